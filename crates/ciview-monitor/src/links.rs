//! Connector glyphs between consecutive job boxes.
//!
//! Consecutive jobs of different stages are joined by a horizontal line.
//! Jobs stacked in the same stage get a bracket on each side that ties them
//! into the lines entering and leaving the stage.

use crate::layout::BoxKey;
use ciview_state::JobNode;
use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect};
use std::collections::HashMap;
use thiserror::Error;

const HORIZONTAL: char = '═';
const VERTICAL: char = '║';
const TEE_DOWN: char = '╦';
const TEE_RIGHT: char = '╠';
const TEE_LEFT: char = '╣';
const CORNER_UP_RIGHT: char = '╚';
const CORNER_UP_LEFT: char = '╝';

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("box for job {name} not found at index: {index}")]
    MissingBox { name: String, index: usize },
}

/// Cell access for line drawing. Writes outside the surface are dropped.
pub trait Canvas {
    fn glyph_at(&self, x: i32, y: i32) -> Option<char>;
    fn put_glyph(&mut self, x: i32, y: i32, glyph: char);
}

fn position(x: i32, y: i32) -> Option<Position> {
    Some(Position::new(u16::try_from(x).ok()?, u16::try_from(y).ok()?))
}

impl Canvas for Buffer {
    fn glyph_at(&self, x: i32, y: i32) -> Option<char> {
        let cell = self.cell(position(x, y)?)?;
        cell.symbol().chars().next()
    }

    fn put_glyph(&mut self, x: i32, y: i32, glyph: char) {
        if let Some(cell) = position(x, y).and_then(|pos| self.cell_mut(pos)) {
            cell.set_char(glyph);
        }
    }
}

/// Restricts another canvas to `clip`.
pub struct Clipped<'a, C: ?Sized> {
    inner: &'a mut C,
    clip: Rect,
}

impl<'a, C: Canvas + ?Sized> Clipped<'a, C> {
    pub fn new(inner: &'a mut C, clip: Rect) -> Self {
        Self { inner, clip }
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        position(x, y).is_some_and(|pos| self.clip.contains(pos))
    }
}

impl<C: Canvas + ?Sized> Canvas for Clipped<'_, C> {
    fn glyph_at(&self, x: i32, y: i32) -> Option<char> {
        if self.contains(x, y) {
            self.inner.glyph_at(x, y)
        } else {
            None
        }
    }

    fn put_glyph(&mut self, x: i32, y: i32, glyph: char) {
        if self.contains(x, y) {
            self.inner.put_glyph(x, y, glyph);
        }
    }
}

/// Draw connectors for every consecutive pair of `jobs`.
///
/// Every job needs an entry in `boxes`.
pub fn link_jobs<C: Canvas + ?Sized>(
    canvas: &mut C,
    jobs: &[JobNode],
    boxes: &HashMap<BoxKey, Rect>,
) -> Result<(), LinkError> {
    let rects = jobs
        .iter()
        .enumerate()
        .map(|(index, job)| {
            boxes
                .get(&BoxKey::job(job))
                .copied()
                .ok_or_else(|| LinkError::MissingBox {
                    name: job.name.clone(),
                    index,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let (Some(first), Some(last)) = (jobs.first(), jobs.last()) else {
        return Ok(());
    };

    let padding = connector_padding(jobs, &rects);
    for (pair, rect) in jobs.windows(2).zip(rects.windows(2)) {
        link(
            canvas,
            rect[0],
            rect[1],
            padding,
            pair[0].stage == first.stage,
            pair[0].stage == last.stage,
        );
    }
    Ok(())
}

/// Gap-dependent offset of same-stage brackets from their boxes.
///
/// Derived from the horizontal gap of each cross-stage pair; the last such
/// pair decides for the whole pass.
pub fn connector_padding(jobs: &[JobNode], rects: &[Rect]) -> i32 {
    let mut padding = 0;
    for (pair, rect) in jobs.windows(2).zip(rects.windows(2)) {
        if pair[0].stage == pair[1].stage {
            continue;
        }
        let gap = i32::from(rect[1].x) - i32::from(rect[0].x) - i32::from(rect[0].width);
        padding = match gap {
            ..=3 => 1,
            4..=6 => 2,
            _ => 3,
        };
    }
    padding
}

fn link<C: Canvas + ?Sized>(
    canvas: &mut C,
    from: Rect,
    to: Rect,
    p: i32,
    first_stage: bool,
    last_stage: bool,
) {
    let (x1, y1) = (i32::from(from.x), i32::from(from.y));
    let (w, h) = (i32::from(from.width), i32::from(from.height));
    let (x2, y2) = (i32::from(to.x), i32::from(to.y));
    let (dx, dy) = (x2 - x1, y2 - y1);

    if dx != 0 {
        hline(canvas, x1 + w, y2 + h / 2, dx - w);
        if dy != 0 {
            // Previous stage fans in from more than one row
            canvas.put_glyph(x1 + w + p - 1, y2 + h / 2, TEE_DOWN);
        }
        return;
    }

    if !first_stage {
        let x = x2 - p;
        let joint = if canvas.glyph_at(x, y1 + h / 2) == Some(CORNER_UP_RIGHT) {
            TEE_RIGHT
        } else {
            TEE_DOWN
        };
        canvas.put_glyph(x, y1 + h / 2, joint);
        for i in 1..p {
            canvas.put_glyph(x2 - i, y2 + h / 2, HORIZONTAL);
        }
        canvas.put_glyph(x, y2 + h / 2, CORNER_UP_RIGHT);
        vline(canvas, x, y1 + h - 1, dy - 1);
    }

    if !last_stage {
        let x = x2 + w + p - 1;
        if canvas.glyph_at(x, y1 + h / 2) == Some(CORNER_UP_LEFT) {
            canvas.put_glyph(x, y1 + h / 2, TEE_LEFT);
        }
        for i in 0..p - 1 {
            canvas.put_glyph(x2 + w + i, y2 + h / 2, HORIZONTAL);
        }
        canvas.put_glyph(x, y2 + h / 2, CORNER_UP_LEFT);
        vline(canvas, x, y1 + h - 1, dy - 1);
    }
}

fn hline<C: Canvas + ?Sized>(canvas: &mut C, x: i32, y: i32, len: i32) {
    for i in 0..len {
        canvas.put_glyph(x + i, y, HORIZONTAL);
    }
}

fn vline<C: Canvas + ?Sized>(canvas: &mut C, x: i32, y: i32, len: i32) {
    for i in 0..len {
        canvas.put_glyph(x, y + i, VERTICAL);
    }
}

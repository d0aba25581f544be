//! Stage header and job boxes of the pipeline graph.

use crate::layout::MAX_TITLE_WIDTH;
use crate::ui::Theme;
use chrono::{DateTime, Utc};
use ciview_state::{JobNode, JobStatus, format_duration};
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

/// Marker shown in the body of bridge jobs.
pub const BRIDGE_MARKER: &str = "»";

/// Leading title glyph for a status.
pub fn status_glyph(status: JobStatus, allow_failure: bool) -> Option<char> {
    match status {
        JobStatus::Success => Some('✔'),
        JobStatus::Failed if allow_failure => Some('!'),
        JobStatus::Failed => Some('✘'),
        JobStatus::Running | JobStatus::Pending => Some('●'),
        JobStatus::Manual => Some('■'),
        JobStatus::Canceled => Some('Ø'),
        JobStatus::Skipped => Some('»'),
        JobStatus::Created => None,
    }
}

/// Box title: status glyph and job name without a trailing `:<stage>`.
pub fn box_title(job: &JobNode) -> String {
    let title = match status_glyph(job.status, job.allow_failure) {
        Some(glyph) => format!("{} {}", glyph, job.name),
        None => job.name.clone(),
    };
    let suffix = format!(":{}", job.stage);
    match title.strip_suffix(&suffix) {
        Some(trimmed) => trimmed.to_string(),
        None => title,
    }
}

/// Long titles are left-aligned so their start stays visible.
pub fn title_alignment(title: &str) -> Alignment {
    if Line::from(title).width() > usize::from(MAX_TITLE_WIDTH) {
        Alignment::Left
    } else {
        Alignment::Center
    }
}

/// Body lines: bridge marker, then the duration once the job has started.
pub fn box_body(job: &JobNode, now: DateTime<Utc>) -> Vec<String> {
    let marker = if job.is_bridge() { BRIDGE_MARKER } else { "" };
    let mut lines = vec![marker.to_string()];
    if let Some(elapsed) = job.duration(now) {
        lines.push(format_duration(elapsed));
    }
    lines
}

/// Borders of `area` that survive clipping to `visible`.
///
/// A box cut off at an edge loses the border on that side instead of
/// looking complete.
fn visible_borders(area: Rect, visible: Rect) -> Borders {
    let mut borders = Borders::ALL;
    if visible.top() > area.top() {
        borders.remove(Borders::TOP);
    }
    if visible.bottom() < area.bottom() {
        borders.remove(Borders::BOTTOM);
    }
    if visible.left() > area.left() {
        borders.remove(Borders::LEFT);
    }
    if visible.right() < area.right() {
        borders.remove(Borders::RIGHT);
    }
    borders
}

pub struct JobBox;

impl JobBox {
    /// Render one job box into the visible part `clip` of its geometry.
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        clip: Rect,
        job: &JobNode,
        selected: bool,
        now: DateTime<Utc>,
        theme: &Theme,
    ) {
        let visible = area.intersection(clip);
        if visible.is_empty() {
            return;
        }

        let mut border_style = Style::default();
        if let Some(color) = theme.status_color(job.status, job.allow_failure) {
            border_style = border_style.fg(color);
        }
        if selected {
            border_style = border_style.add_modifier(Modifier::BOLD);
        }

        let title = box_title(job);
        let block = Block::default()
            .borders(visible_borders(area, visible))
            .border_type(if selected {
                BorderType::Thick
            } else {
                BorderType::Plain
            })
            .border_style(border_style)
            .title(Line::from(title.as_str()).alignment(title_alignment(&title)))
            .title_style(border_style);

        let body: Vec<Line> = box_body(job, now).into_iter().map(Line::from).collect();
        let paragraph = Paragraph::new(body)
            .alignment(Alignment::Right)
            .block(block);

        frame.render_widget(Clear, visible);
        frame.render_widget(paragraph, visible);
    }
}

pub struct StageHeader;

impl StageHeader {
    pub fn render(frame: &mut Frame, area: Rect, clip: Rect, label: &str, theme: &Theme) {
        let visible = area.intersection(clip);
        if visible.is_empty() {
            return;
        }
        let paragraph = Paragraph::new(label)
            .alignment(Alignment::Center)
            .style(Style::default().fg(theme.foreground))
            .block(Block::default().borders(visible_borders(area, visible)));

        frame.render_widget(Clear, visible);
        frame.render_widget(paragraph, visible);
    }
}

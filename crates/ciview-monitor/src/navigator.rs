//! Stage-aware cursor over the job list.

use ciview_state::{JobNode, adjacent_stages, stage_bounds};
use crossterm::event::KeyCode;

/// Cursor state: row within the current stage and absolute list index.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Navigator {
    depth: usize,
    index: usize,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Back to the first job of the first stage.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether `code` moves the cursor.
    pub fn is_navigation_key(code: KeyCode) -> bool {
        matches!(
            code,
            KeyCode::Left
                | KeyCode::Right
                | KeyCode::Up
                | KeyCode::Down
                | KeyCode::Char('h' | 'j' | 'k' | 'l' | 'g' | 'G')
        )
    }

    /// Job under the cursor, with the index clamped to the list.
    pub fn current<'a>(&self, jobs: &'a [JobNode]) -> Option<&'a JobNode> {
        let last = jobs.len().checked_sub(1)?;
        jobs.get(self.index.min(last))
    }

    /// Apply one key and return the newly selected job.
    ///
    /// Returns `None` only for an empty list.
    pub fn navigate<'a>(&mut self, jobs: &'a [JobNode], code: KeyCode) -> Option<&'a JobNode> {
        let here = self.current(jobs)?;
        let (prev, next) = adjacent_stages(jobs, &here.stage);

        let stage = match code {
            KeyCode::Left | KeyCode::Char('h') => prev,
            KeyCode::Right | KeyCode::Char('l') => next,
            _ => here.stage.as_str(),
        };

        let (lower, upper) = stage_bounds(jobs, stage);
        let last_row = upper - lower;
        self.depth = self.depth.min(last_row);

        match code {
            KeyCode::Down | KeyCode::Char('j') => self.depth = (self.depth + 1).min(last_row),
            KeyCode::Up | KeyCode::Char('k') => self.depth = self.depth.saturating_sub(1),
            KeyCode::Char('g') => self.depth = 0,
            KeyCode::Char('G') => self.depth = last_row,
            _ => {}
        }

        self.index = (lower + self.depth).min(upper);
        jobs.get(self.index)
    }

    /// Move the cursor onto the job with the given `(stage, name)`.
    pub fn sync_to<'a>(&mut self, jobs: &'a [JobNode], key: (&str, &str)) -> Option<&'a JobNode> {
        let pos = jobs.iter().position(|j| j.key() == key)?;
        let (lower, _) = stage_bounds(jobs, &jobs[pos].stage);
        self.index = pos;
        self.depth = pos.saturating_sub(lower);
        jobs.get(pos)
    }
}

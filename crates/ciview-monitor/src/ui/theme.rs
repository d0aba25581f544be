//! Color themes.

use ciview_state::JobStatus;
use ratatui::style::Color;

pub struct Theme {
    pub foreground: Color,
    pub highlight: Color,
    pub muted: Color,
    pub success: Color,
    pub error: Color,
    pub allowed_failure: Color,
    pub running: Color,
    pub pending: Color,
    pub manual: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            foreground: Color::White,
            highlight: Color::Cyan,
            muted: Color::DarkGray,
            success: Color::Green,
            error: Color::Red,
            allowed_failure: Color::Rgb(255, 165, 0),
            running: Color::Blue,
            pending: Color::Yellow,
            manual: Color::Gray,
        }
    }

    /// Border color for a job box; `None` keeps the default.
    pub fn status_color(&self, status: JobStatus, allow_failure: bool) -> Option<Color> {
        match status {
            JobStatus::Success => Some(self.success),
            JobStatus::Failed if allow_failure => Some(self.allowed_failure),
            JobStatus::Failed => Some(self.error),
            JobStatus::Running => Some(self.running),
            JobStatus::Pending => Some(self.pending),
            JobStatus::Manual => Some(self.manual),
            JobStatus::Created | JobStatus::Canceled | JobStatus::Skipped => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

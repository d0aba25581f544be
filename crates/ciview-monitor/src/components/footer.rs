//! Footer component with keyboard shortcuts and status messages.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

/// Version from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// What the footer hints at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FooterMode {
    Graph,
    Log,
    Modal,
}

impl FooterMode {
    fn help(self) -> &'static str {
        match self {
            Self::Graph => {
                "hjkl:nav  enter:logs/open  ^R:run  ^D:cancel  ^space:tail  ?:help  q:back  ^Q:quit"
            }
            Self::Log => "j/k:scroll  pgup/pgdn:page  g/G:top/bottom  t:follow  q:close",
            Self::Modal => "tab/h/l:switch  enter:select  y/n:answer  esc:close",
        }
    }
}

pub struct Footer;

impl Footer {
    pub fn render(frame: &mut Frame, area: Rect, mode: FooterMode, status_message: Option<&str>) {
        let version = format!("v{}", VERSION);

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(version.len() as u16 + 1),
            ])
            .split(area);

        // Status message takes precedence over the key hints
        let left_content = if let Some(msg) = status_message {
            Line::from(Span::styled(
                msg.to_string(),
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ))
        } else {
            Line::from(Span::styled(mode.help(), Style::default().fg(Color::Gray)))
        };

        frame.render_widget(Paragraph::new(left_content), chunks[0]);

        let version_paragraph = Paragraph::new(Line::from(Span::styled(
            version,
            Style::default().fg(Color::Gray),
        )));
        frame.render_widget(version_paragraph, chunks[1]);
    }
}

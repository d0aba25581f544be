//! Yes/No confirmation for job actions.

use crate::ui::{Theme, centered_fixed};
use ciview_state::JobNode;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

pub const NO_LABEL: &str = "✘ No";
pub const YES_LABEL: &str = "✔ Yes";

/// Action waiting for confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmKind {
    Cancel,
    Run,
}

/// Focused button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Button {
    #[default]
    No,
    Yes,
}

impl Button {
    fn toggle(self) -> Self {
        match self {
            Self::No => Self::Yes,
            Self::Yes => Self::No,
        }
    }
}

/// Result of a key press inside the modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalOutcome {
    /// Still open
    Pending,
    Confirmed,
    Declined,
}

#[derive(Debug, Clone)]
pub struct ConfirmModal {
    pub kind: ConfirmKind,
    pub job: JobNode,
    pub focus: Button,
}

impl ConfirmModal {
    pub fn cancel(job: JobNode) -> Self {
        Self {
            kind: ConfirmKind::Cancel,
            job,
            focus: Button::No,
        }
    }

    pub fn run(job: JobNode) -> Self {
        Self {
            kind: ConfirmKind::Run,
            job,
            focus: Button::No,
        }
    }

    pub fn prompt(&self) -> String {
        let verb = match self.kind {
            ConfirmKind::Cancel => "cancel",
            ConfirmKind::Run => "run",
        };
        format!("Are you sure you want to {} {}?", verb, self.job.name)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ModalOutcome {
        match key.code {
            KeyCode::Tab
            | KeyCode::BackTab
            | KeyCode::Left
            | KeyCode::Right
            | KeyCode::Char('h' | 'l') => {
                self.focus = self.focus.toggle();
                ModalOutcome::Pending
            }
            KeyCode::Enter => match self.focus {
                Button::Yes => ModalOutcome::Confirmed,
                Button::No => ModalOutcome::Declined,
            },
            KeyCode::Char('y' | 'Y') => ModalOutcome::Confirmed,
            KeyCode::Char('n' | 'N') => ModalOutcome::Declined,
            _ => ModalOutcome::Pending,
        }
    }

    pub fn render(&self, frame: &mut Frame, theme: &Theme) {
        let prompt = self.prompt();
        let width = (Line::from(prompt.as_str()).width() as u16 + 6).clamp(30, 70);
        let area: Rect = centered_fixed(width, 7, frame.area());

        let button = |label: &'static str, focused: bool| {
            let style = if focused {
                Style::default()
                    .fg(theme.highlight)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::default().fg(theme.muted)
            };
            Span::styled(format!(" {} ", label), style)
        };

        let lines = vec![
            Line::from(prompt.as_str()),
            Line::from(""),
            Line::from(vec![
                button(NO_LABEL, self.focus == Button::No),
                Span::raw("   "),
                button(YES_LABEL, self.focus == Button::Yes),
            ]),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.highlight)),
            );

        frame.render_widget(Clear, area);
        frame.render_widget(paragraph, area);
    }
}

//! Key binding overlay.

use crate::ui::centered_rect;
use ratatui::{
    Frame,
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph},
};

const HELP_TEXT: &str = r#"
  Keyboard Shortcuts
  ──────────────────

  Graph
  h/j/k/l / ←↓↑→  Move between jobs and stages
  g / G           First/last job of the stage
  Enter           Toggle logs, or open a downstream pipeline
  Ctrl+R / Ctrl+P Run (play or retry) the job
  Ctrl+D          Cancel a pending or running job
  Ctrl+Space      Tail the job log in the shell
  q / Esc         Back to the parent pipeline, or quit

  Logs
  j/k / ↑↓        Scroll line by line
  PgUp/PgDn       Page up/down
  g / G           Go to top/bottom
  t               Toggle follow mode
  q / Esc         Close the log panel

  Ctrl+Q / Ctrl+C Quit
  ?               This help

  Press any key to close
"#;

pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame) {
        let area = centered_rect(60, 70, frame.area());

        frame.render_widget(Clear, area);
        let paragraph = Paragraph::new(HELP_TEXT)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Help ")
                    .style(Style::default().bg(Color::DarkGray)),
            )
            .style(Style::default().fg(Color::White).bg(Color::DarkGray));

        frame.render_widget(paragraph, area);
    }
}

//! Frame title with pipeline summary and drill-down path.

use crate::ui::Theme;
use chrono::{DateTime, Utc};
use ciview_state::{PipelineStack, PipelineSummary, time_ago};
use ratatui::{
    layout::Alignment,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Padding},
};

pub struct Header;

impl Header {
    /// Title of the root pipeline, e.g. ` Pipeline #42 triggered 3 minutes ago by Ada `.
    pub fn title(summary: &PipelineSummary, now: DateTime<Utc>) -> String {
        let user = summary.user_name.as_deref().unwrap_or("unknown");
        match summary.created_at {
            Some(created) => format!(
                " Pipeline #{} triggered {} by {} ",
                summary.id,
                time_ago(created, now),
                user
            ),
            None => format!(" Pipeline #{} by {} ", summary.id, user),
        }
    }

    /// Path of pipeline ids from the root to the displayed one.
    pub fn breadcrumb(stack: &PipelineStack) -> Option<String> {
        if stack.depth() <= 1 {
            return None;
        }
        let path: Vec<String> = stack.iter().map(|p| format!("#{}", p.id)).collect();
        Some(format!(" {} ", path.join(" » ")))
    }

    /// Outer frame of the viewer.
    pub fn block(
        summary: &PipelineSummary,
        stack: &PipelineStack,
        now: DateTime<Utc>,
        theme: &Theme,
    ) -> Block<'static> {
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.muted))
            .padding(Padding::new(2, 2, 1, 1))
            .title(
                Line::from(Span::styled(
                    Self::title(summary, now),
                    Style::default()
                        .fg(theme.foreground)
                        .add_modifier(Modifier::BOLD),
                ))
                .alignment(Alignment::Center),
            );

        if let Some(path) = Self::breadcrumb(stack) {
            block = block.title(
                Line::from(Span::styled(path, Style::default().fg(theme.highlight)))
                    .alignment(Alignment::Left),
            );
        }
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use ciview_state::PipelineRef;

    #[test]
    fn test_title() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let mut summary = PipelineSummary {
            id: 42,
            web_url: String::new(),
            created_at: Some(now - Duration::minutes(3)),
            user_name: Some("Ada".to_string()),
        };
        assert_eq!(
            Header::title(&summary, now),
            " Pipeline #42 triggered 3 minutes ago by Ada "
        );

        summary.created_at = None;
        summary.user_name = None;
        assert_eq!(Header::title(&summary, now), " Pipeline #42 by unknown ");
    }

    #[test]
    fn test_breadcrumb() {
        let mut stack = PipelineStack::new(PipelineRef::new(1u64, 10, None));
        assert_eq!(Header::breadcrumb(&stack), None);

        stack.push(PipelineRef::new(2u64, 20, None));
        stack.push(PipelineRef::new(3u64, 30, None));
        assert_eq!(
            Header::breadcrumb(&stack).as_deref(),
            Some(" #10 » #20 » #30 ")
        );
    }
}

//! Log panel showing a streamed job trace.

use ciview_gitlab::TraceTarget;
use once_cell::sync::Lazy;
use regex::Regex;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};

/// Lines moved by PageUp/PageDown.
const PAGE: usize = 10;

/// CSI sequences other than SGR, OSC and two-byte escape sequences.
static ESCAPES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1b\[[0-?]*[ -/]*[@-ln-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-Z\\-_]")
        .expect("valid escape sequence regex")
});

/// Select Graphic Rendition sequences; the parameters are captured.
static SGR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[([0-9;:]*)m").expect("valid SGR regex"));

/// Control characters left after escapes are gone (tab and CR excluded).
static CONTROLS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x00-\x08\x0b\x0c\x0e-\x1f\x7f]").expect("valid control character regex")
});

/// Job whose trace a log session streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    /// Identifies the session; chunks from older sessions are ignored
    pub session: u64,
    pub job_id: u64,
    pub trace: TraceTarget,
}

/// One trace line as styled segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogLine {
    pub segments: Vec<(String, Style)>,
}

impl LogLine {
    /// The line without styling.
    pub fn text(&self) -> String {
        self.segments.iter().map(|(text, _)| text.as_str()).collect()
    }

    /// Whether the trace set any colour or attribute on this line.
    pub fn is_styled(&self) -> bool {
        self.segments.iter().any(|(_, style)| *style != Style::default())
    }

    fn to_line(&self) -> Line<'_> {
        if self.is_styled() {
            return Line::from(
                self.segments
                    .iter()
                    .map(|(text, style)| Span::styled(text.as_str(), *style))
                    .collect::<Vec<_>>(),
            );
        }
        let text = self.text();
        let style = if text.contains("ERROR") {
            Style::default().fg(Color::Red)
        } else if text.contains("WARNING") {
            Style::default().fg(Color::Yellow)
        } else if text.starts_with('$') {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        Line::from(Span::styled(text, style))
    }
}

/// Turn one raw trace line into styled segments.
///
/// Colours and attributes survive; other escape sequences are removed and
/// a carriage return keeps only the text written after it, the way a
/// terminal would show the line.
pub fn parse_line(raw: &[u8]) -> LogLine {
    let text = String::from_utf8_lossy(raw);
    let text = ESCAPES.replace_all(&text, "");

    let mut style = Style::default();
    let mut shown = Vec::new();
    for part in text.split('\r') {
        let mut segments = Vec::new();
        let mut last = 0;
        for caps in SGR.captures_iter(part) {
            let Some(whole) = caps.get(0) else { continue };
            push_segment(&mut segments, &part[last..whole.start()], style);
            style = apply_sgr(style, caps.get(1).map_or("", |m| m.as_str()));
            last = whole.end();
        }
        push_segment(&mut segments, &part[last..], style);
        // Style carries over, but only a part with visible text replaces the line
        if !segments.is_empty() {
            shown = segments;
        }
    }
    LogLine { segments: shown }
}

/// Plain text of one raw trace line.
pub fn clean_line(raw: &[u8]) -> String {
    parse_line(raw).text()
}

fn push_segment(segments: &mut Vec<(String, Style)>, text: &str, style: Style) {
    let text = CONTROLS.replace_all(text, "").replace('\t', "    ");
    if !text.is_empty() {
        segments.push((text, style));
    }
}

/// Apply SGR parameters such as `0;32;1` on top of `style`.
fn apply_sgr(style: Style, params: &str) -> Style {
    let codes: Vec<u16> = params
        .split([';', ':'])
        .map(|code| code.parse().unwrap_or(0))
        .collect();

    let mut style = style;
    let mut codes = codes.into_iter();
    while let Some(code) = codes.next() {
        style = match code {
            0 => Style::default(),
            1 => style.add_modifier(Modifier::BOLD),
            2 => style.add_modifier(Modifier::DIM),
            3 => style.add_modifier(Modifier::ITALIC),
            4 => style.add_modifier(Modifier::UNDERLINED),
            7 => style.add_modifier(Modifier::REVERSED),
            9 => style.add_modifier(Modifier::CROSSED_OUT),
            22 => style.remove_modifier(Modifier::BOLD | Modifier::DIM),
            23 => style.remove_modifier(Modifier::ITALIC),
            24 => style.remove_modifier(Modifier::UNDERLINED),
            27 => style.remove_modifier(Modifier::REVERSED),
            29 => style.remove_modifier(Modifier::CROSSED_OUT),
            30..=37 => style.fg(basic_color(code - 30)),
            90..=97 => style.fg(bright_color(code - 90)),
            40..=47 => style.bg(basic_color(code - 40)),
            100..=107 => style.bg(bright_color(code - 100)),
            38 | 48 => match extended_color(&mut codes) {
                Some(color) if code == 38 => style.fg(color),
                Some(color) => style.bg(color),
                None => style,
            },
            39 => {
                style.fg = None;
                style
            }
            49 => {
                style.bg = None;
                style
            }
            _ => style,
        };
    }
    style
}

/// `5;n` (256 colours) or `2;r;g;b` following a 38/48 code.
fn extended_color(codes: &mut impl Iterator<Item = u16>) -> Option<Color> {
    let byte = |code: Option<u16>| code.and_then(|c| u8::try_from(c).ok());
    match codes.next()? {
        5 => byte(codes.next()).map(Color::Indexed),
        2 => {
            let (r, g, b) = (byte(codes.next())?, byte(codes.next())?, byte(codes.next())?);
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}

fn basic_color(idx: u16) -> Color {
    match idx {
        0 => Color::Black,
        1 => Color::Red,
        2 => Color::Green,
        3 => Color::Yellow,
        4 => Color::Blue,
        5 => Color::Magenta,
        6 => Color::Cyan,
        _ => Color::Gray,
    }
}

fn bright_color(idx: u16) -> Color {
    match idx {
        0 => Color::DarkGray,
        1 => Color::LightRed,
        2 => Color::LightGreen,
        3 => Color::LightYellow,
        4 => Color::LightBlue,
        5 => Color::LightMagenta,
        6 => Color::LightCyan,
        _ => Color::White,
    }
}

/// State for the log panel.
#[derive(Debug, Clone)]
pub struct LogPanel {
    pub target: LogTarget,
    /// Completed lines
    pub lines: Vec<LogLine>,
    /// Bytes of the line still being written
    pending: Vec<u8>,
    /// First visible line when not following
    pub scroll_offset: usize,
    /// Follow mode - keep the newest output in view
    pub follow_mode: bool,
}

impl LogPanel {
    pub fn new(target: LogTarget) -> Self {
        Self {
            target,
            lines: Vec::new(),
            pending: Vec::new(),
            scroll_offset: 0,
            follow_mode: true,
        }
    }

    pub fn session(&self) -> u64 {
        self.target.session
    }

    /// Add streamed trace bytes.
    pub fn append(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.lines.push(parse_line(&line[..pos]));
        }
        if self.follow_mode {
            self.scroll_offset = self.len().saturating_sub(1);
        }
    }

    /// Completed lines plus the partial line, if any.
    pub fn display_lines(&self) -> Vec<LogLine> {
        let mut lines = self.lines.clone();
        if !self.pending.is_empty() {
            lines.push(parse_line(&self.pending));
        }
        lines
    }

    pub fn len(&self) -> usize {
        self.lines.len() + usize::from(!self.pending.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scroll down by `n` lines.
    pub fn scroll_down(&mut self, n: usize) {
        self.scroll_offset = (self.scroll_offset + n).min(self.len().saturating_sub(1));
        self.follow_mode = false;
    }

    /// Scroll up by `n` lines.
    pub fn scroll_up(&mut self, n: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(n);
        self.follow_mode = false;
    }

    pub fn page_down(&mut self) {
        self.scroll_down(PAGE);
    }

    pub fn page_up(&mut self) {
        self.scroll_up(PAGE);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
        self.follow_mode = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self.len().saturating_sub(1);
        self.follow_mode = false;
    }

    /// Toggle follow mode.
    pub fn toggle_follow(&mut self) {
        self.follow_mode = !self.follow_mode;
        if self.follow_mode {
            self.scroll_offset = self.len().saturating_sub(1);
        }
    }

    /// First line to show in a viewport of `height` lines.
    pub fn first_visible(&self, height: usize) -> usize {
        let last_page = self.len().saturating_sub(height);
        if self.follow_mode {
            last_page
        } else {
            self.scroll_offset.min(last_page)
        }
    }
}

/// Log viewer component.
pub struct LogViewer;

impl LogViewer {
    pub fn render(frame: &mut Frame, area: Rect, state: &LogPanel) {
        let content_height = area.height.saturating_sub(2) as usize;

        let follow_indicator = if state.follow_mode { " [follow]" } else { "" };
        let title = format!(
            " Logs: {} #{}{} ",
            state.target.trace.job_name, state.target.job_id, follow_indicator
        );

        let all = state.display_lines();
        let start = state.first_visible(content_height);
        let content: Vec<Line> = if all.is_empty() {
            vec![Line::from(Span::styled(
                "(waiting for log output...)",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            all.iter()
                .skip(start)
                .take(content_height)
                .map(LogLine::to_line)
                .collect()
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_bottom(format!(" {}/{} ", (start + 1).min(all.len()), all.len()))
            .title_style(Style::default().fg(Color::Cyan));

        frame.render_widget(Paragraph::new(content).block(block), area);

        if all.len() > content_height {
            let mut scrollbar_state = ScrollbarState::new(all.len()).position(start);

            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .track_symbol(Some("│"))
                .thumb_symbol("█");

            frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
        }
    }
}

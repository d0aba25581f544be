//! Main TUI application.

use crate::components::{
    ConfirmKind, ConfirmModal, Footer, FooterMode, Header, HelpOverlay, JobBox, LogPanel,
    LogTarget, LogViewer, ModalOutcome, StageHeader,
};
use crate::error::ViewerError;
use crate::event::ViewerEvent;
use crate::layout::{BoxKey, layout_graph};
use crate::links::{Clipped, LinkError, link_jobs};
use crate::navigator::Navigator;
use crate::ui::Theme;
use chrono::{DateTime, Utc};
use ciview_gitlab::TraceTarget;
use ciview_state::{JobNode, JobStatus, PipelineRef, PipelineStack, PipelineSummary};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// How long a status message stays in the footer.
const STATUS_TTL: Duration = Duration::from_secs(3);

/// Side effect requested by a key press, executed by the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    Quit,
    Cancel(JobNode),
    PlayOrRetry(JobNode),
    OpenLog(LogTarget),
    CloseLog,
    SuspendAndTail(LogTarget),
}

/// Everything the viewer draws.
#[derive(Debug, Default)]
pub struct ViewerState {
    pub jobs: Vec<JobNode>,
    pub selected: Option<JobNode>,
    pub log: Option<LogPanel>,
    pub modal: Option<ConfirmModal>,
    /// Unclipped geometry of the boxes drawn by the last layout pass
    pub boxes: HashMap<BoxKey, Rect>,
}

pub struct App {
    pub state: ViewerState,
    stack: PipelineStack,
    summary: PipelineSummary,
    navigator: Navigator,
    pub show_help: bool,
    theme: Theme,
    status_message: Option<(String, Instant)>,
    next_session: u64,
    link_error: Option<LinkError>,
}

impl App {
    pub fn new(root: PipelineRef, summary: PipelineSummary) -> Self {
        Self {
            state: ViewerState::default(),
            stack: PipelineStack::new(root),
            summary,
            navigator: Navigator::new(),
            show_help: false,
            theme: Theme::default(),
            status_message: None,
            next_session: 0,
            link_error: None,
        }
    }

    pub fn stack(&self) -> &PipelineStack {
        &self.stack
    }

    /// Pipeline on top of the drill-down stack.
    pub fn current_pipeline(&self) -> &PipelineRef {
        self.stack.current()
    }

    /// Polling pauses while a confirmation is open.
    pub fn is_paused(&self) -> bool {
        self.state.modal.is_some()
    }

    pub fn selected(&self) -> Option<&JobNode> {
        self.state.selected.as_ref()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message
            .as_ref()
            .filter(|(_, at)| at.elapsed() < STATUS_TTL)
            .map(|(msg, _)| msg.as_str())
    }

    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Connector failure from the last draw, if any.
    pub fn take_link_error(&mut self) -> Option<LinkError> {
        self.link_error.take()
    }

    /// Adopt a fresh job set.
    ///
    /// Results for a pipeline that is no longer displayed are dropped and
    /// `false` is returned.
    pub fn apply_jobs(&mut self, pipeline: &PipelineRef, jobs: Vec<JobNode>) -> bool {
        if pipeline != self.stack.current() {
            tracing::debug!("Dropping stale jobs of pipeline {}", pipeline.id);
            return false;
        }
        self.state.jobs = jobs;

        let synced = self
            .state
            .selected
            .as_ref()
            .and_then(|sel| self.navigator.sync_to(&self.state.jobs, sel.key()))
            .cloned();
        self.state.selected = synced.or_else(|| self.navigator.current(&self.state.jobs).cloned());
        true
    }

    /// Put a job returned by a job action in place of the selection.
    ///
    /// An open log panel restarts on the updated job, since a retry gets a
    /// new id; the returned action starts that session.
    pub fn replace_selection(&mut self, job: JobNode) -> Action {
        if let Some(slot) = self.state.jobs.iter_mut().find(|j| j.key() == job.key()) {
            *slot = job.clone();
        }
        let action = if self.state.log.is_some() {
            let target = self.log_target(&job);
            self.state.log = Some(LogPanel::new(target.clone()));
            Action::OpenLog(target)
        } else {
            Action::None
        };
        self.state.selected = Some(job);
        action
    }

    pub fn handle_event(&mut self, event: ViewerEvent) -> Result<Action, ViewerError> {
        match event {
            ViewerEvent::JobsUpdated { pipeline, jobs } => {
                self.apply_jobs(&pipeline, jobs);
                Ok(Action::None)
            }
            ViewerEvent::KeyPressed(key) if key.kind != KeyEventKind::Release => {
                Ok(self.handle_key(key))
            }
            ViewerEvent::KeyPressed(_) | ViewerEvent::TickElapsed => Ok(Action::None),
            ViewerEvent::LogChunk { session, bytes } => {
                if let Some(panel) = self.state.log.as_mut().filter(|p| p.session() == session) {
                    panel.append(&bytes);
                }
                Ok(Action::None)
            }
            ViewerEvent::LogFailed { session, error } => {
                if self.state.log.as_ref().is_some_and(|p| p.session() == session) {
                    return Err(ViewerError::LogStream(error));
                }
                Ok(Action::None)
            }
            ViewerEvent::PollFailed(err) => Err(err),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        // If help is showing, any key closes it
        if self.show_help {
            self.show_help = false;
            return Action::None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('q' | 'c')) {
            return Action::Quit;
        }

        if self.state.modal.is_some() {
            return self.handle_modal_key(key);
        }

        if !ctrl && matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
            return self.close_innermost();
        }

        if ctrl {
            return match key.code {
                KeyCode::Char('d') => self.confirm_cancel(),
                KeyCode::Char('r' | 'p') => self.confirm_run(),
                KeyCode::Char(' ' | '@') => self.suspend_and_tail(),
                _ => Action::None,
            };
        }
        // Some terminals report Ctrl+Space as NUL
        if key.code == KeyCode::Null {
            return self.suspend_and_tail();
        }

        if let Some(panel) = self.state.log.as_mut() {
            match key.code {
                KeyCode::Char('j') | KeyCode::Down => panel.scroll_down(1),
                KeyCode::Char('k') | KeyCode::Up => panel.scroll_up(1),
                KeyCode::PageDown => panel.page_down(),
                KeyCode::PageUp => panel.page_up(),
                KeyCode::Char('g') | KeyCode::Home => panel.scroll_to_top(),
                KeyCode::Char('G') | KeyCode::End => panel.scroll_to_bottom(),
                KeyCode::Char('t') => panel.toggle_follow(),
                KeyCode::Enter => {
                    self.state.log = None;
                    return Action::CloseLog;
                }
                KeyCode::Char('?') => self.show_help = true,
                _ => {}
            }
            return Action::None;
        }

        if Navigator::is_navigation_key(key.code) {
            if let Some(job) = self.navigator.navigate(&self.state.jobs, key.code) {
                self.state.selected = Some(job.clone());
            }
            return Action::None;
        }

        match key.code {
            KeyCode::Enter => self.enter(),
            KeyCode::Char('?') => {
                self.show_help = true;
                Action::None
            }
            _ => Action::None,
        }
    }

    fn handle_modal_key(&mut self, key: KeyEvent) -> Action {
        let Some(modal) = self.state.modal.as_mut() else {
            return Action::None;
        };
        let outcome = if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
            ModalOutcome::Declined
        } else {
            modal.handle_key(key)
        };

        match outcome {
            ModalOutcome::Pending => Action::None,
            ModalOutcome::Declined => {
                self.state.modal = None;
                Action::None
            }
            ModalOutcome::Confirmed => match self.state.modal.take() {
                Some(ConfirmModal {
                    kind: ConfirmKind::Cancel,
                    job,
                    ..
                }) => Action::Cancel(job),
                Some(ConfirmModal {
                    kind: ConfirmKind::Run,
                    job,
                    ..
                }) => Action::PlayOrRetry(job),
                None => Action::None,
            },
        }
    }

    /// Close the innermost open view, quitting from the root pipeline.
    fn close_innermost(&mut self) -> Action {
        if self.state.log.take().is_some() {
            return Action::CloseLog;
        }
        if let Some(left) = self.stack.pop() {
            tracing::debug!("Leaving pipeline {}", left.id);
            self.enter_pipeline();
            return Action::None;
        }
        Action::Quit
    }

    /// Reset per-pipeline view state after the stack changed.
    fn enter_pipeline(&mut self) {
        self.state.jobs.clear();
        self.state.boxes.clear();
        self.state.selected = None;
        self.navigator.reset();
    }

    fn plain_selection(&self) -> Option<&JobNode> {
        self.state.selected.as_ref().filter(|j| !j.is_bridge())
    }

    fn confirm_cancel(&mut self) -> Action {
        if let Some(job) = self
            .plain_selection()
            .filter(|j| matches!(j.status, JobStatus::Pending | JobStatus::Running))
        {
            self.state.modal = Some(ConfirmModal::cancel(job.clone()));
        }
        Action::None
    }

    fn confirm_run(&mut self) -> Action {
        if let Some(job) = self.plain_selection() {
            self.state.modal = Some(ConfirmModal::run(job.clone()));
        }
        Action::None
    }

    fn suspend_and_tail(&mut self) -> Action {
        match self.plain_selection().cloned() {
            Some(job) => Action::SuspendAndTail(self.log_target(&job)),
            None => Action::None,
        }
    }

    fn enter(&mut self) -> Action {
        let Some(job) = self.state.selected.clone() else {
            return Action::None;
        };
        match job.downstream() {
            Some(child) => {
                self.stack.push(child.clone());
                self.enter_pipeline();
                Action::None
            }
            None if job.is_bridge() => {
                self.set_status(format!("{} has no downstream pipeline yet", job.name));
                Action::None
            }
            None => {
                let target = self.log_target(&job);
                self.state.log = Some(LogPanel::new(target.clone()));
                Action::OpenLog(target)
            }
        }
    }

    /// Start a new log session for `job` of the displayed pipeline.
    fn log_target(&mut self, job: &JobNode) -> LogTarget {
        self.next_session += 1;
        let current = self.stack.current();
        let sha = current
            .sha
            .clone()
            .or_else(|| self.stack.root().sha.clone())
            .unwrap_or_default();
        LogTarget {
            session: self.next_session,
            job_id: job.id,
            trace: TraceTarget {
                project: current.project.clone(),
                sha,
                job_name: job.name.clone(),
            },
        }
    }

    /// Render the UI.
    pub fn render(&mut self, frame: &mut Frame) {
        let now = Utc::now();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(frame.area());

        let block = Header::block(&self.summary, &self.stack, now, &self.theme);
        let inner = block.inner(chunks[0]);
        frame.render_widget(block, chunks[0]);

        let mode = if let Some(panel) = &self.state.log {
            LogViewer::render(frame, inner, panel);
            FooterMode::Log
        } else {
            self.render_graph(frame, inner, now);
            FooterMode::Graph
        };

        let mode = if self.state.modal.is_some() {
            FooterMode::Modal
        } else {
            mode
        };
        Footer::render(frame, chunks[1], mode, self.status_message());

        if let Some(modal) = &self.state.modal {
            modal.render(frame, &self.theme);
        }

        // Help overlay (on top of everything)
        if self.show_help {
            HelpOverlay::render(frame);
        }
    }

    fn render_graph(&mut self, frame: &mut Frame, area: Rect, now: DateTime<Utc>) {
        let layout = layout_graph(&self.state.jobs, area);

        let live: HashSet<&BoxKey> = layout.boxes().map(|(key, _)| key).collect();
        self.state.boxes.retain(|key, _| live.contains(key));
        for (key, rect) in layout.boxes() {
            self.state.boxes.insert(key.clone(), rect);
        }

        for stage in &layout.stages {
            StageHeader::render(frame, stage.area, area, &stage.label, &self.theme);
        }

        let selected_key = self.state.selected.as_ref().map(JobNode::key);
        let mut raised = None;
        for placed in &layout.jobs {
            let job = &self.state.jobs[placed.index];
            if Some(job.key()) == selected_key {
                raised = Some((placed.area, job));
                continue;
            }
            JobBox::render(frame, placed.area, area, job, false, now, &self.theme);
        }
        if let Some((rect, job)) = raised {
            JobBox::render(frame, rect, area, job, true, now, &self.theme);
        }

        let mut canvas = Clipped::new(frame.buffer_mut(), area);
        if let Err(err) = link_jobs(&mut canvas, &self.state.jobs, &self.state.boxes) {
            tracing::error!("Failed to draw connectors: {}", err);
            self.link_error = Some(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ciview_gitlab::GitLabError;
    use ciview_state::{JobKind, JobTiming, ProjectId};
    use ratatui::{Terminal, backend::TestBackend};

    fn node(id: u64, name: &str, stage: &str, status: JobStatus) -> JobNode {
        JobNode {
            id,
            name: name.to_string(),
            stage: stage.to_string(),
            status,
            allow_failure: false,
            timing: JobTiming::default(),
            kind: JobKind::Job,
        }
    }

    fn bridge(id: u64, name: &str, stage: &str, downstream: Option<PipelineRef>) -> JobNode {
        JobNode {
            kind: JobKind::Bridge { downstream },
            ..node(id, name, stage, JobStatus::Running)
        }
    }

    fn root() -> PipelineRef {
        PipelineRef::new("group/app", 100, Some("abc123".to_string()))
    }

    fn app_with(jobs: Vec<JobNode>) -> App {
        let summary = PipelineSummary {
            id: 100,
            web_url: "https://gitlab.example.com/group/app/-/pipelines/100".to_string(),
            created_at: None,
            user_name: Some("Ada".to_string()),
        };
        let mut app = App::new(root(), summary);
        assert!(app.apply_jobs(&root(), jobs));
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_first_job_selected_on_arrival() {
        let app = app_with(vec![
            node(1, "build", "build", JobStatus::Success),
            node(2, "test", "test", JobStatus::Running),
        ]);
        assert_eq!(app.selected().map(|j| j.id), Some(1));
    }

    #[test]
    fn test_cancel_confirmed() {
        let mut app = app_with(vec![
            node(1, "build", "build", JobStatus::Success),
            node(2, "deploy", "deploy", JobStatus::Running),
        ]);
        assert_eq!(app.handle_key(key(KeyCode::Right)), Action::None);
        assert_eq!(app.selected().map(|j| j.id), Some(2));

        assert_eq!(app.handle_key(ctrl('d')), Action::None);
        assert!(app.is_paused());
        assert_eq!(
            app.state.modal.as_ref().map(|m| m.prompt()),
            Some("Are you sure you want to cancel deploy?".to_string())
        );

        // Navigation keys move the modal focus, not the cursor
        assert_eq!(app.handle_key(key(KeyCode::Tab)), Action::None);
        match app.handle_key(key(KeyCode::Enter)) {
            Action::Cancel(job) => assert_eq!(job.id, 2),
            other => panic!("unexpected action {:?}", other),
        }
        assert!(!app.is_paused());
    }

    #[test]
    fn test_cancel_declined_by_default() {
        let mut app = app_with(vec![node(1, "build", "build", JobStatus::Pending)]);
        app.handle_key(ctrl('d'));
        assert!(app.is_paused());
        assert_eq!(app.handle_key(key(KeyCode::Enter)), Action::None);
        assert!(app.state.modal.is_none());
    }

    #[test]
    fn test_cancel_requires_active_plain_job() {
        let mut app = app_with(vec![
            node(1, "build", "build", JobStatus::Success),
            bridge(2, "child", "deploy", None),
        ]);
        app.handle_key(ctrl('d'));
        assert!(app.state.modal.is_none());

        app.handle_key(key(KeyCode::Char('l')));
        app.handle_key(ctrl('d'));
        assert!(app.state.modal.is_none());
        app.handle_key(ctrl('r'));
        assert!(app.state.modal.is_none());
    }

    #[test]
    fn test_run_confirmed_with_shortcut() {
        let mut app = app_with(vec![node(1, "build", "build", JobStatus::Failed)]);
        app.handle_key(ctrl('p'));
        match app.handle_key(key(KeyCode::Char('y'))) {
            Action::PlayOrRetry(job) => assert_eq!(job.name, "build"),
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_esc_closes_modal_before_anything_else() {
        let mut app = app_with(vec![node(1, "build", "build", JobStatus::Failed)]);
        app.handle_key(ctrl('r'));
        assert_eq!(app.handle_key(key(KeyCode::Esc)), Action::None);
        assert!(app.state.modal.is_none());
        assert_eq!(app.handle_key(key(KeyCode::Esc)), Action::Quit);
    }

    #[test]
    fn test_drill_down_and_back() {
        let child = PipelineRef::new(7u64, 555, Some("def456".to_string()));
        let mut app = app_with(vec![
            node(1, "build", "build", JobStatus::Success),
            bridge(2, "trigger", "deploy", Some(child.clone())),
        ]);
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.handle_key(key(KeyCode::Enter)), Action::None);
        assert_eq!(app.stack().depth(), 2);
        assert_eq!(app.current_pipeline(), &child);
        assert!(app.selected().is_none());
        assert!(app.state.jobs.is_empty());

        // A late result for the parent is ignored
        assert!(!app.apply_jobs(&root(), vec![node(9, "late", "build", JobStatus::Success)]));
        assert!(app.state.jobs.is_empty());

        assert!(app.apply_jobs(&child, vec![node(20, "child-job", "test", JobStatus::Running)]));
        assert_eq!(app.selected().map(|j| j.id), Some(20));

        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), Action::None);
        assert_eq!(app.stack().depth(), 1);
        assert_eq!(app.current_pipeline(), &root());
        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), Action::Quit);
    }

    #[test]
    fn test_bridge_without_downstream() {
        let mut app = app_with(vec![bridge(2, "trigger", "deploy", None)]);
        assert_eq!(app.handle_key(key(KeyCode::Enter)), Action::None);
        assert_eq!(app.stack().depth(), 1);
        assert_eq!(
            app.status_message(),
            Some("trigger has no downstream pipeline yet")
        );
    }

    #[test]
    fn test_log_panel_session() {
        let mut app = app_with(vec![node(1, "build", "build", JobStatus::Running)]);

        let target = match app.handle_key(key(KeyCode::Enter)) {
            Action::OpenLog(target) => target,
            other => panic!("unexpected action {:?}", other),
        };
        assert_eq!(target.session, 1);
        assert_eq!(target.job_id, 1);
        assert_eq!(target.trace.project, ProjectId::from("group/app"));
        assert_eq!(target.trace.sha, "abc123");
        assert_eq!(target.trace.job_name, "build");

        app.handle_event(ViewerEvent::LogChunk {
            session: 1,
            bytes: b"\x1b[32mok\x1b[0m\n".to_vec(),
        })
        .unwrap();
        app.handle_event(ViewerEvent::LogChunk {
            session: 99,
            bytes: b"stale\n".to_vec(),
        })
        .unwrap();
        assert_eq!(
            app.state.log.as_ref().map(|p| p.lines.iter().map(|l| l.text()).collect::<Vec<_>>()),
            Some(vec!["ok".to_string()])
        );

        // Navigation keys scroll the panel instead of moving the cursor
        app.handle_key(key(KeyCode::Char('k')));
        assert_eq!(app.state.log.as_ref().map(|p| p.follow_mode), Some(false));

        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), Action::CloseLog);
        assert!(app.state.log.is_none());

        let again = match app.handle_key(key(KeyCode::Enter)) {
            Action::OpenLog(target) => target,
            other => panic!("unexpected action {:?}", other),
        };
        assert_eq!(again.session, 2);
    }

    #[test]
    fn test_downstream_log_uses_root_sha_fallback() {
        let child = PipelineRef::new(7u64, 555, None);
        let mut app = app_with(vec![bridge(2, "trigger", "deploy", Some(child.clone()))]);
        app.handle_key(key(KeyCode::Enter));
        app.apply_jobs(&child, vec![node(20, "unit", "test", JobStatus::Running)]);

        match app.handle_key(ctrl(' ')) {
            Action::SuspendAndTail(target) => {
                assert_eq!(target.trace.project, ProjectId::Id(7));
                assert_eq!(target.trace.sha, "abc123");
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_log_failure_is_fatal_for_current_session() {
        let mut app = app_with(vec![node(1, "build", "build", JobStatus::Running)]);
        app.handle_key(key(KeyCode::Enter));

        let stale = app.handle_event(ViewerEvent::LogFailed {
            session: 5,
            error: GitLabError::JobNotFound("build".to_string()),
        });
        assert!(matches!(stale, Ok(Action::None)));

        let current = app.handle_event(ViewerEvent::LogFailed {
            session: 1,
            error: GitLabError::JobNotFound("build".to_string()),
        });
        assert!(matches!(current, Err(ViewerError::LogStream(_))));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app_with(vec![node(1, "build", "build", JobStatus::Running)]);
        app.handle_key(ctrl('r'));
        assert_eq!(app.handle_key(ctrl('c')), Action::Quit);
        assert_eq!(app.handle_key(ctrl('q')), Action::Quit);
    }

    #[test]
    fn test_help_closes_on_any_key() {
        let mut app = app_with(vec![node(1, "build", "build", JobStatus::Running)]);
        app.handle_key(key(KeyCode::Char('?')));
        assert!(app.show_help);
        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), Action::None);
        assert!(!app.show_help);
    }

    #[test]
    fn test_replace_selection_after_retry() {
        let mut app = app_with(vec![
            node(1, "build", "build", JobStatus::Failed),
            node(2, "test", "test", JobStatus::Success),
        ]);
        let action = app.replace_selection(node(11, "build", "build", JobStatus::Pending));
        assert_eq!(action, Action::None);
        assert_eq!(app.selected().map(|j| j.id), Some(11));
        assert_eq!(app.state.jobs[0].id, 11);
        assert_eq!(app.state.jobs.len(), 2);
    }

    #[test]
    fn test_retry_with_open_log_follows_new_job() {
        let mut app = app_with(vec![
            node(1, "build", "build", JobStatus::Failed),
            node(2, "test", "test", JobStatus::Success),
        ]);
        assert!(matches!(app.handle_key(key(KeyCode::Enter)), Action::OpenLog(_)));
        app.handle_key(ctrl('r'));
        assert_eq!(
            app.handle_key(key(KeyCode::Char('y'))),
            Action::PlayOrRetry(node(1, "build", "build", JobStatus::Failed))
        );

        let action = app.replace_selection(node(11, "build", "build", JobStatus::Pending));
        let Action::OpenLog(target) = action else {
            panic!("expected a new log session, got {:?}", action);
        };
        assert_eq!(target.job_id, 11);
        assert_eq!(target.session, 2);
        assert_eq!(target.trace.job_name, "build");
        let panel = app.state.log.as_ref().unwrap();
        assert_eq!(panel.target, target);
        assert!(panel.is_empty());
    }

    #[test]
    fn test_selection_follows_job_across_polls() {
        let mut app = app_with(vec![
            node(1, "build", "build", JobStatus::Success),
            node(2, "lint", "test", JobStatus::Running),
            node(3, "unit", "test", JobStatus::Running),
        ]);
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.selected().map(|j| j.id), Some(3));

        app.apply_jobs(
            &root(),
            vec![
                node(1, "build", "build", JobStatus::Success),
                node(3, "unit", "test", JobStatus::Success),
            ],
        );
        assert_eq!(app.selected().map(|j| j.status), Some(JobStatus::Success));
        assert_eq!(app.handle_key(key(KeyCode::Left)), Action::None);
        assert_eq!(app.selected().map(|j| j.id), Some(1));
    }

    #[test]
    fn test_render_graph() {
        let mut app = app_with(vec![
            node(1, "compile", "build", JobStatus::Success),
            node(2, "lint", "build", JobStatus::Failed),
            node(3, "unit", "test", JobStatus::Running),
        ]);
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();

        assert!(app.take_link_error().is_none());
        assert_eq!(app.state.boxes.len(), 5);

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(text.contains("Pipeline #100 by Ada"));
        assert!(text.contains("Build"));
        assert!(text.contains("compile"));
        assert!(text.contains('═'));
    }

    #[test]
    fn test_registry_drops_vanished_boxes() {
        let mut app = app_with(vec![
            node(1, "compile", "build", JobStatus::Success),
            node(2, "unit", "test", JobStatus::Running),
        ]);
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        assert_eq!(app.state.boxes.len(), 4);

        app.apply_jobs(&root(), vec![node(1, "compile", "build", JobStatus::Success)]);
        terminal.draw(|frame| app.render(frame)).unwrap();
        assert_eq!(app.state.boxes.len(), 2);
        assert!(!app.state.boxes.contains_key(&BoxKey::Stage("test".to_string())));
    }
}

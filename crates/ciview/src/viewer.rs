//! Viewer event loop: terminal input, poll results, log sessions and job
//! actions.

use crate::polling::{PollEvent, PollTarget};
use ciview_cli::ViewerConfig;
use ciview_gitlab::{JobControl, PipelineSource, play_or_retry, stream_log};
use ciview_monitor::{Action, App, LogTarget, ViewerError, ViewerEvent};
use ciview_state::JobNode;
use crossterm::{
    cursor,
    event::{Event, EventStream, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout, Write};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{MissedTickBehavior, interval};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Forwards trace bytes of one panel session to the event loop.
pub struct ChannelWriter {
    session: u64,
    tx: mpsc::UnboundedSender<ViewerEvent>,
}

impl ChannelWriter {
    pub fn new(session: u64, tx: mpsc::UnboundedSender<ViewerEvent>) -> Self {
        Self { session, tx }
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tx
            .send(ViewerEvent::LogChunk {
                session: self.session,
                bytes: buf.to_vec(),
            })
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "log panel closed"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Carry out a confirmed cancel or play/retry and update the selection.
///
/// Returns the follow-up action of the updated selection, or `None` when
/// no request was made.
pub async fn run_job_action<C: JobControl + ?Sized>(
    control: &C,
    app: &mut App,
    action: Action,
) -> Result<Option<Action>, ViewerError> {
    let project = app.current_pipeline().project.clone();
    let updated = match action {
        Action::Cancel(job) => Some(control.cancel_job(&project, job.id).await),
        Action::PlayOrRetry(job) => play_or_retry(control, &project, job.id, job.status)
            .await
            .transpose(),
        _ => None,
    };
    match updated {
        Some(updated) => {
            let updated = updated.map_err(ViewerError::JobControl)?;
            tracing::info!("Job {} is now {}", updated.name, updated.status);
            Ok(Some(app.replace_selection(JobNode::from(&updated))))
        }
        None => Ok(None),
    }
}

/// Point the poller at what `app` shows.
///
/// Receivers are only woken when the target changed, or always with
/// `refresh`.
pub fn sync_target(target: &watch::Sender<PollTarget>, app: &App, refresh: bool) {
    let next = PollTarget {
        pipeline: app.current_pipeline().clone(),
        paused: app.is_paused(),
    };
    target.send_if_modified(|current| {
        let changed = *current != next;
        *current = next;
        changed || refresh
    });
}

/// What the loop does after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    /// Refetch the displayed pipeline now
    Refresh,
    Quit,
}

pub struct Viewer<C: ?Sized> {
    client: Arc<C>,
    config: ViewerConfig,
    /// Stops the running panel log stream
    log_cancel: Option<watch::Sender<bool>>,
    log_tx: mpsc::UnboundedSender<ViewerEvent>,
    log_rx: mpsc::UnboundedReceiver<ViewerEvent>,
}

impl<C> Viewer<C>
where
    C: PipelineSource + JobControl + ?Sized + 'static,
{
    pub fn new(client: Arc<C>, config: ViewerConfig) -> Self {
        let (log_tx, log_rx) = mpsc::unbounded_channel();
        Self {
            client,
            config,
            log_cancel: None,
            log_tx,
            log_rx,
        }
    }

    /// Run until the user quits or a fatal error occurs.
    pub async fn run(
        &mut self,
        terminal: &mut Tui,
        app: &mut App,
        mut polls: mpsc::Receiver<PollEvent>,
        target: watch::Sender<PollTarget>,
    ) -> Result<(), ViewerError> {
        // Nothing to draw before the first job set arrives
        let Some(first) = polls.recv().await else {
            return Ok(());
        };
        app.handle_event(first.into())?;

        let mut keys = EventStream::new();
        let mut ticker = interval(self.config.tick_rate);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let result = loop {
            if let Err(err) = terminal.draw(|frame| app.render(frame)) {
                break Err(err.into());
            }
            if let Some(err) = app.take_link_error() {
                break Err(err.into());
            }

            let event = tokio::select! {
                Some(poll) = polls.recv() => ViewerEvent::from(poll),
                Some(chunk) = self.log_rx.recv() => chunk,
                key = keys.next() => match key {
                    Some(Ok(Event::Key(key))) => ViewerEvent::KeyPressed(key),
                    // Resize and friends only need a redraw
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => break Err(err.into()),
                    None => break Ok(()),
                },
                _ = ticker.tick() => ViewerEvent::TickElapsed,
            };

            let action = match app.handle_event(event) {
                Ok(action) => action,
                Err(err) => break Err(err),
            };
            match self.execute(action, terminal, app, &mut keys).await {
                Ok(Flow::Quit) => break Ok(()),
                Ok(flow) => sync_target(&target, app, flow == Flow::Refresh),
                Err(err) => break Err(err),
            }
        };

        self.close_log();
        result
    }

    async fn execute(
        &mut self,
        action: Action,
        terminal: &mut Tui,
        app: &mut App,
        keys: &mut EventStream,
    ) -> Result<Flow, ViewerError> {
        match action {
            Action::None => {}
            Action::Quit => return Ok(Flow::Quit),
            Action::Cancel(_) | Action::PlayOrRetry(_) => {
                if let Some(follow_up) = run_job_action(self.client.as_ref(), app, action).await? {
                    if let Action::OpenLog(target) = follow_up {
                        self.open_log(target);
                    }
                    return Ok(Flow::Refresh);
                }
            }
            Action::OpenLog(target) => self.open_log(target),
            Action::CloseLog => self.close_log(),
            Action::SuspendAndTail(target) => {
                self.suspend_and_tail(terminal, keys, target).await?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Start streaming `target` into the log panel, replacing any running session.
    fn open_log(&mut self, target: LogTarget) {
        self.close_log();

        let (cancel, cancel_rx) = watch::channel(false);
        let client = Arc::clone(&self.client);
        let tx = self.log_tx.clone();
        let every = self.config.log_interval;

        tokio::spawn(async move {
            let session = target.session;
            let mut out = ChannelWriter::new(session, tx.clone());
            if let Err(error) =
                stream_log(client.as_ref(), &target.trace, &mut out, cancel_rx, every).await
            {
                tracing::warn!("Log session {} ended: {}", session, error);
                let _ = tx.send(ViewerEvent::LogFailed { session, error });
            }
        });
        self.log_cancel = Some(cancel);
    }

    fn close_log(&mut self) {
        if let Some(cancel) = self.log_cancel.take() {
            // The stream stops at its next tick
            let _ = cancel.send(true);
        }
    }

    /// Leave the TUI and tail the job log in the shell until Enter.
    async fn suspend_and_tail(
        &mut self,
        terminal: &mut Tui,
        keys: &mut EventStream,
        target: LogTarget,
    ) -> Result<(), ViewerError> {
        disable_raw_mode()?;
        execute!(io::stdout(), LeaveAlternateScreen, cursor::Show)?;

        let result = self.tail(keys, &target).await;

        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)?;
        terminal.clear()?;
        result
    }

    async fn tail(&self, keys: &mut EventStream, target: &LogTarget) -> Result<(), ViewerError> {
        let (cancel, cancel_rx) = watch::channel(false);
        let mut out = io::stdout();
        let stream = stream_log(
            self.client.as_ref(),
            &target.trace,
            &mut out,
            cancel_rx,
            self.config.log_interval,
        );
        tokio::pin!(stream);

        let mut finished = false;
        loop {
            tokio::select! {
                done = &mut stream, if !finished => {
                    done.map_err(ViewerError::LogStream)?;
                    finished = true;
                    println!("\nPress Enter to return to the pipeline view.");
                }
                key = keys.next() => match key {
                    Some(Ok(Event::Key(key)))
                        if key.code == KeyCode::Enter && key.kind != KeyEventKind::Release =>
                    {
                        let _ = cancel.send(true);
                        return Ok(());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return Err(err.into()),
                    None => return Ok(()),
                },
            }
        }
    }
}

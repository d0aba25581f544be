//! Events consumed by the viewer loop.

use crate::error::ViewerError;
use ciview_gitlab::GitLabError;
use ciview_state::{JobNode, PipelineRef};
use crossterm::event::KeyEvent;

/// Everything that can wake the viewer loop.
#[derive(Debug)]
pub enum ViewerEvent {
    /// A fresh, deduplicated job set for `pipeline`
    JobsUpdated {
        pipeline: PipelineRef,
        jobs: Vec<JobNode>,
    },
    KeyPressed(KeyEvent),
    /// Periodic redraw so running durations advance
    TickElapsed,
    /// Trace bytes for the log panel session `session`
    LogChunk { session: u64, bytes: Vec<u8> },
    /// The log panel session `session` stopped with an error
    LogFailed { session: u64, error: GitLabError },
    PollFailed(ViewerError),
}

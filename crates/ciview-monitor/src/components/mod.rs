//! TUI components.

pub mod footer;
pub mod header;
pub mod help;
pub mod job_box;
pub mod log_viewer;
pub mod modal;

pub use footer::{Footer, FooterMode};
pub use header::Header;
pub use help::HelpOverlay;
pub use job_box::{JobBox, StageHeader};
pub use log_viewer::{LogLine, LogPanel, LogTarget, LogViewer};
pub use modal::{ConfirmKind, ConfirmModal, ModalOutcome};

//! Terminal viewer for a pipeline's job graph.
//!
//! Lays jobs out as stage-grouped boxes, draws the connectors between them
//! and turns key presses into job actions for the event loop to run.

pub mod app;
pub mod components;
pub mod error;
pub mod event;
pub mod layout;
pub mod links;
pub mod navigator;
pub mod ui;

pub use app::{Action, App, ViewerState};
pub use components::{LogPanel, LogTarget};
pub use error::ViewerError;
pub use event::ViewerEvent;
pub use layout::{BoxKey, GraphLayout, layout_graph};
pub use links::{Canvas, Clipped, LinkError, link_jobs};
pub use navigator::Navigator;

//! Normalized pipeline state for ciview.
//!
//! Unifies GitLab jobs and bridges into one node type and provides the
//! list operations the viewer is built on.

pub mod dedup;
pub mod format;
pub mod stack;
pub mod stages;
pub mod types;

pub use ciview_gitlab::{JobStatus, ProjectId};
pub use dedup::latest_jobs;
pub use format::{format_duration, time_ago};
pub use stack::PipelineStack;
pub use stages::{adjacent_stages, stage_bounds, stage_names};
pub use types::{
    JobKind, JobNode, JobTiming, PipelineRef, PipelineSummary, ToJobNode, merge_nodes,
};

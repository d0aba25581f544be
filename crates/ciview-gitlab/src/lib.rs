//! GitLab integration for ciview.
//!
//! Fetch pipeline jobs and bridges, control jobs, and stream job traces
//! over the GitLab REST v4 API.

pub mod client;
pub mod source;
pub mod trace;
pub mod types;

pub use client::{GitLabClient, GitLabError};
pub use source::{JobControl, PipelineSource, pick_trace_job, play_or_retry};
pub use trace::{TraceTarget, stream_log};
pub use types::{
    Bridge, Commit, DownstreamPipeline, Job, JobStatus, Pipeline, PipelineInfo, ProjectId, User,
};

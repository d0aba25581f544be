//! Errors that end a viewer session.

use crate::links::LinkError;
use ciview_gitlab::GitLabError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("failed to find CI jobs: {0}")]
    Fetch(#[source] GitLabError),
    #[error(
        "No jobs found in the pipeline. Your '.gitlab-ci.yml' file might be invalid, \
         or the pipeline triggered no jobs."
    )]
    NoJobs,
    #[error("job action failed: {0}")]
    JobControl(#[source] GitLabError),
    #[error("failed to stream job log: {0}")]
    LogStream(#[source] GitLabError),
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

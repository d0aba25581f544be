//! Incremental job trace streaming.

use crate::client::GitLabError;
use crate::source::PipelineSource;
use crate::types::{JobStatus, ProjectId};
use std::io::Write;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};

/// Identifies the job whose trace is streamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceTarget {
    pub project: ProjectId,
    pub sha: String,
    pub job_name: String,
}

/// Stream the trace of `target` into `out` until the job finishes or
/// `cancel` flips to `true` (or its sender goes away).
///
/// Each tick refetches the whole trace and writes only the bytes past the
/// running offset.
pub async fn stream_log<S, W>(
    source: &S,
    target: &TraceTarget,
    out: &mut W,
    mut cancel: watch::Receiver<bool>,
    every: Duration,
) -> Result<(), GitLabError>
where
    S: PipelineSource + ?Sized,
    W: Write + Send,
{
    writeln!(out, "Getting job trace...")?;
    out.flush()?;

    let job = source
        .job_by_sha(&target.project, &target.sha, &target.job_name)
        .await?
        .ok_or_else(|| GitLabError::JobNotFound(target.job_name.clone()))?;

    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut offset = 0usize;
    let mut announced = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel.wait_for(|stop| *stop) => return Ok(()),
        }

        let current = source.job(&target.project, job.id).await?;
        match current.status {
            JobStatus::Pending => {
                writeln!(out, "{} is pending... waiting for job to start.", current.name)?;
                out.flush()?;
                continue;
            }
            JobStatus::Manual => {
                writeln!(
                    out,
                    "Manual job {} not started, waiting for job to start.",
                    current.name
                )?;
                out.flush()?;
                continue;
            }
            JobStatus::Skipped => {
                writeln!(out, "{} has been skipped.", current.name)?;
            }
            _ => {}
        }

        if !announced {
            writeln!(out, "Showing logs for {} job #{}.", current.name, current.id)?;
            announced = true;
        }

        let trace = source.job_trace(&target.project, job.id).await?;
        if let Some(fresh) = trace.get(offset..) {
            out.write_all(fresh)?;
            offset = trace.len();
        }
        out.flush()?;

        if current.status.is_finished() {
            tracing::debug!("Trace for job {} complete ({} bytes)", current.id, offset);
            return Ok(());
        }
    }
}

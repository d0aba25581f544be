//! Data-source and job-control seams used by the viewer.

use crate::client::{GitLabClient, GitLabError};
use crate::types::{Bridge, Job, JobStatus, ProjectId};
use async_trait::async_trait;

/// Read access to pipelines, jobs and traces.
#[async_trait]
pub trait PipelineSource: Send + Sync {
    /// Jobs and bridges of a pipeline, each in creation order.
    async fn pipeline_jobs(
        &self,
        project: &ProjectId,
        pipeline_id: u64,
    ) -> Result<(Vec<Job>, Vec<Bridge>), GitLabError>;

    /// A single job by id.
    async fn job(&self, project: &ProjectId, job_id: u64) -> Result<Job, GitLabError>;

    /// The job called `name` in the latest pipeline for `sha`.
    async fn job_by_sha(
        &self,
        project: &ProjectId,
        sha: &str,
        name: &str,
    ) -> Result<Option<Job>, GitLabError>;

    /// Full raw trace of a job.
    async fn job_trace(&self, project: &ProjectId, job_id: u64) -> Result<Vec<u8>, GitLabError>;
}

/// Mutating job actions.
#[async_trait]
pub trait JobControl: Send + Sync {
    async fn cancel_job(&self, project: &ProjectId, job_id: u64) -> Result<Job, GitLabError>;

    async fn play_job(&self, project: &ProjectId, job_id: u64) -> Result<Job, GitLabError>;

    async fn retry_job(&self, project: &ProjectId, job_id: u64) -> Result<Job, GitLabError>;
}

/// Play a manual job or retry any other one.
///
/// Pending and running jobs are left alone and yield `None`.
pub async fn play_or_retry<C: JobControl + ?Sized>(
    control: &C,
    project: &ProjectId,
    job_id: u64,
    status: JobStatus,
) -> Result<Option<Job>, GitLabError> {
    match status {
        JobStatus::Pending | JobStatus::Running => Ok(None),
        JobStatus::Manual => control.play_job(project, job_id).await.map(Some),
        _ => control.retry_job(project, job_id).await.map(Some),
    }
}

/// Pick the job whose trace should be shown for `name`.
///
/// Prefers the newest job with that name, then the last running job, then
/// the first pending one, and finally the last job of the list.
pub fn pick_trace_job<'a>(jobs: &'a [Job], name: &str) -> Option<&'a Job> {
    let mut named = None;
    let mut last_running = None;
    let mut first_pending = None;

    for job in jobs {
        if job.status == JobStatus::Running {
            last_running = Some(job);
        }
        if job.status == JobStatus::Pending && first_pending.is_none() {
            first_pending = Some(job);
        }
        if job.name == name {
            // Keep going: a retried job appears again later in the list
            named = Some(job);
        }
    }

    named.or(last_running).or(first_pending).or(jobs.last())
}

#[async_trait]
impl PipelineSource for GitLabClient {
    async fn pipeline_jobs(
        &self,
        project: &ProjectId,
        pipeline_id: u64,
    ) -> Result<(Vec<Job>, Vec<Bridge>), GitLabError> {
        let jobs = self.list_pipeline_jobs(project, pipeline_id).await?;
        let bridges = self.list_pipeline_bridges(project, pipeline_id).await?;
        Ok((jobs, bridges))
    }

    async fn job(&self, project: &ProjectId, job_id: u64) -> Result<Job, GitLabError> {
        let url = self.project_url(project, &["jobs", &job_id.to_string()])?;
        self.get_json(url).await
    }

    async fn job_by_sha(
        &self,
        project: &ProjectId,
        sha: &str,
        name: &str,
    ) -> Result<Option<Job>, GitLabError> {
        let pipelines = self.pipelines_for_sha(project, sha).await?;
        let Some(latest) = pipelines.first() else {
            return Ok(None);
        };
        let jobs = self.list_pipeline_jobs(project, latest.id).await?;
        Ok(pick_trace_job(&jobs, name).cloned())
    }

    async fn job_trace(&self, project: &ProjectId, job_id: u64) -> Result<Vec<u8>, GitLabError> {
        let url = self.project_url(project, &["jobs", &job_id.to_string(), "trace"])?;
        self.get_bytes(url).await
    }
}

#[async_trait]
impl JobControl for GitLabClient {
    async fn cancel_job(&self, project: &ProjectId, job_id: u64) -> Result<Job, GitLabError> {
        let url = self.project_url(project, &["jobs", &job_id.to_string(), "cancel"])?;
        tracing::info!("Cancelling job {} in {}", job_id, project);
        self.post_json(url).await
    }

    async fn play_job(&self, project: &ProjectId, job_id: u64) -> Result<Job, GitLabError> {
        let url = self.project_url(project, &["jobs", &job_id.to_string(), "play"])?;
        tracing::info!("Playing job {} in {}", job_id, project);
        self.post_json(url).await
    }

    async fn retry_job(&self, project: &ProjectId, job_id: u64) -> Result<Job, GitLabError> {
        let url = self.project_url(project, &["jobs", &job_id.to_string(), "retry"])?;
        tracing::info!("Retrying job {} in {}", job_id, project);
        self.post_json(url).await
    }
}

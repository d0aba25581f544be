//! GitLab REST payload types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// GitLab job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for a runner
    #[serde(alias = "preparing", alias = "waiting_for_resource")]
    Pending,
    /// Currently running
    Running,
    /// Finished successfully
    Success,
    /// Finished with an error
    Failed,
    /// Cancelled by a user
    #[serde(alias = "canceling")]
    Canceled,
    /// Skipped because an earlier stage failed
    Skipped,
    /// Waiting for a manual trigger
    #[serde(alias = "scheduled")]
    Manual,
    /// Created but not yet processed, or any state ciview doesn't track
    #[serde(other)]
    Created,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Skipped => "skipped",
            Self::Manual => "manual",
        }
    }

    /// Whether the job can no longer change state on its own.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Canceled)
    }

    /// Whether the job can be cancelled.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project identifier: numeric id or `group/name` path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProjectId {
    Id(u64),
    Path(String),
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::Path(path) => f.write_str(path),
        }
    }
}

impl From<u64> for ProjectId {
    fn from(id: u64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        match s.parse::<u64>() {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Path(s.to_string()),
        }
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

/// User that triggered a pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
}

/// Pipeline a job belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineInfo {
    pub id: u64,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub sha: String,
    #[serde(default, rename = "ref")]
    pub ref_name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub web_url: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Full pipeline record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: u64,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub sha: String,
    #[serde(default, rename = "ref")]
    pub ref_name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub web_url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub user: Option<User>,
}

/// Commit with its most recent pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    #[serde(default)]
    pub short_id: String,
    #[serde(default)]
    pub title: String,
    pub last_pipeline: Option<PipelineInfo>,
}

/// Ordinary CI job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: u64,
    pub name: String,
    pub stage: String,
    pub status: JobStatus,
    #[serde(default)]
    pub allow_failure: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub erased_at: Option<DateTime<Utc>>,
    pub duration: Option<f64>,
    #[serde(default)]
    pub web_url: String,
    pub pipeline: Option<PipelineInfo>,
}

/// Downstream pipeline created by a bridge job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownstreamPipeline {
    pub id: u64,
    pub project_id: u64,
    #[serde(default)]
    pub sha: String,
    #[serde(default, rename = "ref")]
    pub ref_name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub web_url: String,
}

/// Bridge (trigger) job that starts a downstream pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bridge {
    pub id: u64,
    pub name: String,
    pub stage: String,
    pub status: JobStatus,
    #[serde(default)]
    pub allow_failure: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub erased_at: Option<DateTime<Utc>>,
    pub duration: Option<f64>,
    pub downstream_pipeline: Option<DownstreamPipeline>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_aliases() {
        let parse = |s: &str| serde_json::from_str::<JobStatus>(&format!("\"{}\"", s)).unwrap();
        assert_eq!(parse("running"), JobStatus::Running);
        assert_eq!(parse("preparing"), JobStatus::Pending);
        assert_eq!(parse("waiting_for_resource"), JobStatus::Pending);
        assert_eq!(parse("scheduled"), JobStatus::Manual);
        assert_eq!(parse("canceling"), JobStatus::Canceled);
        assert_eq!(parse("something_new"), JobStatus::Created);
    }

    #[test]
    fn test_job_status_created_decodes() {
        let status: JobStatus = serde_json::from_str("\"created\"").unwrap();
        assert_eq!(status, JobStatus::Created);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"created\"");
        assert!(!status.is_active());
    }

    #[test]
    fn test_project_id_from_str() {
        assert_eq!(ProjectId::from("42"), ProjectId::Id(42));
        assert_eq!(
            ProjectId::from("group/app"),
            ProjectId::Path("group/app".to_string())
        );
        assert_eq!(ProjectId::from("group/app").to_string(), "group/app");
    }

    #[test]
    fn test_bridge_without_downstream() {
        let json = r#"{
            "id": 9, "name": "trigger", "stage": "deploy", "status": "created",
            "created_at": null, "started_at": null, "finished_at": null,
            "erased_at": null, "duration": null, "downstream_pipeline": null
        }"#;
        let bridge: Bridge = serde_json::from_str(json).unwrap();
        assert!(bridge.downstream_pipeline.is_none());
        assert!(!bridge.allow_failure);
    }
}

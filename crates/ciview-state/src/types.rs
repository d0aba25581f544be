//! Unified job and pipeline types.

use chrono::{DateTime, Duration, Utc};
use ciview_gitlab::{Bridge, DownstreamPipeline, Job, JobStatus, Pipeline, ProjectId};
use serde::{Deserialize, Serialize};

/// A pipeline the viewer can display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRef {
    pub project: ProjectId,
    pub id: u64,
    /// Commit the pipeline ran for, used to look up job traces
    pub sha: Option<String>,
}

impl PipelineRef {
    pub fn new(project: impl Into<ProjectId>, id: u64, sha: Option<String>) -> Self {
        Self {
            project: project.into(),
            id,
            sha,
        }
    }
}

impl From<&DownstreamPipeline> for PipelineRef {
    fn from(p: &DownstreamPipeline) -> Self {
        Self {
            project: ProjectId::Id(p.project_id),
            id: p.id,
            sha: Some(p.sha.clone()).filter(|s| !s.is_empty()),
        }
    }
}

/// What kind of node a job is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobKind {
    /// Ordinary build step
    Job,
    /// Trigger job; `downstream` is set once the child pipeline exists
    Bridge { downstream: Option<PipelineRef> },
}

/// Job timing information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTiming {
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub erased_at: Option<DateTime<Utc>>,
}

/// One job or bridge of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobNode {
    /// GitLab job id
    pub id: u64,

    /// Job name, unique within its stage
    pub name: String,

    /// Stage label
    pub stage: String,

    /// Current status
    pub status: JobStatus,

    /// Failure is tolerated by the pipeline
    pub allow_failure: bool,

    /// Timing information
    pub timing: JobTiming,

    /// Job or bridge
    pub kind: JobKind,
}

impl JobNode {
    /// Identity within a pipeline: `(stage, name)`.
    pub fn key(&self) -> (&str, &str) {
        (&self.stage, &self.name)
    }

    pub fn is_bridge(&self) -> bool {
        matches!(self.kind, JobKind::Bridge { .. })
    }

    /// Downstream pipeline of a bridge, if it has been created.
    pub fn downstream(&self) -> Option<&PipelineRef> {
        match &self.kind {
            JobKind::Bridge { downstream } => downstream.as_ref(),
            JobKind::Job => None,
        }
    }

    /// Time spent running, measured up to `now` while unfinished.
    pub fn duration(&self, now: DateTime<Utc>) -> Option<Duration> {
        let started = self.timing.started_at?;
        let end = self.timing.finished_at.unwrap_or(now);
        Some(end - started)
    }
}

/// Trait for converting GitLab payloads into [`JobNode`]s.
pub trait ToJobNode {
    fn to_job_node(&self) -> JobNode;
}

impl ToJobNode for Job {
    fn to_job_node(&self) -> JobNode {
        JobNode {
            id: self.id,
            name: self.name.clone(),
            stage: self.stage.clone(),
            status: self.status,
            allow_failure: self.allow_failure,
            timing: JobTiming {
                started_at: self.started_at,
                finished_at: self.finished_at,
                erased_at: self.erased_at,
            },
            kind: JobKind::Job,
        }
    }
}

impl ToJobNode for Bridge {
    fn to_job_node(&self) -> JobNode {
        JobNode {
            id: self.id,
            name: self.name.clone(),
            stage: self.stage.clone(),
            status: self.status,
            allow_failure: self.allow_failure,
            timing: JobTiming {
                started_at: self.started_at,
                finished_at: self.finished_at,
                erased_at: self.erased_at,
            },
            kind: JobKind::Bridge {
                downstream: self.downstream_pipeline.as_ref().map(PipelineRef::from),
            },
        }
    }
}

impl From<&Job> for JobNode {
    fn from(job: &Job) -> Self {
        job.to_job_node()
    }
}

impl From<&Bridge> for JobNode {
    fn from(bridge: &Bridge) -> Self {
        bridge.to_job_node()
    }
}

/// Merge jobs and bridges into one node list: jobs first, then bridges.
pub fn merge_nodes(jobs: &[Job], bridges: &[Bridge]) -> Vec<JobNode> {
    let mut nodes = Vec::with_capacity(jobs.len() + bridges.len());
    nodes.extend(jobs.iter().map(JobNode::from));
    nodes.extend(bridges.iter().map(JobNode::from));
    nodes
}

/// Header information about the root pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub id: u64,
    pub web_url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub user_name: Option<String>,
}

impl From<&Pipeline> for PipelineSummary {
    fn from(p: &Pipeline) -> Self {
        Self {
            id: p.id,
            web_url: p.web_url.clone(),
            created_at: p.created_at,
            user_name: p.user.as_ref().map(|u| u.name.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bridge_json(downstream: &str) -> String {
        format!(
            r#"{{"id":5,"name":"child","stage":"deploy","status":"running",
                "created_at":null,"started_at":"2024-01-15T10:00:00Z",
                "finished_at":null,"erased_at":null,"duration":null,
                "downstream_pipeline":{downstream}}}"#
        )
    }

    #[test]
    fn test_bridge_to_node() {
        let bridge: Bridge = serde_json::from_str(&bridge_json(
            r#"{"id":55,"project_id":3,"sha":"abc","ref":"main","status":"running","web_url":""}"#,
        ))
        .unwrap();
        let node = JobNode::from(&bridge);

        assert!(node.is_bridge());
        assert_eq!(node.key(), ("deploy", "child"));
        assert_eq!(
            node.downstream(),
            Some(&PipelineRef::new(3u64, 55, Some("abc".to_string())))
        );
    }

    #[test]
    fn test_bridge_not_yet_triggered() {
        let bridge: Bridge = serde_json::from_str(&bridge_json("null")).unwrap();
        let node = bridge.to_job_node();
        assert!(node.is_bridge());
        assert!(node.downstream().is_none());
    }

    #[test]
    fn test_duration() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let mut node = JobNode {
            id: 1,
            name: "build".to_string(),
            stage: "build".to_string(),
            status: JobStatus::Running,
            allow_failure: false,
            timing: JobTiming::default(),
            kind: JobKind::Job,
        };
        let now = start + Duration::seconds(90);
        assert_eq!(node.duration(now), None);

        node.timing.started_at = Some(start);
        assert_eq!(node.duration(now), Some(Duration::seconds(90)));

        node.timing.finished_at = Some(start + Duration::seconds(30));
        assert_eq!(node.duration(now), Some(Duration::seconds(30)));
    }
}

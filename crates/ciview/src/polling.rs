//! Background job polling for the displayed pipeline.

use ciview_gitlab::PipelineSource;
use ciview_monitor::{ViewerError, ViewerEvent};
use ciview_state::{JobNode, PipelineRef, latest_jobs, merge_nodes};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;

/// What the poller should fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTarget {
    pub pipeline: PipelineRef,
    /// Set while a confirmation is open
    pub paused: bool,
}

/// Output of one poll.
#[derive(Debug)]
pub enum PollEvent {
    Jobs {
        pipeline: PipelineRef,
        jobs: Vec<JobNode>,
    },
    /// Fetching failed; the poller has stopped.
    Failed(ViewerError),
}

impl From<PollEvent> for ViewerEvent {
    fn from(event: PollEvent) -> Self {
        match event {
            PollEvent::Jobs { pipeline, jobs } => ViewerEvent::JobsUpdated { pipeline, jobs },
            PollEvent::Failed(err) => ViewerEvent::PollFailed(err),
        }
    }
}

/// Configuration for the polling service.
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Interval between fetches of the displayed pipeline.
    pub interval: Duration,
    /// How often a paused poller looks at its target again.
    pub paused_retry: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            paused_retry: Duration::from_secs(1),
        }
    }
}

/// Fetch jobs and bridges of `pipeline` as one deduplicated list.
pub async fn fetch_jobs<S: PipelineSource + ?Sized>(
    source: &S,
    pipeline: &PipelineRef,
) -> Result<Vec<JobNode>, ViewerError> {
    let (jobs, bridges) = source
        .pipeline_jobs(&pipeline.project, pipeline.id)
        .await
        .map_err(ViewerError::Fetch)?;
    if jobs.is_empty() && bridges.is_empty() {
        return Err(ViewerError::NoJobs);
    }
    Ok(latest_jobs(&merge_nodes(&jobs, &bridges)))
}

/// Polling service that runs in the background.
///
/// A change of the watched target doubles as a force-refresh signal.
pub struct Poller<S: ?Sized> {
    source: Arc<S>,
    target: watch::Receiver<PollTarget>,
    events: mpsc::Sender<PollEvent>,
    config: PollingConfig,
}

impl<S: PipelineSource + ?Sized + 'static> Poller<S> {
    pub fn new(
        source: Arc<S>,
        target: watch::Receiver<PollTarget>,
        events: mpsc::Sender<PollEvent>,
        config: PollingConfig,
    ) -> Self {
        Self {
            source,
            target,
            events,
            config,
        }
    }

    /// Start the polling service in the background.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Main polling loop; ends on the first fetch failure or once the
    /// viewer drops its channels.
    async fn run(mut self) {
        loop {
            let target = self.target.borrow_and_update().clone();
            if target.paused {
                if !self.wait(self.config.paused_retry).await {
                    return;
                }
                continue;
            }

            match fetch_jobs(self.source.as_ref(), &target.pipeline).await {
                Ok(jobs) => {
                    tracing::debug!(
                        "Fetched {} jobs of pipeline {}",
                        jobs.len(),
                        target.pipeline.id
                    );
                    let event = PollEvent::Jobs {
                        pipeline: target.pipeline,
                        jobs,
                    };
                    if self.events.send(event).await.is_err() {
                        return;
                    }
                }
                Err(err) => {
                    tracing::error!("Error polling pipeline {}: {}", target.pipeline.id, err);
                    let _ = self.events.send(PollEvent::Failed(err)).await;
                    return;
                }
            }

            if !self.wait(self.config.interval).await {
                return;
            }
        }
    }

    /// Sleep for `period` or until the target changes.
    ///
    /// Returns `false` once the target sender is gone.
    async fn wait(&mut self, period: Duration) -> bool {
        tokio::select! {
            changed = self.target.changed() => changed.is_ok(),
            _ = sleep(period) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ciview_gitlab::{Bridge, GitLabError, Job, JobStatus, ProjectId};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::time::timeout;

    fn job(id: u64, name: &str, stage: &str, status: JobStatus) -> Job {
        Job {
            id,
            name: name.to_string(),
            stage: stage.to_string(),
            status,
            allow_failure: false,
            created_at: None,
            started_at: None,
            finished_at: None,
            erased_at: None,
            duration: None,
            web_url: String::new(),
            pipeline: None,
        }
    }

    fn bridge(id: u64, name: &str, stage: &str) -> Bridge {
        Bridge {
            id,
            name: name.to_string(),
            stage: stage.to_string(),
            status: JobStatus::Created,
            allow_failure: false,
            created_at: None,
            started_at: None,
            finished_at: None,
            erased_at: None,
            duration: None,
            downstream_pipeline: None,
        }
    }

    /// Serves fixed job lists per pipeline id and counts fetches.
    #[derive(Default)]
    struct FakeSource {
        pipelines: HashMap<u64, (Vec<Job>, Vec<Bridge>)>,
        fetches: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl PipelineSource for FakeSource {
        async fn pipeline_jobs(
            &self,
            _: &ProjectId,
            pipeline_id: u64,
        ) -> Result<(Vec<Job>, Vec<Bridge>), GitLabError> {
            self.fetches.lock().unwrap().push(pipeline_id);
            self.pipelines.get(&pipeline_id).cloned().ok_or(GitLabError::Api {
                status: 404,
                message: "404 Not found".to_string(),
            })
        }

        async fn job(&self, _: &ProjectId, _: u64) -> Result<Job, GitLabError> {
            Err(GitLabError::JobNotFound("job".to_string()))
        }

        async fn job_by_sha(
            &self,
            _: &ProjectId,
            _: &str,
            _: &str,
        ) -> Result<Option<Job>, GitLabError> {
            Ok(None)
        }

        async fn job_trace(&self, _: &ProjectId, _: u64) -> Result<Vec<u8>, GitLabError> {
            Ok(Vec::new())
        }
    }

    fn source() -> Arc<FakeSource> {
        let mut pipelines = HashMap::new();
        pipelines.insert(
            1,
            (
                vec![
                    job(1, "build", "build", JobStatus::Failed),
                    job(2, "test", "test", JobStatus::Success),
                    job(3, "build", "build", JobStatus::Running),
                ],
                vec![bridge(4, "child", "deploy")],
            ),
        );
        pipelines.insert(2, (vec![job(9, "unit", "test", JobStatus::Pending)], vec![]));
        pipelines.insert(3, (vec![], vec![]));
        Arc::new(FakeSource {
            pipelines,
            fetches: Mutex::new(Vec::new()),
        })
    }

    fn target(id: u64, paused: bool) -> PollTarget {
        PollTarget {
            pipeline: PipelineRef::new(1u64, id, None),
            paused,
        }
    }

    fn config() -> PollingConfig {
        PollingConfig {
            interval: Duration::from_secs(60),
            paused_retry: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_fetch_jobs_merges_and_deduplicates() {
        let jobs = fetch_jobs(source().as_ref(), &PipelineRef::new(1u64, 1, None))
            .await
            .unwrap();
        let ids: Vec<u64> = jobs.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[tokio::test]
    async fn test_fetch_jobs_single_and_empty() {
        let jobs = fetch_jobs(source().as_ref(), &PipelineRef::new(1u64, 2, None))
            .await
            .unwrap();
        assert_eq!(jobs.len(), 1);

        let err = fetch_jobs(source().as_ref(), &PipelineRef::new(1u64, 3, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ViewerError::NoJobs));
    }

    #[tokio::test]
    async fn test_poller_publishes_and_follows_target() {
        let source = source();
        let (target_tx, target_rx) = watch::channel(target(2, false));
        let (tx, mut rx) = mpsc::channel(4);
        let handle = Poller::new(source.clone(), target_rx, tx, config()).start();

        match rx.recv().await {
            Some(PollEvent::Jobs { pipeline, jobs }) => {
                assert_eq!(pipeline.id, 2);
                assert_eq!(jobs[0].name, "unit");
            }
            other => panic!("unexpected event {:?}", other),
        }

        // A new target is fetched right away instead of after the interval
        target_tx.send(target(1, false)).unwrap();
        let event = timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        match event {
            Some(PollEvent::Jobs { pipeline, jobs }) => {
                assert_eq!(pipeline.id, 1);
                assert_eq!(jobs.len(), 2);
            }
            other => panic!("unexpected event {:?}", other),
        }

        drop(target_tx);
        timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
        assert_eq!(*source.fetches.lock().unwrap(), vec![2, 1]);
    }

    #[tokio::test]
    async fn test_poller_waits_while_paused() {
        let source = source();
        let (target_tx, target_rx) = watch::channel(target(2, true));
        let (tx, mut rx) = mpsc::channel(4);
        let _handle = Poller::new(source.clone(), target_rx, tx, config()).start();

        assert!(timeout(Duration::from_millis(50), rx.recv()).await.is_err());
        assert!(source.fetches.lock().unwrap().is_empty());

        target_tx.send(target(2, false)).unwrap();
        let event = timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        assert!(matches!(event, Some(PollEvent::Jobs { .. })));
    }

    #[tokio::test]
    async fn test_poller_reports_failures_and_stops() {
        let (_target_tx, target_rx) = watch::channel(target(3, false));
        let (tx, mut rx) = mpsc::channel(4);
        let handle = Poller::new(source(), target_rx, tx, config()).start();

        assert!(matches!(
            rx.recv().await,
            Some(PollEvent::Failed(ViewerError::NoJobs))
        ));
        handle.await.unwrap();
        assert!(rx.recv().await.is_none());

        let (_target_tx, target_rx) = watch::channel(target(404, false));
        let (tx, mut rx) = mpsc::channel(4);
        Poller::new(source(), target_rx, tx, config()).start();
        assert!(matches!(
            rx.recv().await,
            Some(PollEvent::Failed(ViewerError::Fetch(GitLabError::Api { status: 404, .. })))
        ));
    }
}

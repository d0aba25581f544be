//! Collapse retried jobs into the latest unique set.

use crate::types::JobNode;
use std::collections::HashMap;

/// Keep the latest node for every `(stage, name)`, preserving order.
///
/// A retried job reappears later in the upstream list with the same key. The
/// first position where a key repeats marks the cutoff: everything from there
/// on is dropped, and each surviving position is replaced by the newest node
/// seen for its key.
pub fn latest_jobs(jobs: &[JobNode]) -> Vec<JobNode> {
    let mut latest: HashMap<(&str, &str), &JobNode> = HashMap::with_capacity(jobs.len());
    let mut cutoff = None;

    for (idx, job) in jobs.iter().enumerate() {
        if latest.insert(job.key(), job).is_some() && cutoff.is_none() {
            cutoff = Some(idx);
        }
    }

    let cutoff = cutoff.unwrap_or(jobs.len());
    if cutoff < jobs.len() {
        tracing::trace!("Collapsing {} retried job entries", jobs.len() - cutoff);
    }

    jobs[..cutoff]
        .iter()
        .map(|job| latest.get(&job.key()).copied().unwrap_or(job).clone())
        .collect()
}

//! Stage lookups over a job list grouped contiguously by stage.

use crate::types::JobNode;

/// Distinct stage labels in order of first appearance.
pub fn stage_names(jobs: &[JobNode]) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for job in jobs {
        if !names.contains(&job.stage.as_str()) {
            names.push(&job.stage);
        }
    }
    names
}

/// Inclusive index range occupied by `stage`.
///
/// Returns `(0, 0)` for lists with at most one job and for stages that do
/// not occur.
pub fn stage_bounds(jobs: &[JobNode], stage: &str) -> (usize, usize) {
    if jobs.len() <= 1 {
        return (0, 0);
    }
    let Some(lower) = jobs.iter().position(|j| j.stage == stage) else {
        return (0, 0);
    };
    let run = jobs[lower..].iter().take_while(|j| j.stage == stage).count();
    (lower, lower + run - 1)
}

/// Stages immediately before and after `stage`, clamped at both ends.
///
/// An unknown stage is its own neighbour on both sides.
pub fn adjacent_stages<'a>(jobs: &'a [JobNode], stage: &'a str) -> (&'a str, &'a str) {
    let names = stage_names(jobs);
    let Some(pos) = names.iter().position(|s| *s == stage) else {
        return (stage, stage);
    };
    let prev = names[pos.saturating_sub(1)];
    let next = names[(pos + 1).min(names.len() - 1)];
    (prev, next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JobKind, JobTiming};
    use ciview_gitlab::JobStatus;

    fn node(name: &str, stage: &str) -> JobNode {
        JobNode {
            id: 0,
            name: name.to_string(),
            stage: stage.to_string(),
            status: JobStatus::Created,
            allow_failure: false,
            timing: JobTiming::default(),
            kind: JobKind::Job,
        }
    }

    fn sample() -> Vec<JobNode> {
        vec![node("A", "build"), node("B", "build"), node("C", "test")]
    }

    #[test]
    fn test_stage_bounds() {
        let jobs = sample();
        assert_eq!(stage_bounds(&jobs, "build"), (0, 1));
        assert_eq!(stage_bounds(&jobs, "test"), (2, 2));
        assert_eq!(stage_bounds(&jobs, "deploy"), (0, 0));
    }

    #[test]
    fn test_stage_bounds_single_job_first_stage() {
        let jobs = vec![node("A", "build"), node("B", "test"), node("C", "test")];
        assert_eq!(stage_bounds(&jobs, "build"), (0, 0));
        assert_eq!(stage_bounds(&jobs, "test"), (1, 2));
    }

    #[test]
    fn test_stage_bounds_tiny_lists() {
        assert_eq!(stage_bounds(&[], "build"), (0, 0));
        assert_eq!(stage_bounds(&[node("A", "build")], "build"), (0, 0));
    }

    #[test]
    fn test_adjacent_stages() {
        let jobs = sample();
        assert_eq!(adjacent_stages(&jobs, "build"), ("build", "test"));
        assert_eq!(adjacent_stages(&jobs, "test"), ("build", "test"));
    }

    #[test]
    fn test_adjacent_stages_middle() {
        let jobs = vec![node("A", "build"), node("B", "test"), node("C", "deploy")];
        assert_eq!(adjacent_stages(&jobs, "test"), ("build", "deploy"));
        assert_eq!(adjacent_stages(&jobs, "release"), ("release", "release"));
    }

    #[test]
    fn test_stage_names() {
        let jobs = vec![
            node("A", "build"),
            node("B", "build"),
            node("C", "test"),
            node("D", "deploy"),
        ];
        assert_eq!(stage_names(&jobs), vec!["build", "test", "deploy"]);
    }
}

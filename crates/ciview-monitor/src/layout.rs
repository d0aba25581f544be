//! Box geometry for stage headers and job boxes.
//!
//! Every stage gets an equal vertical slice of the drawing area. A header
//! box sits near the top of each slice and the stage's jobs are stacked
//! below it in list order, even when a stage reappears further down the
//! list.

use ciview_state::{JobNode, stage_names};
use ratatui::layout::Rect;

/// Width of every box, borders included.
pub const BOX_WIDTH: u16 = MAX_TITLE_WIDTH + 2;
/// Titles wider than this are left-aligned.
pub const MAX_TITLE_WIDTH: u16 = 20;
pub const HEADER_HEIGHT: u16 = 3;
pub const JOB_HEIGHT: u16 = 4;
/// Vertical distance between consecutive job boxes of a stage.
pub const ROW_SPACING: u16 = 5;

/// Identity of a drawn box.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BoxKey {
    Stage(String),
    Job { stage: String, name: String },
}

impl BoxKey {
    pub fn job(job: &JobNode) -> Self {
        Self::Job {
            stage: job.stage.clone(),
            name: job.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedStage {
    pub key: BoxKey,
    /// Title-cased stage label
    pub label: String,
    pub area: Rect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedJob {
    pub key: BoxKey,
    /// Position in the job list
    pub index: usize,
    pub area: Rect,
}

/// Result of one layout pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphLayout {
    pub stages: Vec<PlacedStage>,
    pub jobs: Vec<PlacedJob>,
}

impl GraphLayout {
    /// All boxes with their geometry.
    pub fn boxes(&self) -> impl Iterator<Item = (&BoxKey, Rect)> {
        self.stages
            .iter()
            .map(|s| (&s.key, s.area))
            .chain(self.jobs.iter().map(|j| (&j.key, j.area)))
    }
}

/// Place stage headers and job boxes for `jobs` inside `area`.
///
/// Geometry is not clipped to `area`; boxes of long stages may run past
/// its bottom edge.
pub fn layout_graph(jobs: &[JobNode], area: Rect) -> GraphLayout {
    let names = stage_names(jobs);
    if names.is_empty() {
        return GraphLayout::default();
    }

    let slice = area.width / names.len() as u16;
    let column_x = |stage_idx: usize| area.x.saturating_add(slice.saturating_mul(stage_idx as u16));
    let base_y = area.y.saturating_add(area.height / 6);

    let stages = names
        .iter()
        .enumerate()
        .map(|(idx, name)| PlacedStage {
            key: BoxKey::Stage(name.to_string()),
            label: title_case(name),
            area: Rect::new(
                column_x(idx),
                base_y.saturating_sub(4),
                BOX_WIDTH,
                HEADER_HEIGHT,
            ),
        })
        .collect();

    let mut placed = Vec::with_capacity(jobs.len());
    // Next free row per stage column; stages may reappear later in the list
    let mut rows = vec![0u16; names.len()];

    for (index, job) in jobs.iter().enumerate() {
        let stage_idx = names
            .iter()
            .position(|name| *name == job.stage)
            .unwrap_or_default();
        let row = rows[stage_idx];
        placed.push(PlacedJob {
            key: BoxKey::job(job),
            index,
            area: Rect::new(
                column_x(stage_idx),
                base_y.saturating_add(row.saturating_mul(ROW_SPACING)),
                BOX_WIDTH,
                JOB_HEIGHT,
            ),
        });
        rows[stage_idx] = row.saturating_add(1);
    }

    GraphLayout {
        stages,
        jobs: placed,
    }
}

/// Upper-case the first letter of every word, lower-case the rest.
pub fn title_case(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut word_start = true;
    for c in label.chars() {
        if c.is_alphanumeric() {
            if word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(c);
            word_start = c != '\'' && c != '_';
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ciview_state::{JobKind, JobStatus, JobTiming};

    fn node(name: &str, stage: &str) -> JobNode {
        JobNode {
            id: 0,
            name: name.to_string(),
            stage: stage.to_string(),
            status: JobStatus::Success,
            allow_failure: false,
            timing: JobTiming::default(),
            kind: JobKind::Job,
        }
    }

    #[test]
    fn test_layout_geometry() {
        let jobs = vec![
            node("compile", "build"),
            node("lint", "build"),
            node("unit", "test"),
            node("prod", "deploy"),
        ];
        let area = Rect::new(2, 1, 120, 60);
        let layout = layout_graph(&jobs, area);

        let headers: Vec<Rect> = layout.stages.iter().map(|s| s.area).collect();
        assert_eq!(
            headers,
            vec![
                Rect::new(2, 7, 22, 3),
                Rect::new(42, 7, 22, 3),
                Rect::new(82, 7, 22, 3),
            ]
        );

        let boxes: Vec<Rect> = layout.jobs.iter().map(|j| j.area).collect();
        assert_eq!(
            boxes,
            vec![
                Rect::new(2, 11, 22, 4),
                Rect::new(2, 16, 22, 4),
                Rect::new(42, 11, 22, 4),
                Rect::new(82, 11, 22, 4),
            ]
        );
        assert_eq!(layout.boxes().count(), 7);
    }

    #[test]
    fn test_layout_short_area_saturates() {
        let jobs = vec![node("compile", "build")];
        let layout = layout_graph(&jobs, Rect::new(0, 0, 40, 12));
        assert_eq!(layout.stages[0].area.y, 0);
        assert_eq!(layout.jobs[0].area.y, 2);
    }

    #[test]
    fn test_layout_keys() {
        let jobs = vec![node("run", "build"), node("run", "test")];
        let layout = layout_graph(&jobs, Rect::new(0, 0, 80, 24));
        assert_eq!(layout.stages[1].key, BoxKey::Stage("test".to_string()));
        assert_eq!(
            layout.jobs[1].key,
            BoxKey::Job {
                stage: "test".to_string(),
                name: "run".to_string()
            }
        );
        assert_eq!(layout.stages[1].label, "Test");
    }

    #[test]
    fn test_layout_late_bridge_joins_its_stage() {
        // Bridges are merged after jobs, so `deploy` shows up twice
        let mut trigger = node("trigger", "deploy");
        trigger.kind = JobKind::Bridge { downstream: None };
        let jobs = vec![node("deploy-job", "deploy"), node("smoke", "verify"), trigger];
        let area = Rect::new(0, 0, 80, 30);
        let layout = layout_graph(&jobs, area);

        assert_eq!(layout.stages.len(), 2);
        let boxes: Vec<Rect> = layout.jobs.iter().map(|j| j.area).collect();
        assert_eq!(
            boxes,
            vec![
                Rect::new(0, 5, 22, 4),
                Rect::new(40, 5, 22, 4),
                Rect::new(0, 10, 22, 4),
            ]
        );
        assert!(boxes.iter().all(|b| b.x < area.right()));
    }

    #[test]
    fn test_layout_empty() {
        assert_eq!(layout_graph(&[], Rect::new(0, 0, 80, 24)), GraphLayout::default());
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("build"), "Build");
        assert_eq!(title_case("post-deploy"), "Post-Deploy");
        assert_eq!(title_case("QA checks"), "Qa Checks");
        assert_eq!(title_case("unit_test"), "Unit_test");
    }
}

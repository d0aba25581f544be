//! Drill-down history of displayed pipelines.

use crate::types::PipelineRef;

/// Non-empty stack of pipelines; the root is the pipeline of the commit.
#[derive(Debug, Clone)]
pub struct PipelineStack {
    pipelines: Vec<PipelineRef>,
}

impl PipelineStack {
    pub fn new(root: PipelineRef) -> Self {
        Self {
            pipelines: vec![root],
        }
    }

    /// Enter a downstream pipeline.
    pub fn push(&mut self, pipeline: PipelineRef) {
        tracing::debug!("Entering pipeline {} of {}", pipeline.id, pipeline.project);
        self.pipelines.push(pipeline);
    }

    /// Return to the parent pipeline.
    ///
    /// The root is never removed: popping it yields `None` and leaves the
    /// stack unchanged.
    pub fn pop(&mut self) -> Option<PipelineRef> {
        if self.pipelines.len() <= 1 {
            return None;
        }
        self.pipelines.pop()
    }

    /// Pipeline currently displayed.
    pub fn current(&self) -> &PipelineRef {
        // Never empty: `new` seeds the root and `pop` keeps it.
        &self.pipelines[self.pipelines.len() - 1]
    }

    pub fn root(&self) -> &PipelineRef {
        &self.pipelines[0]
    }

    pub fn depth(&self) -> usize {
        self.pipelines.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PipelineRef> {
        self.pipelines.iter()
    }
}

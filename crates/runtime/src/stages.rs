//! Stage iteration.
//!
//! Given a set of pipelines, yields *stage slices*: all (stage, pipeline)
//! pairs sharing the current minimum stage number, in strictly ascending
//! stage-number order. Stage numbers need not be contiguous; a pipeline
//! with fewer stages simply stops contributing. Order within a slice is
//! unspecified and must not be relied upon.

use std::sync::Arc;

use sluice_ast::{Pipeline, Stage};

/// One (stage, pipeline) pair inside a slice.
#[derive(Debug, Clone)]
pub struct StageRef {
    pipeline: Arc<Pipeline>,
    stage_index: usize,
}

impl StageRef {
    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    pub fn stage(&self) -> &Stage {
        &self.pipeline.stages()[self.stage_index]
    }
}

/// Lazy iterator over stage slices for a pipeline set.
pub struct StageIterator {
    pipelines: Vec<Arc<Pipeline>>,
    cursors: Vec<usize>,
}

impl StageIterator {
    pub fn new(pipelines: Vec<Arc<Pipeline>>) -> Self {
        let cursors = vec![0; pipelines.len()];
        Self { pipelines, cursors }
    }
}

impl Iterator for StageIterator {
    type Item = Vec<StageRef>;

    fn next(&mut self) -> Option<Self::Item> {
        // next slice = minimum stage number among unexhausted pipelines
        let current = self
            .pipelines
            .iter()
            .zip(&self.cursors)
            .filter_map(|(p, &cursor)| p.stages().get(cursor).map(Stage::number))
            .min()?;

        let mut slice = Vec::new();
        for (idx, pipeline) in self.pipelines.iter().enumerate() {
            let cursor = self.cursors[idx];
            if let Some(stage) = pipeline.stages().get(cursor) {
                if stage.number() == current {
                    slice.push(StageRef {
                        pipeline: pipeline.clone(),
                        stage_index: cursor,
                    });
                    self.cursors[idx] += 1;
                }
            }
        }
        Some(slice)
    }
}

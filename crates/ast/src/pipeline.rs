//! Pipelines and stages.
//!
//! A pipeline is an ordered sequence of stages keyed by ascending stage
//! number. Stages reference rules by name; the link pass resolves those
//! references to shared [`Rule`] values before a program is published.
//! Traversal is read-only after linking; mutation happens on the concrete
//! structs during the build passes.

use std::sync::Arc;

use sluice_foundation::PipelineId;

use crate::error::AstError;
use crate::rule::Rule;

/// One stage of a pipeline: a set of rules evaluated together under a
/// match-quorum policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    stage: i32,
    match_all: bool,
    rule_refs: Vec<String>,
    rules: Vec<Arc<Rule>>,
}

impl Stage {
    pub fn new(stage: i32, match_all: bool, rule_refs: Vec<String>) -> Self {
        Self {
            stage,
            match_all,
            rule_refs,
            rules: Vec::new(),
        }
    }

    pub fn number(&self) -> i32 {
        self.stage
    }

    /// Whether every rule must match for the pipeline to proceed.
    pub fn match_all(&self) -> bool {
        self.match_all
    }

    pub fn rule_refs(&self) -> &[String] {
        &self.rule_refs
    }

    /// Resolved rules; empty until the link pass ran.
    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }

    /// Install the resolved rules for this stage (link pass only).
    pub fn set_rules(&mut self, rules: Vec<Arc<Rule>>) {
        self.rules = rules;
    }
}

/// A compiled pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    id: PipelineId,
    name: String,
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Build a pipeline, ordering stages by stage number. Duplicate stage
    /// numbers are an authoring error.
    pub fn new(
        id: impl Into<PipelineId>,
        name: impl Into<String>,
        mut stages: Vec<Stage>,
    ) -> Result<Self, AstError> {
        let name = name.into();
        stages.sort_by_key(|s| s.stage);
        for pair in stages.windows(2) {
            if pair[0].stage == pair[1].stage {
                return Err(AstError::DuplicateStage {
                    pipeline: name,
                    stage: pair[0].stage,
                });
            }
        }
        Ok(Self {
            id: id.into(),
            name,
            stages,
        })
    }

    /// Sentinel for pipelines that failed to parse: no stages, the reason
    /// becomes the name.
    pub fn empty(id: impl Into<PipelineId>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: reason.into(),
            stages: Vec::new(),
        }
    }

    pub fn id(&self) -> &PipelineId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stages in ascending stage-number order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stages_mut(&mut self) -> &mut [Stage] {
        &mut self.stages
    }
}

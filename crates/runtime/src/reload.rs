//! Program reload.
//!
//! Listens to cluster-wide rule, pipeline, and assignment changes and
//! rebuilds the program snapshot. Reloads are serialized on a dedicated
//! task and debounced: while one runs, at most one more is queued, and
//! further triggers collapse into it. Event payloads are logged but never
//! used to patch incrementally: a reload always rebuilds the world from
//! the source-of-truth stores.
//!
//! Parse and link failures degrade to sentinels (`Rule::always_false`,
//! `Pipeline::empty`) rather than aborting a reload; only an unreadable
//! source store keeps the previous snapshot in place.

use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use sluice_ast::{Pipeline, PipelineRuleParser, Rule};
use sluice_foundation::{PipelineId, StreamId};

use crate::program::{ProgramSnapshot, ProgramStore};
use crate::sources::{
    PipelineSourceService, RuleSourceService, SourceError, StreamAssignmentService,
};

/// Change notifications consumed from the cluster event bus.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    RulesChanged {
        updated: Vec<String>,
        deleted: Vec<String>,
    },
    PipelinesChanged {
        updated: Vec<PipelineId>,
        deleted: Vec<PipelineId>,
    },
    StreamAssignmentChanged {
        stream_id: StreamId,
        pipeline_ids: Vec<PipelineId>,
    },
}

impl ChangeEvent {
    fn log(&self) {
        match self {
            ChangeEvent::RulesChanged { updated, deleted } => {
                debug!(?updated, ?deleted, "rules changed");
            }
            ChangeEvent::PipelinesChanged { updated, deleted } => {
                debug!(?updated, ?deleted, "pipelines changed");
            }
            ChangeEvent::StreamAssignmentChanged {
                stream_id,
                pipeline_ids,
            } => {
                debug!(stream = %stream_id, ?pipeline_ids, "stream assignment changed");
            }
        }
    }
}

/// The program snapshot could not be rebuilt; the previous one stays
/// published.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReloadError {
    #[error("program rebuild failed: {0}")]
    Configuration(#[from] SourceError),
}

/// Rebuilds and publishes program snapshots.
pub struct ReloadController {
    rules: Arc<dyn RuleSourceService>,
    pipelines: Arc<dyn PipelineSourceService>,
    assignments: Arc<dyn StreamAssignmentService>,
    parser: Arc<dyn PipelineRuleParser>,
    store: Arc<ProgramStore>,
}

impl ReloadController {
    /// Create the controller and perform the initial load. A failing
    /// initial load leaves the empty program published and is logged.
    pub fn new(
        rules: Arc<dyn RuleSourceService>,
        pipelines: Arc<dyn PipelineSourceService>,
        assignments: Arc<dyn StreamAssignmentService>,
        parser: Arc<dyn PipelineRuleParser>,
        store: Arc<ProgramStore>,
    ) -> Self {
        let controller = Self {
            rules,
            pipelines,
            assignments,
            parser,
            store,
        };
        if let Err(error) = controller.reload() {
            error!(%error, "initial program load failed");
        }
        controller
    }

    /// Rebuild the snapshot from the source-of-truth stores and publish
    /// it atomically. Idempotent: unchanged inputs yield a
    /// content-equal snapshot.
    #[instrument(skip(self))]
    pub fn reload(&self) -> Result<(), ReloadError> {
        // read all rules and compile them
        let mut rules_by_name: IndexMap<String, Arc<Rule>> = IndexMap::new();
        for source in self.rules.load_all()? {
            let rule = match self.parser.parse_rule(&source.source) {
                Ok(rule) => rule,
                Err(error) => {
                    warn!(rule = %source.id, %error, "failed to parse rule");
                    Rule::always_false(format!("Failed to parse rule: {}", source.id))
                }
            };
            rules_by_name.insert(rule.name().to_string(), Arc::new(rule));
        }

        // read all pipelines, compile them, and resolve their rule
        // references
        let mut pipelines_by_id: IndexMap<PipelineId, Arc<Pipeline>> = IndexMap::new();
        for source in self.pipelines.load_all()? {
            let mut pipeline = match self.parser.parse_pipeline(&source.id, &source.source) {
                Ok(pipeline) => pipeline,
                Err(error) => {
                    warn!(pipeline = %source.id, %error, "failed to parse pipeline");
                    Pipeline::empty(
                        source.id.clone(),
                        format!("Failed to parse pipeline: {}", source.id),
                    )
                }
            };

            debug!(pipeline = %pipeline.name(), "resolving pipeline");
            for stage in pipeline.stages_mut() {
                let resolved: Vec<Arc<Rule>> = stage
                    .rule_refs()
                    .iter()
                    .map(|name| match rules_by_name.get(name) {
                        Some(rule) => rule.clone(),
                        None => {
                            warn!(rule = %name, "unresolved rule reference");
                            Arc::new(Rule::always_false(format!("Unresolved rule {}", name)))
                        }
                    })
                    .collect();
                stage.set_rules(resolved);
            }

            pipelines_by_id.insert(source.id, Arc::new(pipeline));
        }

        // read the stream assignments of those pipelines
        let mut assignments: IndexMap<StreamId, Vec<Arc<Pipeline>>> = IndexMap::new();
        for assignment in self.assignments.load_all()? {
            let entry = assignments.entry(assignment.stream_id.clone()).or_default();
            for id in &assignment.pipeline_ids {
                match pipelines_by_id.get(id) {
                    Some(pipeline) => {
                        if !entry.iter().any(|existing| existing.id() == id) {
                            entry.push(pipeline.clone());
                        }
                    }
                    None => {
                        warn!(
                            stream = %assignment.stream_id,
                            pipeline = %id,
                            "dropping assignment for unknown pipeline"
                        );
                    }
                }
            }
        }

        let snapshot = ProgramSnapshot::new(pipelines_by_id, assignments);
        info!(pipelines = snapshot.pipeline_count(), "publishing program");
        self.store.publish(Arc::new(snapshot));
        Ok(())
    }

    /// Subscribe to the event bus and serialize debounced reloads on a
    /// dedicated task.
    pub fn spawn(self: Arc<Self>, mut events: broadcast::Receiver<ChangeEvent>) -> ReloadHandle {
        let (trigger, mut pending) = mpsc::channel::<()>(1);

        let listener_trigger = trigger.clone();
        let listener = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        event.log();
                        // a full channel means a reload is already queued
                        let _ = listener_trigger.try_send(());
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event bus lagged, scheduling reload");
                        let _ = listener_trigger.try_send(());
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        let worker = tokio::spawn(async move {
            while pending.recv().await.is_some() {
                if let Err(error) = self.reload() {
                    error!(%error, "reload failed, keeping previous program");
                }
            }
        });

        ReloadHandle {
            trigger,
            listener,
            worker,
        }
    }
}

/// Handle to the running reload tasks.
pub struct ReloadHandle {
    trigger: mpsc::Sender<()>,
    listener: JoinHandle<()>,
    worker: JoinHandle<()>,
}

impl ReloadHandle {
    /// Queue a reload directly, bypassing the bus. Collapses into an
    /// already-pending reload.
    pub fn schedule_reload(&self) {
        let _ = self.trigger.try_send(());
    }

    pub fn abort(&self) {
        self.listener.abort();
        self.worker.abort();
    }
}

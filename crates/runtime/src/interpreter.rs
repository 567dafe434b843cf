//! The per-message interpreter loop.
//!
//! `process()` drives each message of a batch to a fixed point: select
//! pipelines from the message's stream membership, execute them in stage
//! slices, and re-queue the message whenever rules routed it into streams
//! it was not on before. A blacklist of (message id, stream id) pairs
//! guarantees every combination runs at most once per call, which bounds
//! the loop.
//!
//! The program snapshot is pinned once per call: a concurrent reload is
//! either observed for the whole batch or not at all.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, instrument, warn};

use sluice_ast::Pipeline;
use sluice_foundation::{
    EvaluationContext, Message, MessageId, PipelineId, StreamId,
};

use crate::interpret::{evaluate_bool, execute};
use crate::metrics::InterpreterMetrics;
use crate::program::{ProgramSnapshot, ProgramStore};
use crate::sources::Journal;
use crate::stages::StageIterator;

/// Static identity for host registration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Descriptor;

impl Descriptor {
    pub fn name(&self) -> &'static str {
        "Processing Pipeline Interpreter"
    }

    pub fn id(&self) -> &'static str {
        "sluice-pipeline-interpreter"
    }
}

/// The message processor: executes the current program against batches
/// of messages. Safe to call concurrently from host worker threads; each
/// call runs to completion on its calling thread.
pub struct Interpreter {
    store: Arc<ProgramStore>,
    journal: Arc<dyn Journal>,
    metrics: Arc<InterpreterMetrics>,
}

impl Interpreter {
    pub fn new(store: Arc<ProgramStore>, journal: Arc<dyn Journal>) -> Self {
        Self {
            store,
            journal,
            metrics: Arc::new(InterpreterMetrics::default()),
        }
    }

    pub fn descriptor(&self) -> Descriptor {
        Descriptor
    }

    pub fn metrics(&self) -> &InterpreterMetrics {
        &self.metrics
    }

    /// Process a batch of messages to completion.
    ///
    /// Total: every input message yields an output message (possibly
    /// unmodified), except messages dropped via the filter-out flag.
    #[instrument(skip_all, fields(batch = messages.len()))]
    pub fn process(&self, messages: Vec<Message>) -> Vec<Message> {
        let snapshot = self.store.snapshot();

        // (message id, stream id) combinations already processed
        let mut blacklist: HashSet<(MessageId, StreamId)> = HashSet::new();

        let mut fully_processed = Vec::new();
        let mut to_process = messages;

        while !to_process.is_empty() {
            let current_set = std::mem::take(&mut to_process);

            for mut message in current_set {
                let msg_id = message.id().clone();

                // 1. determine which pipelines to run from the streams the
                //    message is currently on; no streams means "default"
                let initial_streams = message.stream_ids();
                let used_default = initial_streams.is_empty();

                let pipelines_to_run =
                    select_pipelines(&snapshot, &msg_id, &initial_streams, &blacklist);
                debug!(
                    message = %msg_id,
                    pipelines = pipelines_to_run.len(),
                    "selected pipelines"
                );

                // 2. run the stage slices
                self.run_stages(&mut message, &pipelines_to_run, &mut to_process);

                // 3. blacklist every stream that was processed in this pass;
                //    streams that appeared during the pass are new
                let mut added_streams = false;
                for stream in message.stream_ids() {
                    if initial_streams.contains(&stream) {
                        blacklist.insert((msg_id.clone(), stream));
                    } else {
                        added_streams = true;
                    }
                }
                if used_default {
                    blacklist.insert((msg_id.clone(), StreamId::default_stream()));
                }

                // 4. drop handling
                if message.filter_out() {
                    debug!(message = %msg_id, "dropping message");
                    self.metrics.mark_filtered_out();
                    self.journal
                        .mark_journal_offset_committed(message.journal_offset());
                    continue;
                }

                // 5. fixed point: newly assigned streams get their own pass
                if added_streams {
                    debug!(message = %msg_id, "new streams assigned, running again");
                    to_process.push(message);
                } else {
                    fully_processed.push(message);
                }
            }
        }

        fully_processed
    }

    fn run_stages(
        &self,
        message: &mut Message,
        pipelines: &[Arc<Pipeline>],
        to_process: &mut Vec<Message>,
    ) {
        let msg_id = message.id().clone();

        // pipelines that passed their most recent stage; everything is
        // eligible until a stage says otherwise
        let mut proceeding: HashSet<PipelineId> =
            pipelines.iter().map(|p| p.id().clone()).collect();

        for slice in StageIterator::new(pipelines.to_vec()) {
            let mut passed: HashSet<PipelineId> = HashSet::new();
            let mut participants: HashSet<PipelineId> = HashSet::new();

            for stage_ref in slice {
                let pipeline = stage_ref.pipeline();
                let stage = stage_ref.stage();
                participants.insert(pipeline.id().clone());

                if !proceeding.contains(pipeline.id()) {
                    debug!(
                        message = %msg_id,
                        pipeline = %pipeline.name(),
                        "previous stage prevents further processing"
                    );
                    continue;
                }

                debug!(
                    message = %msg_id,
                    pipeline = %pipeline.name(),
                    stage = stage.number(),
                    match_all = stage.match_all(),
                    "evaluating stage"
                );

                let mut ctx = EvaluationContext::new(message);

                // rule selection: collect the rules whose predicate holds
                let mut matched = Vec::new();
                for rule in stage.rules() {
                    match evaluate_bool(rule.when(), &mut ctx) {
                        Ok(true) => {
                            debug!(message = %msg_id, rule = %rule.name(), "rule matches");
                            matched.push(rule.clone());
                        }
                        Ok(false) => {
                            debug!(message = %msg_id, rule = %rule.name(), "rule does not match");
                        }
                        Err(error) => {
                            warn!(
                                message = %msg_id,
                                rule = %rule.name(),
                                %error,
                                "predicate failed, treating rule as non-matching"
                            );
                        }
                    }
                }

                // action phase, in declaration order
                for rule in &matched {
                    for statement in rule.then() {
                        if let Err(error) = execute(statement, &mut ctx) {
                            warn!(
                                message = %msg_id,
                                rule = %rule.name(),
                                %error,
                                "statement failed, aborting rule actions"
                            );
                            break;
                        }
                    }
                }

                // match-quorum: all rules under match_all, at least one
                // otherwise
                let satisfied = if stage.match_all() {
                    matched.len() == stage.rules().len()
                } else {
                    !matched.is_empty()
                };
                if satisfied {
                    passed.insert(pipeline.id().clone());
                }

                // messages created by rules join the work set for the
                // next pass
                to_process.extend(ctx.drain_created());
            }

            // only pipelines with a stage in this slice can change status
            proceeding.retain(|id| !participants.contains(id) || passed.contains(id));
        }
    }
}

/// Union of the pipelines assigned to the message's unblacklisted
/// streams, deduplicated by pipeline id.
fn select_pipelines(
    snapshot: &ProgramSnapshot,
    msg_id: &MessageId,
    initial_streams: &indexmap::IndexSet<StreamId>,
    blacklist: &HashSet<(MessageId, StreamId)>,
) -> Vec<Arc<Pipeline>> {
    let mut selected: IndexMap<PipelineId, Arc<Pipeline>> = IndexMap::new();

    if initial_streams.is_empty() {
        let default = StreamId::default_stream();
        if blacklist.contains(&(msg_id.clone(), default.clone())) {
            debug!(message = %msg_id, "already processed default stream, skipping");
        } else {
            for pipeline in snapshot.pipelines_for_stream(&default) {
                selected.insert(pipeline.id().clone(), pipeline.clone());
            }
        }
    } else {
        for stream in initial_streams {
            if blacklist.contains(&(msg_id.clone(), stream.clone())) {
                continue;
            }
            for pipeline in snapshot.pipelines_for_stream(stream) {
                selected.insert(pipeline.id().clone(), pipeline.clone());
            }
        }
    }

    selected.into_values().collect()
}

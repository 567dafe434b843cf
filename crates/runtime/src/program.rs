//! The compiled program and its hot-swappable store.
//!
//! A [`ProgramSnapshot`] is the unit of hot-swap: pipelines by id plus the
//! stream assignment multimap, mutually consistent and immutable once
//! published. The store holds one cell; readers pin a snapshot with a
//! single wait-free load and resolve everything against that immutable
//! view, writers publish a replacement with a single store.

use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;

use sluice_ast::Pipeline;
use sluice_foundation::{PipelineId, StreamId};

/// An immutable compiled program.
///
/// Every pipeline referenced by the assignment map exists in
/// `pipelines`; every stage rule reference has been resolved (to a real
/// rule or an always-false sentinel) before construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramSnapshot {
    pipelines: IndexMap<PipelineId, Arc<Pipeline>>,
    assignments: IndexMap<StreamId, Vec<Arc<Pipeline>>>,
}

impl ProgramSnapshot {
    pub fn new(
        pipelines: IndexMap<PipelineId, Arc<Pipeline>>,
        assignments: IndexMap<StreamId, Vec<Arc<Pipeline>>>,
    ) -> Self {
        Self {
            pipelines,
            assignments,
        }
    }

    /// A program with no pipelines; every message passes through
    /// unchanged.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn pipeline(&self, id: &PipelineId) -> Option<&Arc<Pipeline>> {
        self.pipelines.get(id)
    }

    pub fn pipelines(&self) -> impl Iterator<Item = &Arc<Pipeline>> {
        self.pipelines.values()
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Pipelines assigned to a stream; empty for unassigned streams.
    pub fn pipelines_for_stream(&self, stream: &StreamId) -> &[Arc<Pipeline>] {
        self.assignments
            .get(stream)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_assignment(&self, stream: &StreamId) -> bool {
        self.assignments.contains_key(stream)
    }
}

/// Read-mostly cell holding the current program.
///
/// Readers hold their snapshot for the duration of one `process()` call;
/// no snapshot field mutates after publication, so a swap is never
/// observable mid-call.
pub struct ProgramStore {
    cell: ArcSwap<ProgramSnapshot>,
}

impl ProgramStore {
    /// Start with the empty program.
    pub fn new() -> Self {
        Self {
            cell: ArcSwap::from_pointee(ProgramSnapshot::empty()),
        }
    }

    /// Pin the current program.
    pub fn snapshot(&self) -> Arc<ProgramSnapshot> {
        self.cell.load_full()
    }

    /// Atomically replace the current program.
    pub fn publish(&self, snapshot: Arc<ProgramSnapshot>) {
        self.cell.store(snapshot);
    }
}

impl Default for ProgramStore {
    fn default() -> Self {
        Self::new()
    }
}

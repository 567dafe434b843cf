//! Consumed contracts: source-of-truth stores and the journal.
//!
//! The persistent rule/pipeline/assignment definitions live outside the
//! engine; reload pulls them through these traits. The journal is only
//! touched to commit offsets for dropped messages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sluice_foundation::{PipelineId, StreamId};

/// A rule definition as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSource {
    pub id: String,
    pub source: String,
}

/// A pipeline definition as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSource {
    pub id: PipelineId,
    pub source: String,
}

/// A stream → pipelines assignment as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamAssignment {
    pub stream_id: StreamId,
    pub pipeline_ids: Vec<PipelineId>,
}

/// A source-of-truth store could not be read.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("source store unavailable: {0}")]
pub struct SourceError(pub String);

pub trait RuleSourceService: Send + Sync {
    fn load_all(&self) -> Result<Vec<RuleSource>, SourceError>;
}

pub trait PipelineSourceService: Send + Sync {
    fn load_all(&self) -> Result<Vec<PipelineSource>, SourceError>;
}

pub trait StreamAssignmentService: Send + Sync {
    fn load_all(&self) -> Result<Vec<StreamAssignment>, SourceError>;
}

/// Message journal; offsets are committed when a message is dropped so
/// the host never redelivers it.
pub trait Journal: Send + Sync {
    fn mark_journal_offset_committed(&self, offset: u64);
}

/// Journal that discards commits, for embedding and tests.
#[derive(Debug, Default)]
pub struct NullJournal;

impl Journal for NullJournal {
    fn mark_journal_offset_committed(&self, _offset: u64) {}
}

//! The message flowing through the host.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::ids::{MessageId, StreamId};
use crate::value::Value;

/// A single message under processing.
///
/// Messages are owned by the host; the interpreter mutates fields and
/// stream membership in place. Field and stream iteration order is
/// insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    fields: IndexMap<String, Value>,
    streams: IndexSet<StreamId>,
    filter_out: bool,
    journal_offset: u64,
}

impl Message {
    pub fn new(id: impl Into<MessageId>) -> Self {
        Self {
            id: id.into(),
            fields: IndexMap::new(),
            streams: IndexSet::new(),
            filter_out: false,
            journal_offset: 0,
        }
    }

    pub fn with_journal_offset(mut self, offset: u64) -> Self {
        self.journal_offset = offset;
        self
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        self.fields.shift_remove(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn streams(&self) -> &IndexSet<StreamId> {
        &self.streams
    }

    /// Snapshot of the current stream ids (copied; safe to hold across
    /// mutation).
    pub fn stream_ids(&self) -> IndexSet<StreamId> {
        self.streams.clone()
    }

    /// Add a stream; returns false if already present.
    pub fn add_stream(&mut self, stream: impl Into<StreamId>) -> bool {
        self.streams.insert(stream.into())
    }

    /// Remove a stream; returns false if it was not present.
    pub fn remove_stream(&mut self, stream: &StreamId) -> bool {
        self.streams.shift_remove(stream)
    }

    pub fn filter_out(&self) -> bool {
        self.filter_out
    }

    pub fn set_filter_out(&mut self, filter_out: bool) {
        self.filter_out = filter_out;
    }

    pub fn journal_offset(&self) -> u64 {
        self.journal_offset
    }
}

//! Interpreter metrics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained by the interpreter.
#[derive(Debug, Default)]
pub struct InterpreterMetrics {
    filtered_out_messages: AtomicU64,
}

impl InterpreterMetrics {
    pub fn mark_filtered_out(&self) {
        self.filtered_out_messages.fetch_add(1, Ordering::Relaxed);
    }

    /// Messages dropped via the filter-out flag since startup.
    pub fn filtered_out_messages(&self) -> u64 {
        self.filtered_out_messages.load(Ordering::Relaxed)
    }
}

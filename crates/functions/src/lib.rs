//! Sluice Built-in Functions
//!
//! The native function library available to rule authors: string and
//! numeric primitives, conversions, and the mutating message-manipulation
//! functions. Functions register themselves against the
//! [`sluice_registry::FUNCTIONS`] slice; linking this crate makes the
//! whole library available for lookup.

mod convert;
mod messages;
mod numeric;
mod strings;

// Re-export for convenience
pub use sluice_registry::{all_names, get, invoke, is_known};

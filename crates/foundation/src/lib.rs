//! Sluice Foundation
//!
//! Core data model shared by every sluice crate: runtime values, the
//! message type flowing through the host, typed identifiers, and the
//! per-evaluation scratch context.

pub mod context;
pub mod error;
pub mod ids;
pub mod message;
pub mod ops;
pub mod value;

pub use context::EvaluationContext;
pub use error::ValueError;
pub use ids::{MessageId, PipelineId, StreamId, DEFAULT_STREAM};
pub use message::Message;
pub use ops::{BinaryOp, ComparisonOp, UnaryOp};
pub use value::{MessageHandle, TypeTag, Value};

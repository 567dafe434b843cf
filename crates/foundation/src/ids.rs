//! Typed identifiers for sluice entities
//!
//! Messages, streams, and pipelines are identified by typed string wrappers.
//! These ensure type safety and provide consistent serialization.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved stream id for messages with no explicit stream membership.
pub const DEFAULT_STREAM: &str = "default";

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a message
    MessageId
);

define_id!(
    /// Unique identifier for a stream
    StreamId
);

define_id!(
    /// Unique identifier for a pipeline
    PipelineId
);

impl StreamId {
    /// The reserved `"default"` stream.
    pub fn default_stream() -> Self {
        Self(DEFAULT_STREAM.to_string())
    }

    /// Check whether this is the reserved default stream.
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_STREAM
    }
}

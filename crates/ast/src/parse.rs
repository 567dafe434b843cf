//! Parser contract.
//!
//! The rule-language parser is an external collaborator: the engine
//! consumes it as a source → AST function and is agnostic to surface
//! syntax.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sluice_foundation::PipelineId;

use crate::pipeline::Pipeline;
use crate::rule::Rule;

/// A source document failed to parse.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("parse error at {line}:{column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Source → AST contract implemented outside this crate.
pub trait PipelineRuleParser: Send + Sync {
    fn parse_rule(&self, source: &str) -> Result<Rule, ParseError>;

    fn parse_pipeline(&self, id: &PipelineId, source: &str) -> Result<Pipeline, ParseError>;
}

//! Sluice AST
//!
//! Expression and statement nodes for the rule language, plus the rule,
//! stage, and pipeline containers the interpreter executes. Nodes are pure
//! data; evaluation lives in `sluice-runtime`. The surface syntax is the
//! parser's concern; this crate only defines the parsed form and the
//! parser contract.

pub mod error;
pub mod expr;
pub mod parse;
pub mod pipeline;
pub mod rule;
pub mod stmt;

pub use error::AstError;
pub use expr::{Constant, Expression, FunctionCall};
pub use parse::{ParseError, PipelineRuleParser};
pub use pipeline::{Pipeline, Stage};
pub use rule::Rule;
pub use stmt::Statement;

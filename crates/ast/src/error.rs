//! AST construction errors

use thiserror::Error;

use sluice_foundation::TypeTag;

/// Structural errors caught while building rules and pipelines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AstError {
    #[error("rule `{name}`: `when` must be boolean, found {found}")]
    NonBooleanPredicate { name: String, found: TypeTag },

    #[error("pipeline `{pipeline}`: duplicate stage number {stage}")]
    DuplicateStage { pipeline: String, stage: i32 },
}

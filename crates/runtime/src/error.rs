//! Runtime errors

use thiserror::Error;

use sluice_foundation::{TypeTag, ValueError};
use sluice_registry::FunctionError;

/// Failures raised while evaluating an expression or statement.
///
/// These are contained at the rule boundary: a failing predicate demotes
/// the rule to a non-match, a failing statement aborts the remaining
/// statements of that rule only. No evaluation error escapes `process()`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Function(#[from] FunctionError),

    #[error("cannot access field `{field}` on {target}")]
    InvalidFieldAccess { field: String, target: TypeTag },

    #[error("cannot index into {target}")]
    InvalidIndex { target: TypeTag },
}

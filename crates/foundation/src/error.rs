//! Value-level errors

use thiserror::Error;

use crate::value::TypeTag;

/// Errors raised by value arithmetic, comparison, and handle resolution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("cannot apply `{op}` to {left} and {right}")]
    InvalidOperands {
        op: &'static str,
        left: TypeTag,
        right: TypeTag,
    },

    #[error("cannot order {left} against {right}")]
    InvalidComparison { left: TypeTag, right: TypeTag },

    #[error("cannot negate {0}")]
    InvalidNegation(TypeTag),

    #[error("message handle does not resolve in this context")]
    InvalidMessageHandle,
}

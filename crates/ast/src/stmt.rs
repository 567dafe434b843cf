//! Statement nodes for rule actions.

use serde::{Deserialize, Serialize};

use crate::expr::{Expression, FunctionCall};

/// A single action statement in a rule's `then` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Bind a rule-local variable.
    Let { name: String, expr: Expression },
    /// Evaluate an expression for its effects, discarding the result.
    Expr(Expression),
    /// Invoke a function for its effects.
    Call(FunctionCall),
}

impl Statement {
    pub fn let_(name: impl Into<String>, expr: Expression) -> Self {
        Statement::Let {
            name: name.into(),
            expr,
        }
    }

    pub fn call(function: impl Into<String>, args: Vec<Expression>) -> Self {
        Statement::Call(FunctionCall::new(function, args))
    }
}

//! Expression nodes.
//!
//! Every node is immutable after construction and carries its operand
//! payload inline. `static_type` is a best-effort pre-evaluation type:
//! variables, field reads, and function calls type as `Unknown` until
//! evaluated.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use sluice_foundation::{BinaryOp, ComparisonOp, TypeTag, UnaryOp};

/// Literal constants as they appear in rule source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Long(i64),
    Double(f64),
    Boolean(bool),
    String(String),
}

impl Constant {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Constant::Long(_) => TypeTag::Long,
            Constant::Double(_) => TypeTag::Double,
            Constant::Boolean(_) => TypeTag::Boolean,
            Constant::String(_) => TypeTag::String,
        }
    }
}

/// A named function invocation with positional and named arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub function: String,
    pub args: Vec<Expression>,
    pub named_args: IndexMap<String, Expression>,
}

impl FunctionCall {
    pub fn new(function: impl Into<String>, args: Vec<Expression>) -> Self {
        Self {
            function: function.into(),
            args,
            named_args: IndexMap::new(),
        }
    }

    pub fn with_named(mut self, name: impl Into<String>, expr: Expression) -> Self {
        self.named_args.insert(name.into(), expr);
        self
    }
}

/// An expression in a rule predicate or action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Constant(Constant),
    /// A variable reference; unbound names evaluate to `Null`.
    Variable(String),
    /// `target.field`: map key or message field lookup.
    FieldAccess {
        target: Box<Expression>,
        field: String,
    },
    /// `target[key]`: indexed lookup on maps and lists.
    Index {
        target: Box<Expression>,
        key: Box<Expression>,
    },
    Call(FunctionCall),
    /// Arithmetic: `+ - * / %`.
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// `< <= > >= == !=`.
    Comparison {
        op: ComparisonOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// Numeric negation and logical not.
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    /// Short-circuit conjunction.
    And {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// Short-circuit disjunction.
    Or {
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

impl Expression {
    pub fn long(v: i64) -> Self {
        Expression::Constant(Constant::Long(v))
    }

    pub fn double(v: f64) -> Self {
        Expression::Constant(Constant::Double(v))
    }

    pub fn boolean(v: bool) -> Self {
        Expression::Constant(Constant::Boolean(v))
    }

    pub fn string(v: impl Into<String>) -> Self {
        Expression::Constant(Constant::String(v.into()))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Variable(name.into())
    }

    pub fn field(target: Expression, field: impl Into<String>) -> Self {
        Expression::FieldAccess {
            target: Box::new(target),
            field: field.into(),
        }
    }

    pub fn call(function: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::Call(FunctionCall::new(function, args))
    }

    /// Best-effort static type of this node.
    pub fn static_type(&self) -> TypeTag {
        match self {
            Expression::Constant(c) => c.type_tag(),
            Expression::Variable(_) | Expression::FieldAccess { .. } | Expression::Index { .. } => {
                TypeTag::Unknown
            }
            Expression::Call(_) => TypeTag::Unknown,
            Expression::Binary { op, left, right } => {
                binary_static_type(*op, left.static_type(), right.static_type())
            }
            Expression::Comparison { .. } | Expression::And { .. } | Expression::Or { .. } => {
                TypeTag::Boolean
            }
            Expression::Unary { op, operand } => match op {
                UnaryOp::Not => TypeTag::Boolean,
                UnaryOp::Neg => match operand.static_type() {
                    t @ (TypeTag::Long | TypeTag::Double) => t,
                    _ => TypeTag::Unknown,
                },
            },
        }
    }
}

fn binary_static_type(op: BinaryOp, left: TypeTag, right: TypeTag) -> TypeTag {
    match (op, left, right) {
        (BinaryOp::Add, TypeTag::String, _) | (BinaryOp::Add, _, TypeTag::String) => {
            TypeTag::String
        }
        (_, TypeTag::Long, TypeTag::Long) => TypeTag::Long,
        (_, TypeTag::Long | TypeTag::Double, TypeTag::Long | TypeTag::Double) => TypeTag::Double,
        _ => TypeTag::Unknown,
    }
}

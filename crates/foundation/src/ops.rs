//! Operators and value coercion rules.
//!
//! These operator enums are used consistently across the AST and the
//! evaluator to avoid duplication and 1:1 conversion boilerplate. The
//! functions below implement the coercion rules shared by every operator
//! site:
//!
//! - integral × integral stays integral (64-bit two's-complement wrap),
//! - a floating operand promotes the result to double (IEEE-754),
//! - string `+` concatenates and coerces the other side via its canonical
//!   string form,
//! - equality between a numeric and a non-numeric is `false` without error.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;
use crate::value::Value;

/// Arithmetic binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition: `a + b`.
    Add,
    /// Subtraction: `a - b`.
    Sub,
    /// Multiplication: `a * b`.
    Mul,
    /// Division: `a / b`.
    Div,
    /// Remainder: `a % b`.
    Rem,
}

impl BinaryOp {
    fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOp {
    /// Equality: `a == b`.
    Eq,
    /// Inequality: `a != b`.
    Ne,
    /// Less than: `a < b`.
    Lt,
    /// Less than or equal: `a <= b`.
    Le,
    /// Greater than: `a > b`.
    Gt,
    /// Greater than or equal: `a >= b`.
    Ge,
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::Ne => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
        };
        write!(f, "{}", s)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Numeric negation: `-x`.
    Neg,
    /// Logical not: `!x`.
    Not,
}

/// Apply an arithmetic operator to two values.
pub fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, ValueError> {
    // String concatenation wins over numeric rules for `+`.
    if op == BinaryOp::Add {
        match (left, right) {
            (Value::String(l), r) => return Ok(Value::String(format!("{}{}", l, r))),
            (l, Value::String(r)) => return Ok(Value::String(format!("{}{}", l, r))),
            _ => {}
        }
    }

    match (left, right) {
        (Value::Long(l), Value::Long(r)) => apply_long(op, *l, *r),
        (l, r) if l.is_numeric() && r.is_numeric() => {
            // as_double cannot fail for numeric values
            let l = l.as_double().unwrap_or_default();
            let r = r.as_double().unwrap_or_default();
            Ok(Value::Double(apply_double(op, l, r)))
        }
        (l, r) => Err(ValueError::InvalidOperands {
            op: op.symbol(),
            left: l.type_tag(),
            right: r.type_tag(),
        }),
    }
}

fn apply_long(op: BinaryOp, l: i64, r: i64) -> Result<Value, ValueError> {
    let v = match op {
        BinaryOp::Add => l.wrapping_add(r),
        BinaryOp::Sub => l.wrapping_sub(r),
        BinaryOp::Mul => l.wrapping_mul(r),
        BinaryOp::Div => l.checked_div(r).ok_or(ValueError::DivisionByZero)?,
        BinaryOp::Rem => l.checked_rem(r).ok_or(ValueError::DivisionByZero)?,
    };
    Ok(Value::Long(v))
}

fn apply_double(op: BinaryOp, l: f64, r: f64) -> f64 {
    match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div => l / r,
        BinaryOp::Rem => l % r,
    }
}

/// Apply a comparison operator to two values.
///
/// Equality never fails: mismatched kinds compare unequal. Ordering is
/// defined for numeric pairs (with promotion) and string pairs.
pub fn apply_comparison(
    op: ComparisonOp,
    left: &Value,
    right: &Value,
) -> Result<bool, ValueError> {
    match op {
        ComparisonOp::Eq => Ok(values_equal(left, right)),
        ComparisonOp::Ne => Ok(!values_equal(left, right)),
        _ => {
            let ordering = match (left, right) {
                (l, r) if l.is_numeric() && r.is_numeric() => {
                    let l = l.as_double().unwrap_or_default();
                    let r = r.as_double().unwrap_or_default();
                    l.partial_cmp(&r)
                }
                (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
                (l, r) => {
                    return Err(ValueError::InvalidComparison {
                        left: l.type_tag(),
                        right: r.type_tag(),
                    })
                }
            };
            // NaN orders as false on every operator
            Ok(ordering.is_some_and(|ord| match op {
                ComparisonOp::Lt => ord.is_lt(),
                ComparisonOp::Le => ord.is_le(),
                ComparisonOp::Gt => ord.is_gt(),
                ComparisonOp::Ge => ord.is_ge(),
                ComparisonOp::Eq | ComparisonOp::Ne => unreachable!(),
            }))
        }
    }
}

/// Equality with numeric promotion; mismatched kinds are unequal.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (l, r) if l.is_numeric() && r.is_numeric() => {
            l.as_double().unwrap_or_default() == r.as_double().unwrap_or_default()
        }
        (l, r) => l == r,
    }
}

/// Apply a unary operator to a value.
pub fn apply_unary(op: UnaryOp, value: &Value) -> Result<Value, ValueError> {
    match op {
        UnaryOp::Neg => match value {
            Value::Long(v) => Ok(Value::Long(v.wrapping_neg())),
            Value::Double(v) => Ok(Value::Double(-v)),
            other => Err(ValueError::InvalidNegation(other.type_tag())),
        },
        UnaryOp::Not => Ok(Value::Boolean(!value.is_truthy())),
    }
}

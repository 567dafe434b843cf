//! Expression and statement evaluation.
//!
//! A tree-walking interpreter over [`Expression`] nodes. Evaluation is a
//! single dispatch on the node tag against an [`EvaluationContext`];
//! function calls resolve through the process-wide registry. All failure
//! paths return `Err`; containment at the rule boundary is the
//! interpreter loop's job, not this module's.

use indexmap::IndexMap;

use sluice_ast::{Expression, FunctionCall, Statement};
use sluice_foundation::{ops, EvaluationContext, Value};

use crate::error::EvalError;

/// Evaluate an expression to a value.
pub fn evaluate(expr: &Expression, ctx: &mut EvaluationContext) -> Result<Value, EvalError> {
    match expr {
        Expression::Constant(c) => Ok(constant_value(c)),

        // unbound variables read as Null
        Expression::Variable(name) => Ok(ctx.var(name).cloned().unwrap_or(Value::Null)),

        Expression::FieldAccess { target, field } => {
            match evaluate(target, ctx)? {
                Value::Null => Ok(Value::Null),
                Value::Map(map) => Ok(map.get(field).cloned().unwrap_or(Value::Null)),
                Value::Message(handle) => Ok(ctx.field_of(handle, field)?),
                other => Err(EvalError::InvalidFieldAccess {
                    field: field.clone(),
                    target: other.type_tag(),
                }),
            }
        }

        Expression::Index { target, key } => {
            let target = evaluate(target, ctx)?;
            let key = evaluate(key, ctx)?;
            match target {
                Value::Null => Ok(Value::Null),
                // map keys resolve through the canonical string form
                Value::Map(map) => Ok(map.get(&key.to_string()).cloned().unwrap_or(Value::Null)),
                Value::List(items) => {
                    let value = key
                        .as_long()
                        .and_then(|idx| usize::try_from(idx).ok())
                        .and_then(|idx| items.get(idx).cloned());
                    Ok(value.unwrap_or(Value::Null))
                }
                other => Err(EvalError::InvalidIndex {
                    target: other.type_tag(),
                }),
            }
        }

        Expression::Call(call) => evaluate_call(call, ctx),

        Expression::Binary { op, left, right } => {
            let left = evaluate(left, ctx)?;
            let right = evaluate(right, ctx)?;
            Ok(ops::apply_binary(*op, &left, &right)?)
        }

        Expression::Comparison { op, left, right } => {
            let left = evaluate(left, ctx)?;
            let right = evaluate(right, ctx)?;
            Ok(Value::Boolean(ops::apply_comparison(*op, &left, &right)?))
        }

        Expression::Unary { op, operand } => {
            let operand = evaluate(operand, ctx)?;
            Ok(ops::apply_unary(*op, &operand)?)
        }

        // right operand only evaluates when the left side didn't decide
        Expression::And { left, right } => {
            if !evaluate(left, ctx)?.is_truthy() {
                return Ok(Value::Boolean(false));
            }
            Ok(Value::Boolean(evaluate(right, ctx)?.is_truthy()))
        }

        Expression::Or { left, right } => {
            if evaluate(left, ctx)?.is_truthy() {
                return Ok(Value::Boolean(true));
            }
            Ok(Value::Boolean(evaluate(right, ctx)?.is_truthy()))
        }
    }
}

/// Evaluate a predicate; only `Boolean(true)` counts as a match.
pub fn evaluate_bool(expr: &Expression, ctx: &mut EvaluationContext) -> Result<bool, EvalError> {
    Ok(matches!(evaluate(expr, ctx)?, Value::Boolean(true)))
}

/// Execute a single action statement.
pub fn execute(stmt: &Statement, ctx: &mut EvaluationContext) -> Result<(), EvalError> {
    match stmt {
        Statement::Let { name, expr } => {
            let value = evaluate(expr, ctx)?;
            ctx.set_var(name.clone(), value);
            Ok(())
        }
        Statement::Expr(expr) => {
            evaluate(expr, ctx)?;
            Ok(())
        }
        Statement::Call(call) => {
            evaluate_call(call, ctx)?;
            Ok(())
        }
    }
}

fn evaluate_call(call: &FunctionCall, ctx: &mut EvaluationContext) -> Result<Value, EvalError> {
    let mut positional = Vec::with_capacity(call.args.len());
    for arg in &call.args {
        positional.push(evaluate(arg, ctx)?);
    }
    let mut named = IndexMap::with_capacity(call.named_args.len());
    for (name, arg) in &call.named_args {
        named.insert(name.clone(), evaluate(arg, ctx)?);
    }
    Ok(sluice_registry::invoke(
        &call.function,
        positional,
        named,
        ctx,
    )?)
}

fn constant_value(c: &sluice_ast::Constant) -> Value {
    match c {
        sluice_ast::Constant::Long(v) => Value::Long(*v),
        sluice_ast::Constant::Double(v) => Value::Double(*v),
        sluice_ast::Constant::Boolean(v) => Value::Boolean(*v),
        sluice_ast::Constant::String(v) => Value::String(v.clone()),
    }
}

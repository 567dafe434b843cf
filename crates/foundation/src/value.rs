//! Runtime values for rule evaluation.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Handle to a message reachable from an evaluation context.
///
/// Values never borrow the message they refer to; handles are resolved
/// through the [`EvaluationContext`](crate::context::EvaluationContext)
/// that produced them and are meaningless outside of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageHandle {
    /// The message currently under evaluation.
    Current,
    /// A message created during this stage, by insertion order.
    Created(usize),
}

/// Static type of a value or expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    Long,
    Double,
    Boolean,
    String,
    Map,
    List,
    Message,
    Null,
    /// Not determinable before evaluation (variables, field reads, …).
    Unknown,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeTag::Long => "long",
            TypeTag::Double => "double",
            TypeTag::Boolean => "boolean",
            TypeTag::String => "string",
            TypeTag::Map => "map",
            TypeTag::List => "list",
            TypeTag::Message => "message",
            TypeTag::Null => "null",
            TypeTag::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// Runtime value produced by expression evaluation.
///
/// Numeric values keep the integral/floating distinction; arithmetic and
/// comparison coerce per the rules in [`crate::ops`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// 64-bit signed integer.
    Long(i64),
    /// IEEE-754 double.
    Double(f64),
    Boolean(bool),
    String(String),
    /// String-keyed map; insertion order is preserved.
    Map(IndexMap<String, Value>),
    List(Vec<Value>),
    /// Handle to a message (see [`MessageHandle`]).
    Message(MessageHandle),
    Null,
}

impl Value {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Long(_) => TypeTag::Long,
            Value::Double(_) => TypeTag::Double,
            Value::Boolean(_) => TypeTag::Boolean,
            Value::String(_) => TypeTag::String,
            Value::Map(_) => TypeTag::Map,
            Value::List(_) => TypeTag::List,
            Value::Message(_) => TypeTag::Message,
            Value::Null => TypeTag::Null,
        }
    }

    /// Attempt to get the value as a long.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempt to get the value as a double (longs widen).
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Long(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// True for anything but `Null` and `Boolean(false)`.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value participates in numeric coercion.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Long(_) | Value::Double(_))
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

/// Canonical string form, used for string concatenation and field rendering.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Long(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::List(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Message(MessageHandle::Current) => write!(f, "<message>"),
            Value::Message(MessageHandle::Created(idx)) => write!(f, "<message #{}>", idx),
            Value::Null => write!(f, "null"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

//! Function Registry.
//!
//! Provides distributed registration for the native functions callable
//! from rule expressions. Functions are mathematical, string, conversion,
//! and message-manipulation primitives like `abs`, `uppercase`, `to_long`,
//! and `set_field`.
//!
//! # Architecture
//!
//! The registry uses [`linkme::distributed_slice`] for compile-time
//! registration:
//!
//! 1. Function crates declare [`FunctionDescriptor`] statics against
//!    [`FUNCTIONS`]
//! 2. At link time, all registrations are collected into the slice
//! 3. At runtime, the registry provides lookup by name and argument
//!    binding for dispatch
//!
//! Registration is therefore complete before the first message is
//! processed, and the registry is immutable for the process lifetime.
//!
//! # Argument binding
//!
//! Descriptors declare their parameter list (name, type, required or
//! optional). [`bind`] maps positional arguments by position, then named
//! arguments by name, and rejects unknown names, double bindings, missing
//! required parameters, and incompatible value kinds. Longs widen to
//! doubles at the binding boundary, matching the arithmetic coercion
//! rules.
//!
//! # Example registration
//!
//! ```ignore
//! use linkme::distributed_slice;
//! use sluice_registry::{FunctionDescriptor, ParamSpec, FUNCTIONS};
//! use sluice_foundation::{TypeTag, Value};
//!
//! #[distributed_slice(FUNCTIONS)]
//! static ABS: FunctionDescriptor = FunctionDescriptor {
//!     name: "abs",
//!     signature: "abs(value: long|double) -> long|double",
//!     doc: "Absolute value",
//!     params: &[ParamSpec::required("value", TypeTag::Double)],
//!     mutating: false,
//!     implementation: |args, _ctx| Ok(Value::Double(args.double("value")?.abs())),
//! };
//! ```

use indexmap::IndexMap;
use linkme::distributed_slice;
use thiserror::Error;

pub use sluice_foundation::{EvaluationContext, TypeTag, Value, ValueError};

/// Declared parameter of a native function.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    /// Expected value kind; `TypeTag::Unknown` accepts any value.
    pub type_tag: TypeTag,
    pub required: bool,
}

impl ParamSpec {
    pub const fn required(name: &'static str, type_tag: TypeTag) -> Self {
        Self {
            name,
            type_tag,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, type_tag: TypeTag) -> Self {
        Self {
            name,
            type_tag,
            required: false,
        }
    }
}

/// Native function signature.
///
/// Functions receive their bound arguments and the evaluation context of
/// the invoking rule. Only functions flagged `mutating` touch the context
/// beyond reads.
pub type NativeFn = fn(&Arguments, &mut EvaluationContext) -> Result<Value, FunctionError>;

/// Descriptor for a registered function.
pub struct FunctionDescriptor {
    /// Rule-language name (e.g. `set_field`, `to_long`).
    pub name: &'static str,
    /// Full signature string for diagnostics.
    pub signature: &'static str,
    /// Documentation string.
    pub doc: &'static str,
    /// Declared parameters, in positional order.
    pub params: &'static [ParamSpec],
    /// Whether the function mutates the message or creates messages.
    pub mutating: bool,
    pub implementation: NativeFn,
}

/// Distributed slice collecting all function registrations.
///
/// Populated at link time by descriptor statics.
#[distributed_slice]
pub static FUNCTIONS: [FunctionDescriptor];

/// Errors raised while resolving, binding, or running a function.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FunctionError {
    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("`{function}` takes at most {expected} positional arguments, got {got}")]
    ArityMismatch {
        function: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("`{function}`: argument `{param}` expects {expected}, got {found}")]
    TypeMismatch {
        function: &'static str,
        param: &'static str,
        expected: TypeTag,
        found: TypeTag,
    },

    #[error("`{function}`: unknown named argument `{name}`")]
    UnknownParameter {
        function: &'static str,
        name: String,
    },

    #[error("`{function}`: argument `{param}` bound twice")]
    DuplicateArgument {
        function: &'static str,
        param: &'static str,
    },

    #[error("`{function}`: {message}")]
    Failed { function: &'static str, message: String },

    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Bound arguments, keyed by declared parameter name.
#[derive(Debug)]
pub struct Arguments {
    function: &'static str,
    values: IndexMap<&'static str, Value>,
}

impl Arguments {
    pub fn function(&self) -> &'static str {
        self.function
    }

    /// The bound value, or `None` for an absent optional parameter.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// The bound value, `Null` when absent.
    pub fn value(&self, name: &str) -> Value {
        self.values.get(name).cloned().unwrap_or(Value::Null)
    }

    pub fn string(&self, name: &'static str) -> Result<&str, FunctionError> {
        match self.get(name) {
            Some(Value::String(s)) => Ok(s),
            other => Err(self.mismatch(name, TypeTag::String, other)),
        }
    }

    pub fn long(&self, name: &'static str) -> Result<i64, FunctionError> {
        match self.get(name) {
            Some(Value::Long(v)) => Ok(*v),
            other => Err(self.mismatch(name, TypeTag::Long, other)),
        }
    }

    /// Numeric argument widened to double.
    pub fn double(&self, name: &'static str) -> Result<f64, FunctionError> {
        match self.get(name).and_then(Value::as_double) {
            Some(v) => Ok(v),
            None => Err(self.mismatch(name, TypeTag::Double, self.get(name))),
        }
    }

    pub fn boolean(&self, name: &'static str) -> Result<bool, FunctionError> {
        match self.get(name) {
            Some(Value::Boolean(v)) => Ok(*v),
            other => Err(self.mismatch(name, TypeTag::Boolean, other)),
        }
    }

    fn mismatch(
        &self,
        param: &'static str,
        expected: TypeTag,
        found: Option<&Value>,
    ) -> FunctionError {
        FunctionError::TypeMismatch {
            function: self.function,
            param,
            expected,
            found: found.map_or(TypeTag::Null, Value::type_tag),
        }
    }
}

/// Get all registered function names.
pub fn all_names() -> impl Iterator<Item = &'static str> {
    FUNCTIONS.iter().map(|f| f.name)
}

/// Look up a function by name.
pub fn get(name: &str) -> Option<&'static FunctionDescriptor> {
    FUNCTIONS.iter().find(|f| f.name == name)
}

/// Check if a function name is registered.
pub fn is_known(name: &str) -> bool {
    get(name).is_some()
}

/// Bind positional and named argument values against a descriptor.
pub fn bind(
    desc: &'static FunctionDescriptor,
    positional: Vec<Value>,
    named: IndexMap<String, Value>,
) -> Result<Arguments, FunctionError> {
    if positional.len() > desc.params.len() {
        return Err(FunctionError::ArityMismatch {
            function: desc.name,
            expected: desc.params.len(),
            got: positional.len(),
        });
    }

    let mut values: IndexMap<&'static str, Value> = IndexMap::new();
    for (spec, value) in desc.params.iter().zip(positional) {
        check_kind(desc.name, spec, &value)?;
        values.insert(spec.name, value);
    }

    for (name, value) in named {
        let spec = desc
            .params
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| FunctionError::UnknownParameter {
                function: desc.name,
                name: name.clone(),
            })?;
        if values.contains_key(spec.name) {
            return Err(FunctionError::DuplicateArgument {
                function: desc.name,
                param: spec.name,
            });
        }
        check_kind(desc.name, spec, &value)?;
        values.insert(spec.name, value);
    }

    for spec in desc.params {
        if spec.required && !values.contains_key(spec.name) {
            return Err(FunctionError::TypeMismatch {
                function: desc.name,
                param: spec.name,
                expected: spec.type_tag,
                found: TypeTag::Null,
            });
        }
    }

    Ok(Arguments {
        function: desc.name,
        values,
    })
}

fn check_kind(
    function: &'static str,
    spec: &ParamSpec,
    value: &Value,
) -> Result<(), FunctionError> {
    let found = value.type_tag();
    let compatible = match spec.type_tag {
        TypeTag::Unknown => true,
        // longs widen to double, as in arithmetic
        TypeTag::Double => value.is_numeric(),
        expected => found == expected,
    };
    if compatible {
        Ok(())
    } else {
        Err(FunctionError::TypeMismatch {
            function,
            param: spec.name,
            expected: spec.type_tag,
            found,
        })
    }
}

/// Resolve, bind, and invoke a function in one step.
pub fn invoke(
    name: &str,
    positional: Vec<Value>,
    named: IndexMap<String, Value>,
    ctx: &mut EvaluationContext,
) -> Result<Value, FunctionError> {
    let desc = get(name).ok_or_else(|| FunctionError::UnknownFunction(name.to_string()))?;
    let args = bind(desc, positional, named)?;
    (desc.implementation)(&args, ctx)
}

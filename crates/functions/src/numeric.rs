//! Numeric Functions
//!
//! Math primitives. Integral inputs keep their integral kind where the
//! operation allows it.

use linkme::distributed_slice;
use sluice_registry::{FunctionDescriptor, FunctionError, ParamSpec, FUNCTIONS};
use sluice_foundation::{TypeTag, Value};

fn numeric(args: &sluice_registry::Arguments, name: &'static str) -> Result<Value, FunctionError> {
    match args.get(name) {
        Some(v @ (Value::Long(_) | Value::Double(_))) => Ok(v.clone()),
        other => Err(FunctionError::TypeMismatch {
            function: args.function(),
            param: name,
            expected: TypeTag::Double,
            found: other.map_or(TypeTag::Null, Value::type_tag),
        }),
    }
}

/// Absolute value: `abs(value)`
#[distributed_slice(FUNCTIONS)]
static ABS: FunctionDescriptor = FunctionDescriptor {
    name: "abs",
    signature: "abs(value: long|double) -> long|double",
    doc: "Absolute value; longs stay integral",
    params: &[ParamSpec::required("value", TypeTag::Double)],
    mutating: false,
    implementation: |args, _ctx| match numeric(args, "value")? {
        Value::Long(v) => Ok(Value::Long(v.wrapping_abs())),
        Value::Double(v) => Ok(Value::Double(v.abs())),
        _ => unreachable!(),
    },
};

/// Minimum: `min(first, second)`
#[distributed_slice(FUNCTIONS)]
static MIN: FunctionDescriptor = FunctionDescriptor {
    name: "min",
    signature: "min(first: long|double, second: long|double) -> long|double",
    doc: "Smaller of two numbers; integral only if both are",
    params: &[
        ParamSpec::required("first", TypeTag::Double),
        ParamSpec::required("second", TypeTag::Double),
    ],
    mutating: false,
    implementation: |args, _ctx| match (numeric(args, "first")?, numeric(args, "second")?) {
        (Value::Long(a), Value::Long(b)) => Ok(Value::Long(a.min(b))),
        (a, b) => Ok(Value::Double(f64::min(
            a.as_double().unwrap_or_default(),
            b.as_double().unwrap_or_default(),
        ))),
    },
};

/// Maximum: `max(first, second)`
#[distributed_slice(FUNCTIONS)]
static MAX: FunctionDescriptor = FunctionDescriptor {
    name: "max",
    signature: "max(first: long|double, second: long|double) -> long|double",
    doc: "Larger of two numbers; integral only if both are",
    params: &[
        ParamSpec::required("first", TypeTag::Double),
        ParamSpec::required("second", TypeTag::Double),
    ],
    mutating: false,
    implementation: |args, _ctx| match (numeric(args, "first")?, numeric(args, "second")?) {
        (Value::Long(a), Value::Long(b)) => Ok(Value::Long(a.max(b))),
        (a, b) => Ok(Value::Double(f64::max(
            a.as_double().unwrap_or_default(),
            b.as_double().unwrap_or_default(),
        ))),
    },
};

/// Round down: `floor(value)`
#[distributed_slice(FUNCTIONS)]
static FLOOR: FunctionDescriptor = FunctionDescriptor {
    name: "floor",
    signature: "floor(value: long|double) -> long",
    doc: "Largest integral value not greater than the argument",
    params: &[ParamSpec::required("value", TypeTag::Double)],
    mutating: false,
    implementation: |args, _ctx| Ok(Value::Long(args.double("value")?.floor() as i64)),
};

/// Round up: `ceil(value)`
#[distributed_slice(FUNCTIONS)]
static CEIL: FunctionDescriptor = FunctionDescriptor {
    name: "ceil",
    signature: "ceil(value: long|double) -> long",
    doc: "Smallest integral value not less than the argument",
    params: &[ParamSpec::required("value", TypeTag::Double)],
    mutating: false,
    implementation: |args, _ctx| Ok(Value::Long(args.double("value")?.ceil() as i64)),
};

/// Round half away from zero: `round(value)`
#[distributed_slice(FUNCTIONS)]
static ROUND: FunctionDescriptor = FunctionDescriptor {
    name: "round",
    signature: "round(value: long|double) -> long",
    doc: "Nearest integral value, halves away from zero",
    params: &[ParamSpec::required("value", TypeTag::Double)],
    mutating: false,
    implementation: |args, _ctx| Ok(Value::Long(args.double("value")?.round() as i64)),
};

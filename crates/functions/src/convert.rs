//! Conversion Functions
//!
//! Lenient conversions between value kinds. Failed conversions yield the
//! caller-provided default instead of erroring, so rules keep flowing on
//! malformed input.

use linkme::distributed_slice;
use sluice_registry::{FunctionDescriptor, ParamSpec, FUNCTIONS};
use sluice_foundation::{TypeTag, Value};

/// To integral: `to_long(value, default)`
#[distributed_slice(FUNCTIONS)]
static TO_LONG: FunctionDescriptor = FunctionDescriptor {
    name: "to_long",
    signature: "to_long(value: any, default: long = 0) -> long",
    doc: "Converts numbers and numeric strings to a long",
    params: &[
        ParamSpec::required("value", TypeTag::Unknown),
        ParamSpec::optional("default", TypeTag::Long),
    ],
    mutating: false,
    implementation: |args, _ctx| {
        let fallback = match args.get("default") {
            Some(Value::Long(v)) => *v,
            _ => 0,
        };
        let converted = match args.value("value") {
            Value::Long(v) => v,
            Value::Double(v) => v as i64,
            Value::String(s) => s.trim().parse::<i64>().unwrap_or(fallback),
            _ => fallback,
        };
        Ok(Value::Long(converted))
    },
};

/// To floating: `to_double(value, default)`
#[distributed_slice(FUNCTIONS)]
static TO_DOUBLE: FunctionDescriptor = FunctionDescriptor {
    name: "to_double",
    signature: "to_double(value: any, default: double = 0.0) -> double",
    doc: "Converts numbers and numeric strings to a double",
    params: &[
        ParamSpec::required("value", TypeTag::Unknown),
        ParamSpec::optional("default", TypeTag::Double),
    ],
    mutating: false,
    implementation: |args, _ctx| {
        let fallback = args.get("default").and_then(Value::as_double).unwrap_or(0.0);
        let converted = match args.value("value") {
            Value::Long(v) => v as f64,
            Value::Double(v) => v,
            Value::String(s) => s.trim().parse::<f64>().unwrap_or(fallback),
            _ => fallback,
        };
        Ok(Value::Double(converted))
    },
};

/// To canonical string: `to_string(value)`
#[distributed_slice(FUNCTIONS)]
static TO_STRING: FunctionDescriptor = FunctionDescriptor {
    name: "to_string",
    signature: "to_string(value: any) -> string",
    doc: "Renders any value in its canonical string form",
    params: &[ParamSpec::required("value", TypeTag::Unknown)],
    mutating: false,
    implementation: |args, _ctx| Ok(Value::String(args.value("value").to_string())),
};

/// To boolean: `to_bool(value)`
///
/// Strings convert by case-insensitive `"true"` test; everything else
/// follows truthiness.
#[distributed_slice(FUNCTIONS)]
static TO_BOOL: FunctionDescriptor = FunctionDescriptor {
    name: "to_bool",
    signature: "to_bool(value: any) -> boolean",
    doc: "Converts strings and other values to a boolean",
    params: &[ParamSpec::required("value", TypeTag::Unknown)],
    mutating: false,
    implementation: |args, _ctx| {
        let converted = match args.value("value") {
            Value::Boolean(v) => v,
            Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
            other => other.is_truthy(),
        };
        Ok(Value::Boolean(converted))
    },
};

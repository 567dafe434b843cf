//! String Functions
//!
//! Pure string primitives operating on their arguments only.

use linkme::distributed_slice;
use sluice_registry::{FunctionDescriptor, ParamSpec, FUNCTIONS};
use sluice_foundation::{TypeTag, Value};

/// Upper-case: `uppercase(value)`
#[distributed_slice(FUNCTIONS)]
static UPPERCASE: FunctionDescriptor = FunctionDescriptor {
    name: "uppercase",
    signature: "uppercase(value: string) -> string",
    doc: "Upper-cases a string",
    params: &[ParamSpec::required("value", TypeTag::String)],
    mutating: false,
    implementation: |args, _ctx| Ok(Value::String(args.string("value")?.to_uppercase())),
};

/// Lower-case: `lowercase(value)`
#[distributed_slice(FUNCTIONS)]
static LOWERCASE: FunctionDescriptor = FunctionDescriptor {
    name: "lowercase",
    signature: "lowercase(value: string) -> string",
    doc: "Lower-cases a string",
    params: &[ParamSpec::required("value", TypeTag::String)],
    mutating: false,
    implementation: |args, _ctx| Ok(Value::String(args.string("value")?.to_lowercase())),
};

/// Trim surrounding whitespace: `trim(value)`
#[distributed_slice(FUNCTIONS)]
static TRIM: FunctionDescriptor = FunctionDescriptor {
    name: "trim",
    signature: "trim(value: string) -> string",
    doc: "Removes leading and trailing whitespace",
    params: &[ParamSpec::required("value", TypeTag::String)],
    mutating: false,
    implementation: |args, _ctx| Ok(Value::String(args.string("value")?.trim().to_string())),
};

/// Concatenation: `concat(first, second)`
///
/// Non-string operands are rendered in their canonical string form.
#[distributed_slice(FUNCTIONS)]
static CONCAT: FunctionDescriptor = FunctionDescriptor {
    name: "concat",
    signature: "concat(first: any, second: any) -> string",
    doc: "Concatenates the canonical string forms of two values",
    params: &[
        ParamSpec::required("first", TypeTag::Unknown),
        ParamSpec::required("second", TypeTag::Unknown),
    ],
    mutating: false,
    implementation: |args, _ctx| {
        Ok(Value::String(format!(
            "{}{}",
            args.value("first"),
            args.value("second")
        )))
    },
};

/// Substring search: `contains(value, search)`
#[distributed_slice(FUNCTIONS)]
static CONTAINS: FunctionDescriptor = FunctionDescriptor {
    name: "contains",
    signature: "contains(value: string, search: string) -> boolean",
    doc: "Whether a string contains another",
    params: &[
        ParamSpec::required("value", TypeTag::String),
        ParamSpec::required("search", TypeTag::String),
    ],
    mutating: false,
    implementation: |args, _ctx| {
        Ok(Value::Boolean(
            args.string("value")?.contains(args.string("search")?),
        ))
    },
};

/// Prefix test: `starts_with(value, prefix)`
#[distributed_slice(FUNCTIONS)]
static STARTS_WITH: FunctionDescriptor = FunctionDescriptor {
    name: "starts_with",
    signature: "starts_with(value: string, prefix: string) -> boolean",
    doc: "Whether a string starts with a prefix",
    params: &[
        ParamSpec::required("value", TypeTag::String),
        ParamSpec::required("prefix", TypeTag::String),
    ],
    mutating: false,
    implementation: |args, _ctx| {
        Ok(Value::Boolean(
            args.string("value")?.starts_with(args.string("prefix")?),
        ))
    },
};

/// Suffix test: `ends_with(value, suffix)`
#[distributed_slice(FUNCTIONS)]
static ENDS_WITH: FunctionDescriptor = FunctionDescriptor {
    name: "ends_with",
    signature: "ends_with(value: string, suffix: string) -> boolean",
    doc: "Whether a string ends with a suffix",
    params: &[
        ParamSpec::required("value", TypeTag::String),
        ParamSpec::required("suffix", TypeTag::String),
    ],
    mutating: false,
    implementation: |args, _ctx| {
        Ok(Value::Boolean(
            args.string("value")?.ends_with(args.string("suffix")?),
        ))
    },
};

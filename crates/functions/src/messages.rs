//! Message Functions
//!
//! Field access and the mutating primitives: field writes, stream
//! routing, dropping, and message creation. Mutating functions are
//! flagged in their descriptors; everything else in the library is
//! side-effect-free.

use linkme::distributed_slice;
use sluice_registry::{FunctionDescriptor, ParamSpec, FUNCTIONS};
use sluice_foundation::{Message, MessageHandle, TypeTag, Value};

fn target_handle(args: &sluice_registry::Arguments) -> MessageHandle {
    match args.get("message") {
        Some(Value::Message(handle)) => *handle,
        _ => MessageHandle::Current,
    }
}

/// Field presence: `has_field(field)`
#[distributed_slice(FUNCTIONS)]
static HAS_FIELD: FunctionDescriptor = FunctionDescriptor {
    name: "has_field",
    signature: "has_field(field: string) -> boolean",
    doc: "Whether the current message has a field",
    params: &[ParamSpec::required("field", TypeTag::String)],
    mutating: false,
    implementation: |args, ctx| {
        Ok(Value::Boolean(ctx.message().has_field(args.string("field")?)))
    },
};

/// Field read: `get_field(field)`
///
/// Missing fields read as `Null`.
#[distributed_slice(FUNCTIONS)]
static GET_FIELD: FunctionDescriptor = FunctionDescriptor {
    name: "get_field",
    signature: "get_field(field: string) -> any",
    doc: "Reads a field from the current message",
    params: &[ParamSpec::required("field", TypeTag::String)],
    mutating: false,
    implementation: |args, ctx| {
        Ok(ctx
            .message()
            .field(args.string("field")?)
            .cloned()
            .unwrap_or(Value::Null))
    },
};

/// Field write: `set_field(field, value, message)`
///
/// Writes to the current message unless a created-message handle is
/// passed as `message`.
#[distributed_slice(FUNCTIONS)]
static SET_FIELD: FunctionDescriptor = FunctionDescriptor {
    name: "set_field",
    signature: "set_field(field: string, value: any, message: message = current) -> void",
    doc: "Sets a field on a message",
    params: &[
        ParamSpec::required("field", TypeTag::String),
        ParamSpec::required("value", TypeTag::Unknown),
        ParamSpec::optional("message", TypeTag::Message),
    ],
    mutating: true,
    implementation: |args, ctx| {
        let field = args.string("field")?.to_string();
        let value = args.value("value");
        ctx.resolve_mut(target_handle(args))?.set_field(field, value);
        Ok(Value::Null)
    },
};

/// Field removal: `remove_field(field)`
#[distributed_slice(FUNCTIONS)]
static REMOVE_FIELD: FunctionDescriptor = FunctionDescriptor {
    name: "remove_field",
    signature: "remove_field(field: string) -> void",
    doc: "Removes a field from the current message",
    params: &[ParamSpec::required("field", TypeTag::String)],
    mutating: true,
    implementation: |args, ctx| {
        let field = args.string("field")?.to_string();
        ctx.message_mut().remove_field(&field);
        Ok(Value::Null)
    },
};

/// Drop: `drop_message()`
///
/// Marks the current message for discard at the end of the pass.
#[distributed_slice(FUNCTIONS)]
static DROP_MESSAGE: FunctionDescriptor = FunctionDescriptor {
    name: "drop_message",
    signature: "drop_message() -> void",
    doc: "Marks the current message to be discarded",
    params: &[],
    mutating: true,
    implementation: |_args, ctx| {
        ctx.message_mut().set_filter_out(true);
        Ok(Value::Null)
    },
};

/// Stream routing: `route_to_stream(stream)`
#[distributed_slice(FUNCTIONS)]
static ROUTE_TO_STREAM: FunctionDescriptor = FunctionDescriptor {
    name: "route_to_stream",
    signature: "route_to_stream(stream: string) -> void",
    doc: "Adds the current message to a stream",
    params: &[ParamSpec::required("stream", TypeTag::String)],
    mutating: true,
    implementation: |args, ctx| {
        let stream = args.string("stream")?.to_string();
        ctx.message_mut().add_stream(stream);
        Ok(Value::Null)
    },
};

/// Stream removal: `remove_from_stream(stream)`
#[distributed_slice(FUNCTIONS)]
static REMOVE_FROM_STREAM: FunctionDescriptor = FunctionDescriptor {
    name: "remove_from_stream",
    signature: "remove_from_stream(stream: string) -> void",
    doc: "Removes the current message from a stream",
    params: &[ParamSpec::required("stream", TypeTag::String)],
    mutating: true,
    implementation: |args, ctx| {
        let stream = args.string("stream")?.to_string().into();
        ctx.message_mut().remove_stream(&stream);
        Ok(Value::Null)
    },
};

/// Message creation: `create_message(id)`
///
/// The new message joins the interpreter's work set after the current
/// stage completes; the returned handle is usable within the creating
/// rule (e.g. with `set_field`).
#[distributed_slice(FUNCTIONS)]
static CREATE_MESSAGE: FunctionDescriptor = FunctionDescriptor {
    name: "create_message",
    signature: "create_message(id: string = derived) -> message",
    doc: "Creates a new message entering processing next pass",
    params: &[ParamSpec::optional("id", TypeTag::String)],
    mutating: true,
    implementation: |args, ctx| {
        let id = match args.get("id") {
            Some(Value::String(id)) => id.clone(),
            _ => format!(
                "{}#{}",
                ctx.message().id(),
                ctx.created_messages().len() + 1
            ),
        };
        let handle = ctx.create_message(Message::new(id));
        Ok(Value::Message(handle))
    },
};

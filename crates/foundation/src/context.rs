//! Per-evaluation scratch context.
//!
//! A fresh context is created for every (message × stage) pair and
//! discarded when the stage completes; variable bindings never leak
//! across stages. Messages created by rules accumulate here and are
//! drained into the interpreter's work set after each stage.

use indexmap::IndexMap;

use crate::error::ValueError;
use crate::message::Message;
use crate::value::{MessageHandle, Value};

/// Evaluation scratchpad for one message in one stage.
pub struct EvaluationContext<'a> {
    message: &'a mut Message,
    bindings: IndexMap<String, Value>,
    created: Vec<Message>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(message: &'a mut Message) -> Self {
        Self {
            message,
            bindings: IndexMap::new(),
            created: Vec::new(),
        }
    }

    /// The message under evaluation.
    pub fn message(&self) -> &Message {
        self.message
    }

    pub fn message_mut(&mut self) -> &mut Message {
        self.message
    }

    /// Look up a variable binding; absent names are simply unbound.
    pub fn var(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// Register a message created by a rule; returns a handle valid for
    /// this context only.
    pub fn create_message(&mut self, message: Message) -> MessageHandle {
        self.created.push(message);
        MessageHandle::Created(self.created.len() - 1)
    }

    pub fn created_messages(&self) -> &[Message] {
        &self.created
    }

    /// Take ownership of all created messages, leaving the context empty.
    pub fn drain_created(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.created)
    }

    /// Resolve a handle to the message it refers to.
    pub fn resolve(&self, handle: MessageHandle) -> Result<&Message, ValueError> {
        match handle {
            MessageHandle::Current => Ok(self.message),
            MessageHandle::Created(idx) => {
                self.created.get(idx).ok_or(ValueError::InvalidMessageHandle)
            }
        }
    }

    pub fn resolve_mut(&mut self, handle: MessageHandle) -> Result<&mut Message, ValueError> {
        match handle {
            MessageHandle::Current => Ok(self.message),
            MessageHandle::Created(idx) => self
                .created
                .get_mut(idx)
                .ok_or(ValueError::InvalidMessageHandle),
        }
    }

    /// Read a field through a handle; missing fields read as `Null`.
    pub fn field_of(&self, handle: MessageHandle, name: &str) -> Result<Value, ValueError> {
        Ok(self
            .resolve(handle)?
            .field(name)
            .cloned()
            .unwrap_or(Value::Null))
    }
}

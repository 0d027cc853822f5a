//! Evaluation context
//!
//! Per-message scratch space for one rule evaluation: the message under
//! evaluation, `let` bindings, messages created by actions and the errors
//! raised so far. A context is owned by the invocation that created it.

use crate::error::{Result, RuntimeError};
use crate::message::Message;
use sluice_core::Value;
use std::collections::HashMap;

pub const DEFAULT_STREAM: &str = "default";

/// Evaluation context bound to one message
#[derive(Debug)]
pub struct EvaluationContext<'m> {
    message: &'m mut dyn Message,
    variables: HashMap<String, Value>,
    created_messages: Vec<Box<dyn Message>>,
    errors: Vec<String>,
    default_stream: String,
}

impl<'m> EvaluationContext<'m> {
    /// Create a context for `message`
    pub fn new(message: &'m mut dyn Message) -> Self {
        Self {
            message,
            variables: HashMap::new(),
            created_messages: Vec::new(),
            errors: Vec::new(),
            default_stream: DEFAULT_STREAM.to_string(),
        }
    }

    /// Set the stream messages fall back to when they leave every other
    pub fn with_default_stream(mut self, stream: impl Into<String>) -> Self {
        self.default_stream = stream.into();
        self
    }

    pub fn message(&self) -> &dyn Message {
        &*self.message
    }

    pub fn message_mut(&mut self) -> &mut dyn Message {
        &mut *self.message
    }

    pub fn default_stream(&self) -> &str {
        &self.default_stream
    }

    /// Bind a variable
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Read a variable
    pub fn variable(&self, name: &str) -> Result<&Value> {
        self.variables
            .get(name)
            .ok_or_else(|| RuntimeError::UndefinedVariable(name.to_string()))
    }

    /// Forget all `let` bindings; each rule starts with an empty scope
    pub fn clear_variables(&mut self) {
        self.variables.clear();
    }

    /// Queue a message created by an action
    pub fn add_created_message(&mut self, message: Box<dyn Message>) {
        self.created_messages.push(message);
    }

    pub fn created_messages(&self) -> &[Box<dyn Message>] {
        &self.created_messages
    }

    pub fn take_created_messages(&mut self) -> Vec<Box<dyn Message>> {
        std::mem::take(&mut self.created_messages)
    }

    /// Record an evaluation error
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

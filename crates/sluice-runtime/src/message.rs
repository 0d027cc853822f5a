//! Message capability
//!
//! The engine only reads and writes messages through [`Message`]; it never
//! assumes how fields are stored. [`LogMessage`] is the in-memory
//! implementation used by the SDK, the CLI and the tests.

use crate::error::{Result, RuntimeError};
use chrono::{DateTime, Utc};
use sluice_core::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

pub const FIELD_ID: &str = "_id";
pub const FIELD_MESSAGE: &str = "message";
pub const FIELD_SOURCE: &str = "source";
pub const FIELD_TIMESTAMP: &str = "timestamp";

/// Operations the engine performs on a message
pub trait Message: Send + fmt::Debug {
    /// Stable identifier of this message
    fn id(&self) -> &str;

    fn get_field(&self, name: &str) -> Option<Value>;

    fn set_field(&mut self, name: &str, value: Value);

    fn remove_field(&mut self, name: &str) -> Option<Value>;

    fn has_field(&self, name: &str) -> bool {
        self.get_field(name).is_some()
    }

    fn field_names(&self) -> Vec<String>;

    /// Attach the message to a stream
    fn add_stream(&mut self, stream: &str);

    /// Detach the message from a stream; true if it was attached
    fn remove_stream(&mut self, stream: &str) -> bool;

    fn streams(&self) -> Vec<String>;

    /// Mark the message to be discarded after processing
    fn drop_message(&mut self);

    fn is_dropped(&self) -> bool;

    /// Copy of this message with a fresh id
    fn clone_boxed(&self) -> Box<dyn Message>;

    /// New empty message of the same kind
    fn spawn(&self) -> Box<dyn Message>;

    /// JSON rendering of the fields and streams
    fn to_json(&self) -> serde_json::Value {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .field_names()
            .into_iter()
            .filter_map(|name| self.get_field(&name).map(|value| (name, value.to_json())))
            .collect();
        serde_json::json!({
            "id": self.id(),
            "fields": fields,
            "streams": self.streams(),
        })
    }
}

/// In-memory message
#[derive(Debug, Clone, PartialEq)]
pub struct LogMessage {
    id: String,
    fields: BTreeMap<String, Value>,
    streams: BTreeSet<String>,
    dropped: bool,
}

impl LogMessage {
    /// Create a message with the standard `message`, `source` and
    /// `timestamp` fields
    pub fn new(message: impl Into<String>, source: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        let mut msg = Self::empty();
        msg.fields.insert(FIELD_MESSAGE.to_string(), Value::String(message.into()));
        msg.fields.insert(FIELD_SOURCE.to_string(), Value::String(source.into()));
        msg.fields.insert(FIELD_TIMESTAMP.to_string(), Value::DateTime(timestamp));
        msg
    }

    /// Create a message without fields
    pub fn empty() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            fields: BTreeMap::new(),
            streams: BTreeSet::new(),
            dropped: false,
        }
    }

    /// Create a message from a field map
    pub fn from_fields(fields: impl IntoIterator<Item = (String, Value)>) -> Self {
        let mut msg = Self::empty();
        msg.fields.extend(fields);
        msg
    }

    /// Create a message from a JSON object. An `_id` string becomes the
    /// message id and a `timestamp` in RFC 3339 becomes a date.
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(object) = json else {
            return Err(RuntimeError::InvalidMessage(
                "expected a JSON object".to_string(),
            ));
        };
        let mut msg = Self::empty();
        for (name, value) in object {
            match (name.as_str(), value) {
                (FIELD_ID, serde_json::Value::String(id)) => msg.id = id,
                (FIELD_TIMESTAMP, serde_json::Value::String(text)) => {
                    let value = DateTime::parse_from_rfc3339(&text)
                        .map(|dt| Value::DateTime(dt.with_timezone(&Utc)))
                        .unwrap_or(Value::String(text));
                    msg.fields.insert(name, value);
                }
                (_, value) => {
                    msg.fields.insert(name, Value::from(value));
                }
            }
        }
        Ok(msg)
    }

    /// Builder-style field setter
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Builder-style stream membership
    pub fn with_stream(mut self, stream: impl Into<String>) -> Self {
        self.streams.insert(stream.into());
        self
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }
}

impl Message for LogMessage {
    fn id(&self) -> &str {
        &self.id
    }

    fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }

    fn set_field(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }

    fn remove_field(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    fn add_stream(&mut self, stream: &str) {
        self.streams.insert(stream.to_string());
    }

    fn remove_stream(&mut self, stream: &str) -> bool {
        self.streams.remove(stream)
    }

    fn streams(&self) -> Vec<String> {
        self.streams.iter().cloned().collect()
    }

    fn drop_message(&mut self) {
        self.dropped = true;
    }

    fn is_dropped(&self) -> bool {
        self.dropped
    }

    fn clone_boxed(&self) -> Box<dyn Message> {
        Box::new(Self {
            id: Uuid::new_v4().to_string(),
            dropped: false,
            ..self.clone()
        })
    }

    fn spawn(&self) -> Box<dyn Message> {
        Box::new(Self::empty())
    }
}

//! Static types used by the type checker

use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The static type of an expression or parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Unknown until run time (message fields, untyped function results)
    Any,
    /// No usable value: unresolved identifiers and statement-only functions
    Void,
    Boolean,
    Long,
    Double,
    String,
    DateTime,
    Period,
    Duration,
    List,
    Map,
}

impl ValueType {
    /// Whether a parameter of this type accepts an argument of type `other`
    pub fn accepts(&self, other: ValueType) -> bool {
        *self == ValueType::Any || *self == other
    }

    /// Whether `expr[index]` is defined for this type
    pub fn is_indexable(&self) -> bool {
        matches!(self, ValueType::List | ValueType::Map)
    }

    /// Whether values of this type can be ordered with `<`, `>` and friends
    pub fn is_ordered(&self) -> bool {
        matches!(
            self,
            ValueType::Any
                | ValueType::Long
                | ValueType::Double
                | ValueType::String
                | ValueType::DateTime
                | ValueType::Duration
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Long | ValueType::Double)
    }

    /// Run-time type of a value. Null has no static type and reports `Any`.
    pub fn of(value: &Value) -> ValueType {
        match value {
            Value::Null => ValueType::Any,
            Value::Bool(_) => ValueType::Boolean,
            Value::Long(_) => ValueType::Long,
            Value::Double(_) => ValueType::Double,
            Value::String(_) => ValueType::String,
            Value::DateTime(_) => ValueType::DateTime,
            Value::Period(_) => ValueType::Period,
            Value::Duration(_) => ValueType::Duration,
            Value::List(_) => ValueType::List,
            Value::Map(_) => ValueType::Map,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Any => "any",
            ValueType::Void => "void",
            ValueType::Boolean => "boolean",
            ValueType::Long => "long",
            ValueType::Double => "double",
            ValueType::String => "string",
            ValueType::DateTime => "datetime",
            ValueType::Period => "period",
            ValueType::Duration => "duration",
            ValueType::List => "list",
            ValueType::Map => "map",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

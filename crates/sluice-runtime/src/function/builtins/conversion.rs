//! Conversion functions
//!
//! Each conversion takes any value and an optional `default` returned
//! when the value is null or cannot be converted.

use super::{describe, optional, required};
use crate::context::EvaluationContext;
use crate::error::Result;
use crate::function::{FunctionArgs, NativeFunction};
use sluice_core::{Value, ValueType};
use std::collections::BTreeMap;

pub(super) fn functions() -> Vec<NativeFunction> {
    vec![
        NativeFunction::new(
            describe("to_bool", ValueType::Boolean, "Converts a value to a boolean")
                .param(required("value", ValueType::Any))
                .param(optional("default", ValueType::Boolean).with_default(false)),
            to_bool,
        ),
        NativeFunction::new(
            describe("to_long", ValueType::Long, "Converts a value to a long")
                .param(required("value", ValueType::Any))
                .param(optional("default", ValueType::Long).with_default(0i64)),
            to_long,
        ),
        NativeFunction::new(
            describe("to_double", ValueType::Double, "Converts a value to a double")
                .param(required("value", ValueType::Any))
                .param(optional("default", ValueType::Double).with_default(0.0)),
            to_double,
        ),
        NativeFunction::new(
            describe("to_string", ValueType::String, "Converts a value to its string form")
                .param(required("value", ValueType::Any))
                .param(optional("default", ValueType::String).with_default("")),
            to_string,
        ),
        NativeFunction::new(
            describe("to_map", ValueType::Map, "Converts a map-like value to a map")
                .param(required("value", ValueType::Any))
                .param(optional("default", ValueType::Map)),
            to_map,
        ),
    ]
}

fn default_or(args: &FunctionArgs<'_>, fallback: Value) -> Value {
    args.get("default").cloned().unwrap_or(fallback)
}

fn to_bool(args: &FunctionArgs<'_>, _: &mut EvaluationContext<'_>) -> Result<Value> {
    let converted = match args.get("value") {
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::Long(n)) => Some(*n != 0),
        Some(Value::Double(n)) => Some(*n != 0.0),
        Some(Value::String(s)) => Some(s.trim().eq_ignore_ascii_case("true")),
        _ => None,
    };
    Ok(converted
        .map(Value::Bool)
        .unwrap_or_else(|| default_or(args, Value::Bool(false))))
}

fn to_long(args: &FunctionArgs<'_>, _: &mut EvaluationContext<'_>) -> Result<Value> {
    let converted = match args.get("value") {
        Some(Value::Long(n)) => Some(*n),
        Some(Value::Double(n)) if n.is_finite() => Some(n.trunc() as i64),
        Some(Value::Bool(b)) => Some(i64::from(*b)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(Value::DateTime(dt)) => Some(dt.timestamp_millis()),
        _ => None,
    };
    Ok(converted
        .map(Value::Long)
        .unwrap_or_else(|| default_or(args, Value::Long(0))))
}

fn to_double(args: &FunctionArgs<'_>, _: &mut EvaluationContext<'_>) -> Result<Value> {
    let converted = match args.get("value") {
        Some(Value::Double(n)) => Some(*n),
        Some(Value::Long(n)) => Some(*n as f64),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(converted
        .map(Value::Double)
        .unwrap_or_else(|| default_or(args, Value::Double(0.0))))
}

fn to_string(args: &FunctionArgs<'_>, _: &mut EvaluationContext<'_>) -> Result<Value> {
    Ok(match args.get("value") {
        Some(value) => Value::String(value.to_string()),
        None => default_or(args, Value::String(String::new())),
    })
}

fn to_map(args: &FunctionArgs<'_>, _: &mut EvaluationContext<'_>) -> Result<Value> {
    Ok(match args.get("value") {
        Some(Value::Map(map)) => Value::Map(map.clone()),
        _ => default_or(args, Value::Map(BTreeMap::new())),
    })
}

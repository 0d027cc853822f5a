//! Collection and miscellaneous functions

use super::{describe, required};
use crate::context::EvaluationContext;
use crate::error::Result;
use crate::function::{FunctionArgs, NativeFunction};
use sluice_core::{Value, ValueType};

pub(super) fn functions() -> Vec<NativeFunction> {
    vec![
        NativeFunction::new(
            describe("keys", ValueType::List, "Keys of a map")
                .param(required("value", ValueType::Map)),
            |args, _| {
                let map = args.map("value")?.cloned().unwrap_or_default();
                Ok(Value::List(map.into_keys().map(Value::String).collect()))
            },
        ),
        NativeFunction::new(
            describe("values", ValueType::List, "Values of a map")
                .param(required("value", ValueType::Map)),
            |args, _| {
                let map = args.map("value")?.cloned().unwrap_or_default();
                Ok(Value::List(map.into_values().collect()))
            },
        ),
        NativeFunction::new(
            describe("first_non_null", ValueType::Any, "First element that is not null")
                .param(required("value", ValueType::List)),
            |args, _| {
                let list = args.list("value")?.unwrap_or_default();
                Ok(list.iter().find(|v| !v.is_null()).cloned().unwrap_or(Value::Null))
            },
        ),
        NativeFunction::new(
            describe("parse_json", ValueType::Any, "Parses a JSON document")
                .param(required("value", ValueType::String)),
            parse_json,
        ),
        NativeFunction::new(
            describe("debug", ValueType::Void, "Logs a value")
                .param(required("value", ValueType::Any)),
            |args, ctx| {
                let value = args.get("value").cloned().unwrap_or(Value::Null);
                tracing::info!(message_id = %ctx.message().id(), "pipeline debug: {}", value);
                Ok(Value::Null)
            },
        ),
    ]
}

fn parse_json(args: &FunctionArgs<'_>, _: &mut EvaluationContext<'_>) -> Result<Value> {
    let text = args.required_string("value")?;
    serde_json::from_str::<serde_json::Value>(text)
        .map(Value::from)
        .map_err(|e| args.invalid(format!("invalid JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::Function;
    use crate::message::LogMessage;
    use std::collections::BTreeMap;

    fn call(name: &str, values: Vec<Option<Value>>) -> Result<Value> {
        let functions = functions();
        let function = functions.iter().find(|f| f.descriptor().name == name).unwrap();
        let mut msg = LogMessage::empty();
        let mut ctx = EvaluationContext::new(&mut msg);
        function.evaluate(&FunctionArgs::new(function.descriptor(), values), &mut ctx)
    }

    fn sample_map() -> Value {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), Value::Long(2));
        map.insert("a".to_string(), Value::Long(1));
        Value::Map(map)
    }

    #[test]
    fn test_keys_and_values_are_ordered() {
        assert_eq!(
            call("keys", vec![Some(sample_map())]),
            Ok(Value::List(vec![Value::from("a"), Value::from("b")]))
        );
        assert_eq!(
            call("values", vec![Some(sample_map())]),
            Ok(Value::List(vec![Value::Long(1), Value::Long(2)]))
        );
    }

    #[test]
    fn test_first_non_null() {
        let list = Value::List(vec![Value::Null, Value::from("x"), Value::from("y")]);
        assert_eq!(call("first_non_null", vec![Some(list)]), Ok(Value::from("x")));
        assert_eq!(
            call("first_non_null", vec![Some(Value::List(vec![Value::Null]))]),
            Ok(Value::Null)
        );
    }

    #[test]
    fn test_parse_json() {
        let parsed = call("parse_json", vec![Some(Value::from(r#"{"n": 1}"#))]).unwrap();
        assert_eq!(parsed.as_map().and_then(|m| m.get("n")), Some(&Value::Long(1)));
        assert!(call("parse_json", vec![Some(Value::from("{"))]).is_err());
    }
}

//! Run-time type tests

use super::{describe, required};
use crate::context::EvaluationContext;
use crate::error::Result;
use crate::function::{FunctionArgs, NativeFunction};
use sluice_core::{Value, ValueType};

pub(super) fn functions() -> Vec<NativeFunction> {
    vec![
        test("is_null", is_null),
        test("is_not_null", |args, ctx| Ok(Value::Bool(is_null(args, ctx)? == Value::Bool(false)))),
        test("is_bool", |args, _| Ok(Value::Bool(matches!(args.get("value"), Some(Value::Bool(_)))))),
        test("is_number", |args, _| {
            Ok(Value::Bool(matches!(args.get("value"), Some(Value::Long(_) | Value::Double(_)))))
        }),
        test("is_long", |args, _| Ok(Value::Bool(matches!(args.get("value"), Some(Value::Long(_)))))),
        test("is_double", |args, _| Ok(Value::Bool(matches!(args.get("value"), Some(Value::Double(_)))))),
        test("is_string", |args, _| Ok(Value::Bool(matches!(args.get("value"), Some(Value::String(_)))))),
        test("is_list", |args, _| Ok(Value::Bool(matches!(args.get("value"), Some(Value::List(_)))))),
        test("is_map", |args, _| Ok(Value::Bool(matches!(args.get("value"), Some(Value::Map(_)))))),
        test("is_date", |args, _| Ok(Value::Bool(matches!(args.get("value"), Some(Value::DateTime(_)))))),
        test("is_period", |args, _| Ok(Value::Bool(matches!(args.get("value"), Some(Value::Period(_)))))),
    ]
}

fn test(
    name: &str,
    body: fn(&FunctionArgs<'_>, &mut EvaluationContext<'_>) -> Result<Value>,
) -> NativeFunction {
    NativeFunction::new(
        describe(name, ValueType::Boolean, "Checks the run-time type of a value")
            .param(required("value", ValueType::Any)),
        body,
    )
}

fn is_null(args: &FunctionArgs<'_>, _: &mut EvaluationContext<'_>) -> Result<Value> {
    Ok(Value::Bool(args.get("value").is_none()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::Function;
    use crate::message::LogMessage;

    fn check(name: &str, value: Value) -> bool {
        let functions = functions();
        let function = functions.iter().find(|f| f.descriptor().name == name).unwrap();
        let mut msg = LogMessage::empty();
        let mut ctx = EvaluationContext::new(&mut msg);
        let args = FunctionArgs::new(function.descriptor(), vec![Some(value)]);
        function.evaluate(&args, &mut ctx).unwrap() == Value::Bool(true)
    }

    #[test]
    fn test_type_checks() {
        assert!(check("is_null", Value::Null));
        assert!(!check("is_not_null", Value::Null));
        assert!(check("is_number", Value::Double(1.0)));
        assert!(!check("is_long", Value::Double(1.0)));
        assert!(check("is_string", Value::from("s")));
        assert!(check("is_list", Value::List(vec![])));
    }
}

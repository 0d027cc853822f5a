//! Message functions
//!
//! Read and mutate the message under evaluation, route it between streams
//! and create new messages.

use super::{describe, optional, required};
use crate::context::EvaluationContext;
use crate::error::Result;
use crate::function::{FunctionArgs, NativeFunction};
use crate::message::{FIELD_MESSAGE, FIELD_SOURCE, FIELD_TIMESTAMP};
use chrono::Utc;
use sluice_core::{Value, ValueType};

pub(super) fn functions() -> Vec<NativeFunction> {
    vec![
        NativeFunction::new(
            describe("has_field", ValueType::Boolean, "Checks whether the message has a field")
                .param(required("field", ValueType::String)),
            has_field,
        ),
        NativeFunction::new(
            describe("set_field", ValueType::Void, "Sets a field, ignoring null values")
                .param(required("field", ValueType::String))
                .param(required("value", ValueType::Any))
                .param(optional("prefix", ValueType::String))
                .param(optional("suffix", ValueType::String)),
            set_field,
        ),
        NativeFunction::new(
            describe("set_fields", ValueType::Void, "Sets every entry of a map as a field")
                .param(required("fields", ValueType::Map))
                .param(optional("prefix", ValueType::String))
                .param(optional("suffix", ValueType::String)),
            set_fields,
        ),
        NativeFunction::new(
            describe("rename_field", ValueType::Void, "Renames a field if present")
                .param(required("old_field", ValueType::String))
                .param(required("new_field", ValueType::String)),
            rename_field,
        ),
        NativeFunction::new(
            describe("remove_field", ValueType::Void, "Removes a field")
                .param(required("field", ValueType::String)),
            remove_field,
        ),
        NativeFunction::new(
            describe("drop_message", ValueType::Void, "Discards the message after this stage"),
            |_, ctx| {
                ctx.message_mut().drop_message();
                Ok(Value::Null)
            },
        ),
        NativeFunction::new(
            describe("route_to_stream", ValueType::Void, "Attaches the message to a stream")
                .param(required("name", ValueType::String))
                .param(optional("remove_from_default", ValueType::Boolean).with_default(false)),
            route_to_stream,
        ),
        NativeFunction::new(
            describe("remove_from_stream", ValueType::Void, "Detaches the message from a stream")
                .param(required("name", ValueType::String)),
            remove_from_stream,
        ),
        NativeFunction::new(
            describe("create_message", ValueType::Void, "Emits a new message")
                .param(optional("message", ValueType::String))
                .param(optional("source", ValueType::String))
                .param(optional("timestamp", ValueType::DateTime)),
            create_message,
        ),
        NativeFunction::new(
            describe("clone_message", ValueType::Void, "Emits a copy of the message"),
            |_, ctx| {
                let copy = ctx.message().clone_boxed();
                ctx.add_created_message(copy);
                Ok(Value::Null)
            },
        ),
    ]
}

fn decorated(args: &FunctionArgs<'_>, name: &str) -> Result<String> {
    Ok(format!(
        "{}{}{}",
        args.string("prefix")?.unwrap_or_default(),
        name,
        args.string("suffix")?.unwrap_or_default()
    ))
}

fn has_field(args: &FunctionArgs<'_>, ctx: &mut EvaluationContext<'_>) -> Result<Value> {
    let field = args.required_string("field")?;
    Ok(Value::Bool(ctx.message().has_field(field)))
}

fn set_field(args: &FunctionArgs<'_>, ctx: &mut EvaluationContext<'_>) -> Result<Value> {
    let field = args.required_string("field")?;
    if let (false, Some(value)) = (field.is_empty(), args.get("value")) {
        let name = decorated(args, field)?;
        ctx.message_mut().set_field(&name, value.clone());
    }
    Ok(Value::Null)
}

fn set_fields(args: &FunctionArgs<'_>, ctx: &mut EvaluationContext<'_>) -> Result<Value> {
    let Some(fields) = args.map("fields")? else {
        return Ok(Value::Null);
    };
    for (field, value) in fields.iter().filter(|(_, value)| !value.is_null()) {
        let name = decorated(args, field)?;
        ctx.message_mut().set_field(&name, value.clone());
    }
    Ok(Value::Null)
}

fn rename_field(args: &FunctionArgs<'_>, ctx: &mut EvaluationContext<'_>) -> Result<Value> {
    let old_field = args.required_string("old_field")?;
    let new_field = args.required_string("new_field")?;
    if old_field != new_field {
        if let Some(value) = ctx.message_mut().remove_field(old_field) {
            ctx.message_mut().set_field(new_field, value);
        }
    }
    Ok(Value::Null)
}

fn remove_field(args: &FunctionArgs<'_>, ctx: &mut EvaluationContext<'_>) -> Result<Value> {
    let field = args.required_string("field")?;
    ctx.message_mut().remove_field(field);
    Ok(Value::Null)
}

fn route_to_stream(args: &FunctionArgs<'_>, ctx: &mut EvaluationContext<'_>) -> Result<Value> {
    let stream = args.required_string("name")?;
    ctx.message_mut().add_stream(stream);
    if args.bool("remove_from_default")?.unwrap_or(false) && stream != ctx.default_stream() {
        let default_stream = ctx.default_stream().to_string();
        ctx.message_mut().remove_stream(&default_stream);
    }
    Ok(Value::Null)
}

/// A message never ends up without streams; it falls back to the default
fn remove_from_stream(args: &FunctionArgs<'_>, ctx: &mut EvaluationContext<'_>) -> Result<Value> {
    let stream = args.required_string("name")?;
    ctx.message_mut().remove_stream(stream);
    if ctx.message().streams().is_empty() {
        let default_stream = ctx.default_stream().to_string();
        ctx.message_mut().add_stream(&default_stream);
    }
    Ok(Value::Null)
}

fn create_message(args: &FunctionArgs<'_>, ctx: &mut EvaluationContext<'_>) -> Result<Value> {
    let mut created = ctx.message().spawn();
    created.set_field(
        FIELD_MESSAGE,
        Value::from(args.string("message")?.unwrap_or_default()),
    );
    created.set_field(
        FIELD_SOURCE,
        Value::from(args.string("source")?.unwrap_or_default()),
    );
    created.set_field(
        FIELD_TIMESTAMP,
        Value::DateTime(args.datetime("timestamp")?.unwrap_or_else(Utc::now)),
    );
    ctx.add_created_message(created);
    Ok(Value::Null)
}

//! Callable functions
//!
//! Every function the rule language can call implements [`Function`]: a
//! static descriptor plus an evaluation entry point. Built-ins are
//! [`NativeFunction`] values, a descriptor paired with a closure; plugins
//! may implement the trait directly.

pub mod builtins;
pub mod registry;

pub use registry::{FunctionRegistry, FunctionRegistryBuilder};

use crate::context::EvaluationContext;
use crate::error::{Result, RuntimeError};
use chrono::{DateTime, Utc};
use sluice_core::{FunctionDescriptor, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A function callable from rules
pub trait Function: Send + Sync {
    fn descriptor(&self) -> &FunctionDescriptor;

    fn evaluate(&self, args: &FunctionArgs<'_>, ctx: &mut EvaluationContext<'_>) -> Result<Value>;

    /// Validate arguments known before evaluation, one slot per parameter
    fn check_constant_args(&self, _args: &[Option<&Value>]) -> std::result::Result<(), String> {
        Ok(())
    }
}

impl fmt::Debug for dyn Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.descriptor().name)
    }
}

type Body = Box<dyn Fn(&FunctionArgs<'_>, &mut EvaluationContext<'_>) -> Result<Value> + Send + Sync>;
type Preflight = fn(&[Option<&Value>]) -> std::result::Result<(), String>;

/// A function implemented by a Rust closure
pub struct NativeFunction {
    descriptor: FunctionDescriptor,
    body: Body,
    preflight: Option<Preflight>,
}

impl NativeFunction {
    pub fn new<F>(descriptor: FunctionDescriptor, body: F) -> Self
    where
        F: Fn(&FunctionArgs<'_>, &mut EvaluationContext<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            descriptor,
            body: Box::new(body),
            preflight: None,
        }
    }

    /// Attach a check for constant arguments
    pub fn with_preflight(mut self, preflight: Preflight) -> Self {
        self.preflight = Some(preflight);
        self
    }
}

impl Function for NativeFunction {
    fn descriptor(&self) -> &FunctionDescriptor {
        &self.descriptor
    }

    fn evaluate(&self, args: &FunctionArgs<'_>, ctx: &mut EvaluationContext<'_>) -> Result<Value> {
        (self.body)(args, ctx)
    }

    fn check_constant_args(&self, args: &[Option<&Value>]) -> std::result::Result<(), String> {
        match self.preflight {
            Some(preflight) => preflight(args),
            None => Ok(()),
        }
    }
}

/// Evaluated arguments of one call, one slot per declared parameter.
///
/// Getters treat null like an omitted argument. Typed getters fail with
/// [`RuntimeError::InvalidArgument`] when the value has another type.
#[derive(Debug)]
pub struct FunctionArgs<'d> {
    descriptor: &'d FunctionDescriptor,
    values: Vec<Option<Value>>,
}

impl<'d> FunctionArgs<'d> {
    pub fn new(descriptor: &'d FunctionDescriptor, values: Vec<Option<Value>>) -> Self {
        Self { descriptor, values }
    }

    pub fn function(&self) -> &str {
        &self.descriptor.name
    }

    /// The argument for `name`, if present and not null
    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.descriptor.param_index(name)?;
        self.values
            .get(index)
            .and_then(Option::as_ref)
            .filter(|value| !value.is_null())
    }

    /// The argument for `name`, failing when absent or null
    pub fn required(&self, name: &str) -> Result<&Value> {
        self.get(name).ok_or_else(|| RuntimeError::MissingArgument {
            function: self.descriptor.name.clone(),
            parameter: name.to_string(),
        })
    }

    pub fn invalid(&self, message: impl Into<String>) -> RuntimeError {
        RuntimeError::InvalidArgument {
            function: self.descriptor.name.clone(),
            message: message.into(),
        }
    }

    fn typed<'a, T>(
        &'a self,
        name: &str,
        expected: &str,
        extract: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Result<Option<T>> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => extract(value).map(Some).ok_or_else(|| {
                self.invalid(format!("'{}' must be a {}, got {}", name, expected, value))
            }),
        }
    }

    pub fn string(&self, name: &str) -> Result<Option<&str>> {
        self.typed(name, "string", Value::as_str)
    }

    pub fn required_string(&self, name: &str) -> Result<&str> {
        self.required(name)?;
        self.string(name)?.ok_or_else(|| self.invalid(format!("'{}' is required", name)))
    }

    pub fn long(&self, name: &str) -> Result<Option<i64>> {
        self.typed(name, "long", |value| match value {
            Value::Long(n) => Some(*n),
            _ => None,
        })
    }

    pub fn required_long(&self, name: &str) -> Result<i64> {
        self.required(name)?;
        self.long(name)?.ok_or_else(|| self.invalid(format!("'{}' is required", name)))
    }

    pub fn bool(&self, name: &str) -> Result<Option<bool>> {
        self.typed(name, "boolean", Value::as_bool)
    }

    pub fn list(&self, name: &str) -> Result<Option<&[Value]>> {
        self.typed(name, "list", Value::as_list)
    }

    pub fn map(&self, name: &str) -> Result<Option<&BTreeMap<String, Value>>> {
        self.typed(name, "map", Value::as_map)
    }

    pub fn datetime(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        self.typed(name, "date", Value::as_datetime)
    }
}

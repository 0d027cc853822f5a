//! Built-in function library
//!
//! Each module contributes a list of [`NativeFunction`]s; [`all`] is the
//! table registered by [`FunctionRegistryBuilder::with_builtins`].
//!
//! [`FunctionRegistryBuilder::with_builtins`]: super::FunctionRegistryBuilder::with_builtins

mod collections;
mod conversion;
mod dates;
mod message;
mod strings;
mod type_tests;

use super::NativeFunction;
use sluice_core::{FunctionDescriptor, ParameterDescriptor, ValueType};

/// Every built-in function
pub fn all() -> Vec<NativeFunction> {
    let mut functions = Vec::new();
    functions.extend(conversion::functions());
    functions.extend(type_tests::functions());
    functions.extend(message::functions());
    functions.extend(strings::functions());
    functions.extend(dates::functions());
    functions.extend(collections::functions());
    functions
}

fn required(name: &str, ty: ValueType) -> ParameterDescriptor {
    ParameterDescriptor::required(name, ty)
}

fn optional(name: &str, ty: ValueType) -> ParameterDescriptor {
    ParameterDescriptor::optional(name, ty)
}

fn describe(name: &str, return_type: ValueType, description: &str) -> FunctionDescriptor {
    FunctionDescriptor::new(name, return_type).with_description(description)
}

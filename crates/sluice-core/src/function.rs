//! Function descriptors
//!
//! A descriptor is the static signature of a callable: its name, return
//! type and ordered parameters. The analyzer binds call sites against
//! descriptors looked up through a [`FunctionCatalog`]; the runtime's
//! function registry is the catalog used in production.

use crate::types::{Value, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Static signature of a function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub name: String,
    pub return_type: ValueType,
    pub params: Vec<ParameterDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A single declared parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub ty: ValueType,
    pub optional: bool,
    /// Value bound when an optional parameter is omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FunctionDescriptor {
    /// Create a descriptor without parameters
    pub fn new(name: impl Into<String>, return_type: ValueType) -> Self {
        Self {
            name: name.into(),
            return_type,
            params: Vec::new(),
            description: None,
        }
    }

    /// Append a parameter
    pub fn param(mut self, param: ParameterDescriptor) -> Self {
        self.params.push(param);
        self
    }

    /// Set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Position of a parameter by name
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    /// Number of parameters that must be supplied
    pub fn required_count(&self) -> usize {
        self.params.iter().filter(|p| !p.optional).count()
    }

    /// Check the descriptor itself for duplicate parameter names
    pub fn duplicate_param(&self) -> Option<&str> {
        self.params.iter().enumerate().find_map(|(i, p)| {
            self.params[..i]
                .iter()
                .any(|earlier| earlier.name == p.name)
                .then_some(p.name.as_str())
        })
    }
}

impl ParameterDescriptor {
    /// A required parameter
    pub fn required(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            default: None,
            description: None,
        }
    }

    /// An optional parameter without a default
    pub fn optional(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            optional: true,
            ..Self::required(name, ty)
        }
    }

    /// Set the default bound when the parameter is omitted
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Lookup of function descriptors by name
pub trait FunctionCatalog {
    fn descriptor(&self, name: &str) -> Option<&FunctionDescriptor>;

    /// Validate arguments that are known before evaluation, such as a
    /// literal regular expression. `args` has one slot per declared
    /// parameter holding the constant value, if there is one.
    fn check_constant_args(&self, _name: &str, _args: &[Option<&Value>]) -> Result<(), String> {
        Ok(())
    }
}

impl FunctionCatalog for HashMap<String, FunctionDescriptor> {
    fn descriptor(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.get(name)
    }
}

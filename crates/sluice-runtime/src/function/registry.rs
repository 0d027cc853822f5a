//! Function registry
//!
//! Built once at startup and frozen; afterwards it is only read, by the
//! analyzer through [`FunctionCatalog`] and by both evaluators when they
//! resolve calls.

use super::{builtins, Function};
use crate::error::{Result, RuntimeError};
use sluice_core::{FunctionCatalog, FunctionDescriptor, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Name to function mapping
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn Function>>,
}

impl FunctionRegistry {
    pub fn builder() -> FunctionRegistryBuilder {
        FunctionRegistryBuilder::default()
    }

    /// Registry holding only the built-in library
    pub fn with_builtins() -> Result<Self> {
        Ok(Self::builder().with_builtins()?.build())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Function>> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl FunctionCatalog for FunctionRegistry {
    fn descriptor(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.get(name).map(|function| function.descriptor())
    }

    fn check_constant_args(&self, name: &str, args: &[Option<&Value>]) -> std::result::Result<(), String> {
        match self.functions.get(name) {
            Some(function) => function.check_constant_args(args),
            None => Ok(()),
        }
    }
}

/// Collects functions before the registry is frozen
#[derive(Default)]
pub struct FunctionRegistryBuilder {
    functions: HashMap<String, Arc<dyn Function>>,
}

impl FunctionRegistryBuilder {
    /// Register one function. Duplicate names and descriptors that
    /// repeat a parameter name are rejected.
    pub fn register(mut self, function: impl Function + 'static) -> Result<Self> {
        self.insert(Arc::new(function))?;
        Ok(self)
    }

    /// Register a shared function
    pub fn register_arc(mut self, function: Arc<dyn Function>) -> Result<Self> {
        self.insert(function)?;
        Ok(self)
    }

    /// Register the built-in library
    pub fn with_builtins(mut self) -> Result<Self> {
        for function in builtins::all() {
            self.insert(Arc::new(function))?;
        }
        Ok(self)
    }

    fn insert(&mut self, function: Arc<dyn Function>) -> Result<()> {
        let descriptor = function.descriptor();
        if let Some(parameter) = descriptor.duplicate_param() {
            return Err(RuntimeError::DuplicateParameter {
                function: descriptor.name.clone(),
                parameter: parameter.to_string(),
            });
        }
        if self.functions.contains_key(&descriptor.name) {
            return Err(RuntimeError::DuplicateFunction(descriptor.name.clone()));
        }
        tracing::trace!(function = %descriptor.name, "Registered function");
        self.functions.insert(descriptor.name.clone(), function);
        Ok(())
    }

    pub fn build(self) -> FunctionRegistry {
        tracing::debug!(functions = self.functions.len(), "Function registry built");
        FunctionRegistry {
            functions: self.functions,
        }
    }
}

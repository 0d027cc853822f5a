//! Builder pattern for PipelineEngine

use crate::config::EngineConfig;
use crate::definitions::Definitions;
use crate::engine::PipelineEngine;
use crate::error::Result;
use sluice_runtime::{Function, FunctionRegistry};
use std::sync::Arc;

/// Builder for PipelineEngine
///
/// # Example
///
/// ```rust,ignore
/// use sluice_sdk::{Definitions, EngineBuilder, EngineConfig};
///
/// let engine = EngineBuilder::new()
///     .with_config(EngineConfig::load()?)
///     .with_function(lookup_table)
///     .with_definitions(Definitions::from_dir("rules")?)
///     .build()?;
///
/// let output = engine.process(vec![Box::new(message)]);
/// ```
pub struct EngineBuilder {
    config: EngineConfig,
    functions: Vec<Arc<dyn Function>>,
    builtins: bool,
    definitions: Option<Definitions>,
}

impl EngineBuilder {
    /// Create a new builder with the built-in functions enabled
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            functions: Vec::new(),
            builtins: true,
            definitions: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Register an additional function. Names must not collide.
    pub fn with_function(mut self, function: impl Function + 'static) -> Self {
        self.functions.push(Arc::new(function));
        self
    }

    pub fn with_shared_function(mut self, function: Arc<dyn Function>) -> Self {
        self.functions.push(function);
        self
    }

    /// Include the built-in function library (on by default)
    pub fn with_builtins(mut self, enabled: bool) -> Self {
        self.builtins = enabled;
        self
    }

    /// Definitions to load right after the engine is built
    pub fn with_definitions(mut self, definitions: Definitions) -> Self {
        self.definitions = Some(definitions);
        self
    }

    /// Freeze the function registry and build the engine
    pub fn build(self) -> Result<PipelineEngine> {
        let mut registry = FunctionRegistry::builder();
        if self.builtins {
            registry = registry.with_builtins()?;
        }
        for function in self.functions {
            registry = registry.register_arc(function)?;
        }
        let registry = registry.build();
        tracing::debug!(functions = registry.len(), "function registry frozen");

        let engine = PipelineEngine::new(registry, self.config);
        if let Some(definitions) = &self.definitions {
            engine.load(definitions);
        }
        Ok(engine)
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

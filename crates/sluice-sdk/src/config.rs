//! Configuration types for PipelineEngine

use crate::error::{Result, SdkError};
use serde::{Deserialize, Serialize};
use sluice_runtime::{InterpreterOptions, DEFAULT_PROCESSING_ERROR_FIELD, DEFAULT_STREAM};
use std::path::Path;

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Compile validated rules into IR programs instead of walking the AST
    pub allow_code_generation: bool,

    /// Field that collects run-time rule failures on a message
    pub processing_error_field: String,

    /// Stream assigned to messages that arrive without one
    pub default_stream: String,

    /// Keep per-rule counters
    pub record_metrics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            allow_code_generation: true,
            processing_error_field: DEFAULT_PROCESSING_ERROR_FIELD.to_string(),
            default_stream: DEFAULT_STREAM.to_string(),
            record_metrics: true,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_code_generation(mut self, enabled: bool) -> Self {
        self.allow_code_generation = enabled;
        self
    }

    pub fn with_processing_error_field(mut self, field: impl Into<String>) -> Self {
        self.processing_error_field = field.into();
        self
    }

    pub fn with_default_stream(mut self, stream: impl Into<String>) -> Self {
        self.default_stream = stream.into();
        self
    }

    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.record_metrics = enabled;
        self
    }

    /// Load configuration from `config/sluice` and `SLUICE_*` environment variables
    pub fn load() -> Result<Self> {
        let config_result = config::Config::builder()
            .add_source(config::File::with_name("config/sluice").required(false))
            .add_source(Self::environment())
            .build();

        match config_result {
            Ok(cfg) => Self::deserialize_from(cfg),
            Err(e) => {
                tracing::info!("No usable config file ({}), using default configuration", e);
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from an explicit file, still honouring the environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(Self::environment())
            .build()
            .map_err(|e| SdkError::ConfigError(e.to_string()))?;
        Self::deserialize_from(cfg)
    }

    /// Options handed to the pipeline interpreter
    pub fn interpreter_options(&self) -> InterpreterOptions {
        InterpreterOptions {
            processing_error_field: self.processing_error_field.clone(),
            default_stream: self.default_stream.clone(),
        }
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix("SLUICE").try_parsing(true)
    }

    fn deserialize_from(cfg: config::Config) -> Result<Self> {
        cfg.try_deserialize()
            .map_err(|e| SdkError::ConfigError(format!("Failed to deserialize config: {}", e)))
    }
}

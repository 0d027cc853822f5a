//! Sluice pipeline rule engine SDK
//!
//! High-level API for loading rules, pipelines and stream connections and
//! running messages through them.
//!
//! ```rust,ignore
//! use sluice_sdk::{Definitions, EngineBuilder, LogMessage};
//!
//! let engine = EngineBuilder::new().build()?;
//! engine.load(&Definitions::from_dir("rules")?);
//! let (messages, trace) = engine.evaluate("main", Box::new(LogMessage::empty()))?;
//! ```

pub mod builder;
pub mod config;
pub mod definitions;
pub mod engine;
pub mod error;
pub mod state;

// Re-export main types
pub use builder::EngineBuilder;
pub use config::EngineConfig;
pub use definitions::{Connections, Definitions, SourceDefinition};
pub use engine::PipelineEngine;
pub use error::{Result, SdkError};
pub use state::{DefinitionErrors, EngineState, LoadReport};

// Re-export commonly used types from dependencies
pub use sluice_compiler::{ValidatedPipeline, ValidatedRule};
pub use sluice_core::{RuleError, Value};
pub use sluice_runtime::{
    ExecutionTrace, Function, InterpreterListener, LogMessage, Message, MetricsSnapshot,
    NativeFunction,
};

//! Sluice Runtime - Evaluation engine for validated rules
//!
//! This crate evaluates validated rules against messages, either by
//! walking the AST or by running compiled IR, and drives messages through
//! multi-stage pipelines.

pub mod context;
pub mod engine;
pub mod error;
pub mod function;
pub mod message;
pub mod observability;
pub mod pipeline;
pub mod pipeline_interpreter;
pub mod result;
pub mod rule;

// Re-export main types
pub use context::{EvaluationContext, DEFAULT_STREAM};
pub use engine::{Interpreter, LinkedProgram};
pub use error::{Result, RuntimeError};
pub use function::registry::{FunctionRegistry, FunctionRegistryBuilder};
pub use function::{Function, FunctionArgs, NativeFunction};
pub use message::{LogMessage, Message};
pub use observability::{MetricsSnapshot, RuleMetrics};
pub use pipeline::{RuntimePipeline, RuntimeStage, StreamConnections};
pub use pipeline_interpreter::{
    InterpreterOptions, PipelineInterpreter, DEFAULT_PROCESSING_ERROR_FIELD,
};
pub use result::{ExecutionTrace, InterpreterListener, NoopListener, TraceRecorder};
pub use rule::{CompiledRule, ExecutableRule, InterpretedRule, PlaceholderRule};

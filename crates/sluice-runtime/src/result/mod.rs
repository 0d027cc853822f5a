//! Execution listeners and traces

mod trace;

pub use trace::{
    ExecutionTrace, InterpreterListener, NoopListener, PipelineTrace, RuleTrace, StageTrace,
    TraceRecorder,
};

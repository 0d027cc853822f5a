//! PipelineEngine - validates definitions and runs messages through pipelines

use crate::config::EngineConfig;
use crate::definitions::Definitions;
use crate::error::{Result, SdkError};
use crate::state::{EngineState, LoadReport};
use arc_swap::ArcSwap;
use sluice_compiler::{Compiler, ValidatedPipeline, ValidatedRule};
use sluice_core::RuleError;
use sluice_runtime::{
    ExecutionTrace, FunctionRegistry, InterpreterListener, Message, MetricsSnapshot, NoopListener,
    TraceRecorder,
};
use std::path::Path;
use std::sync::Arc;

/// The pipeline rule engine
///
/// The function registry is frozen when the engine is built. Loaded rules
/// and pipelines live in an [`EngineState`] snapshot that [`load`] replaces
/// atomically; every call that processes messages works on the snapshot
/// current when it started. The engine is `Send + Sync` and meant to be
/// shared across worker threads behind an `Arc`.
///
/// [`load`]: PipelineEngine::load
#[derive(Debug)]
pub struct PipelineEngine {
    registry: Arc<FunctionRegistry>,
    config: EngineConfig,
    state: ArcSwap<EngineState>,
}

impl PipelineEngine {
    pub(crate) fn new(registry: FunctionRegistry, config: EngineConfig) -> Self {
        let state = EngineState::empty(&config);
        Self {
            registry: Arc::new(registry),
            config,
            state: ArcSwap::from_pointee(state),
        }
    }

    /// Validate rule source against the engine's functions
    pub fn parse_rule(&self, source: &str) -> std::result::Result<ValidatedRule, Vec<RuleError>> {
        Compiler::new(self.registry.as_ref()).parse_rule(source)
    }

    /// Validate a single pipeline declaration
    pub fn parse_pipeline(
        &self,
        source: &str,
    ) -> std::result::Result<ValidatedPipeline, Vec<RuleError>> {
        Compiler::new(self.registry.as_ref()).parse_pipeline(source)
    }

    /// Validate a document declaring any number of pipelines
    pub fn parse_pipelines(
        &self,
        source: &str,
    ) -> std::result::Result<Vec<ValidatedPipeline>, Vec<RuleError>> {
        Compiler::new(self.registry.as_ref()).parse_pipelines(source)
    }

    /// Replace every loaded rule, pipeline and connection with `definitions`
    ///
    /// Validation happens before the swap; processing in progress is not
    /// disturbed. Counters of rules that keep their name carry over.
    pub fn load(&self, definitions: &Definitions) -> LoadReport {
        let previous = self.state.load_full();
        let (state, report) =
            EngineState::build(definitions, &self.registry, &self.config, previous.metrics());
        self.state.store(Arc::new(state));

        tracing::info!(
            rules = report.rules,
            pipelines = report.pipelines,
            invalid = report.invalid.len(),
            "engine state loaded"
        );
        report
    }

    /// Read a definitions directory and load it
    pub fn load_dir(&self, dir: impl AsRef<Path>) -> Result<LoadReport> {
        let definitions = Definitions::from_dir(dir)?;
        Ok(self.load(&definitions))
    }

    /// Run one message through a named pipeline
    ///
    /// Returns the message (unless dropped) followed by messages created by
    /// rule actions, and the trace of what matched.
    pub fn evaluate(
        &self,
        pipeline: &str,
        message: Box<dyn Message>,
    ) -> Result<(Vec<Box<dyn Message>>, ExecutionTrace)> {
        let state = self.state.load_full();
        let resolved = state
            .pipeline(pipeline)
            .cloned()
            .ok_or_else(|| SdkError::UnknownPipeline(pipeline.to_string()))?;

        let message_id = message.id().to_string();
        let mut recorder = TraceRecorder::new();
        let output = state
            .interpreter()
            .evaluate(message, &[resolved], &mut recorder);
        let trace = recorder
            .into_traces()
            .into_iter()
            .next()
            .unwrap_or_else(|| ExecutionTrace::new(message_id));
        Ok((output, trace))
    }

    /// Route messages through the pipelines connected to their streams
    pub fn process(&self, messages: Vec<Box<dyn Message>>) -> Vec<Box<dyn Message>> {
        self.process_with_listener(messages, &mut NoopListener)
    }

    /// Like [`process`](Self::process), also returning one trace per message
    pub fn process_traced(
        &self,
        messages: Vec<Box<dyn Message>>,
    ) -> (Vec<Box<dyn Message>>, Vec<ExecutionTrace>) {
        let mut recorder = TraceRecorder::new();
        let output = self.process_with_listener(messages, &mut recorder);
        (output, recorder.into_traces())
    }

    pub fn process_with_listener(
        &self,
        messages: Vec<Box<dyn Message>>,
        listener: &mut dyn InterpreterListener,
    ) -> Vec<Box<dyn Message>> {
        let state = self.state.load_full();
        tracing::trace!(messages = messages.len(), "processing batch");
        state
            .interpreter()
            .process(messages, state.connections(), listener)
    }

    /// Per-rule counters, empty when metrics are disabled
    pub fn metrics(&self) -> MetricsSnapshot {
        self.state
            .load()
            .metrics()
            .map(|metrics| metrics.snapshot())
            .unwrap_or_default()
    }

    /// Snapshot of the currently loaded state
    pub fn state(&self) -> Arc<EngineState> {
        self.state.load_full()
    }

    pub fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

//! Pipeline interpreter
//!
//! Runs messages through pipelines stage by stage. When several pipelines
//! apply to a message their stages are interleaved by stage number: all
//! stage-0 rules of every pipeline run before any stage-1 rule. A pipeline
//! whose stage does not pass sits out the remaining stages.
//!
//! Within a stage every condition is evaluated before any action runs.
//! Failures are recorded on the message and never abort other rules.

use crate::context::{EvaluationContext, DEFAULT_STREAM};
use crate::message::Message;
use crate::observability::{RuleCounters, RuleMetrics};
use crate::pipeline::{RuntimePipeline, RuntimeStage, StreamConnections};
use crate::result::InterpreterListener;
use crate::rule::ExecutableRule;
use sluice_core::Value;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;

/// Field receiving run-time error descriptions
pub const DEFAULT_PROCESSING_ERROR_FIELD: &str = "gl2_processing_error";

/// Interpreter settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterOptions {
    pub processing_error_field: String,
    pub default_stream: String,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            processing_error_field: DEFAULT_PROCESSING_ERROR_FIELD.to_string(),
            default_stream: DEFAULT_STREAM.to_string(),
        }
    }
}

/// Executes runtime pipelines against messages
#[derive(Debug, Clone, Default)]
pub struct PipelineInterpreter {
    options: InterpreterOptions,
    metrics: Option<RuleMetrics>,
}

impl PipelineInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: InterpreterOptions) -> Self {
        self.options = options;
        self
    }

    /// Count rule outcomes into `metrics`
    pub fn with_metrics(mut self, metrics: RuleMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn options(&self) -> &InterpreterOptions {
        &self.options
    }

    pub fn metrics(&self) -> Option<&RuleMetrics> {
        self.metrics.as_ref()
    }

    /// Run one message through `pipelines`.
    ///
    /// Returns the message unless it was dropped, followed by every message
    /// created by rule actions. Created messages are not processed further.
    pub fn evaluate(
        &self,
        mut message: Box<dyn Message>,
        pipelines: &[Arc<RuntimePipeline>],
        listener: &mut dyn InterpreterListener,
    ) -> Vec<Box<dyn Message>> {
        let id = message.id().to_string();
        listener.start_processing(&id);
        let created = self.run(message.as_mut(), pipelines, listener);
        listener.finish_processing(&id);

        let mut output = Vec::with_capacity(created.len() + 1);
        if !message.is_dropped() {
            output.push(message);
        }
        output.extend(created);
        output
    }

    /// Route messages through the pipelines connected to their streams.
    ///
    /// Messages without a stream join the default stream. After each round,
    /// streams the message joined during that round select further
    /// pipelines. Each stream is processed at most once per message and each
    /// pipeline runs at most once per message. Created messages are queued
    /// and processed the same way.
    pub fn process(
        &self,
        messages: Vec<Box<dyn Message>>,
        connections: &StreamConnections,
        listener: &mut dyn InterpreterListener,
    ) -> Vec<Box<dyn Message>> {
        let mut queue: VecDeque<Box<dyn Message>> = messages.into();
        let mut output = Vec::new();

        while let Some(mut message) = queue.pop_front() {
            let id = message.id().to_string();
            listener.start_processing(&id);
            if message.streams().is_empty() {
                message.add_stream(&self.options.default_stream);
            }

            let mut processed_streams: HashSet<String> = HashSet::new();
            let mut executed_pipelines: HashSet<String> = HashSet::new();
            loop {
                let streams: Vec<String> = message
                    .streams()
                    .into_iter()
                    .filter(|stream| !processed_streams.contains(stream))
                    .collect();
                if streams.is_empty() {
                    break;
                }
                processed_streams.extend(streams.iter().cloned());

                let pipelines: Vec<Arc<RuntimePipeline>> = connections
                    .pipelines_for_streams(streams.iter().map(String::as_str))
                    .into_iter()
                    .filter(|pipeline| executed_pipelines.insert(pipeline.name.clone()))
                    .collect();
                let names: Vec<String> = pipelines.iter().map(|p| p.name.clone()).collect();
                listener.process_streams(&id, &names, &streams);
                if pipelines.is_empty() {
                    continue;
                }

                let created = self.run(message.as_mut(), &pipelines, listener);
                queue.extend(created);
                if message.is_dropped() {
                    break;
                }
            }

            listener.finish_processing(&id);
            if !message.is_dropped() {
                output.push(message);
            }
        }
        output
    }

    /// One round of stage slices; returns the created messages
    fn run(
        &self,
        message: &mut dyn Message,
        pipelines: &[Arc<RuntimePipeline>],
        listener: &mut dyn InterpreterListener,
    ) -> Vec<Box<dyn Message>> {
        let id = message.id().to_string();
        let mut ctx =
            EvaluationContext::new(message).with_default_stream(&self.options.default_stream);

        let stage_numbers: BTreeSet<i32> = pipelines
            .iter()
            .flat_map(|pipeline| pipeline.stage_numbers())
            .collect();
        let mut stopped: HashSet<&str> = HashSet::new();

        'slices: for number in stage_numbers {
            for pipeline in pipelines {
                if stopped.contains(pipeline.name.as_str()) {
                    continue;
                }
                let Some(stage) = pipeline.stage(number) else {
                    continue;
                };

                listener.enter_stage(&pipeline.name, number, stage.match_mode);
                let passed = self.run_stage(&pipeline.name, stage, &mut ctx, listener);
                listener.exit_stage(&pipeline.name, number, passed);

                if ctx.message().is_dropped() {
                    tracing::debug!(message_id = %id, pipeline = %pipeline.name, "message dropped");
                    listener.drop_message(&id);
                    break 'slices;
                }
                if passed {
                    tracing::trace!(pipeline = %pipeline.name, stage = number, "stage passed");
                    listener.continue_pipeline(&pipeline.name);
                } else {
                    tracing::debug!(pipeline = %pipeline.name, stage = number, "pipeline stopped");
                    listener.stop_pipeline(&pipeline.name);
                    stopped.insert(pipeline.name.as_str());
                }
            }
        }

        ctx.take_created_messages()
    }

    /// Evaluate every condition, then run the matched rules' actions.
    /// Returns whether the stage passed.
    fn run_stage(
        &self,
        pipeline: &str,
        stage: &RuntimeStage,
        ctx: &mut EvaluationContext<'_>,
        listener: &mut dyn InterpreterListener,
    ) -> bool {
        let mut matched: Vec<&Arc<dyn ExecutableRule>> = Vec::new();

        for rule in &stage.rules {
            let name = rule.name();
            listener.evaluate_rule(pipeline, name);
            match rule.evaluate_condition(ctx) {
                Ok(true) => {
                    listener.satisfy_rule(pipeline, name);
                    self.count(name, RuleCounters::mark_matched);
                    matched.push(rule);
                }
                Ok(false) => {
                    listener.dissatisfy_rule(pipeline, name);
                    self.count(name, RuleCounters::mark_not_matched);
                }
                Err(e) => {
                    let error = e.to_string();
                    tracing::debug!(rule = %name, error = %error, "condition failed");
                    self.record_error(ctx, name, &error);
                    listener.fail_evaluate_rule(pipeline, name, &error);
                    listener.dissatisfy_rule(pipeline, name);
                    self.count(name, RuleCounters::mark_failed);
                }
            }
        }

        let passed = stage.match_mode.passes(matched.len(), stage.rules.len());

        for rule in matched {
            let name = rule.name();
            ctx.clear_variables();
            listener.execute_rule(pipeline, name);
            self.count(name, RuleCounters::mark_executed);
            if let Err(e) = rule.execute_actions(ctx) {
                let error = e.to_string();
                tracing::debug!(rule = %name, error = %error, "action failed");
                self.record_error(ctx, name, &error);
                listener.fail_execute_rule(pipeline, name, &error);
                self.count(name, RuleCounters::mark_failed);
            }
            if ctx.message().is_dropped() {
                break;
            }
        }

        passed
    }

    fn count(&self, rule: &str, mark: fn(&RuleCounters)) {
        if let Some(counters) = self.metrics.as_ref().and_then(|m| m.rule(rule)) {
            mark(counters);
        }
    }

    /// Append to the processing error field, comma separated
    fn record_error(&self, ctx: &mut EvaluationContext<'_>, rule: &str, error: &str) {
        let entry = format!("For rule '{}': {}", rule, error);
        let field = &self.options.processing_error_field;
        let combined = match ctx.message().get_field(field) {
            Some(Value::String(existing)) if !existing.is_empty() => {
                format!("{},{}", existing, entry)
            }
            _ => entry.clone(),
        };
        ctx.message_mut().set_field(field, Value::String(combined));
        ctx.add_error(entry);
    }
}

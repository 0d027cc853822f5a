//! Execution tracing for pipeline simulation
//!
//! The pipeline interpreter reports every decision to an
//! [`InterpreterListener`]. [`TraceRecorder`] turns those callbacks into
//! serializable [`ExecutionTrace`]s for debugging tools.

use sluice_core::ast::MatchMode;
use serde::{Deserialize, Serialize};

/// Callbacks fired while messages move through pipelines.
///
/// Every method defaults to a no-op so listeners implement only what they
/// need.
#[allow(unused_variables)]
pub trait InterpreterListener {
    fn start_processing(&mut self, message_id: &str) {}
    fn finish_processing(&mut self, message_id: &str) {}

    /// The set of pipelines selected for one processing round
    fn process_streams(&mut self, message_id: &str, pipelines: &[String], streams: &[String]) {}

    fn enter_stage(&mut self, pipeline: &str, stage: i32, match_mode: MatchMode) {}
    fn exit_stage(&mut self, pipeline: &str, stage: i32, passed: bool) {}

    fn evaluate_rule(&mut self, pipeline: &str, rule: &str) {}
    fn satisfy_rule(&mut self, pipeline: &str, rule: &str) {}
    fn dissatisfy_rule(&mut self, pipeline: &str, rule: &str) {}
    fn fail_evaluate_rule(&mut self, pipeline: &str, rule: &str, error: &str) {}
    fn execute_rule(&mut self, pipeline: &str, rule: &str) {}
    fn fail_execute_rule(&mut self, pipeline: &str, rule: &str, error: &str) {}

    fn continue_pipeline(&mut self, pipeline: &str) {}
    fn stop_pipeline(&mut self, pipeline: &str) {}

    fn drop_message(&mut self, message_id: &str) {}
}

/// Listener that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl InterpreterListener for NoopListener {}

/// Trace of one message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionTrace {
    pub message_id: String,

    pub pipelines: Vec<PipelineTrace>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dropped: bool,
}

/// Trace of one pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineTrace {
    pub name: String,

    pub stages: Vec<StageTrace>,

    /// Stage after which the pipeline stopped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<i32>,
}

/// Trace of one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTrace {
    pub number: i32,
    pub match_mode: MatchMode,
    pub passed: bool,
    pub rules: Vec<RuleTrace>,
}

/// Trace of one rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTrace {
    pub name: String,
    pub matched: bool,
    pub executed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionTrace {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            pipelines: Vec::new(),
            dropped: false,
        }
    }

    pub fn pipeline(&self, name: &str) -> Option<&PipelineTrace> {
        self.pipelines.iter().find(|p| p.name == name)
    }

    fn pipeline_mut(&mut self, name: &str) -> &mut PipelineTrace {
        let index = match self.pipelines.iter().position(|p| p.name == name) {
            Some(index) => index,
            None => {
                self.pipelines.push(PipelineTrace {
                    name: name.to_string(),
                    stages: Vec::new(),
                    stopped_at: None,
                });
                self.pipelines.len() - 1
            }
        };
        &mut self.pipelines[index]
    }
}

impl PipelineTrace {
    pub fn stage(&self, number: i32) -> Option<&StageTrace> {
        self.stages.iter().find(|s| s.number == number)
    }
}

impl StageTrace {
    pub fn rule(&self, name: &str) -> Option<&RuleTrace> {
        self.rules.iter().find(|r| r.name == name)
    }
}

/// Listener collecting one [`ExecutionTrace`] per processed message
#[derive(Debug, Default)]
pub struct TraceRecorder {
    current: Option<ExecutionTrace>,
    finished: Vec<ExecutionTrace>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finished traces in processing order
    pub fn traces(&self) -> &[ExecutionTrace] {
        &self.finished
    }

    pub fn into_traces(self) -> Vec<ExecutionTrace> {
        self.finished
    }

    fn current_stage(&mut self, pipeline: &str) -> Option<&mut StageTrace> {
        self.current
            .as_mut()?
            .pipeline_mut(pipeline)
            .stages
            .last_mut()
    }

    fn current_rule(&mut self, pipeline: &str, rule: &str) -> Option<&mut RuleTrace> {
        self.current_stage(pipeline)?
            .rules
            .iter_mut()
            .rev()
            .find(|r| r.name == rule)
    }
}

impl InterpreterListener for TraceRecorder {
    fn start_processing(&mut self, message_id: &str) {
        if let Some(trace) = self.current.take() {
            self.finished.push(trace);
        }
        self.current = Some(ExecutionTrace::new(message_id));
    }

    fn finish_processing(&mut self, _message_id: &str) {
        if let Some(trace) = self.current.take() {
            self.finished.push(trace);
        }
    }

    fn enter_stage(&mut self, pipeline: &str, stage: i32, match_mode: MatchMode) {
        if let Some(trace) = self.current.as_mut() {
            trace.pipeline_mut(pipeline).stages.push(StageTrace {
                number: stage,
                match_mode,
                passed: false,
                rules: Vec::new(),
            });
        }
    }

    fn exit_stage(&mut self, pipeline: &str, _stage: i32, passed: bool) {
        if let Some(stage) = self.current_stage(pipeline) {
            stage.passed = passed;
        }
    }

    fn evaluate_rule(&mut self, pipeline: &str, rule: &str) {
        if let Some(stage) = self.current_stage(pipeline) {
            stage.rules.push(RuleTrace {
                name: rule.to_string(),
                matched: false,
                executed: false,
                error: None,
            });
        }
    }

    fn satisfy_rule(&mut self, pipeline: &str, rule: &str) {
        if let Some(trace) = self.current_rule(pipeline, rule) {
            trace.matched = true;
        }
    }

    fn fail_evaluate_rule(&mut self, pipeline: &str, rule: &str, error: &str) {
        if let Some(trace) = self.current_rule(pipeline, rule) {
            trace.error = Some(error.to_string());
        }
    }

    fn execute_rule(&mut self, pipeline: &str, rule: &str) {
        if let Some(trace) = self.current_rule(pipeline, rule) {
            trace.executed = true;
        }
    }

    fn fail_execute_rule(&mut self, pipeline: &str, rule: &str, error: &str) {
        if let Some(trace) = self.current_rule(pipeline, rule) {
            trace.error = Some(error.to_string());
        }
    }

    fn stop_pipeline(&mut self, pipeline: &str) {
        if let Some(trace) = self.current.as_mut() {
            let pipeline = trace.pipeline_mut(pipeline);
            pipeline.stopped_at = pipeline.stages.last().map(|s| s.number);
        }
    }

    fn drop_message(&mut self, _message_id: &str) {
        if let Some(trace) = self.current.as_mut() {
            trace.dropped = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_builds_nested_trace() {
        let mut recorder = TraceRecorder::new();
        recorder.start_processing("m1");
        recorder.enter_stage("p", 0, MatchMode::All);
        recorder.evaluate_rule("p", "r1");
        recorder.satisfy_rule("p", "r1");
        recorder.execute_rule("p", "r1");
        recorder.evaluate_rule("p", "r2");
        recorder.dissatisfy_rule("p", "r2");
        recorder.exit_stage("p", 0, false);
        recorder.stop_pipeline("p");
        recorder.finish_processing("m1");

        let traces = recorder.into_traces();
        assert_eq!(traces.len(), 1);
        let pipeline = traces[0].pipeline("p").unwrap();
        assert_eq!(pipeline.stopped_at, Some(0));
        let stage = pipeline.stage(0).unwrap();
        assert!(!stage.passed);
        assert!(stage.rule("r1").unwrap().executed);
        assert!(!stage.rule("r2").unwrap().matched);
    }

    #[test]
    fn test_trace_serialization_skips_empty_fields() {
        let mut trace = ExecutionTrace::new("m1");
        trace.pipelines.push(PipelineTrace {
            name: "p".to_string(),
            stages: vec![],
            stopped_at: None,
        });
        let json = serde_json::to_value(&trace).unwrap();
        assert!(json.get("dropped").is_none());
        assert!(json["pipelines"][0].get("stopped_at").is_none());
    }
}

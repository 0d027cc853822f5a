//! Engine state
//!
//! An [`EngineState`] is an immutable snapshot of everything needed to
//! process messages: validated rules, resolved pipelines, stream
//! connections and the interpreter carrying the metrics. Every load builds
//! a fresh state from definitions and the engine swaps it in whole, so
//! messages in flight keep the snapshot they started with.

use crate::config::EngineConfig;
use crate::definitions::Definitions;
use crate::error::Result;
use serde::Serialize;
use sluice_compiler::{Compiler, ValidatedRule};
use sluice_core::RuleError;
use sluice_runtime::{
    CompiledRule, ExecutableRule, FunctionRegistry, InterpretedRule, PipelineInterpreter,
    PlaceholderRule, RuleMetrics, RuntimePipeline, StreamConnections,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Errors found in one source definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefinitionErrors {
    pub id: String,
    pub errors: Vec<RuleError>,
}

/// Summary of a load
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    /// Rules that validated
    pub rules: usize,
    /// Pipelines that validated
    pub pipelines: usize,
    pub invalid: Vec<DefinitionErrors>,
    /// `(stream, pipeline)` connections naming a pipeline that is not loaded
    pub unknown_connections: Vec<(String, String)>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty() && self.unknown_connections.is_empty()
    }
}

/// Snapshot of loaded rules and pipelines
#[derive(Debug, Default)]
pub struct EngineState {
    rules: HashMap<String, ValidatedRule>,
    pipelines: HashMap<String, Arc<RuntimePipeline>>,
    connections: StreamConnections,
    interpreter: PipelineInterpreter,
}

impl EngineState {
    /// State with nothing loaded
    pub(crate) fn empty(config: &EngineConfig) -> Self {
        Self {
            interpreter: interpreter(config, RuleMetrics::default()),
            ..Self::default()
        }
    }

    /// Validate and resolve `definitions`. Invalid definitions are reported
    /// and left out; they never fail the whole load.
    pub(crate) fn build(
        definitions: &Definitions,
        registry: &Arc<FunctionRegistry>,
        config: &EngineConfig,
        previous_metrics: Option<&RuleMetrics>,
    ) -> (Self, LoadReport) {
        let compiler = Compiler::new(registry.as_ref());
        let mut report = LoadReport::default();

        let mut rules: HashMap<String, ValidatedRule> = HashMap::new();
        let mut executables: HashMap<String, Arc<dyn ExecutableRule>> = HashMap::new();
        let mut placeholders: HashMap<String, Arc<dyn ExecutableRule>> = HashMap::new();

        for definition in &definitions.rules {
            match compiler.parse_rule(&definition.source) {
                Ok(validated) => {
                    let name = validated.name().to_string();
                    let executable = executable_rule(&compiler, &validated, registry, config);
                    if rules.insert(name.clone(), validated).is_some() {
                        tracing::warn!(rule = %name, id = %definition.id, "duplicate rule name, keeping the later definition");
                    }
                    executables.insert(name, executable);
                }
                Err(errors) => {
                    tracing::warn!(id = %definition.id, errors = errors.len(), "rule failed validation");
                    placeholders.insert(
                        definition.id.clone(),
                        Arc::new(PlaceholderRule::unparseable(&definition.id)),
                    );
                    report.invalid.push(DefinitionErrors {
                        id: definition.id.clone(),
                        errors,
                    });
                }
            }
        }

        let lookup = |name: &str| {
            executables
                .get(name)
                .or_else(|| placeholders.get(name))
                .cloned()
        };

        let mut pipelines: HashMap<String, Arc<RuntimePipeline>> = HashMap::new();
        for definition in &definitions.pipelines {
            match compiler.parse_pipelines(&definition.source) {
                Ok(validated) => {
                    for pipeline in validated {
                        let resolved = RuntimePipeline::resolve(pipeline.pipeline(), lookup);
                        let name = resolved.name.clone();
                        if pipelines.insert(name.clone(), Arc::new(resolved)).is_some() {
                            tracing::warn!(pipeline = %name, id = %definition.id, "duplicate pipeline name, keeping the later definition");
                        }
                    }
                }
                Err(errors) => {
                    tracing::warn!(id = %definition.id, errors = errors.len(), "pipeline failed validation");
                    report.invalid.push(DefinitionErrors {
                        id: definition.id.clone(),
                        errors,
                    });
                }
            }
        }

        let mut connections = StreamConnections::new();
        for (stream, names) in &definitions.connections {
            for name in names {
                match pipelines.get(name) {
                    Some(pipeline) => connections.connect(stream.clone(), pipeline.clone()),
                    None => {
                        tracing::warn!(stream = %stream, pipeline = %name, "connection to unknown pipeline ignored");
                        report
                            .unknown_connections
                            .push((stream.clone(), name.clone()));
                    }
                }
            }
        }

        let names = rules.keys().map(String::as_str);
        let metrics = match previous_metrics {
            Some(previous) => previous.rebuild(names),
            None => RuleMetrics::new(names),
        };

        report.rules = rules.len();
        report.pipelines = pipelines.len();
        let state = Self {
            interpreter: interpreter(config, metrics),
            rules,
            pipelines,
            connections,
        };
        (state, report)
    }

    pub fn rule(&self, name: &str) -> Option<&ValidatedRule> {
        self.rules.get(name)
    }

    /// Names of validated rules, sorted
    pub fn rule_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn pipeline(&self, name: &str) -> Option<&Arc<RuntimePipeline>> {
        self.pipelines.get(name)
    }

    /// Names of loaded pipelines, sorted
    pub fn pipeline_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.pipelines.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn connections(&self) -> &StreamConnections {
        &self.connections
    }

    pub fn interpreter(&self) -> &PipelineInterpreter {
        &self.interpreter
    }

    pub fn metrics(&self) -> Option<&RuleMetrics> {
        self.interpreter.metrics()
    }
}

fn interpreter(config: &EngineConfig, metrics: RuleMetrics) -> PipelineInterpreter {
    let interpreter = PipelineInterpreter::new().with_options(config.interpreter_options());
    if config.record_metrics {
        interpreter.with_metrics(metrics)
    } else {
        interpreter
    }
}

/// Compiled program when code generation is allowed, AST walker otherwise.
/// A rule that fails to compile still runs interpreted.
fn executable_rule(
    compiler: &Compiler<'_>,
    validated: &ValidatedRule,
    registry: &Arc<FunctionRegistry>,
    config: &EngineConfig,
) -> Arc<dyn ExecutableRule> {
    if config.allow_code_generation {
        match compile(compiler, validated, registry) {
            Ok(rule) => return Arc::new(rule),
            Err(e) => {
                tracing::warn!(rule = %validated.name(), "code generation failed, interpreting instead: {}", e);
            }
        }
    }
    Arc::new(InterpretedRule::new(validated.rule().clone(), registry.clone()))
}

fn compile(
    compiler: &Compiler<'_>,
    validated: &ValidatedRule,
    registry: &FunctionRegistry,
) -> Result<CompiledRule> {
    let program = compiler.compile_rule(validated)?;
    Ok(CompiledRule::link(program, registry)?)
}

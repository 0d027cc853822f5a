//! Runtime pipelines and stream connections
//!
//! A [`RuntimePipeline`] is a validated pipeline whose rule references
//! have been replaced by executable rules. References to rules that are
//! not loaded become placeholders that never match.

use crate::rule::{ExecutableRule, PlaceholderRule};
use sluice_core::ast::{MatchMode, Pipeline};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// One stage with its rules resolved
#[derive(Debug, Clone)]
pub struct RuntimeStage {
    pub number: i32,
    pub match_mode: MatchMode,
    pub rules: Vec<Arc<dyn ExecutableRule>>,
}

/// A pipeline ready to process messages
#[derive(Debug, Clone)]
pub struct RuntimePipeline {
    pub name: String,
    /// Ordered by stage number
    pub stages: Vec<RuntimeStage>,
}

impl RuntimePipeline {
    /// Resolve every rule reference of `pipeline` through `lookup`
    pub fn resolve<F>(pipeline: &Pipeline, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<Arc<dyn ExecutableRule>>,
    {
        let mut stages: Vec<RuntimeStage> = pipeline
            .stages
            .iter()
            .map(|stage| RuntimeStage {
                number: stage.number,
                match_mode: stage.match_mode,
                rules: stage
                    .rules
                    .iter()
                    .map(|name| {
                        lookup(name).unwrap_or_else(|| {
                            tracing::debug!(
                                pipeline = %pipeline.name,
                                rule = %name,
                                "unresolved rule reference"
                            );
                            Arc::new(PlaceholderRule::unresolved(name)) as Arc<dyn ExecutableRule>
                        })
                    })
                    .collect(),
            })
            .collect();
        stages.sort_by_key(|stage| stage.number);
        Self {
            name: pipeline.name.clone(),
            stages,
        }
    }

    pub fn stage(&self, number: i32) -> Option<&RuntimeStage> {
        self.stages.iter().find(|stage| stage.number == number)
    }

    /// Stage numbers in ascending order
    pub fn stage_numbers(&self) -> impl Iterator<Item = i32> + '_ {
        self.stages.iter().map(|stage| stage.number)
    }
}

/// Which pipelines run for messages on which streams
#[derive(Debug, Clone, Default)]
pub struct StreamConnections {
    streams: HashMap<String, Vec<Arc<RuntimePipeline>>>,
}

impl StreamConnections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a pipeline to a stream; attaching twice has no effect
    pub fn connect(&mut self, stream: impl Into<String>, pipeline: Arc<RuntimePipeline>) {
        let pipelines = self.streams.entry(stream.into()).or_default();
        if !pipelines.iter().any(|p| p.name == pipeline.name) {
            pipelines.push(pipeline);
        }
    }

    pub fn pipelines_for(&self, stream: &str) -> &[Arc<RuntimePipeline>] {
        self.streams.get(stream).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct pipelines connected to any of `streams`, ordered by name
    pub fn pipelines_for_streams<'a>(
        &self,
        streams: impl IntoIterator<Item = &'a str>,
    ) -> Vec<Arc<RuntimePipeline>> {
        let mut seen = BTreeSet::new();
        let mut pipelines: Vec<Arc<RuntimePipeline>> = streams
            .into_iter()
            .flat_map(|stream| self.pipelines_for(stream).iter().cloned())
            .filter(|pipeline| seen.insert(pipeline.name.clone()))
            .collect();
        pipelines.sort_by(|a, b| a.name.cmp(&b.name));
        pipelines
    }

    pub fn streams(&self) -> impl Iterator<Item = &str> {
        self.streams.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::ast::Stage;

    fn pipeline(name: &str) -> Pipeline {
        Pipeline::new(
            name,
            vec![
                Stage::new(2, MatchMode::Either, vec!["b".to_string()]),
                Stage::new(1, MatchMode::All, vec!["a".to_string()]),
            ],
        )
    }

    #[test]
    fn test_unresolved_rules_become_placeholders() {
        let resolved = RuntimePipeline::resolve(&pipeline("p"), |_| None);
        let numbers: Vec<i32> = resolved.stage_numbers().collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(resolved.stage(1).unwrap().rules[0].name(), "Unresolved rule a");
    }

    #[test]
    fn test_connections_deduplicate() {
        let p = Arc::new(RuntimePipeline::resolve(&pipeline("p"), |_| None));
        let q = Arc::new(RuntimePipeline::resolve(&pipeline("q"), |_| None));
        let mut connections = StreamConnections::new();
        connections.connect("s1", q.clone());
        connections.connect("s1", p.clone());
        connections.connect("s1", p.clone());
        connections.connect("s2", p);

        assert_eq!(connections.pipelines_for("s1").len(), 2);
        let names: Vec<String> = connections
            .pipelines_for_streams(["s1", "s2"])
            .iter()
            .map(|p| p.name.clone())
            .collect();
        assert_eq!(names, vec!["p", "q"]);
        assert!(connections.pipelines_for("none").is_empty());
    }
}

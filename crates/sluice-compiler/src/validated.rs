//! Validated artifacts
//!
//! A validated rule has passed semantic analysis with zero errors and
//! carries its bound, typed AST. Values of these types are only created by
//! the [`Compiler`](crate::Compiler), so holding one is proof of validity.

use serde::Serialize;
use sluice_core::ast::{Pipeline, Rule};

/// A rule that parsed and analyzed without errors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedRule {
    rule: Rule,
    source: String,
}

impl ValidatedRule {
    pub(crate) fn new(rule: Rule, source: impl Into<String>) -> Self {
        Self {
            rule,
            source: source.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.rule.name
    }

    /// The typed AST with bound call arguments
    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    /// Source text the rule was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn into_rule(self) -> Rule {
        self.rule
    }
}

/// A pipeline that parsed without errors. Rule references are resolved
/// by name when the pipeline is loaded into an engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedPipeline {
    pipeline: Pipeline,
    source: String,
}

impl ValidatedPipeline {
    pub(crate) fn new(pipeline: Pipeline, source: impl Into<String>) -> Self {
        Self {
            pipeline,
            source: source.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.pipeline.name
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names of every rule referenced by any stage
    pub fn rule_references(&self) -> impl Iterator<Item = &str> {
        self.pipeline
            .stages
            .iter()
            .flat_map(|stage| stage.rules.iter().map(String::as_str))
    }

    pub fn into_pipeline(self) -> Pipeline {
        self.pipeline
    }
}

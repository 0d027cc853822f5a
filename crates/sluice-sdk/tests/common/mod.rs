//! Common test utilities for SDK integration tests

#![allow(dead_code)]

use serde_json::json;
use sluice_sdk::{
    Definitions, EngineBuilder, EngineConfig, LoadReport, LogMessage, Message, PipelineEngine,
};

/// Test helper to build a PipelineEngine from inline rule and pipeline source
pub struct TestEngine {
    definitions: Definitions,
    config: EngineConfig,
}

impl TestEngine {
    pub fn new() -> Self {
        Self {
            definitions: Definitions::new(),
            config: EngineConfig::default(),
        }
    }

    /// Add a rule; its id is derived from the insertion order
    pub fn with_rule(mut self, source: &str) -> Self {
        let id = format!("rule-{}", self.definitions.rules.len());
        self.definitions = self.definitions.with_rule(id, source.trim());
        self
    }

    pub fn with_pipeline(mut self, source: &str) -> Self {
        let id = format!("pipeline-{}", self.definitions.pipelines.len());
        self.definitions = self.definitions.with_pipeline(id, source.trim());
        self
    }

    pub fn with_connection(mut self, stream: &str, pipeline: &str) -> Self {
        self.definitions = self.definitions.with_connection(stream, pipeline);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the interpreted path instead of compiled programs
    pub fn interpreted(self) -> Self {
        let config = self.config.clone().with_code_generation(false);
        self.with_config(config)
    }

    pub fn definitions(&self) -> &Definitions {
        &self.definitions
    }

    /// Build the engine; every definition must validate
    pub fn build(self) -> PipelineEngine {
        let (engine, report) = self.build_with_report();
        assert!(report.is_clean(), "definitions did not load cleanly: {:?}", report);
        engine
    }

    pub fn build_with_report(self) -> (PipelineEngine, LoadReport) {
        let engine = EngineBuilder::new()
            .with_config(self.config)
            .build()
            .expect("engine builds");
        let report = engine.load(&self.definitions);
        (engine, report)
    }
}

/// Message with the given fields and a fixed id
pub fn message(fields: serde_json::Value) -> Box<dyn Message> {
    let mut object = json!({ "_id": "test-message" });
    if let (Some(target), Some(source)) = (object.as_object_mut(), fields.as_object()) {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
    Box::new(LogMessage::from_json(object).expect("valid message"))
}

/// Field values of a message as JSON
pub fn fields(message: &dyn Message) -> serde_json::Value {
    message.to_json()["fields"].clone()
}

//! Rule, pipeline and connection sources to load into an engine
//!
//! Definitions are plain source text keyed by an id. The id names a rule
//! that fails to parse, since its title cannot be read from broken source.
//! On disk a definitions directory holds `*.rule` and `*.pipeline` files
//! (the id is the file stem) plus an optional `connections.yaml` mapping
//! stream names to pipeline names.

use crate::error::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const RULE_EXTENSION: &str = "rule";
pub const PIPELINE_EXTENSION: &str = "pipeline";
pub const CONNECTIONS_FILE: &str = "connections.yaml";

/// One source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDefinition {
    pub id: String,
    pub source: String,
}

impl SourceDefinition {
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
        }
    }
}

/// Stream name to connected pipeline names
pub type Connections = BTreeMap<String, Vec<String>>;

/// Everything an engine state is built from
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    pub rules: Vec<SourceDefinition>,
    /// A pipeline document may declare several pipelines
    pub pipelines: Vec<SourceDefinition>,
    pub connections: Connections,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, id: impl Into<String>, source: impl Into<String>) -> Self {
        self.rules.push(SourceDefinition::new(id, source));
        self
    }

    pub fn with_pipeline(mut self, id: impl Into<String>, source: impl Into<String>) -> Self {
        self.pipelines.push(SourceDefinition::new(id, source));
        self
    }

    /// Connect `pipeline` to `stream`
    pub fn with_connection(mut self, stream: impl Into<String>, pipeline: impl Into<String>) -> Self {
        let pipeline = pipeline.into();
        let pipelines = self.connections.entry(stream.into()).or_default();
        if !pipelines.contains(&pipeline) {
            pipelines.push(pipeline);
        }
        self
    }

    /// Parse a YAML connections document
    pub fn parse_connections(yaml: &str) -> Result<Connections> {
        if yaml.trim().is_empty() {
            return Ok(Connections::new());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read a definitions directory. Files are taken in name order.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths: Vec<_> = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        paths.sort();

        let mut definitions = Self::new();
        for path in paths.iter().filter(|p| p.is_file()) {
            let id = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.to_string(),
                None => continue,
            };
            match path.extension().and_then(|e| e.to_str()) {
                Some(RULE_EXTENSION) => {
                    definitions.rules.push(SourceDefinition::new(id, fs::read_to_string(path)?));
                }
                Some(PIPELINE_EXTENSION) => {
                    definitions
                        .pipelines
                        .push(SourceDefinition::new(id, fs::read_to_string(path)?));
                }
                _ => {}
            }
        }

        let connections = dir.join(CONNECTIONS_FILE);
        if connections.is_file() {
            definitions.connections = Self::parse_connections(&fs::read_to_string(connections)?)?;
        }

        tracing::debug!(
            dir = %dir.display(),
            rules = definitions.rules.len(),
            pipelines = definitions.pipelines.len(),
            streams = definitions.connections.len(),
            "read definitions"
        );
        Ok(definitions)
    }
}

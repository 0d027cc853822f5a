//! Subcommand implementations, writing their report to any sink

use anyhow::{bail, Context, Result};
use serde::Serialize;
use sluice_sdk::{EngineBuilder, EngineConfig, ExecutionTrace, LogMessage, Message, MetricsSnapshot};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Validate every file, printing one `path:line:column: message` line per
/// error. Returns true when all files are valid.
pub fn check(files: &[PathBuf], config: EngineConfig, out: &mut dyn Write) -> Result<bool> {
    let engine = EngineBuilder::new().with_config(config).build()?;
    let mut failed = 0;

    for path in files {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let result = match path.extension().and_then(|e| e.to_str()) {
            Some("rule") => engine
                .parse_rule(&source)
                .map(|rule| format!("rule \"{}\"", rule.name())),
            Some("pipeline") => engine.parse_pipelines(&source).map(|pipelines| {
                pipelines
                    .iter()
                    .map(|p| format!("pipeline \"{}\"", p.name()))
                    .collect::<Vec<_>>()
                    .join(", ")
            }),
            _ => bail!("{}: expected a .rule or .pipeline file", path.display()),
        };

        match result {
            Ok(summary) => writeln!(out, "{}: ok, {}", path.display(), summary)?,
            Err(errors) => {
                failed += 1;
                for error in &errors {
                    writeln!(out, "{}:{}", path.display(), error)?;
                }
            }
        }
    }

    writeln!(out, "{} file(s) checked, {} with errors", files.len(), failed)?;
    Ok(failed == 0)
}

/// The `--message` argument: inline JSON or `@path`
pub fn read_message_arg(arg: &str) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {}", path)),
        None => Ok(arg.to_string()),
    }
}

#[derive(Serialize)]
struct Simulation<'a> {
    messages: Vec<serde_json::Value>,
    traces: &'a [ExecutionTrace],
    metrics: MetricsSnapshot,
}

/// Load a definitions directory and run one message through it, printing
/// the resulting messages and traces as JSON. Returns false when some
/// definitions did not load.
pub fn simulate(
    dir: &Path,
    message: &str,
    pipeline: Option<&str>,
    config: EngineConfig,
    out: &mut dyn Write,
) -> Result<bool> {
    let engine = EngineBuilder::new().with_config(config).build()?;
    let report = engine
        .load_dir(dir)
        .with_context(|| format!("failed to load {}", dir.display()))?;
    for invalid in &report.invalid {
        for error in &invalid.errors {
            tracing::warn!("{}:{}", invalid.id, error);
        }
    }
    for (stream, pipeline) in &report.unknown_connections {
        tracing::warn!("stream '{}' is connected to unknown pipeline '{}'", stream, pipeline);
    }

    let json: serde_json::Value =
        serde_json::from_str(message).context("message is not valid JSON")?;
    let message: Box<dyn Message> = Box::new(LogMessage::from_json(json)?);

    let (messages, traces) = match pipeline {
        Some(name) => {
            let (messages, trace) = engine.evaluate(name, message)?;
            (messages, vec![trace])
        }
        None => engine.process_traced(vec![message]),
    };

    let simulation = Simulation {
        messages: messages.iter().map(|m| m.to_json()).collect(),
        traces: &traces,
        metrics: engine.metrics(),
    };
    serde_json::to_writer_pretty(&mut *out, &simulation)?;
    writeln!(out)?;
    Ok(report.is_clean())
}

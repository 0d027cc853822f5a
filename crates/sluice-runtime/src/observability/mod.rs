//! Observability module
//!
//! Per-rule counters maintained by the pipeline interpreter.

pub mod metrics;

pub use metrics::{MetricsSnapshot, RuleCounters, RuleMetrics, RuleStats};

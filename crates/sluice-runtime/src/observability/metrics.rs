//! Per-rule execution counters
//!
//! Counters are created when rules are loaded and only incremented on the
//! hot path, so no lock is taken while messages are processed.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for one rule
#[derive(Debug, Default)]
pub struct RuleCounters {
    executed: AtomicU64,
    matched: AtomicU64,
    not_matched: AtomicU64,
    failed: AtomicU64,
}

impl RuleCounters {
    pub fn mark_executed(&self) {
        self.executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mark_matched(&self) {
        self.matched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mark_not_matched(&self) {
        self.not_matched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mark_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> RuleStats {
        RuleStats {
            executed: self.executed.load(Ordering::Relaxed),
            matched: self.matched.load(Ordering::Relaxed),
            not_matched: self.not_matched.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time values of [`RuleCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuleStats {
    pub executed: u64,
    pub matched: u64,
    pub not_matched: u64,
    pub failed: u64,
}

/// Counters keyed by rule name
#[derive(Debug, Default, Clone)]
pub struct RuleMetrics {
    rules: HashMap<String, Arc<RuleCounters>>,
}

/// Serializable view of all counters, sorted by rule name
pub type MetricsSnapshot = BTreeMap<String, RuleStats>;

impl RuleMetrics {
    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self::default().rebuild(names)
    }

    /// Counters for a new rule set. Rules that survive keep their counts.
    pub fn rebuild<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Self {
        let rules = names
            .into_iter()
            .map(|name| {
                let counters = self.rules.get(name).cloned().unwrap_or_default();
                (name.to_string(), counters)
            })
            .collect();
        Self { rules }
    }

    pub fn rule(&self, name: &str) -> Option<&Arc<RuleCounters>> {
        self.rules.get(name)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.rules
            .iter()
            .map(|(name, counters)| (name.clone(), counters.stats()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = RuleMetrics::new(["a", "b"]);
        let a = metrics.rule("a").unwrap();
        a.mark_matched();
        a.mark_executed();
        metrics.rule("b").unwrap().mark_not_matched();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot["a"].matched, 1);
        assert_eq!(snapshot["a"].executed, 1);
        assert_eq!(snapshot["b"].not_matched, 1);
    }

    #[test]
    fn test_rebuild_keeps_surviving_counters() {
        let metrics = RuleMetrics::new(["a", "b"]);
        metrics.rule("a").unwrap().mark_failed();

        let rebuilt = metrics.rebuild(["a", "c"]);
        assert_eq!(rebuilt.rule("a").unwrap().stats().failed, 1);
        assert!(rebuilt.rule("b").is_none());
        assert_eq!(rebuilt.rule("c").unwrap().stats(), RuleStats::default());
    }
}

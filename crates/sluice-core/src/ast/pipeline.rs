//! Pipeline AST definitions

use crate::ast::Position;
use serde::{Deserialize, Serialize};

/// A pipeline: named, ordered stages of rule references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: String,

    /// Stages, strictly ascending by stage number
    pub stages: Vec<Stage>,
}

/// How rule outcomes combine into a stage outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Every rule must match
    All,
    /// At least one rule must match
    Either,
}

/// A single stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Ordering key
    pub number: i32,

    pub match_mode: MatchMode,

    /// Referenced rule titles, in declaration order
    pub rules: Vec<String>,

    pub position: Position,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, stages: Vec<Stage>) -> Self {
        let mut stages = stages;
        stages.sort_by_key(|stage| stage.number);
        Self {
            name: name.into(),
            stages,
        }
    }

    /// Look up a stage by number
    pub fn stage(&self, number: i32) -> Option<&Stage> {
        self.stages.iter().find(|stage| stage.number == number)
    }
}

impl MatchMode {
    /// Decide whether a stage passes given how many of its rules matched.
    /// A stage without rules always passes.
    pub fn passes(&self, matched: usize, total: usize) -> bool {
        if total == 0 {
            return true;
        }
        match self {
            MatchMode::All => matched == total,
            MatchMode::Either => matched > 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::All => "all",
            MatchMode::Either => "either",
        }
    }
}

impl Stage {
    pub fn new(number: i32, match_mode: MatchMode, rules: Vec<String>) -> Self {
        Self {
            number,
            match_mode,
            rules,
            position: Position::default(),
        }
    }

    pub fn match_all(&self) -> bool {
        self.match_mode == MatchMode::All
    }
}

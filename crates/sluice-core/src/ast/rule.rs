//! Rule AST definitions

use crate::ast::{Expression, Position};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A rule: `rule "name" when <condition> then <statements> end`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Rule title as written in the source
    pub name: String,

    /// Optional human-readable description, supplied by the caller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Condition that must evaluate to `true` for the actions to run
    pub when: Expression,

    /// Actions, in source order
    pub then: Vec<Statement>,
}

/// A statement in a rule's `then` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `let name = value;`
    Let {
        name: String,
        value: Expression,
        position: Position,
    },

    /// A function call evaluated for its side effects
    Expression(Expression),
}

impl Rule {
    /// Create a new rule
    pub fn new(name: impl Into<String>, when: Expression, then: Vec<Statement>) -> Self {
        Self {
            name: name.into(),
            description: None,
            when,
            then,
        }
    }

    /// Set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Statement {
    pub fn position(&self) -> Position {
        match self {
            Statement::Let { position, .. } => *position,
            Statement::Expression(expr) => expr.position,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let { name, value, .. } => write!(f, "let {} = {};", name, value),
            Statement::Expression(expr) => write!(f, "{};", expr),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "rule {:?}", self.name)?;
        writeln!(f, "when {}", self.when)?;
        writeln!(f, "then")?;
        for statement in &self.then {
            writeln!(f, "  {}", statement)?;
        }
        write!(f, "end")
    }
}

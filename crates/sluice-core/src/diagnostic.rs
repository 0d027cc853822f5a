//! Structured diagnostics for rule and pipeline sources
//!
//! Parsing and analysis never stop at the first problem. Every error found
//! is collected as a [`RuleError`] carrying the position of the offending
//! node, so editors can report them all at once.

use crate::ast::Position;
use crate::types::ValueType;
use serde::Serialize;
use thiserror::Error;

/// A single problem found in rule or pipeline source
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleError {
    #[error("{position}: syntax error: {message}")]
    SyntaxError { position: Position, message: String },

    #[error("{position}: undeclared variable `{name}`")]
    UndeclaredVariable { position: Position, name: String },

    #[error("{position}: undeclared function `{name}`")]
    UndeclaredFunction { position: Position, name: String },

    #[error("{position}: `{function}` expects {expected} required argument(s), got {actual}")]
    WrongNumberOfArgs {
        position: Position,
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("{position}: optional parameters of `{function}` must be named")]
    OptionalParametersMustBeNamed { position: Position, function: String },

    #[error("{position}: `{function}` parameter `{parameter}` expects {expected}, got {actual}")]
    IncompatibleArgumentType {
        position: Position,
        function: String,
        parameter: String,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("{position}: incompatible types {left} {operator} {right}")]
    IncompatibleTypes {
        position: Position,
        operator: String,
        left: ValueType,
        right: ValueType,
    },

    #[error("{position}: expected {expected}, got {actual}")]
    IncompatibleType {
        position: Position,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("{position}: index of type {actual} cannot be used, expected {expected}")]
    IncompatibleIndexType {
        position: Position,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("{position}: type {actual} is not indexable")]
    NonIndexableType { position: Position, actual: ValueType },

    #[error("{position}: invalid operation: {message}")]
    InvalidOperation { position: Position, message: String },

    #[error("{position}: invalid argument for `{function}`: {message}")]
    InvalidFunctionArgument {
        position: Position,
        function: String,
        message: String,
    },
}

impl RuleError {
    /// Where in the source the problem was found
    pub fn position(&self) -> Position {
        match self {
            RuleError::SyntaxError { position, .. }
            | RuleError::UndeclaredVariable { position, .. }
            | RuleError::UndeclaredFunction { position, .. }
            | RuleError::WrongNumberOfArgs { position, .. }
            | RuleError::OptionalParametersMustBeNamed { position, .. }
            | RuleError::IncompatibleArgumentType { position, .. }
            | RuleError::IncompatibleTypes { position, .. }
            | RuleError::IncompatibleType { position, .. }
            | RuleError::IncompatibleIndexType { position, .. }
            | RuleError::NonIndexableType { position, .. }
            | RuleError::InvalidOperation { position, .. }
            | RuleError::InvalidFunctionArgument { position, .. } => *position,
        }
    }

    /// Stable name of the error class
    pub fn kind(&self) -> &'static str {
        match self {
            RuleError::SyntaxError { .. } => "SyntaxError",
            RuleError::UndeclaredVariable { .. } => "UndeclaredVariable",
            RuleError::UndeclaredFunction { .. } => "UndeclaredFunction",
            RuleError::WrongNumberOfArgs { .. } => "WrongNumberOfArgs",
            RuleError::OptionalParametersMustBeNamed { .. } => "OptionalParametersMustBeNamed",
            RuleError::IncompatibleArgumentType { .. } => "IncompatibleArgumentType",
            RuleError::IncompatibleTypes { .. } => "IncompatibleTypes",
            RuleError::IncompatibleType { .. } => "IncompatibleType",
            RuleError::IncompatibleIndexType { .. } => "IncompatibleIndexType",
            RuleError::NonIndexableType { .. } => "NonIndexableType",
            RuleError::InvalidOperation { .. } => "InvalidOperation",
            RuleError::InvalidFunctionArgument { .. } => "InvalidFunctionArgument",
        }
    }

    pub fn syntax(position: Position, message: impl Into<String>) -> Self {
        RuleError::SyntaxError {
            position,
            message: message.into(),
        }
    }
}

//! Compiler error types

use thiserror::Error;

/// Compiler error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// A call site reached code generation without bound arguments
    #[error("Unbound call to '{0}'")]
    UnboundCall(String),

    /// Generated code failed its own consistency check
    #[error("Malformed program generated for rule '{0}'")]
    MalformedProgram(String),
}

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, CompileError>;

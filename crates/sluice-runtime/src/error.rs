//! Runtime error types

use sluice_core::CoreError;
use thiserror::Error;

/// Runtime error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Operator or value failure
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Stack underflow
    #[error("Stack underflow")]
    StackUnderflow,

    /// A variable was read before it was bound
    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),

    /// A function name could not be resolved in the registry
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// A call reached evaluation without bound arguments
    #[error("Unbound call to '{0}'")]
    UnboundCall(String),

    /// A required argument was absent or null
    #[error("Missing argument '{parameter}' for function '{function}'")]
    MissingArgument { function: String, parameter: String },

    /// An argument value was unusable
    #[error("Invalid argument for function '{function}': {message}")]
    InvalidArgument { function: String, message: String },

    /// Registration of a function name that is already taken
    #[error("Function '{0}' is already registered")]
    DuplicateFunction(String),

    /// A descriptor declares the same parameter twice
    #[error("Function '{function}' declares parameter '{parameter}' more than once")]
    DuplicateParameter { function: String, parameter: String },

    /// Invalid message input
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

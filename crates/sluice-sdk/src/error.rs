//! SDK error types

use thiserror::Error;

/// SDK error type
#[derive(Error, Debug)]
pub enum SdkError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Compiler error
    #[error("Compiler error: {0}")]
    CompileError(#[from] sluice_compiler::CompileError),

    /// Runtime error
    #[error("Runtime error: {0}")]
    RuntimeError(#[from] sluice_runtime::RuntimeError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed stream connections document
    #[error("Invalid connections: {0}")]
    ConnectionsError(#[from] serde_yaml::Error),

    /// No pipeline with this name is loaded
    #[error("Unknown pipeline: {0}")]
    UnknownPipeline(String),
}

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;

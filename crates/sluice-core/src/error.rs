//! Error types for Sluice Core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Date arithmetic out of range")]
    DateOutOfRange,

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Division by zero")]
    DivisionByZero,
}

pub type Result<T> = std::result::Result<T, CoreError>;

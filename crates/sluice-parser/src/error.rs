//! Parser error types
//!
//! Syntax problems are reported as [`RuleError::SyntaxError`] values.
//! Parsing collects them and fails with the complete list.

use sluice_core::RuleError;
use std::fmt;
use thiserror::Error;

/// Every syntax error found in one source text, in source order
#[derive(Error, Debug, Clone, PartialEq)]
pub struct SyntaxErrors(pub Vec<RuleError>);

impl fmt::Display for SyntaxErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl From<SyntaxErrors> for Vec<RuleError> {
    fn from(errors: SyntaxErrors) -> Self {
        errors.0
    }
}

/// Result type for parsing operations
pub type Result<T> = std::result::Result<T, SyntaxErrors>;

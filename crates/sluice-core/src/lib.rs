//! Sluice Core - Core types and definitions for the Sluice pipeline rule engine
//!
//! This crate provides the fundamental types shared by every other crate:
//! - Value types and the static type lattice
//! - AST (Abstract Syntax Tree) definitions for rules and pipelines
//! - IR (Intermediate Representation) for compiled rules
//! - Function descriptors and the catalog lookup seam
//! - Structured diagnostics reported by the parser and analyzer

pub mod ast;
pub mod diagnostic;
pub mod error;
pub mod function;
pub mod ir;
pub mod types;

// Re-export commonly used types
pub use diagnostic::RuleError;
pub use error::CoreError;
pub use function::{FunctionCatalog, FunctionDescriptor, ParameterDescriptor};
pub use types::{Period, Value, ValueType};

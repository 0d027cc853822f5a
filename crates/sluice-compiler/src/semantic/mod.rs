//! Semantic analysis
//!
//! Binding, type checking and resolution of parsed rules against a
//! function catalog.

pub mod analyzer;
pub mod binder;
pub mod type_checker;

pub use analyzer::SemanticAnalyzer;
pub use binder::{bind, Slot};
pub use type_checker::TypeChecker;

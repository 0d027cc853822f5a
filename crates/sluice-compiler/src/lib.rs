//! Sluice Compiler - validation and code generation
//!
//! This crate turns parsed rules into validated rules by resolving names,
//! binding function arguments and type checking every expression, and
//! compiles validated rules into flat IR programs.

pub mod codegen;
pub mod compiler;
pub mod error;
pub mod optimizer;
pub mod semantic;
pub mod validated;

// Re-export main types
pub use compiler::{Compiler, CompilerOptions};
pub use error::{CompileError, Result};
pub use validated::{ValidatedPipeline, ValidatedRule};

// Re-export codegen types
pub use codegen::{ExpressionCompiler, RuleCompiler};

// Re-export semantic types
pub use semantic::{SemanticAnalyzer, TypeChecker};

// Re-export optimizer types
pub use optimizer::ConstantFolder;

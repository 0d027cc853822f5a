//! Code generation module
//!
//! Transforms validated rules into flat IR programs.

pub mod expression_codegen;
pub mod rule_codegen;

pub use expression_codegen::{ExpressionCompiler, FunctionTable};
pub use rule_codegen::RuleCompiler;

//! Sluice Parser - rule language front end
//!
//! Turns rule and pipeline source text into AST nodes, reporting every
//! syntax error found with its line and column. Semantic problems such as
//! undeclared names or type errors are left to the analyzer.

pub mod error;
pub mod expression_parser;
pub mod lexer;
mod parser;
pub mod pipeline_parser;
pub mod rule_parser;

// Re-export main types
pub use error::{Result, SyntaxErrors};
pub use expression_parser::ExpressionParser;
pub use lexer::{Lexer, Token, TokenKind};
pub use pipeline_parser::PipelineParser;
pub use rule_parser::RuleParser;

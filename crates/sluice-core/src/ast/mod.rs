//! Abstract Syntax Tree definitions
//!
//! The parser produces these nodes with untyped expressions and unbound
//! function arguments; the semantic analyzer annotates types and binds
//! arguments in place.

pub mod expression;
pub mod operator;
pub mod pipeline;
pub mod position;
pub mod rule;

pub use expression::{Argument, Arguments, Expression, ExpressionKind, FunctionCall};
pub use operator::{Operator, UnaryOperator};
pub use pipeline::{MatchMode, Pipeline, Stage};
pub use position::Position;
pub use rule::{Rule, Statement};

//! Expression AST definitions

use crate::ast::{Operator, Position, UnaryOperator};
use crate::types::{Value, ValueType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An expression node.
///
/// `ty` is `ValueType::Any` when produced by the parser (literals excepted)
/// and holds the inferred type once the analyzer has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub position: Position,
    pub ty: ValueType,
}

/// The shape of an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpressionKind {
    /// Literal value (e.g., 42, "hello", true)
    Literal(Value),

    /// Field of the message under evaluation (e.g., `$message.source`)
    MessageField(String),

    /// Reference to a `let`-bound variable
    Variable(String),

    /// Nested member access (e.g., `parsed.user`)
    FieldAccess {
        object: Box<Expression>,
        field: String,
    },

    /// Indexed access (e.g., `tags[0]`, `headers["host"]`)
    Index {
        target: Box<Expression>,
        index: Box<Expression>,
    },

    /// Array literal
    Array(Vec<Expression>),

    /// Map literal, keys in source order
    Map(Vec<(String, Expression)>),

    /// Unary operation
    Unary {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Binary operation
    Binary {
        left: Box<Expression>,
        op: Operator,
        right: Box<Expression>,
    },

    /// Function call
    FunctionCall(FunctionCall),
}

/// A call site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: Arguments,
}

/// Call arguments before and after binding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Arguments {
    /// Arguments as written at the call site
    Unbound(Vec<Argument>),
    /// One slot per declared parameter, in declaration order.
    /// `None` marks an omitted optional parameter without a default.
    Bound(Vec<Option<Expression>>),
}

/// A single argument as written at the call site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    /// Parameter name for named arguments
    pub name: Option<String>,
    pub value: Expression,
}

impl Expression {
    pub fn new(kind: ExpressionKind, position: Position) -> Self {
        let ty = match &kind {
            ExpressionKind::Literal(value) => ValueType::of(value),
            ExpressionKind::Array(_) => ValueType::List,
            ExpressionKind::Map(_) => ValueType::Map,
            _ => ValueType::Any,
        };
        Self { kind, position, ty }
    }

    /// Create a literal expression
    pub fn literal(value: impl Into<Value>, position: Position) -> Self {
        Self::new(ExpressionKind::Literal(value.into()), position)
    }

    /// Create a message field reference
    pub fn message_field(name: impl Into<String>, position: Position) -> Self {
        Self::new(ExpressionKind::MessageField(name.into()), position)
    }

    /// Create a variable reference
    pub fn variable(name: impl Into<String>, position: Position) -> Self {
        Self::new(ExpressionKind::Variable(name.into()), position)
    }

    /// Create a binary expression positioned at its left operand
    pub fn binary(left: Expression, op: Operator, right: Expression) -> Self {
        let position = left.position;
        Self::new(
            ExpressionKind::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            position,
        )
    }

    /// Create a unary expression
    pub fn unary(op: UnaryOperator, operand: Expression, position: Position) -> Self {
        Self::new(
            ExpressionKind::Unary {
                op,
                operand: Box::new(operand),
            },
            position,
        )
    }

    /// Create an unbound function call
    pub fn call(name: impl Into<String>, args: Vec<Argument>, position: Position) -> Self {
        Self::new(
            ExpressionKind::FunctionCall(FunctionCall {
                name: name.into(),
                args: Arguments::Unbound(args),
            }),
            position,
        )
    }

    /// Set the inferred type
    pub fn with_type(mut self, ty: ValueType) -> Self {
        self.ty = ty;
        self
    }

    /// The literal value if this is a literal
    pub fn as_literal(&self) -> Option<&Value> {
        match &self.kind {
            ExpressionKind::Literal(value) => Some(value),
            _ => None,
        }
    }
}

impl Argument {
    pub fn positional(value: Expression) -> Self {
        Self { name: None, value }
    }

    pub fn named(name: impl Into<String>, value: Expression) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn write_identifier(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if is_plain_identifier(name) {
        f.write_str(name)
    } else {
        write!(f, "`{}`", name)
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) => write!(f, "{:?}", s),
        other => write!(f, "{}", other),
    }
}

/// Renders expressions back to rule syntax with every binary and unary
/// operation parenthesized, which makes the parse tree visible.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExpressionKind::Literal(value) => write_literal(f, value),
            ExpressionKind::MessageField(name) => {
                f.write_str("$message.")?;
                write_identifier(f, name)
            }
            ExpressionKind::Variable(name) => write_identifier(f, name),
            ExpressionKind::FieldAccess { object, field } => {
                write!(f, "{}.", object)?;
                write_identifier(f, field)
            }
            ExpressionKind::Index { target, index } => write!(f, "{}[{}]", target, index),
            ExpressionKind::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            ExpressionKind::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_identifier(f, key)?;
                    write!(f, ": {}", value)?;
                }
                f.write_str("}")
            }
            ExpressionKind::Unary { op, operand } => write!(f, "({}{})", op, operand),
            ExpressionKind::Binary { left, op, right } => {
                write!(f, "({} {} {})", left, op, right)
            }
            ExpressionKind::FunctionCall(call) => write!(f, "{}", call),
        }
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        match &self.args {
            Arguments::Unbound(args) => {
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if let Some(name) = &arg.name {
                        write!(f, "{}: ", name)?;
                    }
                    write!(f, "{}", arg.value)?;
                }
            }
            Arguments::Bound(slots) => {
                for (i, value) in slots.iter().flatten().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", value)?;
                }
            }
        }
        f.write_str(")")
    }
}

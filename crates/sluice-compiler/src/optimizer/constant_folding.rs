//! Constant folding optimizer
//!
//! Evaluates operators whose operands are all literals at compile time.
//! Folding goes through the same operator semantics as evaluation, and an
//! operation that would fail at run time (division by zero, overflow) is
//! left in place so it still fails when the rule runs.

use sluice_core::ast::{Arguments, Expression, ExpressionKind, Operator, Rule, Statement};
use sluice_core::types::ops;
use sluice_core::Value;

/// Constant folding optimizer
#[derive(Debug, Default)]
pub struct ConstantFolder;

impl ConstantFolder {
    /// Create a new constant folder
    pub fn new() -> Self {
        Self
    }

    /// Fold every expression of a rule
    pub fn fold_rule(&self, rule: &Rule) -> Rule {
        let then = rule
            .then
            .iter()
            .map(|statement| match statement {
                Statement::Let {
                    name,
                    value,
                    position,
                } => Statement::Let {
                    name: name.clone(),
                    value: self.fold(value),
                    position: *position,
                },
                Statement::Expression(expr) => Statement::Expression(self.fold(expr)),
            })
            .collect();
        Rule {
            name: rule.name.clone(),
            description: rule.description.clone(),
            when: self.fold(&rule.when),
            then,
        }
    }

    /// Optimize an expression by folding constants
    pub fn fold(&self, expr: &Expression) -> Expression {
        let kind = match &expr.kind {
            ExpressionKind::Literal(_)
            | ExpressionKind::MessageField(_)
            | ExpressionKind::Variable(_) => return expr.clone(),

            ExpressionKind::Binary { left, op, right } => {
                let left = self.fold(left);
                let right = self.fold(right);
                if let (Some(l), Some(r)) = (left.as_literal(), right.as_literal()) {
                    if let Some(value) = self.fold_binary_op(l, *op, r) {
                        return Expression::literal(value, expr.position);
                    }
                }
                ExpressionKind::Binary {
                    left: Box::new(left),
                    op: *op,
                    right: Box::new(right),
                }
            }

            ExpressionKind::Unary { op, operand } => {
                let operand = self.fold(operand);
                if let Some(value) = operand.as_literal() {
                    if let Ok(result) = ops::unary(*op, value) {
                        return Expression::literal(result, expr.position);
                    }
                }
                ExpressionKind::Unary {
                    op: *op,
                    operand: Box::new(operand),
                }
            }

            ExpressionKind::FieldAccess { object, field } => ExpressionKind::FieldAccess {
                object: Box::new(self.fold(object)),
                field: field.clone(),
            },

            ExpressionKind::Index { target, index } => ExpressionKind::Index {
                target: Box::new(self.fold(target)),
                index: Box::new(self.fold(index)),
            },

            ExpressionKind::Array(items) => {
                ExpressionKind::Array(items.iter().map(|item| self.fold(item)).collect())
            }

            ExpressionKind::Map(entries) => ExpressionKind::Map(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), self.fold(value)))
                    .collect(),
            ),

            // Calls are never folded; only their arguments are
            ExpressionKind::FunctionCall(call) => {
                let mut call = call.clone();
                match &mut call.args {
                    Arguments::Bound(slots) => {
                        for value in slots.iter_mut().flatten() {
                            *value = self.fold(value);
                        }
                    }
                    Arguments::Unbound(args) => {
                        for arg in args.iter_mut() {
                            arg.value = self.fold(&arg.value);
                        }
                    }
                }
                ExpressionKind::FunctionCall(call)
            }
        };

        Expression {
            kind,
            position: expr.position,
            ty: expr.ty,
        }
    }

    fn fold_binary_op(&self, left: &Value, op: Operator, right: &Value) -> Option<Value> {
        match op {
            Operator::And | Operator::Or => match (left, right) {
                (Value::Bool(l), Value::Bool(r)) => Some(Value::Bool(if op == Operator::And {
                    *l && *r
                } else {
                    *l || *r
                })),
                _ => None,
            },
            op if op.is_arithmetic() => ops::arithmetic(op, left, right).ok(),
            op => ops::compare(op, left, right).ok().map(Value::Bool),
        }
    }
}

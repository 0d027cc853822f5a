//! Tree-walking interpreter
//!
//! Evaluates bound expressions and statements against an
//! [`EvaluationContext`]. Used for simulation and for rules that are not
//! compiled ahead of time.

use super::invoke;
use crate::context::EvaluationContext;
use crate::error::{Result, RuntimeError};
use crate::function::FunctionRegistry;
use sluice_core::ast::{Arguments, Expression, ExpressionKind, FunctionCall, Operator, Statement};
use sluice_core::types::ops;
use sluice_core::Value;
use std::collections::BTreeMap;

/// Interpreter over a function registry
#[derive(Debug, Clone, Copy)]
pub struct Interpreter<'r> {
    registry: &'r FunctionRegistry,
}

impl<'r> Interpreter<'r> {
    pub fn new(registry: &'r FunctionRegistry) -> Self {
        Self { registry }
    }

    /// Evaluate an expression to a value
    pub fn evaluate(&self, expr: &Expression, ctx: &mut EvaluationContext<'_>) -> Result<Value> {
        match &expr.kind {
            ExpressionKind::Literal(value) => Ok(value.clone()),

            ExpressionKind::MessageField(name) => {
                Ok(ctx.message().get_field(name).unwrap_or(Value::Null))
            }

            ExpressionKind::Variable(name) => ctx.variable(name).cloned(),

            ExpressionKind::FieldAccess { object, field } => {
                let object = self.evaluate(object, ctx)?;
                Ok(ops::member(&object, field))
            }

            ExpressionKind::Index { target, index } => {
                let target = self.evaluate(target, ctx)?;
                let index = self.evaluate(index, ctx)?;
                Ok(ops::index(&target, &index))
            }

            ExpressionKind::Array(items) => items
                .iter()
                .map(|item| self.evaluate(item, ctx))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),

            ExpressionKind::Map(entries) => {
                let mut map = BTreeMap::new();
                for (key, value) in entries {
                    map.insert(key.clone(), self.evaluate(value, ctx)?);
                }
                Ok(Value::Map(map))
            }

            ExpressionKind::Unary { op, operand } => {
                let operand = self.evaluate(operand, ctx)?;
                Ok(ops::unary(*op, &operand)?)
            }

            ExpressionKind::Binary { left, op, right } => match op {
                Operator::And => {
                    let result = ops::is_truthy(&self.evaluate(left, ctx)?)
                        && ops::is_truthy(&self.evaluate(right, ctx)?);
                    Ok(Value::Bool(result))
                }
                Operator::Or => {
                    let result = ops::is_truthy(&self.evaluate(left, ctx)?)
                        || ops::is_truthy(&self.evaluate(right, ctx)?);
                    Ok(Value::Bool(result))
                }
                op => {
                    let left = self.evaluate(left, ctx)?;
                    let right = self.evaluate(right, ctx)?;
                    if op.is_arithmetic() {
                        Ok(ops::arithmetic(*op, &left, &right)?)
                    } else {
                        Ok(Value::Bool(ops::compare(*op, &left, &right)?))
                    }
                }
            },

            ExpressionKind::FunctionCall(call) => self.call(call, ctx),
        }
    }

    fn call(&self, call: &FunctionCall, ctx: &mut EvaluationContext<'_>) -> Result<Value> {
        let Arguments::Bound(slots) = &call.args else {
            return Err(RuntimeError::UnboundCall(call.name.clone()));
        };
        let function = self
            .registry
            .get(&call.name)
            .ok_or_else(|| RuntimeError::UnknownFunction(call.name.clone()))?;

        let mut values = Vec::with_capacity(slots.len());
        for slot in slots {
            values.push(match slot {
                Some(expr) => Some(self.evaluate(expr, ctx)?),
                None => None,
            });
        }
        invoke(function.as_ref(), values, ctx)
    }

    /// Evaluate a rule condition
    pub fn evaluate_condition(
        &self,
        condition: &Expression,
        ctx: &mut EvaluationContext<'_>,
    ) -> Result<bool> {
        Ok(ops::is_truthy(&self.evaluate(condition, ctx)?))
    }

    /// Execute statements in order, stopping at the first failure
    pub fn execute(&self, statements: &[Statement], ctx: &mut EvaluationContext<'_>) -> Result<()> {
        for statement in statements {
            match statement {
                Statement::Let { name, value, .. } => {
                    let value = self.evaluate(value, ctx)?;
                    ctx.define(name.clone(), value);
                }
                Statement::Expression(expr) => {
                    self.evaluate(expr, ctx)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{LogMessage, Message};
    use sluice_core::ast::{Position, UnaryOperator};
    use sluice_core::CoreError;

    fn pos() -> Position {
        Position::new(1, 1)
    }

    fn registry() -> FunctionRegistry {
        FunctionRegistry::with_builtins().unwrap()
    }

    fn bound_call(name: &str, slots: Vec<Option<Expression>>) -> Expression {
        Expression::new(
            ExpressionKind::FunctionCall(FunctionCall {
                name: name.to_string(),
                args: Arguments::Bound(slots),
            }),
            pos(),
        )
    }

    #[test]
    fn test_missing_field_is_null() {
        let registry = registry();
        let mut msg = LogMessage::empty();
        let mut ctx = EvaluationContext::new(&mut msg);
        let value = Interpreter::new(&registry)
            .evaluate(&Expression::message_field("absent", pos()), &mut ctx)
            .unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn test_and_short_circuits() {
        let registry = registry();
        let mut msg = LogMessage::empty();
        let mut ctx = EvaluationContext::new(&mut msg);
        // The right side would fail if it were evaluated
        let expr = Expression::binary(
            Expression::literal(false, pos()),
            Operator::And,
            Expression::variable("undefined", pos()),
        );
        let value = Interpreter::new(&registry).evaluate(&expr, &mut ctx);
        assert_eq!(value, Ok(Value::Bool(false)));
    }

    #[test]
    fn test_arithmetic_errors_surface() {
        let registry = registry();
        let mut msg = LogMessage::empty();
        let mut ctx = EvaluationContext::new(&mut msg);
        let expr = Expression::binary(
            Expression::literal(1i64, pos()),
            Operator::Div,
            Expression::literal(0i64, pos()),
        );
        let result = Interpreter::new(&registry).evaluate(&expr, &mut ctx);
        assert_eq!(result, Err(RuntimeError::Core(CoreError::DivisionByZero)));
    }

    #[test]
    fn test_not_of_null_is_true() {
        let registry = registry();
        let mut msg = LogMessage::empty();
        let mut ctx = EvaluationContext::new(&mut msg);
        let expr = Expression::unary(
            UnaryOperator::Not,
            Expression::message_field("missing", pos()),
            pos(),
        );
        assert_eq!(
            Interpreter::new(&registry).evaluate(&expr, &mut ctx),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn test_execute_let_and_call() {
        let registry = registry();
        let mut msg = LogMessage::empty();
        {
            let mut ctx = EvaluationContext::new(&mut msg);
            let statements = vec![
                Statement::Let {
                    name: "v".to_string(),
                    value: Expression::literal("x", pos()),
                    position: pos(),
                },
                Statement::Expression(bound_call(
                    "set_field",
                    vec![
                        Some(Expression::literal("out", pos())),
                        Some(Expression::variable("v", pos())),
                        None,
                        None,
                    ],
                )),
            ];
            Interpreter::new(&registry).execute(&statements, &mut ctx).unwrap();
        }
        assert_eq!(msg.get_field("out"), Some(Value::from("x")));
    }

    #[test]
    fn test_unbound_call_is_rejected() {
        let registry = registry();
        let mut msg = LogMessage::empty();
        let mut ctx = EvaluationContext::new(&mut msg);
        let expr = Expression::call("now", vec![], pos());
        assert_eq!(
            Interpreter::new(&registry).evaluate(&expr, &mut ctx),
            Err(RuntimeError::UnboundCall("now".to_string()))
        );
    }
}

//! Type checker
//!
//! Infers the static type of operator, index and call nodes and reports
//! the type errors of the rule language. Checks never fail; each returns
//! the inferred type together with the error found, if any, so analysis
//! can continue past the problem.

use sluice_core::ast::{Operator, Position, UnaryOperator};
use sluice_core::{FunctionDescriptor, ParameterDescriptor, RuleError, ValueType};
use std::collections::HashMap;

/// Inferred type plus the error found at this node
pub type Checked = (ValueType, Option<RuleError>);

/// Type checker holding the types of `let`-bound variables
#[derive(Debug, Default)]
pub struct TypeChecker {
    variable_types: HashMap<String, ValueType>,
}

impl TypeChecker {
    /// Create a new type checker
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variable with the type of its initializer
    pub fn register_variable(&mut self, name: impl Into<String>, ty: ValueType) {
        self.variable_types.insert(name.into(), ty);
    }

    /// Get the type of a variable
    pub fn get_variable_type(&self, name: &str) -> Option<ValueType> {
        self.variable_types.get(name).copied()
    }

    /// Check a binary operation
    pub fn check_binary_operation(
        &self,
        left: ValueType,
        op: Operator,
        right: ValueType,
        position: Position,
    ) -> Checked {
        let incompatible = || RuleError::IncompatibleTypes {
            position,
            operator: op.symbol().to_string(),
            left,
            right,
        };
        let invalid = |message: String| RuleError::InvalidOperation { position, message };

        if op.is_logical() || op.is_equality() || op.is_comparison() {
            let error = if left == ValueType::Void || right == ValueType::Void {
                Some(incompatible())
            } else if op.is_logical() {
                (left != ValueType::Boolean || right != ValueType::Boolean).then(incompatible)
            } else if op.is_equality() {
                None
            } else if left != right {
                Some(incompatible())
            } else if !left.is_ordered() {
                Some(invalid(format!("values of type {} cannot be ordered", left)))
            } else {
                None
            };
            return (ValueType::Boolean, error);
        }

        if left == ValueType::Void || right == ValueType::Void {
            return (left, Some(incompatible()));
        }

        use Operator::{Add, Sub};
        use ValueType::{DateTime, Duration, Period};
        match (left, op, right) {
            (DateTime, Add | Sub, Period) | (Period, Add, DateTime) => (DateTime, None),
            (Period, Add | Sub, Period) => (Period, None),
            (DateTime, Sub, DateTime) => (Duration, None),
            (DateTime, Add, DateTime) => (
                DateTime,
                Some(invalid("unable to add two dates".to_string())),
            ),
            (Duration, Add | Sub, Duration) => (Duration, None),
            (ValueType::String, Add, ValueType::String) => (ValueType::String, None),
            (ValueType::String, _, ValueType::String) => (
                ValueType::String,
                Some(invalid(format!("operator '{}' is not defined for strings", op))),
            ),
            _ if left != right => (left, Some(incompatible())),
            (ValueType::Long | ValueType::Double | ValueType::Any, _, _) => (left, None),
            _ => (
                left,
                Some(invalid(format!(
                    "operator '{}' is not defined for type {}",
                    op, left
                ))),
            ),
        }
    }

    /// Check a unary operation
    pub fn check_unary_operation(
        &self,
        op: UnaryOperator,
        operand: ValueType,
        position: Position,
    ) -> Checked {
        match op {
            UnaryOperator::Not => {
                let error = (operand != ValueType::Boolean).then(|| RuleError::IncompatibleType {
                    position,
                    expected: ValueType::Boolean,
                    actual: operand,
                });
                (ValueType::Boolean, error)
            }
            UnaryOperator::Negate | UnaryOperator::Plus => {
                let numeric = operand.is_numeric() || operand == ValueType::Any;
                let error = (!numeric).then(|| RuleError::InvalidOperation {
                    position,
                    message: format!("sign '{}' requires a number, got {}", op, operand),
                });
                (operand, error)
            }
        }
    }

    /// Check `target[index]`. The element type is not tracked, so the
    /// result is always `Any`.
    pub fn check_index(
        &self,
        target: ValueType,
        index: ValueType,
        position: Position,
    ) -> Option<RuleError> {
        let expected = match target {
            ValueType::Map => ValueType::String,
            ValueType::List => ValueType::Long,
            actual => return Some(RuleError::NonIndexableType { position, actual }),
        };
        (index != expected).then_some(RuleError::IncompatibleIndexType {
            position,
            expected,
            actual: index,
        })
    }

    /// A rule condition must be boolean. A void condition has already been
    /// reported where it was produced.
    pub fn check_condition(&self, ty: ValueType, position: Position) -> Option<RuleError> {
        (ty != ValueType::Boolean && ty != ValueType::Void).then_some(RuleError::IncompatibleType {
            position,
            expected: ValueType::Boolean,
            actual: ty,
        })
    }

    /// Check one bound argument against its parameter
    pub fn check_argument(
        &self,
        function: &FunctionDescriptor,
        param: &ParameterDescriptor,
        actual: ValueType,
        position: Position,
    ) -> Option<RuleError> {
        (!param.ty.accepts(actual)).then(|| RuleError::IncompatibleArgumentType {
            position,
            function: function.name.clone(),
            parameter: param.name.clone(),
            expected: param.ty,
            actual,
        })
    }
}

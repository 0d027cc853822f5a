//! Run-time semantics of the expression operators
//!
//! The interpreter, the virtual machine and the constant folder all apply
//! operators through these functions, so every evaluation strategy agrees
//! on results and on failures.

use crate::ast::{Operator, UnaryOperator};
use crate::error::{CoreError, Result};
use crate::types::Value;
use std::cmp::Ordering;

/// Only the boolean `true` is truthy
pub fn is_truthy(value: &Value) -> bool {
    matches!(value, Value::Bool(true))
}

/// Structural equality; longs and doubles compare numerically
pub fn equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Long(a), Value::Double(b)) | (Value::Double(b), Value::Long(a)) => {
            (*a as f64) == *b
        }
        _ => left == right,
    }
}

/// Ordering between two values, if they are comparable
pub fn ordering(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Long(a), Value::Long(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
        (Value::Duration(a), Value::Duration(b)) => Some(a.cmp(b)),
        _ => match (left.as_double(), right.as_double()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    }
}

/// Apply an equality or ordering operator. Incomparable values never
/// satisfy an ordering.
pub fn compare(op: Operator, left: &Value, right: &Value) -> Result<bool> {
    let result = match op {
        Operator::Eq => equals(left, right),
        Operator::Ne => !equals(left, right),
        Operator::Lt => ordering(left, right) == Some(Ordering::Less),
        Operator::Le => matches!(ordering(left, right), Some(Ordering::Less | Ordering::Equal)),
        Operator::Gt => ordering(left, right) == Some(Ordering::Greater),
        Operator::Ge => matches!(
            ordering(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        other => {
            return Err(CoreError::TypeError(format!(
                "'{}' is not a comparison operator",
                other
            )))
        }
    };
    Ok(result)
}

/// Apply an arithmetic operator
pub fn arithmetic(op: Operator, left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Long(a), Value::Long(b)) => long_arithmetic(op, *a, *b),
        (Value::Double(_), Value::Double(_))
        | (Value::Long(_), Value::Double(_))
        | (Value::Double(_), Value::Long(_)) => {
            let (a, b) = (left.as_double(), right.as_double());
            match (a, b) {
                (Some(a), Some(b)) => double_arithmetic(op, a, b),
                _ => Err(unsupported(op, left, right)),
            }
        }
        (Value::String(a), Value::String(b)) if op == Operator::Add => {
            Ok(Value::String(format!("{}{}", a, b)))
        }
        (Value::DateTime(dt), Value::Period(p)) => match op {
            Operator::Add => Ok(Value::DateTime(p.add_to(*dt)?)),
            Operator::Sub => Ok(Value::DateTime(p.subtract_from(*dt)?)),
            _ => Err(unsupported(op, left, right)),
        },
        (Value::Period(p), Value::DateTime(dt)) if op == Operator::Add => {
            Ok(Value::DateTime(p.add_to(*dt)?))
        }
        (Value::Period(a), Value::Period(b)) => match op {
            Operator::Add => Ok(Value::Period(a.plus(b)?)),
            Operator::Sub => Ok(Value::Period(a.minus(b)?)),
            _ => Err(unsupported(op, left, right)),
        },
        (Value::DateTime(a), Value::DateTime(b)) if op == Operator::Sub => {
            Ok(Value::Duration(a.signed_duration_since(*b)))
        }
        (Value::Duration(a), Value::Duration(b)) => match op {
            Operator::Add => a.checked_add(b).map(Value::Duration).ok_or(CoreError::Overflow),
            Operator::Sub => a.checked_sub(b).map(Value::Duration).ok_or(CoreError::Overflow),
            _ => Err(unsupported(op, left, right)),
        },
        _ => Err(unsupported(op, left, right)),
    }
}

fn long_arithmetic(op: Operator, a: i64, b: i64) -> Result<Value> {
    let result = match op {
        Operator::Add => a.checked_add(b),
        Operator::Sub => a.checked_sub(b),
        Operator::Mul => a.checked_mul(b),
        Operator::Div if b == 0 => return Err(CoreError::DivisionByZero),
        Operator::Div => a.checked_div(b),
        Operator::Mod if b == 0 => return Err(CoreError::DivisionByZero),
        Operator::Mod => a.checked_rem(b),
        other => {
            return Err(CoreError::TypeError(format!(
                "'{}' is not an arithmetic operator",
                other
            )))
        }
    };
    result.map(Value::Long).ok_or(CoreError::Overflow)
}

fn double_arithmetic(op: Operator, a: f64, b: f64) -> Result<Value> {
    let result = match op {
        Operator::Add => a + b,
        Operator::Sub => a - b,
        Operator::Mul => a * b,
        Operator::Div => a / b,
        Operator::Mod => a % b,
        other => {
            return Err(CoreError::TypeError(format!(
                "'{}' is not an arithmetic operator",
                other
            )))
        }
    };
    Ok(Value::Double(result))
}

fn unsupported(op: Operator, left: &Value, right: &Value) -> CoreError {
    CoreError::TypeError(format!(
        "cannot apply '{}' to {} and {}",
        op,
        crate::types::ValueType::of(left),
        crate::types::ValueType::of(right)
    ))
}

/// Apply a unary operator
pub fn unary(op: UnaryOperator, operand: &Value) -> Result<Value> {
    match (op, operand) {
        (UnaryOperator::Not, value) => Ok(Value::Bool(!is_truthy(value))),
        (UnaryOperator::Negate, Value::Long(n)) => {
            n.checked_neg().map(Value::Long).ok_or(CoreError::Overflow)
        }
        (UnaryOperator::Negate, Value::Double(n)) => Ok(Value::Double(-n)),
        (UnaryOperator::Plus, Value::Long(_) | Value::Double(_)) => Ok(operand.clone()),
        (op, value) => Err(CoreError::TypeError(format!(
            "cannot apply '{}' to {}",
            op,
            crate::types::ValueType::of(value)
        ))),
    }
}

/// `target[index]`; out-of-range positions and missing keys yield null
pub fn index(target: &Value, index: &Value) -> Value {
    match (target, index) {
        (Value::List(items), Value::Long(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .unwrap_or(Value::Null),
        (Value::Map(map), Value::String(key)) => map.get(key).cloned().unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// `object.name`; only maps have members
pub fn member(object: &Value, name: &str) -> Value {
    match object {
        Value::Map(map) => map.get(name).cloned().unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

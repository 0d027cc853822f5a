//! Call-site argument binding
//!
//! Positional arguments fill parameters in declaration order, named
//! arguments fill parameters by name. A call produces at most one arity
//! error so a single mistake does not fan out into several diagnostics.

use sluice_core::ast::{Argument, Position};
use sluice_core::{FunctionDescriptor, RuleError, Value};

/// What fills a declared parameter after binding
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// The call-site argument at this index
    Argument(usize),
    /// The parameter's declared default
    Default(Value),
    /// Omitted optional parameter without a default
    Absent,
}

/// Bind call-site arguments to the descriptor's parameters.
///
/// On failure every binding error for this call is returned; the caller
/// skips argument type checks for a call that did not bind.
pub fn bind(
    descriptor: &FunctionDescriptor,
    args: &[Argument],
    position: Position,
) -> Result<Vec<Slot>, Vec<RuleError>> {
    let params = &descriptor.params;
    let wrong_arity = || RuleError::WrongNumberOfArgs {
        position,
        function: descriptor.name.clone(),
        expected: descriptor.required_count(),
        actual: args.len(),
    };

    if args.len() > params.len() {
        return Err(vec![wrong_arity()]);
    }

    let mut filled: Vec<Option<usize>> = vec![None; params.len()];

    let positional = args.iter().take_while(|arg| arg.name.is_none()).count();
    for (i, slot) in filled.iter_mut().enumerate().take(positional) {
        let required_later = params[i + 1..].iter().any(|p| !p.optional);
        if params[i].optional && required_later {
            return Err(vec![RuleError::OptionalParametersMustBeNamed {
                position,
                function: descriptor.name.clone(),
            }]);
        }
        *slot = Some(i);
    }

    let mut errors = Vec::new();
    for (i, arg) in args.iter().enumerate().skip(positional) {
        let Some(name) = &arg.name else {
            errors.push(RuleError::InvalidFunctionArgument {
                position: arg.value.position,
                function: descriptor.name.clone(),
                message: "positional argument after named argument".to_string(),
            });
            continue;
        };
        match descriptor.param_index(name) {
            None => errors.push(RuleError::InvalidFunctionArgument {
                position: arg.value.position,
                function: descriptor.name.clone(),
                message: format!("unknown parameter '{}'", name),
            }),
            Some(index) if filled[index].is_some() => {
                errors.push(RuleError::InvalidFunctionArgument {
                    position: arg.value.position,
                    function: descriptor.name.clone(),
                    message: format!("parameter '{}' supplied more than once", name),
                })
            }
            Some(index) => filled[index] = Some(i),
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    let missing_required = params
        .iter()
        .zip(&filled)
        .any(|(param, slot)| !param.optional && slot.is_none());
    if missing_required {
        return Err(vec![wrong_arity()]);
    }

    Ok(params
        .iter()
        .zip(filled)
        .map(|(param, slot)| match (slot, &param.default) {
            (Some(index), _) => Slot::Argument(index),
            (None, Some(default)) => Slot::Default(default.clone()),
            (None, None) => Slot::Absent,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::ast::Expression;
    use sluice_core::{ParameterDescriptor, ValueType};

    fn pos() -> Position {
        Position::new(1, 1)
    }

    fn positional(n: usize) -> Vec<Argument> {
        (0..n)
            .map(|i| Argument::positional(Expression::literal(i as i64, pos())))
            .collect()
    }

    fn named(name: &str) -> Argument {
        Argument::named(name, Expression::literal(0i64, pos()))
    }

    fn required_ab() -> FunctionDescriptor {
        FunctionDescriptor::new("required", ValueType::Boolean)
            .param(ParameterDescriptor::required("a", ValueType::Long))
            .param(ParameterDescriptor::required("b", ValueType::String))
    }

    fn trailing_optional() -> FunctionDescriptor {
        FunctionDescriptor::new("to_long", ValueType::Long)
            .param(ParameterDescriptor::required("value", ValueType::Any))
            .param(ParameterDescriptor::optional("default", ValueType::Long).with_default(0i64))
            .param(ParameterDescriptor::optional("radix", ValueType::Long))
    }

    fn optional_in_the_middle() -> FunctionDescriptor {
        FunctionDescriptor::new("optional", ValueType::Boolean)
            .param(ParameterDescriptor::required("a", ValueType::Boolean))
            .param(ParameterDescriptor::required("b", ValueType::String))
            .param(ParameterDescriptor::optional("c", ValueType::Double))
            .param(ParameterDescriptor::required("d", ValueType::Long))
    }

    #[test]
    fn test_positional_binding() {
        let slots = bind(&required_ab(), &positional(2), pos()).unwrap();
        assert_eq!(slots, vec![Slot::Argument(0), Slot::Argument(1)]);
    }

    #[test]
    fn test_named_binding_in_any_order() {
        let slots = bind(&required_ab(), &[named("b"), named("a")], pos()).unwrap();
        assert_eq!(slots, vec![Slot::Argument(1), Slot::Argument(0)]);
    }

    #[test]
    fn test_defaults_fill_omitted_optionals() {
        let slots = bind(&trailing_optional(), &positional(1), pos()).unwrap();
        assert_eq!(
            slots,
            vec![Slot::Argument(0), Slot::Default(Value::Long(0)), Slot::Absent]
        );
    }

    #[test]
    fn test_missing_required_is_single_error() {
        let errors = bind(&required_ab(), &positional(1), pos()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            RuleError::WrongNumberOfArgs { expected: 2, actual: 1, .. }
        ));
    }

    #[test]
    fn test_too_many_arguments() {
        let errors = bind(&required_ab(), &positional(3), pos()).unwrap_err();
        assert!(matches!(errors[0], RuleError::WrongNumberOfArgs { .. }));
    }

    #[test]
    fn test_positional_optional_before_required_must_be_named() {
        let errors = bind(&optional_in_the_middle(), &positional(3), pos()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], RuleError::OptionalParametersMustBeNamed { .. }));
    }

    #[test]
    fn test_positional_call_stopping_before_optional_is_arity_error() {
        let errors = bind(&optional_in_the_middle(), &positional(2), pos()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            RuleError::WrongNumberOfArgs { expected: 3, actual: 2, .. }
        ));
    }

    #[test]
    fn test_optional_in_the_middle_named() {
        let args = vec![
            Argument::positional(Expression::literal(true, pos())),
            Argument::positional(Expression::literal("s", pos())),
            named("d"),
        ];
        let slots = bind(&optional_in_the_middle(), &args, pos()).unwrap();
        assert_eq!(
            slots,
            vec![Slot::Argument(0), Slot::Argument(1), Slot::Absent, Slot::Argument(2)]
        );
    }

    #[test]
    fn test_unknown_and_duplicate_names() {
        let errors = bind(&required_ab(), &[named("a"), named("a"), named("z")], pos())
            .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, RuleError::InvalidFunctionArgument { .. })));
    }

    #[test]
    fn test_positional_then_named_for_same_param() {
        let mut args = positional(1);
        args.push(named("a"));
        let errors = bind(&required_ab(), &args, pos()).unwrap_err();
        assert_eq!(errors.len(), 1);
    }
}

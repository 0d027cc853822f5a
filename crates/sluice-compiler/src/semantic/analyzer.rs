//! Semantic analyzer
//!
//! Resolves variables and calls against a [`FunctionCatalog`], binds call
//! arguments, infers types and collects every error found. The rule is
//! annotated in place: each expression gets its inferred type and each
//! call gets its bound argument list.

use super::binder::{self, Slot};
use super::type_checker::TypeChecker;
use sluice_core::ast::{Arguments, Expression, ExpressionKind, FunctionCall, Rule, Statement};
use sluice_core::{FunctionCatalog, RuleError, Value, ValueType};

/// Semantic analyzer for one rule
pub struct SemanticAnalyzer<'a> {
    catalog: &'a dyn FunctionCatalog,
    checker: TypeChecker,
    errors: Vec<RuleError>,
}

impl<'a> SemanticAnalyzer<'a> {
    /// Create a new semantic analyzer
    pub fn new(catalog: &'a dyn FunctionCatalog) -> Self {
        Self {
            catalog,
            checker: TypeChecker::new(),
            errors: Vec::new(),
        }
    }

    /// Analyze a rule, returning every error in source order
    pub fn analyze_rule(mut self, rule: &mut Rule) -> Result<(), Vec<RuleError>> {
        self.analyze_expression(&mut rule.when);
        if let Some(error) = self.checker.check_condition(rule.when.ty, rule.when.position) {
            self.errors.push(error);
        }

        for statement in &mut rule.then {
            match statement {
                Statement::Let { name, value, .. } => {
                    self.analyze_expression(value);
                    self.checker.register_variable(name.clone(), value.ty);
                }
                Statement::Expression(expr) => self.analyze_expression(expr),
            }
        }

        self.finish()
    }

    /// Analyze a standalone expression
    pub fn analyze_standalone(mut self, expr: &mut Expression) -> Result<(), Vec<RuleError>> {
        self.analyze_expression(expr);
        self.finish()
    }

    fn finish(mut self) -> Result<(), Vec<RuleError>> {
        if self.errors.is_empty() {
            return Ok(());
        }
        self.errors.sort_by_key(RuleError::position);
        Err(self.errors)
    }

    fn analyze_expression(&mut self, expr: &mut Expression) {
        let position = expr.position;
        let ty = match &mut expr.kind {
            ExpressionKind::Literal(value) => ValueType::of(value),
            ExpressionKind::MessageField(_) => ValueType::Any,
            ExpressionKind::Variable(name) => match self.checker.get_variable_type(name) {
                Some(ty) => ty,
                None => {
                    self.errors.push(RuleError::UndeclaredVariable {
                        position,
                        name: name.clone(),
                    });
                    ValueType::Void
                }
            },
            ExpressionKind::FieldAccess { object, .. } => {
                self.analyze_expression(object);
                ValueType::Any
            }
            ExpressionKind::Index { target, index } => {
                self.analyze_expression(target);
                self.analyze_expression(index);
                self.push(self.checker.check_index(target.ty, index.ty, position));
                ValueType::Any
            }
            ExpressionKind::Array(items) => {
                items.iter_mut().for_each(|item| self.analyze_expression(item));
                ValueType::List
            }
            ExpressionKind::Map(entries) => {
                entries
                    .iter_mut()
                    .for_each(|(_, value)| self.analyze_expression(value));
                ValueType::Map
            }
            ExpressionKind::Unary { op, operand } => {
                self.analyze_expression(operand);
                let (ty, error) = self.checker.check_unary_operation(*op, operand.ty, position);
                self.push(error);
                ty
            }
            ExpressionKind::Binary { left, op, right } => {
                self.analyze_expression(left);
                self.analyze_expression(right);
                let (ty, error) =
                    self.checker
                        .check_binary_operation(left.ty, *op, right.ty, position);
                self.push(error);
                ty
            }
            ExpressionKind::FunctionCall(call) => self.analyze_call(call, position),
        };
        expr.ty = ty;
    }

    fn analyze_call(
        &mut self,
        call: &mut FunctionCall,
        position: sluice_core::ast::Position,
    ) -> ValueType {
        match &mut call.args {
            Arguments::Unbound(args) => args
                .iter_mut()
                .for_each(|arg| self.analyze_expression(&mut arg.value)),
            Arguments::Bound(slots) => slots
                .iter_mut()
                .flatten()
                .for_each(|value| self.analyze_expression(value)),
        }

        let catalog = self.catalog;
        let Some(descriptor) = catalog.descriptor(&call.name) else {
            self.errors.push(RuleError::UndeclaredFunction {
                position,
                name: call.name.clone(),
            });
            return ValueType::Void;
        };

        let args = match std::mem::replace(&mut call.args, Arguments::Bound(Vec::new())) {
            Arguments::Unbound(args) => args,
            bound @ Arguments::Bound(_) => {
                call.args = bound;
                return descriptor.return_type;
            }
        };

        let slots = match binder::bind(descriptor, &args, position) {
            Ok(slots) => slots,
            Err(errors) => {
                self.errors.extend(errors);
                call.args = Arguments::Unbound(args);
                return descriptor.return_type;
            }
        };

        for (param, slot) in descriptor.params.iter().zip(&slots) {
            if let Slot::Argument(i) = slot {
                let value = &args[*i].value;
                let error = self
                    .checker
                    .check_argument(descriptor, param, value.ty, value.position);
                self.push(error);
            }
        }

        let constants: Vec<Option<&Value>> = slots
            .iter()
            .map(|slot| match slot {
                Slot::Argument(i) => args[*i].value.as_literal(),
                Slot::Default(value) => Some(value),
                Slot::Absent => None,
            })
            .collect();
        if let Err(message) = catalog.check_constant_args(&call.name, &constants) {
            self.errors.push(RuleError::InvalidFunctionArgument {
                position,
                function: call.name.clone(),
                message,
            });
        }

        let mut args: Vec<Option<Expression>> =
            args.into_iter().map(|arg| Some(arg.value)).collect();
        let bound = slots
            .into_iter()
            .map(|slot| match slot {
                Slot::Argument(i) => args[i].take(),
                Slot::Default(value) => Some(Expression::literal(value, position)),
                Slot::Absent => None,
            })
            .collect();
        call.args = Arguments::Bound(bound);

        descriptor.return_type
    }

    fn push(&mut self, error: Option<RuleError>) {
        self.errors.extend(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::{FunctionDescriptor, ParameterDescriptor};
    use sluice_parser::{ExpressionParser, RuleParser};
    use std::collections::HashMap;

    fn catalog() -> HashMap<String, FunctionDescriptor> {
        let descriptors = [FunctionDescriptor::new("to_long", ValueType::Long)
            .param(ParameterDescriptor::required("value", ValueType::Any))
            .param(ParameterDescriptor::optional("default", ValueType::Long).with_default(0i64))];
        descriptors
            .into_iter()
            .map(|d| (d.name.clone(), d))
            .collect()
    }

    fn analyze(source: &str) -> Result<Rule, Vec<RuleError>> {
        let catalog = catalog();
        let mut rule = RuleParser::parse(source).expect("parses");
        SemanticAnalyzer::new(&catalog).analyze_rule(&mut rule)?;
        Ok(rule)
    }

    #[test]
    fn test_binds_defaults() {
        let rule = analyze(r#"rule "r" when to_long($message.x) > 1 then end"#).unwrap();
        let ExpressionKind::Binary { left, .. } = &rule.when.kind else {
            panic!("expected binary condition");
        };
        assert_eq!(left.ty, ValueType::Long);
        let ExpressionKind::FunctionCall(call) = &left.kind else {
            panic!("expected call");
        };
        let Arguments::Bound(slots) = &call.args else {
            panic!("expected bound arguments");
        };
        assert_eq!(slots.len(), 2);
        assert_eq!(
            slots[1].as_ref().and_then(Expression::as_literal),
            Some(&Value::Long(0))
        );
    }

    #[test]
    fn test_let_types_flow_to_uses() {
        let rule = analyze(
            r#"rule "r" when true then let n = to_long($message.x); let m = n + 1; end"#,
        )
        .unwrap();
        let Statement::Let { value, .. } = &rule.then[1] else {
            panic!("expected let");
        };
        assert_eq!(value.ty, ValueType::Long);
    }

    #[test]
    fn test_variables_are_not_visible_before_declaration() {
        let errors = analyze(r#"rule "r" when true then let a = b; let b = 1; end"#).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), "UndeclaredVariable");
    }

    #[test]
    fn test_standalone_expression() {
        let catalog = catalog();
        let mut expr = ExpressionParser::parse("to_long(\"1\") + 2").unwrap();
        SemanticAnalyzer::new(&catalog)
            .analyze_standalone(&mut expr)
            .unwrap();
        assert_eq!(expr.ty, ValueType::Long);
    }

    #[test]
    fn test_condition_must_be_boolean() {
        let errors = analyze(r#"rule "r" when 1 + 1 then end"#).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), "IncompatibleType");
    }
}

//! Semantic analysis over complete rules

use sluice_compiler::Compiler;
use sluice_core::ast::{Arguments, ExpressionKind, Statement};
use sluice_core::{FunctionCatalog, FunctionDescriptor, ParameterDescriptor, RuleError, Value, ValueType};
use std::collections::HashMap;

/// Catalog with the handful of functions the tests call
struct TestCatalog {
    functions: HashMap<String, FunctionDescriptor>,
}

impl TestCatalog {
    fn new() -> Self {
        let descriptors = vec![
            FunctionDescriptor::new("nein", ValueType::Boolean),
            FunctionDescriptor::new("doch", ValueType::Boolean),
            FunctionDescriptor::new("one_arg", ValueType::String)
                .param(ParameterDescriptor::required("one", ValueType::String)),
            FunctionDescriptor::new("concat", ValueType::String)
                .param(ParameterDescriptor::required("one", ValueType::String))
                .param(ParameterDescriptor::required("two", ValueType::String))
                .param(ParameterDescriptor::required("three", ValueType::String)),
            FunctionDescriptor::new("trailing", ValueType::Long)
                .param(ParameterDescriptor::required("value", ValueType::Any))
                .param(ParameterDescriptor::optional("default", ValueType::Long).with_default(7i64)),
            FunctionDescriptor::new("optional", ValueType::Boolean)
                .param(ParameterDescriptor::required("a", ValueType::Boolean))
                .param(ParameterDescriptor::required("b", ValueType::String))
                .param(ParameterDescriptor::optional("c", ValueType::Long))
                .param(ParameterDescriptor::required("d", ValueType::String)),
            FunctionDescriptor::new("to_map", ValueType::Map)
                .param(ParameterDescriptor::required("value", ValueType::Any)),
            FunctionDescriptor::new("now", ValueType::DateTime),
            FunctionDescriptor::new("years", ValueType::Period)
                .param(ParameterDescriptor::required("value", ValueType::Long)),
            FunctionDescriptor::new("regex", ValueType::Map)
                .param(ParameterDescriptor::required("pattern", ValueType::String))
                .param(ParameterDescriptor::required("value", ValueType::String)),
            FunctionDescriptor::new("set_field", ValueType::Void)
                .param(ParameterDescriptor::required("field", ValueType::String))
                .param(ParameterDescriptor::required("value", ValueType::Any)),
        ];
        Self {
            functions: descriptors.into_iter().map(|d| (d.name.clone(), d)).collect(),
        }
    }
}

impl FunctionCatalog for TestCatalog {
    fn descriptor(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.get(name)
    }

    fn check_constant_args(&self, name: &str, args: &[Option<&Value>]) -> Result<(), String> {
        match (name, args.first()) {
            ("regex", Some(Some(Value::String(pattern)))) if pattern.contains('[') && !pattern.contains(']') => {
                Err(format!("invalid pattern '{}'", pattern))
            }
            _ => Ok(()),
        }
    }
}

fn errors_of(source: &str) -> Vec<RuleError> {
    let catalog = TestCatalog::new();
    Compiler::new(&catalog).parse_rule(source).unwrap_err()
}

fn kinds(errors: &[RuleError]) -> Vec<&'static str> {
    errors.iter().map(RuleError::kind).collect()
}

#[test]
fn test_valid_rule() {
    let catalog = TestCatalog::new();
    let rule = Compiler::new(&catalog)
        .parse_rule(
            r#"rule "valid"
               when doch() && !nein()
               then
                 let greeting = concat("a", "b", "c");
                 set_field("greeting", greeting);
               end"#,
        )
        .unwrap();
    assert_eq!(rule.rule().when.ty, ValueType::Boolean);
}

#[test]
fn test_parsing_twice_is_identical() {
    let catalog = TestCatalog::new();
    let compiler = Compiler::new(&catalog);
    let source = r#"rule "r" when trailing($message.x) > 3 then set_field("y", 1); end"#;
    assert_eq!(compiler.parse_rule(source), compiler.parse_rule(source));
}

#[test]
fn test_undeclared_variable_reports_cascade() {
    let errors = errors_of(r#"rule "r" when true then let x = missing + 1; end"#);
    assert!(kinds(&errors).contains(&"UndeclaredVariable"));
    assert!(kinds(&errors).contains(&"IncompatibleTypes"));
}

#[test]
fn test_undeclared_function() {
    let errors = errors_of(r#"rule "r" when unknown() then end"#);
    assert_eq!(kinds(&errors), vec!["UndeclaredFunction"]);
}

#[test]
fn test_missing_required_argument_reports_only_arity() {
    let errors = errors_of(r#"rule "r" when true then let x = concat("a", "b"); end"#);
    assert_eq!(
        errors,
        vec![RuleError::WrongNumberOfArgs {
            position: errors[0].position(),
            function: "concat".to_string(),
            expected: 3,
            actual: 2,
        }]
    );
}

#[test]
fn test_too_many_arguments() {
    let errors = errors_of(r#"rule "r" when true then let x = one_arg("a", "b"); end"#);
    assert_eq!(kinds(&errors), vec!["WrongNumberOfArgs"]);
}

#[test]
fn test_omitted_optional_takes_default() {
    let catalog = TestCatalog::new();
    let rule = Compiler::new(&catalog)
        .parse_rule(r#"rule "r" when trailing($message.x) == 7 then end"#)
        .unwrap();
    let ExpressionKind::Binary { left, .. } = &rule.rule().when.kind else {
        panic!("expected binary");
    };
    let ExpressionKind::FunctionCall(call) = &left.kind else {
        panic!("expected call");
    };
    let Arguments::Bound(slots) = &call.args else {
        panic!("expected bound call");
    };
    assert_eq!(slots[1].as_ref().and_then(|e| e.as_literal()), Some(&Value::Long(7)));
}

#[test]
fn test_positional_optional_must_be_named() {
    let errors = errors_of(r#"rule "r" when optional(true, "b", 1, "d") then end"#);
    assert_eq!(kinds(&errors), vec!["OptionalParametersMustBeNamed"]);
}

#[test]
fn test_positional_call_missing_trailing_required_is_arity_error() {
    let errors = errors_of(r#"rule "r" when true then let x = optional(true, "b"); end"#);
    assert_eq!(
        errors,
        vec![RuleError::WrongNumberOfArgs {
            position: errors[0].position(),
            function: "optional".to_string(),
            expected: 3,
            actual: 2,
        }]
    );
}

#[test]
fn test_named_optional_is_accepted() {
    let catalog = TestCatalog::new();
    let rule = Compiler::new(&catalog)
        .parse_rule(r#"rule "r" when optional(true, "b", d: "d", c: 1) then end"#)
        .unwrap();
    assert_eq!(rule.rule().when.ty, ValueType::Boolean);
}

#[test]
fn test_incompatible_argument_type() {
    let errors = errors_of(r#"rule "r" when true then let x = one_arg(1); end"#);
    assert!(matches!(
        &errors[..],
        [RuleError::IncompatibleArgumentType { expected: ValueType::String, actual: ValueType::Long, .. }]
    ));
}

#[test]
fn test_message_fields_need_conversion_for_typed_parameters() {
    let errors = errors_of(r#"rule "r" when true then let x = one_arg($message.x); end"#);
    assert_eq!(kinds(&errors), vec!["IncompatibleArgumentType"]);
}

#[test]
fn test_non_indexable_type() {
    let errors = errors_of(r#"rule "r" when true then let x = 1; let y = x[0]; end"#);
    assert_eq!(kinds(&errors), vec!["NonIndexableType"]);
}

#[test]
fn test_map_requires_string_index() {
    let errors = errors_of(r#"rule "r" when true then let m = to_map($message.x); let y = m[1]; end"#);
    assert_eq!(kinds(&errors), vec!["IncompatibleIndexType"]);
}

#[test]
fn test_valid_indexing() {
    let catalog = TestCatalog::new();
    let result = Compiler::new(&catalog).parse_rule(
        r#"rule "r" when true then let l = [1, 2]; let a = l[0]; let m = {k: "v"}; let b = m["k"]; end"#,
    );
    assert!(result.is_ok(), "{:?}", result);
}

#[test]
fn test_date_plus_number_is_incompatible() {
    let errors = errors_of(r#"rule "r" when true then let x = now() + 1; end"#);
    assert_eq!(kinds(&errors), vec!["IncompatibleTypes"]);
}

#[test]
fn test_date_plus_period() {
    let catalog = TestCatalog::new();
    let rule = Compiler::new(&catalog)
        .parse_rule(r#"rule "r" when now() + years(1) > now() then end"#)
        .unwrap();
    assert_eq!(rule.rule().when.ty, ValueType::Boolean);
}

#[test]
fn test_adding_two_dates_is_invalid() {
    let errors = errors_of(r#"rule "r" when true then let x = now() + now(); end"#);
    assert_eq!(kinds(&errors), vec!["InvalidOperation"]);
}

#[test]
fn test_constant_argument_preflight() {
    let errors = errors_of(r#"rule "r" when true then let m = regex("[a-", "abc"); end"#);
    assert_eq!(kinds(&errors), vec!["InvalidFunctionArgument"]);
}

#[test]
fn test_condition_must_be_boolean() {
    let errors = errors_of(r#"rule "r" when one_arg("x") then end"#);
    assert_eq!(kinds(&errors), vec!["IncompatibleType"]);
}

#[test]
fn test_all_errors_are_collected_in_source_order() {
    let errors = errors_of(
        r#"rule "r"
           when nope()
           then
             let a = concat("x");
             let b = 1 + 1.5;
           end"#,
    );
    assert_eq!(
        kinds(&errors),
        vec!["UndeclaredFunction", "WrongNumberOfArgs", "IncompatibleTypes"]
    );
    let lines: Vec<u32> = errors.iter().map(|e| e.position().line).collect();
    assert_eq!(lines, vec![2, 4, 5]);
}

#[test]
fn test_call_statement_is_bound() {
    let catalog = TestCatalog::new();
    let rule = Compiler::new(&catalog)
        .parse_rule(r#"rule "r" when true then set_field(value: 1, field: "f"); end"#)
        .unwrap();
    let Statement::Expression(expr) = &rule.rule().then[0] else {
        panic!("expected call statement");
    };
    let ExpressionKind::FunctionCall(call) = &expr.kind else {
        panic!("expected call");
    };
    let Arguments::Bound(slots) = &call.args else {
        panic!("expected bound call");
    };
    assert_eq!(
        slots[0].as_ref().and_then(|e| e.as_literal()),
        Some(&Value::String("f".to_string()))
    );
}

//! Code generation over validated rules

use sluice_compiler::{Compiler, CompilerOptions};
use sluice_core::ir::Instruction;
use sluice_core::{FunctionDescriptor, ParameterDescriptor, Value, ValueType};
use std::collections::HashMap;

fn catalog() -> HashMap<String, FunctionDescriptor> {
    [
        FunctionDescriptor::new("has_field", ValueType::Boolean)
            .param(ParameterDescriptor::required("field", ValueType::String)),
        FunctionDescriptor::new("to_long", ValueType::Long)
            .param(ParameterDescriptor::required("value", ValueType::Any))
            .param(ParameterDescriptor::optional("default", ValueType::Long).with_default(0i64)),
        FunctionDescriptor::new("set_field", ValueType::Void)
            .param(ParameterDescriptor::required("field", ValueType::String))
            .param(ParameterDescriptor::required("value", ValueType::Any))
            .param(ParameterDescriptor::optional("prefix", ValueType::String))
            .param(ParameterDescriptor::optional("suffix", ValueType::String)),
    ]
    .into_iter()
    .map(|d| (d.name.clone(), d))
    .collect()
}

const RULE: &str = r#"
rule "flag slow requests"
when
    has_field("took_ms") && to_long($message.took_ms) > 1000
then
    let slow = to_long($message.took_ms) / 1000;
    set_field("slow_seconds", slow);
    set_field("flag", true, suffix: "!");
end
"#;

#[test]
fn test_function_tables_are_per_program() {
    let catalog = catalog();
    let compiler = Compiler::new(&catalog);
    let program = compiler.compile_rule(&compiler.parse_rule(RULE).unwrap()).unwrap();

    assert_eq!(program.condition.functions, vec!["has_field", "to_long"]);
    assert_eq!(program.actions.functions, vec!["to_long", "set_field"]);
    assert!(program.condition.is_well_formed());
    assert!(program.actions.is_well_formed());
}

#[test]
fn test_call_records_present_slots() {
    let catalog = catalog();
    let compiler = Compiler::new(&catalog);
    let program = compiler.compile_rule(&compiler.parse_rule(RULE).unwrap()).unwrap();

    let calls: Vec<&Vec<bool>> = program
        .actions
        .instructions
        .iter()
        .filter_map(|instruction| match instruction {
            Instruction::Call { args, .. } => Some(args),
            _ => None,
        })
        .collect();
    assert_eq!(
        calls,
        vec![
            &vec![true, true],
            &vec![true, true, false, false],
            &vec![true, true, false, true],
        ]
    );
}

#[test]
fn test_statements_leave_stack_balanced() {
    let catalog = catalog();
    let compiler = Compiler::new(&catalog);
    let program = compiler.compile_rule(&compiler.parse_rule(RULE).unwrap()).unwrap();

    let tail: Vec<&Instruction> = program
        .actions
        .instructions
        .iter()
        .filter(|i| matches!(i, Instruction::Store { .. } | Instruction::Pop))
        .collect();
    assert_eq!(tail.len(), 3);
    assert_eq!(program.actions.instructions.last(), Some(&Instruction::Pop));
}

#[test]
fn test_constant_conditions_fold() {
    let catalog = catalog();
    let source = r#"rule "constant" when 2 * 3 == 6 && "a" + "b" == "ab" then end"#;

    let folding = Compiler::new(&catalog);
    let folded = folding.compile_rule(&folding.parse_rule(source).unwrap()).unwrap();
    assert_eq!(
        folded.condition.instructions,
        vec![Instruction::LoadConst { value: Value::Bool(true) }]
    );

    let plain = Compiler::with_options(
        &catalog,
        CompilerOptions {
            enable_constant_folding: false,
        },
    );
    let unfolded = plain.compile_rule(&plain.parse_rule(source).unwrap()).unwrap();
    assert!(unfolded.condition.instruction_count() > 1);
}

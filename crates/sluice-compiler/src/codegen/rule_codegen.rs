//! Rule compiler
//!
//! Compiles a validated rule into a [`RuleProgram`]: a condition program
//! that leaves one value on the stack and an action program that leaves
//! the stack empty.

use super::expression_codegen::{ExpressionCompiler, FunctionTable};
use crate::error::{CompileError, Result};
use sluice_core::ast::{Rule, Statement};
use sluice_core::ir::{Instruction, Program, ProgramMetadata, RuleProgram, Section};

/// Rule compiler
pub struct RuleCompiler;

impl RuleCompiler {
    /// Compile a rule into its condition and action programs
    pub fn compile(rule: &Rule) -> Result<RuleProgram> {
        let mut functions = FunctionTable::new();
        let instructions = ExpressionCompiler::compile(&rule.when, &mut functions)?;
        let condition = Program::new(
            instructions,
            functions.into_names(),
            ProgramMetadata::for_rule(&rule.name, Section::Condition),
        );

        let mut functions = FunctionTable::new();
        let mut instructions = Vec::new();
        for statement in &rule.then {
            match statement {
                Statement::Let { name, value, .. } => {
                    instructions.extend(ExpressionCompiler::compile(value, &mut functions)?);
                    instructions.push(Instruction::Store { name: name.clone() });
                }
                Statement::Expression(expr) => {
                    instructions.extend(ExpressionCompiler::compile(expr, &mut functions)?);
                    instructions.push(Instruction::Pop);
                }
            }
        }
        let actions = Program::new(
            instructions,
            functions.into_names(),
            ProgramMetadata::for_rule(&rule.name, Section::Actions)
                .with_custom("statements", rule.then.len().to_string()),
        );

        if !condition.is_well_formed() || !actions.is_well_formed() {
            return Err(CompileError::MalformedProgram(rule.name.clone()));
        }

        Ok(RuleProgram {
            name: rule.name.clone(),
            condition,
            actions,
        })
    }
}

//! Stack virtual machine for compiled rule programs
//!
//! A [`LinkedProgram`] is an IR [`Program`] whose function table has been
//! resolved against a registry. Linking happens once; executing only
//! dispatches on instructions. The operand stack lives in each call to
//! [`LinkedProgram::execute`], so one linked program can run on many
//! threads at once.

use super::invoke;
use crate::context::EvaluationContext;
use crate::error::{Result, RuntimeError};
use crate::function::{Function, FunctionRegistry};
use sluice_core::ir::{Instruction, Program};
use sluice_core::types::ops;
use sluice_core::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A program with every callee resolved
#[derive(Debug, Clone)]
pub struct LinkedProgram {
    program: Program,
    functions: Vec<Arc<dyn Function>>,
}

impl LinkedProgram {
    /// Resolve the function table of `program`
    pub fn link(program: Program, registry: &FunctionRegistry) -> Result<Self> {
        let functions = program
            .functions
            .iter()
            .map(|name| {
                registry
                    .get(name)
                    .cloned()
                    .ok_or_else(|| RuntimeError::UnknownFunction(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { program, functions })
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Run the program and return the value left on top of the stack
    pub fn execute(&self, ctx: &mut EvaluationContext<'_>) -> Result<Option<Value>> {
        let instructions = &self.program.instructions;
        let mut stack: Vec<Value> = Vec::new();
        let mut pc = 0;

        while pc < instructions.len() {
            match &instructions[pc] {
                Instruction::LoadConst { value } => stack.push(value.clone()),

                Instruction::LoadField { name } => {
                    stack.push(ctx.message().get_field(name).unwrap_or(Value::Null))
                }

                Instruction::Load { name } => stack.push(ctx.variable(name)?.clone()),

                Instruction::Store { name } => {
                    let value = pop(&mut stack)?;
                    ctx.define(name.clone(), value);
                }

                Instruction::GetMember { name } => {
                    let object = pop(&mut stack)?;
                    stack.push(ops::member(&object, name));
                }

                Instruction::Index => {
                    let index = pop(&mut stack)?;
                    let target = pop(&mut stack)?;
                    stack.push(ops::index(&target, &index));
                }

                Instruction::MakeList { len } => {
                    let items = pop_n(&mut stack, *len)?;
                    stack.push(Value::List(items));
                }

                Instruction::MakeMap { keys } => {
                    let values = pop_n(&mut stack, keys.len())?;
                    let map: BTreeMap<String, Value> = keys.iter().cloned().zip(values).collect();
                    stack.push(Value::Map(map));
                }

                Instruction::BinaryOp { op } => {
                    let right = pop(&mut stack)?;
                    let left = pop(&mut stack)?;
                    stack.push(ops::arithmetic(*op, &left, &right)?);
                }

                Instruction::Compare { op } => {
                    let right = pop(&mut stack)?;
                    let left = pop(&mut stack)?;
                    stack.push(Value::Bool(ops::compare(*op, &left, &right)?));
                }

                Instruction::UnaryOp { op } => {
                    let operand = pop(&mut stack)?;
                    stack.push(ops::unary(*op, &operand)?);
                }

                Instruction::Call { function, args } => {
                    let present = args.iter().filter(|present| **present).count();
                    let mut popped = pop_n(&mut stack, present)?.into_iter();
                    let values = args
                        .iter()
                        .map(|present| if *present { popped.next() } else { None })
                        .collect();
                    let function = self
                        .functions
                        .get(*function)
                        .ok_or_else(|| RuntimeError::UnknownFunction(format!("#{}", function)))?;
                    stack.push(invoke(function.as_ref(), values, ctx)?);
                }

                Instruction::Jump { offset } => {
                    pc = jump(pc, *offset);
                    continue;
                }

                Instruction::JumpIfTrue { offset } => {
                    if ops::is_truthy(&pop(&mut stack)?) {
                        pc = jump(pc, *offset);
                        continue;
                    }
                }

                Instruction::JumpIfFalse { offset } => {
                    if !ops::is_truthy(&pop(&mut stack)?) {
                        pc = jump(pc, *offset);
                        continue;
                    }
                }

                Instruction::Pop => {
                    pop(&mut stack)?;
                }
            }
            pc += 1;
        }

        Ok(stack.pop())
    }
}

fn pop(stack: &mut Vec<Value>) -> Result<Value> {
    stack.pop().ok_or(RuntimeError::StackUnderflow)
}

/// Pop `n` values, first pushed first
fn pop_n(stack: &mut Vec<Value>, n: usize) -> Result<Vec<Value>> {
    if stack.len() < n {
        return Err(RuntimeError::StackUnderflow);
    }
    Ok(stack.split_off(stack.len() - n))
}

/// Well-formed programs never jump before the start
fn jump(pc: usize, offset: isize) -> usize {
    pc.saturating_add_signed(offset)
}

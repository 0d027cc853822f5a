//! Expression compiler
//!
//! Compiles bound Expression nodes into IR instructions. Function names
//! are collected into the program's function table so the runtime can
//! resolve each name once when it links the program.

use crate::error::{CompileError, Result};
use sluice_core::ast::{Arguments, Expression, ExpressionKind, Operator};
use sluice_core::ir::Instruction;
use sluice_core::Value;

/// Function names referenced by one program, in first-use order
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FunctionTable {
    names: Vec<String>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `name`, adding it on first use
    pub fn intern(&mut self, name: &str) -> usize {
        match self.names.iter().position(|n| n == name) {
            Some(index) => index,
            None => {
                self.names.push(name.to_string());
                self.names.len() - 1
            }
        }
    }

    pub fn into_names(self) -> Vec<String> {
        self.names
    }
}

/// Expression compiler
pub struct ExpressionCompiler;

impl ExpressionCompiler {
    /// Compile an expression into instructions that leave its value on
    /// the stack
    pub fn compile(expr: &Expression, functions: &mut FunctionTable) -> Result<Vec<Instruction>> {
        let mut instructions = Vec::new();
        Self::emit(expr, functions, &mut instructions)?;
        Ok(instructions)
    }

    fn emit(
        expr: &Expression,
        functions: &mut FunctionTable,
        out: &mut Vec<Instruction>,
    ) -> Result<()> {
        match &expr.kind {
            ExpressionKind::Literal(value) => out.push(Instruction::LoadConst {
                value: value.clone(),
            }),

            ExpressionKind::MessageField(name) => {
                out.push(Instruction::LoadField { name: name.clone() })
            }

            ExpressionKind::Variable(name) => out.push(Instruction::Load { name: name.clone() }),

            ExpressionKind::FieldAccess { object, field } => {
                Self::emit(object, functions, out)?;
                out.push(Instruction::GetMember {
                    name: field.clone(),
                });
            }

            ExpressionKind::Index { target, index } => {
                Self::emit(target, functions, out)?;
                Self::emit(index, functions, out)?;
                out.push(Instruction::Index);
            }

            ExpressionKind::Array(items) => {
                for item in items {
                    Self::emit(item, functions, out)?;
                }
                out.push(Instruction::MakeList { len: items.len() });
            }

            ExpressionKind::Map(entries) => {
                for (_, value) in entries {
                    Self::emit(value, functions, out)?;
                }
                out.push(Instruction::MakeMap {
                    keys: entries.iter().map(|(key, _)| key.clone()).collect(),
                });
            }

            ExpressionKind::Unary { op, operand } => {
                Self::emit(operand, functions, out)?;
                out.push(Instruction::UnaryOp { op: *op });
            }

            ExpressionKind::Binary { left, op, right } if op.is_logical() => {
                Self::emit_logical(left, *op, right, functions, out)?;
            }

            ExpressionKind::Binary { left, op, right } => {
                Self::emit(left, functions, out)?;
                Self::emit(right, functions, out)?;
                if op.is_arithmetic() {
                    out.push(Instruction::BinaryOp { op: *op });
                } else {
                    out.push(Instruction::Compare { op: *op });
                }
            }

            ExpressionKind::FunctionCall(call) => {
                let Arguments::Bound(slots) = &call.args else {
                    return Err(CompileError::UnboundCall(call.name.clone()));
                };
                for value in slots.iter().flatten() {
                    Self::emit(value, functions, out)?;
                }
                out.push(Instruction::Call {
                    function: functions.intern(&call.name),
                    args: slots.iter().map(Option::is_some).collect(),
                });
            }
        }
        Ok(())
    }

    /// Short-circuit `&&` / `||`, always leaving a boolean:
    ///
    /// ```text
    /// <left>  JumpIf{F,T} short
    /// <right> JumpIf{F,T} short
    ///         LoadConst !short_value
    ///         Jump end
    /// short:  LoadConst short_value
    /// end:
    /// ```
    fn emit_logical(
        left: &Expression,
        op: Operator,
        right: &Expression,
        functions: &mut FunctionTable,
        out: &mut Vec<Instruction>,
    ) -> Result<()> {
        let short_value = op == Operator::Or;
        let jump = |offset: isize| match op {
            Operator::Or => Instruction::JumpIfTrue { offset },
            _ => Instruction::JumpIfFalse { offset },
        };

        Self::emit(left, functions, out)?;
        let mut right_code = Vec::new();
        Self::emit(right, functions, &mut right_code)?;
        let right_len = right_code.len() as isize;

        out.push(jump(right_len + 4));
        out.extend(right_code);
        out.push(jump(3));
        out.push(Instruction::LoadConst {
            value: Value::Bool(!short_value),
        });
        out.push(Instruction::Jump { offset: 2 });
        out.push(Instruction::LoadConst {
            value: Value::Bool(short_value),
        });
        Ok(())
    }
}

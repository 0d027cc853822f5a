//! IR Program
//!
//! A program is a sequence of IR instructions with its function table and
//! metadata. A compiled rule is a pair of programs: one for the condition,
//! one for the actions.

use crate::ir::Instruction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An IR program ready for linking and execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// The sequence of instructions
    pub instructions: Vec<Instruction>,

    /// Names of the functions referenced by `Call` instructions
    pub functions: Vec<String>,

    /// Program metadata
    pub metadata: ProgramMetadata,
}

/// Which part of a rule a program was compiled from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Condition,
    Actions,
}

/// Metadata associated with a program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramMetadata {
    /// Name of the source rule
    pub rule: String,

    pub section: Section,

    /// Custom metadata fields
    #[serde(default)]
    pub custom: HashMap<String, String>,

    /// Version of the compiler that generated this
    pub compiler_version: String,
}

/// Both programs of a compiled rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleProgram {
    pub name: String,
    /// Leaves exactly one value on the stack
    pub condition: Program,
    /// Leaves the stack empty
    pub actions: Program,
}

impl Program {
    /// Create a new program
    pub fn new(
        instructions: Vec<Instruction>,
        functions: Vec<String>,
        metadata: ProgramMetadata,
    ) -> Self {
        Self {
            instructions,
            functions,
            metadata,
        }
    }

    /// Get the number of instructions
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Check if program is empty
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Check that every jump lands inside the program (or exactly at its
    /// end) and every call refers to the function table.
    pub fn is_well_formed(&self) -> bool {
        let len = self.instructions.len() as isize;
        self.instructions.iter().enumerate().all(|(pc, instruction)| match instruction {
            Instruction::Jump { offset }
            | Instruction::JumpIfTrue { offset }
            | Instruction::JumpIfFalse { offset } => {
                let target = pc as isize + offset;
                (0..=len).contains(&target)
            }
            Instruction::Call { function, .. } => *function < self.functions.len(),
            _ => true,
        })
    }
}

impl ProgramMetadata {
    /// Create metadata for one section of a rule
    pub fn for_rule(rule: impl Into<String>, section: Section) -> Self {
        Self {
            rule: rule.into(),
            section,
            custom: HashMap::new(),
            compiler_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Add a custom metadata field
    pub fn with_custom(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }
}

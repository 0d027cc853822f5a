//! Intermediate Representation (IR)
//!
//! Flat, stack-based instruction streams produced by the compiler from a
//! validated rule. Function calls refer to a per-program function table so
//! the runtime can resolve every callee once, at link time.

pub mod instruction;
pub mod program;

pub use instruction::Instruction;
pub use program::{Program, ProgramMetadata, RuleProgram, Section};

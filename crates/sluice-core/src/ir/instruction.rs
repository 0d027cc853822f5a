//! IR Instructions
//!
//! Low-level instructions for the rule virtual machine.

use crate::ast::{Operator, UnaryOperator};
use crate::Value;
use serde::{Deserialize, Serialize};

/// A single IR instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    // ===== Data Loading =====
    /// Load a constant value onto the stack
    LoadConst {
        /// The constant value
        value: Value,
    },

    /// Load a field of the message under evaluation
    LoadField {
        /// Field name
        name: String,
    },

    /// Load a variable
    Load {
        /// Variable name
        name: String,
    },

    /// Pop a value and bind it to a variable
    Store {
        /// Variable name
        name: String,
    },

    /// Replace the top of stack with one of its members (`expr.name`)
    GetMember {
        /// Member name
        name: String,
    },

    /// Pop index, pop target, push `target[index]`
    Index,

    /// Pop `len` values and push them as a list, first pushed first
    MakeList {
        len: usize,
    },

    /// Pop one value per key and push a map
    MakeMap {
        keys: Vec<String>,
    },

    // ===== Operations =====
    /// Perform an arithmetic operation (+ - * / %)
    BinaryOp {
        /// The operator to apply
        op: Operator,
    },

    /// Perform an equality or ordering comparison (== != < <= > >=)
    Compare {
        /// The comparison operator
        op: Operator,
    },

    /// Perform a unary operation (! - +)
    UnaryOp {
        /// The unary operator
        op: UnaryOperator,
    },

    /// Call a function from the program's function table.
    ///
    /// `args` has one flag per declared parameter; only present slots were
    /// pushed, in parameter order.
    Call {
        /// Index into [`Program::functions`](crate::ir::Program)
        function: usize,
        /// Which parameter slots have a value on the stack
        args: Vec<bool>,
    },

    // ===== Control Flow =====
    /// Unconditional jump. Offsets are relative to the jump itself.
    Jump {
        /// Offset to jump (can be negative)
        offset: isize,
    },

    /// Pop; jump if the value is `true`
    JumpIfTrue {
        /// Offset to jump
        offset: isize,
    },

    /// Pop; jump unless the value is `true`
    JumpIfFalse {
        /// Offset to jump
        offset: isize,
    },

    /// Discard the top of stack
    Pop,
}

//! Evaluation strategies
//!
//! [`Interpreter`] walks the bound AST directly; [`LinkedProgram`] runs
//! compiled IR on a small stack machine. Both apply operators through
//! `sluice_core::types::ops` and call functions through [`invoke`], so
//! they agree on every result and every failure.

mod interpreter;
mod vm;

pub use interpreter::Interpreter;
pub use vm::LinkedProgram;

use crate::context::EvaluationContext;
use crate::error::Result;
use crate::function::{Function, FunctionArgs};
use sluice_core::Value;

/// Call `function` with one value per declared parameter
pub(crate) fn invoke(
    function: &dyn Function,
    values: Vec<Option<Value>>,
    ctx: &mut EvaluationContext<'_>,
) -> Result<Value> {
    let args = FunctionArgs::new(function.descriptor(), values);
    function.evaluate(&args, ctx).map_err(|e| {
        tracing::debug!(function = %function.descriptor().name, error = %e, "function failed");
        e
    })
}

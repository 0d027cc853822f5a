//! Executable rules
//!
//! A pipeline stage holds rules behind [`ExecutableRule`] so interpreted,
//! compiled and placeholder rules can be mixed freely.

use crate::context::EvaluationContext;
use crate::engine::{Interpreter, LinkedProgram};
use crate::error::Result;
use crate::function::FunctionRegistry;
use sluice_core::ast::Rule;
use sluice_core::ir::RuleProgram;
use sluice_core::types::ops;
use std::fmt;
use std::sync::Arc;

/// A rule ready to run against messages
pub trait ExecutableRule: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Evaluate the `when` clause
    fn evaluate_condition(&self, ctx: &mut EvaluationContext<'_>) -> Result<bool>;

    /// Run the `then` block
    fn execute_actions(&self, ctx: &mut EvaluationContext<'_>) -> Result<()>;
}

/// Rule evaluated by walking its AST
#[derive(Debug)]
pub struct InterpretedRule {
    rule: Rule,
    registry: Arc<FunctionRegistry>,
}

impl InterpretedRule {
    pub fn new(rule: Rule, registry: Arc<FunctionRegistry>) -> Self {
        Self { rule, registry }
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }
}

impl ExecutableRule for InterpretedRule {
    fn name(&self) -> &str {
        &self.rule.name
    }

    fn evaluate_condition(&self, ctx: &mut EvaluationContext<'_>) -> Result<bool> {
        Interpreter::new(&self.registry).evaluate_condition(&self.rule.when, ctx)
    }

    fn execute_actions(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        Interpreter::new(&self.registry).execute(&self.rule.then, ctx)
    }
}

/// Rule running linked IR programs
#[derive(Debug)]
pub struct CompiledRule {
    name: String,
    condition: LinkedProgram,
    actions: LinkedProgram,
}

impl CompiledRule {
    /// Link both programs of a compiled rule
    pub fn link(program: RuleProgram, registry: &FunctionRegistry) -> Result<Self> {
        Ok(Self {
            name: program.name,
            condition: LinkedProgram::link(program.condition, registry)?,
            actions: LinkedProgram::link(program.actions, registry)?,
        })
    }
}

impl ExecutableRule for CompiledRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate_condition(&self, ctx: &mut EvaluationContext<'_>) -> Result<bool> {
        let value = self.condition.execute(ctx)?;
        Ok(value.as_ref().map(ops::is_truthy).unwrap_or(false))
    }

    fn execute_actions(&self, ctx: &mut EvaluationContext<'_>) -> Result<()> {
        self.actions.execute(ctx).map(|_| ())
    }
}

/// Stand-in for a rule that is missing or failed to parse. Never matches.
#[derive(Debug, Clone)]
pub struct PlaceholderRule {
    name: String,
}

impl PlaceholderRule {
    /// A stage references a rule that is not loaded
    pub fn unresolved(name: &str) -> Self {
        Self {
            name: format!("Unresolved rule {}", name),
        }
    }

    /// A rule whose source did not validate
    pub fn unparseable(id: &str) -> Self {
        Self {
            name: format!("Unparseable rule {}", id),
        }
    }
}

impl ExecutableRule for PlaceholderRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate_condition(&self, _ctx: &mut EvaluationContext<'_>) -> Result<bool> {
        Ok(false)
    }

    fn execute_actions(&self, _ctx: &mut EvaluationContext<'_>) -> Result<()> {
        Ok(())
    }
}

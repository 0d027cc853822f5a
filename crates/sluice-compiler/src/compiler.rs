//! Main compiler
//!
//! Provides a unified interface for validating rule and pipeline source
//! and compiling validated rules into IR.

use crate::codegen::RuleCompiler;
use crate::error::Result;
use crate::optimizer::ConstantFolder;
use crate::semantic::SemanticAnalyzer;
use crate::validated::{ValidatedPipeline, ValidatedRule};
use sluice_core::ast::Rule;
use sluice_core::ir::RuleProgram;
use sluice_core::{FunctionCatalog, RuleError};
use sluice_parser::{PipelineParser, RuleParser};

/// Compiler options
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Fold constant sub-expressions before code generation
    pub enable_constant_folding: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            enable_constant_folding: true,
        }
    }
}

/// The main Sluice compiler
///
/// Validation is a pure function of the source text and the catalog the
/// compiler was created with.
pub struct Compiler<'a> {
    catalog: &'a dyn FunctionCatalog,
    options: CompilerOptions,
    constant_folder: ConstantFolder,
}

impl<'a> Compiler<'a> {
    /// Create a new compiler with default options
    pub fn new(catalog: &'a dyn FunctionCatalog) -> Self {
        Self::with_options(catalog, CompilerOptions::default())
    }

    /// Create a new compiler with custom options
    pub fn with_options(catalog: &'a dyn FunctionCatalog, options: CompilerOptions) -> Self {
        Self {
            catalog,
            options,
            constant_folder: ConstantFolder::new(),
        }
    }

    /// Parse and validate one rule
    pub fn parse_rule(&self, source: &str) -> std::result::Result<ValidatedRule, Vec<RuleError>> {
        let rule = RuleParser::parse(source).map_err(Vec::<RuleError>::from)?;
        self.validate_rule(rule, source)
    }

    /// Validate an already parsed rule
    pub fn validate_rule(
        &self,
        mut rule: Rule,
        source: &str,
    ) -> std::result::Result<ValidatedRule, Vec<RuleError>> {
        match SemanticAnalyzer::new(self.catalog).analyze_rule(&mut rule) {
            Ok(()) => {
                tracing::debug!(rule = %rule.name, "Rule validated");
                Ok(ValidatedRule::new(rule, source))
            }
            Err(errors) => {
                tracing::debug!(
                    rule = %rule.name,
                    errors = errors.len(),
                    "Rule failed validation"
                );
                Err(errors)
            }
        }
    }

    /// Parse one pipeline
    pub fn parse_pipeline(
        &self,
        source: &str,
    ) -> std::result::Result<ValidatedPipeline, Vec<RuleError>> {
        let pipeline = PipelineParser::parse(source).map_err(Vec::<RuleError>::from)?;
        tracing::debug!(pipeline = %pipeline.name, stages = pipeline.stages.len(), "Pipeline validated");
        Ok(ValidatedPipeline::new(pipeline, source))
    }

    /// Parse every pipeline declared in `source`
    pub fn parse_pipelines(
        &self,
        source: &str,
    ) -> std::result::Result<Vec<ValidatedPipeline>, Vec<RuleError>> {
        let pipelines = PipelineParser::parse_all(source).map_err(Vec::<RuleError>::from)?;
        Ok(pipelines
            .into_iter()
            .map(|pipeline| ValidatedPipeline::new(pipeline, source))
            .collect())
    }

    /// Compile a validated rule into condition and action programs
    pub fn compile_rule(&self, rule: &ValidatedRule) -> Result<RuleProgram> {
        let program = if self.options.enable_constant_folding {
            RuleCompiler::compile(&self.constant_folder.fold_rule(rule.rule()))?
        } else {
            RuleCompiler::compile(rule.rule())?
        };
        tracing::trace!(
            rule = %program.name,
            condition = program.condition.instruction_count(),
            actions = program.actions.instruction_count(),
            "Rule compiled"
        );
        Ok(program)
    }

    /// Get the compiler options
    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }
}

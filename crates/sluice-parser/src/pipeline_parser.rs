//! Pipeline parser
//!
//! ```text
//! pipeline "name"
//! stage 1 match all
//!     rule "first";
//!     rule "second";
//! stage 2 match either
//!     rule "third";
//! end
//! ```

use crate::error::Result;
use crate::lexer::TokenKind;
use crate::parser::{PResult, Parser};
use sluice_core::ast::{MatchMode, Pipeline, Stage};
use sluice_core::RuleError;

/// Pipeline parser
pub struct PipelineParser;

impl PipelineParser {
    /// Parse exactly one pipeline declaration
    pub fn parse(source: &str) -> Result<Pipeline> {
        let mut parser = Parser::new(source);
        if parser.has_lex_errors() {
            return parser.finish(None);
        }
        let pipeline = parser.parse_pipeline_declaration();
        if pipeline.is_some() && !parser.at_eof() {
            let err = parser.unexpected("end of input");
            parser.record(err);
        }
        parser.finish(pipeline)
    }

    /// Parse a source text holding any number of pipeline declarations
    pub fn parse_all(source: &str) -> Result<Vec<Pipeline>> {
        let mut parser = Parser::new(source);
        if parser.has_lex_errors() {
            return parser.finish(None);
        }
        let mut pipelines = Vec::new();
        let mut complete = true;
        while !parser.at_eof() {
            match parser.parse_pipeline_declaration() {
                Some(pipeline) => pipelines.push(pipeline),
                None => {
                    complete = false;
                    parser.advance();
                    parser.synchronize(|kind| {
                        matches!(kind, TokenKind::Identifier(word) if word.eq_ignore_ascii_case("pipeline"))
                    });
                }
            }
        }
        parser.finish(complete.then_some(pipelines))
    }
}

impl Parser {
    pub(crate) fn parse_pipeline_declaration(&mut self) -> Option<Pipeline> {
        let name = match self
            .expect_word("pipeline")
            .and_then(|_| self.expect_string())
        {
            Ok((name, _)) => name,
            Err(err) => {
                self.record(err);
                return None;
            }
        };

        let mut stages: Vec<Stage> = Vec::new();
        let mut complete = true;
        while self.peek().is_word("stage") {
            match self.parse_stage() {
                Ok(stage) => {
                    if stages.iter().any(|s| s.number == stage.number) {
                        self.record(RuleError::syntax(
                            stage.position,
                            format!("duplicate stage {} in pipeline '{}'", stage.number, name),
                        ));
                        complete = false;
                    } else {
                        stages.push(stage);
                    }
                }
                Err(err) => {
                    self.record(err);
                    complete = false;
                    self.synchronize(|kind| {
                        *kind == TokenKind::End
                            || matches!(kind, TokenKind::Identifier(word) if word.eq_ignore_ascii_case("stage"))
                    });
                }
            }
        }

        if let Err(err) = self.expect(&TokenKind::End) {
            self.record(err);
            complete = false;
        }

        complete.then(|| Pipeline::new(name, stages))
    }

    fn parse_stage(&mut self) -> PResult<Stage> {
        let position = self.expect_word("stage")?.position;
        let number = self.parse_stage_number()?;
        self.expect_word("match")?;
        let match_mode = if self.peek().is_word("all") {
            MatchMode::All
        } else if self.peek().is_word("either") || self.peek().is_word("any") {
            MatchMode::Either
        } else {
            return Err(self.unexpected("'all' or 'either'"));
        };
        self.advance();

        let mut rules = Vec::new();
        while self.eat(&TokenKind::Rule) {
            let (rule, _) = self.expect_string()?;
            self.eat(&TokenKind::Semicolon);
            rules.push(rule);
        }

        Ok(Stage {
            number,
            match_mode,
            rules,
            position,
        })
    }

    fn parse_stage_number(&mut self) -> PResult<i32> {
        let negative = self.eat(&TokenKind::Minus);
        let token = self.peek().clone();
        let TokenKind::Integer(n) = token.kind else {
            return Err(self.unexpected("stage number"));
        };
        self.advance();
        let sign = if negative { -1 } else { 1 };
        i64::try_from(n)
            .ok()
            .and_then(|n| i32::try_from(sign * n).ok())
            .ok_or_else(|| {
                let shown = if negative { format!("-{}", n) } else { n.to_string() };
                RuleError::syntax(token.position, format!("stage number {} out of range", shown))
            })
    }
}

//! Rule parser
//!
//! ```text
//! rule "name"
//! when <expression>
//! then
//!     let x = <expression>;
//!     function(args);
//! end
//! ```

use crate::error::Result;
use crate::lexer::TokenKind;
use crate::parser::{PResult, Parser};
use sluice_core::ast::{ExpressionKind, Rule, Statement};
use sluice_core::RuleError;

/// Rule parser
pub struct RuleParser;

impl RuleParser {
    /// Parse exactly one rule declaration
    pub fn parse(source: &str) -> Result<Rule> {
        let mut parser = Parser::new(source);
        if parser.has_lex_errors() {
            return parser.finish(None);
        }
        let rule = parser.parse_rule_declaration();
        if rule.is_some() && !parser.at_eof() {
            let err = parser.unexpected("end of input");
            parser.record(err);
        }
        parser.finish(rule)
    }

    /// Parse a source text holding any number of rule declarations
    pub fn parse_all(source: &str) -> Result<Vec<Rule>> {
        let mut parser = Parser::new(source);
        if parser.has_lex_errors() {
            return parser.finish(None);
        }
        let mut rules = Vec::new();
        let mut complete = true;
        while !parser.at_eof() {
            match parser.parse_rule_declaration() {
                Some(rule) => rules.push(rule),
                None => {
                    complete = false;
                    // resume at the next declaration
                    parser.advance();
                    parser.synchronize(|kind| *kind == TokenKind::Rule);
                }
            }
        }
        parser.finish(complete.then_some(rules))
    }
}

impl Parser {
    /// Parse one `rule ... end` block, recording errors as they are found.
    /// Returns `None` when the rule could not be assembled.
    pub(crate) fn parse_rule_declaration(&mut self) -> Option<Rule> {
        let name = match self.parse_rule_header() {
            Ok(name) => name,
            Err(err) => {
                self.record(err);
                return None;
            }
        };

        let when = match self.parse_expression() {
            Ok(expr) => Some(expr),
            Err(err) => {
                self.record(err);
                self.synchronize(|kind| matches!(kind, TokenKind::Then | TokenKind::End));
                None
            }
        };

        if let Err(err) = self.expect(&TokenKind::Then) {
            self.record(err);
            self.synchronize(|kind| *kind == TokenKind::End);
        }

        let mut then = Vec::new();
        while !self.check(&TokenKind::End) && !self.at_eof() {
            match self.parse_statement() {
                Ok(Some(statement)) => then.push(statement),
                Ok(None) => {}
                Err(err) => {
                    self.record(err);
                    self.synchronize(|kind| {
                        matches!(kind, TokenKind::Semicolon | TokenKind::End)
                    });
                    self.eat(&TokenKind::Semicolon);
                }
            }
        }

        if let Err(err) = self.expect(&TokenKind::End) {
            self.record(err);
        }

        tracing::trace!(rule = %name, statements = then.len(), "parsed rule");
        when.map(|when| Rule::new(name, when, then))
    }

    fn parse_rule_header(&mut self) -> PResult<String> {
        self.expect(&TokenKind::Rule)?;
        let (name, _) = self.expect_string()?;
        self.expect(&TokenKind::When)?;
        Ok(name)
    }

    /// `;`, `let name = expr;` or `call(...);`. The empty statement yields `None`.
    fn parse_statement(&mut self) -> PResult<Option<Statement>> {
        if self.eat(&TokenKind::Semicolon) {
            return Ok(None);
        }

        if self.check(&TokenKind::Let) {
            let position = self.advance().position;
            let (name, _) = self.expect_identifier()?;
            self.expect(&TokenKind::Assign)?;
            let value = self.parse_expression()?;
            self.expect(&TokenKind::Semicolon)?;
            return Ok(Some(Statement::Let {
                name,
                value,
                position,
            }));
        }

        let expr = self.parse_expression()?;
        if !matches!(expr.kind, ExpressionKind::FunctionCall(_)) {
            return Err(RuleError::syntax(
                expr.position,
                "only function calls and let bindings are allowed as statements",
            ));
        }
        self.expect(&TokenKind::Semicolon)?;
        Ok(Some(Statement::Expression(expr)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::ast::Position;

    #[test]
    fn test_parse_minimal_rule() {
        let rule = RuleParser::parse(r#"rule "noop" when true then end"#).unwrap();
        assert_eq!(rule.name, "noop");
        assert!(rule.then.is_empty());
    }

    #[test]
    fn test_parse_statements() {
        let rule = RuleParser::parse(
            r#"
            rule "stmts"
            when has_field("x")
            then
                let y = 1 + 2;
                ;
                set_field("y", y);
            end
            "#,
        )
        .unwrap();
        assert_eq!(rule.then.len(), 2);
        assert!(matches!(&rule.then[0], Statement::Let { name, .. } if name == "y"));
        assert!(matches!(&rule.then[1], Statement::Expression(_)));
    }

    #[test]
    fn test_non_call_statement_is_rejected() {
        let errors = RuleParser::parse(r#"rule "x" when true then 1 + 2; end"#)
            .unwrap_err()
            .0;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].position(), Position::new(1, 25));
    }

    #[test]
    fn test_errors_in_several_statements_are_all_reported() {
        let errors = RuleParser::parse(
            "rule \"x\"\nwhen true\nthen\n  let = 1;\n  f(;\n  g();\nend",
        )
        .unwrap_err()
        .0;
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].position().line, 4);
        assert_eq!(errors[1].position().line, 5);
    }

    #[test]
    fn test_bad_condition_still_checks_statements() {
        let errors = RuleParser::parse("rule \"x\" when 1 + then\n  let = 2;\nend")
            .unwrap_err()
            .0;
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_missing_end() {
        let errors = RuleParser::parse(r#"rule "x" when true then"#).unwrap_err().0;
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("'end'"));
    }

    #[test]
    fn test_parse_all() {
        let rules = RuleParser::parse_all(
            r#"
            rule "a" when true then end
            rule "b" when false then end
            "#,
        )
        .unwrap();
        let names: Vec<&str> = rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_lexical_errors_are_reported() {
        let errors = RuleParser::parse("rule \"x\" when # then end").unwrap_err().0;
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("unexpected character"));
    }
}

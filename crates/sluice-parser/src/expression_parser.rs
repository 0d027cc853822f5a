//! Expression parser
//!
//! Precedence, loosest first: `or`, `and`, `not`, equality, comparison,
//! additive, multiplicative, unary sign, postfix member/index access.

use crate::error::Result;
use crate::lexer::TokenKind;
use crate::parser::{PResult, Parser};
use sluice_core::ast::{Argument, Expression, ExpressionKind, Operator, UnaryOperator};
use sluice_core::RuleError;

/// Standalone expression parsing, mostly useful for tests and tooling
pub struct ExpressionParser;

impl ExpressionParser {
    /// Parse a complete expression
    pub fn parse(source: &str) -> Result<Expression> {
        let mut parser = Parser::new(source);
        if parser.has_lex_errors() {
            return parser.finish(None);
        }
        let expr = match parser.parse_expression() {
            Ok(expr) if parser.at_eof() => Some(expr),
            Ok(_) => {
                let err = parser.unexpected("end of expression");
                parser.record(err);
                None
            }
            Err(err) => {
                parser.record(err);
                None
            }
        };
        parser.finish(expr)
    }
}

impl Parser {
    pub(crate) fn parse_expression(&mut self) -> PResult<Expression> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> PResult<Expression> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::Or) || self.eat(&TokenKind::OrOr) {
            let right = self.parse_and()?;
            left = Expression::binary(left, Operator::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> PResult<Expression> {
        let mut left = self.parse_not()?;
        while self.eat(&TokenKind::And) || self.eat(&TokenKind::AndAnd) {
            let right = self.parse_not()?;
            left = Expression::binary(left, Operator::And, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> PResult<Expression> {
        if matches!(self.peek_kind(), TokenKind::Not | TokenKind::Bang) {
            let position = self.advance().position;
            let operand = self.parse_not()?;
            return Ok(Expression::unary(UnaryOperator::Not, operand, position));
        }
        self.parse_equality()
    }

    fn parse_equality(&mut self) -> PResult<Expression> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => Operator::Eq,
                TokenKind::NotEq => Operator::Ne,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = Expression::binary(left, op, right);
        }
    }

    fn parse_comparison(&mut self) -> PResult<Expression> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt => Operator::Lt,
                TokenKind::Le => Operator::Le,
                TokenKind::Gt => Operator::Gt,
                TokenKind::Ge => Operator::Ge,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Expression::binary(left, op, right);
        }
    }

    fn parse_additive(&mut self) -> PResult<Expression> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => Operator::Add,
                TokenKind::Minus => Operator::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expression::binary(left, op, right);
        }
    }

    fn parse_multiplicative(&mut self) -> PResult<Expression> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => Operator::Mul,
                TokenKind::Slash => Operator::Div,
                TokenKind::Percent => Operator::Mod,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expression::binary(left, op, right);
        }
    }

    fn parse_unary(&mut self) -> PResult<Expression> {
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOperator::Negate,
            TokenKind::Plus => UnaryOperator::Plus,
            TokenKind::Bang | TokenKind::Not => UnaryOperator::Not,
            _ => return self.parse_postfix(),
        };
        let position = self.advance().position;
        // i64::MIN has no positive counterpart, so its sign is part of the literal
        if op == UnaryOperator::Negate
            && *self.peek_kind() == TokenKind::Integer(i64::MIN.unsigned_abs())
        {
            self.advance();
            return self.parse_postfix_from(Expression::literal(i64::MIN, position));
        }
        let operand = self.parse_unary()?;
        Ok(Expression::unary(op, operand, position))
    }

    fn parse_postfix(&mut self) -> PResult<Expression> {
        let expr = self.parse_primary()?;
        self.parse_postfix_from(expr)
    }

    fn parse_postfix_from(&mut self, mut expr: Expression) -> PResult<Expression> {
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    let position = self.advance().position;
                    let (field, _) = self.expect_identifier()?;
                    expr = Expression::new(
                        ExpressionKind::FieldAccess {
                            object: Box::new(expr),
                            field,
                        },
                        position,
                    );
                }
                TokenKind::LBracket => {
                    let position = self.advance().position;
                    let index = self.parse_expression()?;
                    self.expect(&TokenKind::RBracket)?;
                    expr = Expression::new(
                        ExpressionKind::Index {
                            target: Box::new(expr),
                            index: Box::new(index),
                        },
                        position,
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> PResult<Expression> {
        let token = self.peek().clone();
        let position = token.position;
        match token.kind {
            TokenKind::True => {
                self.advance();
                Ok(Expression::literal(true, position))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expression::literal(false, position))
            }
            TokenKind::Integer(n) => {
                self.advance();
                let n = i64::try_from(n).map_err(|_| {
                    RuleError::syntax(position, format!("integer '{}' out of range", n))
                })?;
                Ok(Expression::literal(n, position))
            }
            TokenKind::Float(n) => {
                self.advance();
                Ok(Expression::literal(n, position))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expression::literal(s, position))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                self.advance();
                let items = self.parse_array_items()?;
                Ok(Expression::new(ExpressionKind::Array(items), position))
            }
            TokenKind::LBrace => {
                self.advance();
                let entries = self.parse_map_entries()?;
                Ok(Expression::new(ExpressionKind::Map(entries), position))
            }
            TokenKind::MessageRef => {
                self.advance();
                self.expect(&TokenKind::Dot)?;
                let (field, _) = self.expect_identifier()?;
                Ok(Expression::message_field(field, position))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                if self.check(&TokenKind::LParen) {
                    self.advance();
                    let args = self.parse_arguments()?;
                    Ok(Expression::call(name, args, position))
                } else {
                    Ok(Expression::variable(name, position))
                }
            }
            TokenKind::QuotedIdentifier(name) => {
                self.advance();
                Ok(Expression::variable(name, position))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_array_items(&mut self) -> PResult<Vec<Expression>> {
        let mut items = Vec::new();
        if self.eat(&TokenKind::RBracket) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expression()?);
            if self.eat(&TokenKind::RBracket) {
                return Ok(items);
            }
            self.expect(&TokenKind::Comma)?;
        }
    }

    fn parse_map_entries(&mut self) -> PResult<Vec<(String, Expression)>> {
        let mut entries: Vec<(String, Expression)> = Vec::new();
        if self.eat(&TokenKind::RBrace) {
            return Ok(entries);
        }
        loop {
            let token = self.peek().clone();
            let key = match (&token.kind, token.identifier()) {
                (TokenKind::String(key), _) => key.clone(),
                (_, Some(name)) => name.to_string(),
                _ => return Err(self.unexpected("map key")),
            };
            self.advance();
            if entries.iter().any(|(existing, _)| *existing == key) {
                return Err(RuleError::syntax(
                    token.position,
                    format!("duplicate map key '{}'", key),
                ));
            }
            self.expect(&TokenKind::Colon)?;
            let value = self.parse_expression()?;
            entries.push((key, value));
            if self.eat(&TokenKind::RBrace) {
                return Ok(entries);
            }
            self.expect(&TokenKind::Comma)?;
        }
    }

    /// Arguments after the opening parenthesis. Positional arguments may
    /// not follow named ones.
    fn parse_arguments(&mut self) -> PResult<Vec<Argument>> {
        let mut args = Vec::new();
        if self.eat(&TokenKind::RParen) {
            return Ok(args);
        }
        let mut seen_named = false;
        loop {
            let is_named = self.peek().identifier().is_some()
                && self.peek_nth(1).kind == TokenKind::Colon;
            if is_named {
                let (name, _) = self.expect_identifier()?;
                self.advance();
                let value = self.parse_expression()?;
                args.push(Argument::named(name, value));
                seen_named = true;
            } else {
                let position = self.position();
                let value = self.parse_expression()?;
                if seen_named {
                    return Err(RuleError::syntax(
                        position,
                        "positional argument after named argument",
                    ));
                }
                args.push(Argument::positional(value));
            }
            if self.eat(&TokenKind::RParen) {
                return Ok(args);
            }
            self.expect(&TokenKind::Comma)?;
        }
    }
}

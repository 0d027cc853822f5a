//! Token cursor shared by the expression, rule and pipeline parsers

use crate::error::{Result, SyntaxErrors};
use crate::lexer::{Lexer, Token, TokenKind};
use sluice_core::ast::Position;
use sluice_core::RuleError;

/// Result of a single grammar production; the error is the first syntax
/// problem hit, which the caller records before resynchronizing.
pub(crate) type PResult<T> = std::result::Result<T, RuleError>;

/// Recursive-descent parser state
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<RuleError>,
}

impl Parser {
    /// Tokenize `source`. Lexical errors are kept and reported by `finish`.
    pub fn new(source: &str) -> Self {
        let (tokens, errors) = Lexer::tokenize(source);
        Self {
            tokens,
            pos: 0,
            errors,
        }
    }

    pub(crate) fn has_lex_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub(crate) fn peek(&self) -> &Token {
        // tokenize always terminates the list with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    pub(crate) fn peek_nth(&self, n: usize) -> &Token {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)]
    }

    pub(crate) fn position(&self) -> Position {
        self.peek().position
    }

    pub(crate) fn at_eof(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.at_eof() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: &TokenKind) -> PResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    /// Expect a plain identifier matching `word` case-insensitively
    pub(crate) fn expect_word(&mut self, word: &str) -> PResult<Token> {
        if self.peek().is_word(word) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("'{}'", word)))
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> PResult<(String, Position)> {
        let token = self.peek().clone();
        match token.identifier() {
            Some(name) => {
                let name = name.to_string();
                self.advance();
                Ok((name, token.position))
            }
            None => Err(self.unexpected("identifier")),
        }
    }

    pub(crate) fn expect_string(&mut self) -> PResult<(String, Position)> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::String(value) => {
                self.advance();
                Ok((value, token.position))
            }
            _ => Err(self.unexpected("string")),
        }
    }

    pub(crate) fn unexpected(&self, expected: &str) -> RuleError {
        let token = self.peek();
        RuleError::syntax(
            token.position,
            format!("expected {}, found {}", expected, token.kind),
        )
    }

    pub(crate) fn record(&mut self, error: RuleError) {
        self.errors.push(error);
    }

    /// Skip tokens until one satisfies `stop` (not consumed) or input ends
    pub(crate) fn synchronize(&mut self, stop: impl Fn(&TokenKind) -> bool) {
        while !self.at_eof() && !stop(self.peek_kind()) {
            self.advance();
        }
    }

    /// Hand back `value` if no error was recorded
    pub(crate) fn finish<T>(self, value: Option<T>) -> Result<T> {
        match value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => {
                let mut errors = self.errors;
                if errors.is_empty() {
                    errors.push(RuleError::syntax(Position::new(1, 1), "empty input"));
                }
                errors.sort_by_key(RuleError::position);
                Err(SyntaxErrors(errors))
            }
        }
    }
}

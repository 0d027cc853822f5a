//! Tokenizer for the rule language
//!
//! Keywords are matched case-insensitively. Words that only have meaning
//! inside pipeline declarations (`stage`, `match`, `all`, ...) stay plain
//! identifiers and are recognized by the pipeline parser.

use sluice_core::ast::Position;
use sluice_core::RuleError;
use std::fmt;

/// Kinds of tokens
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Rule,
    When,
    Then,
    End,
    Let,
    And,
    Or,
    Not,
    True,
    False,

    // Literals and names
    Identifier(String),
    /// Back-quoted identifier, may contain any character but a back-quote
    QuotedIdentifier(String),
    String(String),
    /// Magnitude only; a leading minus is a separate token
    Integer(u64),
    Float(f64),
    /// `$message`
    MessageRef,

    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Assign,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    AndAnd,
    OrOr,
    Bang,

    Eof,
}

/// A token with its starting position
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    /// The identifier text for plain and back-quoted identifiers
    pub fn identifier(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Identifier(name) | TokenKind::QuotedIdentifier(name) => Some(name),
            _ => None,
        }
    }

    /// True if this is the plain identifier `word`, ignoring case
    pub fn is_word(&self, word: &str) -> bool {
        matches!(&self.kind, TokenKind::Identifier(name) if name.eq_ignore_ascii_case(word))
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Rule => "'rule'",
            TokenKind::When => "'when'",
            TokenKind::Then => "'then'",
            TokenKind::End => "'end'",
            TokenKind::Let => "'let'",
            TokenKind::And => "'and'",
            TokenKind::Or => "'or'",
            TokenKind::Not => "'not'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Identifier(name) => return write!(f, "identifier '{}'", name),
            TokenKind::QuotedIdentifier(name) => return write!(f, "identifier `{}`", name),
            TokenKind::String(s) => return write!(f, "string {:?}", s),
            TokenKind::Integer(n) => return write!(f, "integer {}", n),
            TokenKind::Float(n) => return write!(f, "number {:?}", n),
            TokenKind::MessageRef => "'$message'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::Dot => "'.'",
            TokenKind::Assign => "'='",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::AndAnd => "'&&'",
            TokenKind::OrOr => "'||'",
            TokenKind::Bang => "'!'",
            TokenKind::Eof => "end of input",
        };
        f.write_str(text)
    }
}

/// Lexer over a source string
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: u32,
    column: u32,
    errors: Vec<RuleError>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
            errors: Vec::new(),
        }
    }

    /// Tokenize the whole input. The token list always ends with `Eof`.
    pub fn tokenize(source: &str) -> (Vec<Token>, Vec<RuleError>) {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        (tokens, lexer.errors)
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next()
    }

    fn bump_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn error(&mut self, position: Position, message: impl Into<String>) {
        self.errors.push(RuleError::syntax(position, message));
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_second() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek_second() == Some('*') => {
                    let start = self.position();
                    self.bump();
                    self.bump();
                    let mut closed = false;
                    while let Some(c) = self.bump() {
                        if c == '*' && self.peek() == Some('/') {
                            self.bump();
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        self.error(start, "unterminated block comment");
                    }
                }
                _ => return,
            }
        }
    }

    /// Produce the next token, recording lexical errors as it goes
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_trivia();
            let position = self.position();
            let Some(c) = self.bump() else {
                return Token {
                    kind: TokenKind::Eof,
                    position,
                };
            };

            let kind = match c {
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '[' => TokenKind::LBracket,
                ']' => TokenKind::RBracket,
                '{' => TokenKind::LBrace,
                '}' => TokenKind::RBrace,
                ',' => TokenKind::Comma,
                ':' => TokenKind::Colon,
                ';' => TokenKind::Semicolon,
                '.' => TokenKind::Dot,
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '*' => TokenKind::Star,
                '/' => TokenKind::Slash,
                '%' => TokenKind::Percent,
                '=' if self.bump_if('=') => TokenKind::EqEq,
                '=' => TokenKind::Assign,
                '!' if self.bump_if('=') => TokenKind::NotEq,
                '!' => TokenKind::Bang,
                '<' if self.bump_if('=') => TokenKind::Le,
                '<' => TokenKind::Lt,
                '>' if self.bump_if('=') => TokenKind::Ge,
                '>' => TokenKind::Gt,
                '&' if self.bump_if('&') => TokenKind::AndAnd,
                '|' if self.bump_if('|') => TokenKind::OrOr,
                '"' | '\'' => match self.string(c, position) {
                    Some(s) => TokenKind::String(s),
                    None => continue,
                },
                '`' => match self.quoted_identifier(position) {
                    Some(name) => TokenKind::QuotedIdentifier(name),
                    None => continue,
                },
                '$' => {
                    let word = self.word(None);
                    if word.eq_ignore_ascii_case("message") {
                        TokenKind::MessageRef
                    } else {
                        self.error(position, format!("unknown reference '${}'", word));
                        continue;
                    }
                }
                c if c.is_ascii_digit() => match self.number(c, position) {
                    Some(kind) => kind,
                    None => continue,
                },
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let word = self.word(Some(c));
                    keyword(&word).unwrap_or(TokenKind::Identifier(word))
                }
                other => {
                    self.error(position, format!("unexpected character '{}'", other));
                    continue;
                }
            };

            return Token { kind, position };
        }
    }

    fn word(&mut self, first: Option<char>) -> String {
        let mut word: String = first.into_iter().collect();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                word.push(c);
                self.bump();
            } else {
                break;
            }
        }
        word
    }

    fn number(&mut self, first: char, position: Position) -> Option<TokenKind> {
        let mut text = String::from(first);
        let mut is_float = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.bump();
            } else if c == '.'
                && !is_float
                && self.peek_second().is_some_and(|d| d.is_ascii_digit())
            {
                is_float = true;
                text.push(c);
                self.bump();
            } else if c == 'e' || c == 'E' {
                let after = self.peek_second();
                if !after.is_some_and(|d| d.is_ascii_digit() || d == '+' || d == '-') {
                    break;
                }
                is_float = true;
                text.push(c);
                self.bump();
                if let Some(sign) = self.peek().filter(|s| *s == '+' || *s == '-') {
                    text.push(sign);
                    self.bump();
                }
                while let Some(d) = self.peek().filter(char::is_ascii_digit) {
                    text.push(d);
                    self.bump();
                }
                break;
            } else {
                break;
            }
        }

        if is_float {
            match text.parse::<f64>() {
                Ok(n) => Some(TokenKind::Float(n)),
                Err(_) => {
                    self.error(position, format!("malformed number '{}'", text));
                    None
                }
            }
        } else {
            match text.parse::<u64>() {
                Ok(n) => Some(TokenKind::Integer(n)),
                Err(_) => {
                    self.error(position, format!("integer '{}' out of range", text));
                    None
                }
            }
        }
    }

    fn string(&mut self, quote: char, position: Position) -> Option<String> {
        let mut value = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    self.error(position, "unterminated string literal");
                    return None;
                }
                Some(c) if c == quote => return Some(value),
                Some('\\') => {
                    let escape_position = self.position();
                    match self.bump() {
                        Some('n') => value.push('\n'),
                        Some('r') => value.push('\r'),
                        Some('t') => value.push('\t'),
                        Some('\\') => value.push('\\'),
                        Some('"') => value.push('"'),
                        Some('\'') => value.push('\''),
                        Some('u') => {
                            let hex: String = (0..4).filter_map(|_| self.bump()).collect();
                            match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                                Some(c) => value.push(c),
                                None => self.error(
                                    escape_position,
                                    format!("invalid unicode escape '\\u{}'", hex),
                                ),
                            }
                        }
                        Some(other) => {
                            self.error(escape_position, format!("invalid escape '\\{}'", other))
                        }
                        None => {
                            self.error(position, "unterminated string literal");
                            return None;
                        }
                    }
                }
                Some(c) => value.push(c),
            }
        }
    }

    fn quoted_identifier(&mut self, position: Position) -> Option<String> {
        let mut name = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    self.error(position, "unterminated quoted identifier");
                    return None;
                }
                Some('`') => return Some(name),
                Some(c) => name.push(c),
            }
        }
    }
}

fn keyword(word: &str) -> Option<TokenKind> {
    let kind = match word.to_ascii_lowercase().as_str() {
        "rule" => TokenKind::Rule,
        "when" => TokenKind::When,
        "then" => TokenKind::Then,
        "end" => TokenKind::End,
        "let" => TokenKind::Let,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, errors) = Lexer::tokenize(source);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(
            kinds("RULE When tHeN end"),
            vec![
                TokenKind::Rule,
                TokenKind::When,
                TokenKind::Then,
                TokenKind::End,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("42 1.5 2e3 7.25E-1"),
            vec![
                TokenKind::Integer(42),
                TokenKind::Float(1.5),
                TokenKind::Float(2000.0),
                TokenKind::Float(0.725),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_member_access_on_integer_is_not_float() {
        assert_eq!(
            kinds("a.b"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Dot,
                TokenKind::Identifier("b".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""a\"b\nA""#),
            vec![TokenKind::String("a\"b\nA".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_message_ref_and_quoted_identifier() {
        assert_eq!(
            kinds("$message.`odd name`"),
            vec![
                TokenKind::MessageRef,
                TokenKind::Dot,
                TokenKind::QuotedIdentifier("odd name".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("a // trailing\n/* block\n comment */ b"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Identifier("b".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("== != <= >= && || ! ="),
            vec![
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Bang,
                TokenKind::Assign,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_positions() {
        let (tokens, _) = Lexer::tokenize("rule\n  \"x\"");
        assert_eq!(tokens[0].position, Position::new(1, 1));
        assert_eq!(tokens[1].position, Position::new(2, 3));
    }

    #[test]
    fn test_errors_are_collected() {
        let (tokens, errors) = Lexer::tokenize("a # b \"open");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].position(), Position::new(1, 3));
        assert_eq!(tokens.last().map(|t| t.kind.clone()), Some(TokenKind::Eof));
    }

    #[test]
    fn test_integer_overflow_is_reported() {
        let (_, errors) = Lexer::tokenize("99999999999999999999");
        assert_eq!(errors.len(), 1);

        let (tokens, errors) = Lexer::tokenize("9223372036854775808");
        assert!(errors.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::Integer(1 << 63));
    }
}

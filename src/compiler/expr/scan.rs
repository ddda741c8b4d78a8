//! Tokenizer for expression bodies.

use serde_json::Number;

use super::errors::{ParseError, ParseErrorKind, ParseResult};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ExprTokenKind {
    /// A quoted string with its outer quotes removed and escapes applied.
    Str(String),
    Number(Number),
    /// `$name`, without the sigil.
    Var(String),
    Ident(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Question,
    Colon,
    Bang,
    Minus,
    AndAnd,
    OrOr,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eof,
}

impl ExprTokenKind {
    /// Describes the token for error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Str(s) => format!("string {s:?}"),
            Self::Number(n) => format!("number {n}"),
            Self::Var(name) => format!("'${name}'"),
            Self::Ident(name) => format!("'{name}'"),
            Self::Eof => "end of expression".to_string(),
            other => format!("'{}'", other.punct()),
        }
    }

    fn punct(&self) -> &'static str {
        match self {
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Comma => ",",
            Self::Dot => ".",
            Self::Question => "?",
            Self::Colon => ":",
            Self::Bang => "!",
            Self::Minus => "-",
            Self::AndAnd => "&&",
            Self::OrOr => "||",
            Self::EqEq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            _ => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExprToken {
    pub kind: ExprTokenKind,
    /// Byte offset in the expression body.
    pub pos: usize,
}

/// Splits an expression body into tokens, ending with `Eof`.
pub(crate) fn scan(input: &str) -> ParseResult<Vec<ExprToken>> {
    Scanner { input, pos: 0 }.run()
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn run(mut self) -> ParseResult<Vec<ExprToken>> {
        let mut tokens = Vec::new();
        loop {
            self.consume_while(char::is_whitespace);
            let pos = self.pos;
            let Some(c) = self.peek() else {
                tokens.push(ExprToken {
                    kind: ExprTokenKind::Eof,
                    pos,
                });
                return Ok(tokens);
            };

            let kind = match c {
                '"' | '\'' => self.string(c)?,
                '0'..='9' => self.number()?,
                '$' => {
                    self.advance();
                    let name = self.identifier();
                    if name.is_empty() {
                        return Err(ParseError::new(ParseErrorKind::MissingVariableName, pos));
                    }
                    ExprTokenKind::Var(name.to_string())
                }
                c if c.is_alphabetic() || c == '_' => {
                    ExprTokenKind::Ident(self.identifier().to_string())
                }
                _ => self.punctuation(c, pos)?,
            };
            tokens.push(ExprToken { kind, pos });
        }
    }

    fn punctuation(&mut self, c: char, pos: usize) -> ParseResult<ExprTokenKind> {
        let two = self.remaining().get(..2).unwrap_or("");
        let (kind, len) = match two {
            "&&" => (ExprTokenKind::AndAnd, 2),
            "||" => (ExprTokenKind::OrOr, 2),
            "==" => (ExprTokenKind::EqEq, 2),
            "!=" => (ExprTokenKind::NotEq, 2),
            "<=" => (ExprTokenKind::LtEq, 2),
            ">=" => (ExprTokenKind::GtEq, 2),
            _ => {
                let kind = match c {
                    '(' => ExprTokenKind::LParen,
                    ')' => ExprTokenKind::RParen,
                    '[' => ExprTokenKind::LBracket,
                    ']' => ExprTokenKind::RBracket,
                    ',' => ExprTokenKind::Comma,
                    '.' => ExprTokenKind::Dot,
                    '?' => ExprTokenKind::Question,
                    ':' => ExprTokenKind::Colon,
                    '!' => ExprTokenKind::Bang,
                    '-' => ExprTokenKind::Minus,
                    '<' => ExprTokenKind::Lt,
                    '>' => ExprTokenKind::Gt,
                    _ => {
                        return Err(ParseError::new(ParseErrorKind::UnexpectedCharacter, pos)
                            .with_found(&format!("'{c}'")));
                    }
                };
                (kind, 1)
            }
        };
        self.pos += len;
        Ok(kind)
    }

    /// Reads a quoted string. Only `\<quote>` and `\\` are escapes; any
    /// other backslash is kept literally.
    fn string(&mut self, quote: char) -> ParseResult<ExprTokenKind> {
        let start = self.pos;
        self.advance();
        let mut value = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(ParseError::new(ParseErrorKind::UnterminatedStringLiteral, start)
                        .with_expected(&[&quote.to_string()]));
                }
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(ExprTokenKind::Str(value));
                }
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        Some(next) if next == quote || next == '\\' => {
                            value.push(next);
                            self.advance();
                        }
                        _ => value.push('\\'),
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    fn number(&mut self) -> ParseResult<ExprTokenKind> {
        let start = self.pos;
        self.consume_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.')
            && self.remaining()[1..].starts_with(|c: char| c.is_ascii_digit())
        {
            self.advance();
            self.consume_while(|c| c.is_ascii_digit());
        }
        let text = &self.input[start..self.pos];

        let number = if let Ok(int) = text.parse::<i64>() {
            Some(Number::from(int))
        } else {
            text.parse::<f64>().ok().and_then(Number::from_f64)
        };
        number
            .map(ExprTokenKind::Number)
            .ok_or_else(|| {
                ParseError::new(ParseErrorKind::InvalidNumericLiteral, start)
                    .with_found(&format!("'{text}'"))
            })
    }

    fn identifier(&mut self) -> &'a str {
        let start = self.pos;
        self.consume_while(|c| c.is_alphanumeric() || c == '_');
        &self.input[start..self.pos]
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn consume_while<F: Fn(char) -> bool>(&mut self, pred: F) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.advance();
        }
    }
}

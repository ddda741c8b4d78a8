//! Error types for the expression parser.
//!
//! Positions are byte offsets into the expression body, not the template.

use std::fmt;

/// The kind of parse error that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A character that cannot start any token.
    UnexpectedCharacter,
    /// Encountered an unexpected token.
    UnexpectedToken,
    /// Reached end of input unexpectedly.
    UnexpectedEof,
    /// Expected expression.
    ExpectedExpression,
    /// Missing closing parenthesis ')'.
    MissingClosingParen,
    /// Missing closing bracket ']'.
    MissingClosingBracket,
    /// Missing ':' in conditional expression.
    MissingConditionalColon,
    /// Missing property name after '.'.
    MissingPropertyName,
    /// Missing variable name after '$'.
    MissingVariableName,
    /// Missing string literal closing quote.
    UnterminatedStringLiteral,
    /// Invalid numeric literal.
    InvalidNumericLiteral,
    /// Tokens left over after a complete expression.
    TrailingInput,
}

impl ParseErrorKind {
    /// Returns a human-readable description of this error kind.
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnexpectedCharacter => "unexpected character",
            Self::UnexpectedToken => "unexpected token",
            Self::UnexpectedEof => "unexpected end of expression",
            Self::ExpectedExpression => "expected expression",
            Self::MissingClosingParen => "missing closing parenthesis ')'",
            Self::MissingClosingBracket => "missing closing bracket ']'",
            Self::MissingConditionalColon => "missing ':' in conditional expression",
            Self::MissingPropertyName => "missing property name after '.'",
            Self::MissingVariableName => "missing variable name after '$'",
            Self::UnterminatedStringLiteral => "unterminated string literal",
            Self::InvalidNumericLiteral => "invalid numeric literal",
            Self::TrailingInput => "unexpected input after expression",
        }
    }
}

/// A detailed parse error with context information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// Byte position in the expression where the error occurred.
    pub position: usize,
    /// What tokens/constructs were expected.
    pub expected: Vec<String>,
    /// What was actually found.
    pub found: Option<String>,
    /// Optional help text for fixing the error.
    pub help: Option<String>,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(kind: ParseErrorKind, position: usize) -> Self {
        Self {
            kind,
            position,
            expected: Vec::new(),
            found: None,
            help: None,
        }
    }

    /// Creates an "unexpected token" error.
    pub fn unexpected_token(position: usize, expected: &[&str], found: &str) -> Self {
        Self::new(ParseErrorKind::UnexpectedToken, position)
            .with_expected(expected)
            .with_found(found)
    }

    /// Creates an "expected expression" error with found token.
    pub fn expected_expression(position: usize, found: &str) -> Self {
        Self::new(ParseErrorKind::ExpectedExpression, position).with_found(found)
    }

    /// Creates a "missing closing" error for the given delimiter.
    pub fn missing_closing(kind: ParseErrorKind, position: usize, found: &str) -> Self {
        let delimiter = match kind {
            ParseErrorKind::MissingClosingParen => "')'",
            ParseErrorKind::MissingClosingBracket => "']'",
            ParseErrorKind::MissingConditionalColon => "':'",
            _ => "delimiter",
        };
        Self::new(kind, position)
            .with_expected(&[delimiter])
            .with_found(found)
    }

    /// Adds expected tokens to the error.
    pub fn with_expected(mut self, expected: &[&str]) -> Self {
        self.expected = expected.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Adds the found token to the error.
    pub fn with_found(mut self, found: &str) -> Self {
        self.found = Some(found.to_string());
        self
    }

    /// Adds help text to the error.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Converts the error to a user-friendly message.
    pub fn to_message(&self) -> String {
        let mut msg = self.kind.description().to_string();

        if let Some(ref found) = self.found {
            msg.push_str(&format!(", found {}", found));
        }

        if !self.expected.is_empty() {
            if self.expected.len() == 1 {
                msg.push_str(&format!(", expected {}", self.expected[0]));
            } else {
                msg.push_str(&format!(", expected one of: {}", self.expected.join(", ")));
            }
        }

        msg.push_str(&format!(" at offset {}", self.position));
        msg
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_message())
    }
}

impl std::error::Error for ParseError {}

/// Result type for expression parsing.
pub type ParseResult<T> = Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_token_error() {
        let err = ParseError::unexpected_token(4, &["','", "')'"], "'$'");
        let msg = err.to_message();
        assert!(msg.contains("unexpected token"));
        assert!(msg.contains("expected one of: ',', ')'"));
        assert!(msg.ends_with("at offset 4"));
    }

    #[test]
    fn test_missing_closing_error() {
        let err = ParseError::missing_closing(ParseErrorKind::MissingClosingParen, 7, "end of expression");
        assert_eq!(
            err.to_message(),
            "missing closing parenthesis ')', found end of expression, expected ')' at offset 7"
        );
    }
}

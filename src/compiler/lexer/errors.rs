//! Error types for the lexer.
//!
//! Provides context-rich error messages for lexer failures.

use std::fmt;

/// The kind of lexer error that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Directive opened but its close delimiter never found.
    UnterminatedDirective,
    /// Sanitized or unsanitized tag opened but never closed.
    UnterminatedTag,
    /// String literal inside a directive or tag missing its closing quote.
    UnterminatedString,
    /// Directive body does not start with a directive name.
    MissingDirectiveName,
}

impl LexErrorKind {
    /// Returns a human-readable description of this error kind.
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnterminatedDirective => "unterminated directive",
            Self::UnterminatedTag => "unterminated tag",
            Self::UnterminatedString => "unterminated string literal",
            Self::MissingDirectiveName => "missing directive name",
        }
    }

    /// Returns a suggested fix for this error kind.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::UnterminatedDirective => Some("add the directive close delimiter"),
            Self::UnterminatedTag => Some("add the tag close delimiter"),
            Self::UnterminatedString => Some("add a closing quote \" or '"),
            Self::MissingDirectiveName => Some("start the directive with a name, e.g. show(\"name\")"),
        }
    }
}

/// A lexer error with context information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// The kind of error.
    pub kind: LexErrorKind,
    /// 1-based line where the error was detected.
    pub line: usize,
    /// Line where the unterminated construct was opened.
    pub opened_at: Option<usize>,
    /// What was expected at this position.
    pub expected: Option<String>,
    /// What was actually found.
    pub found: Option<String>,
    /// Optional help text for fixing the error.
    pub help: Option<String>,
}

impl LexError {
    /// Creates a new lexer error.
    pub fn new(kind: LexErrorKind, line: usize) -> Self {
        Self {
            kind,
            line,
            opened_at: None,
            expected: None,
            found: None,
            help: None,
        }
    }

    /// Creates an "unterminated directive" or "unterminated tag" error.
    pub fn unterminated_region(kind: LexErrorKind, line: usize, opened_at: usize, close: &str) -> Self {
        Self::new(kind, line)
            .opened_at(opened_at)
            .with_expected(&format!("`{close}`"))
            .with_found("end of input")
    }

    /// Creates an "unterminated string" error.
    pub fn unterminated_string(line: usize, opened_at: usize, quote: char) -> Self {
        Self::new(LexErrorKind::UnterminatedString, line)
            .opened_at(opened_at)
            .with_expected(&format!("closing {quote}"))
            .with_found("end of input")
            .with_help(&format!("add {quote} to close the string"))
    }

    /// Creates a "missing directive name" error.
    pub fn missing_directive_name(line: usize, body: &str) -> Self {
        Self::new(LexErrorKind::MissingDirectiveName, line)
            .with_expected("directive name")
            .with_found(&format!("`{}`", body.trim()))
    }

    pub fn opened_at(mut self, line: usize) -> Self {
        self.opened_at = Some(line);
        self
    }

    pub fn with_expected(mut self, expected: &str) -> Self {
        self.expected = Some(expected.to_string());
        self
    }

    pub fn with_found(mut self, found: &str) -> Self {
        self.found = Some(found.to_string());
        self
    }

    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Returns the custom help text, or the suggestion for the error kind.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref().or_else(|| self.kind.suggestion())
    }

    /// Converts the error to a one-line message.
    pub fn to_message(&self) -> String {
        let mut msg = self.kind.description().to_string();

        if let Some(ref expected) = self.expected {
            msg.push_str(&format!(", expected {}", expected));
        }

        if let Some(ref found) = self.found {
            msg.push_str(&format!(", found {}", found));
        }

        if let Some(opened) = self.opened_at
            && opened != self.line
        {
            msg.push_str(&format!(" (opened on line {})", opened));
        }

        msg
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.to_message())
    }
}

impl std::error::Error for LexError {}

/// Result type for lexer operations.
pub type LexResult<T> = Result<T, LexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unterminated_string_error() {
        let err = LexError::unterminated_string(5, 2, '"');
        let msg = err.to_string();
        assert!(msg.starts_with("line 5"));
        assert!(msg.contains("unterminated string"));
        assert!(msg.contains("opened on line 2"));
        assert_eq!(err.help(), Some("add \" to close the string"));
    }

    #[test]
    fn test_unterminated_region_uses_kind_suggestion() {
        let err = LexError::unterminated_region(LexErrorKind::UnterminatedTag, 1, 1, "}}");
        assert!(err.to_message().contains("expected `}}`"));
        assert!(!err.to_message().contains("opened on line"));
        assert_eq!(err.help(), Some("add the tag close delimiter"));
    }

    #[test]
    fn test_all_error_kinds_have_descriptions() {
        let kinds = [
            LexErrorKind::UnterminatedDirective,
            LexErrorKind::UnterminatedTag,
            LexErrorKind::UnterminatedString,
            LexErrorKind::MissingDirectiveName,
        ];

        for kind in kinds {
            assert!(!kind.description().is_empty(), "{:?} has empty description", kind);
            assert!(kind.suggestion().is_some(), "{:?} has no suggestion", kind);
        }
    }
}

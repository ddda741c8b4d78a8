//! The error type returned by every compile operation.

use std::fmt;

use thiserror::Error;

use super::error_fmt::{ErrorFormat, line_offset};
use super::expr::{EvalError, ParseError};
use super::lexer::errors::LexError;

/// The category of a compile failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unterminated delimiter, unterminated string, or a directive without a name.
    Lexical,
    /// `show` or `parent` referenced a part that is not visible.
    UndefinedPart,
    /// An identifier, variable, or function name could not be resolved.
    UnresolvedExpression,
    /// A directive name outside the known set.
    UnknownDirective,
    /// `endpart`/`endif` without an opener, a missing closer, or a nested part.
    UnbalancedDirective,
    /// An expression body that does not parse, or an invalid operand.
    InvalidExpression,
    /// A built-in function rejected its arguments.
    FunctionFailed,
    /// Tag or directive nesting exceeded the configured depth.
    RecursionLimitExceeded,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lexical => "lexical error",
            Self::UndefinedPart => "undefined part",
            Self::UnresolvedExpression => "unresolved expression",
            Self::UnknownDirective => "unknown directive",
            Self::UnbalancedDirective => "unbalanced directive",
            Self::InvalidExpression => "invalid expression",
            Self::FunctionFailed => "function failed",
            Self::RecursionLimitExceeded => "recursion limit exceeded",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compile failure. No partial output survives one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}{}: {message}", on_line(*.line))]
pub struct ViewCompilerError {
    pub kind: ErrorKind,
    /// 1-based line in the text being compiled, when known.
    pub line: Option<usize>,
    pub message: String,
    pub help: Option<String>,
}

fn on_line(line: Option<usize>) -> String {
    line.map(|line| format!(" on line {line}")).unwrap_or_default()
}

impl ViewCompilerError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            line: None,
            message: message.into(),
            help: None,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Wraps an expression parse failure for `body` on `line`.
    pub fn invalid_expression(err: &ParseError, body: &str, line: usize) -> Self {
        let error = Self::new(
            ErrorKind::InvalidExpression,
            format!("`{}`: {}", body, err.to_message()),
        )
        .at_line(line);
        match &err.help {
            Some(help) => error.with_help(help.as_str()),
            None => error,
        }
    }

    /// Wraps an evaluation failure on `line`.
    pub fn evaluation(err: EvalError, line: usize) -> Self {
        let kind = match err {
            EvalError::UndefinedVariable(_)
            | EvalError::UnresolvedIdentifier(_)
            | EvalError::UnknownFunction(_) => ErrorKind::UnresolvedExpression,
            EvalError::NotANumber(_) => ErrorKind::InvalidExpression,
            EvalError::Function(_) => ErrorKind::FunctionFailed,
        };
        let error = Self::new(kind, err.to_string()).at_line(line);
        match err {
            EvalError::UnknownFunction(_) => {
                error.with_help("register the function on the compiler before compiling")
            }
            _ => error,
        }
    }

    /// Renders a diagnostic pointing at the offending line of `source`.
    pub fn report(&self, source: &str, filename: &str) -> String {
        let message = format!("{}: {}", self.kind, self.message);
        let Some(position) = self.line.and_then(|line| line_offset(source, line)) else {
            let mut report = format!("error: {message}\n --> {filename}\n");
            if let Some(help) = &self.help {
                report.push_str(&format!("help: {help}\n"));
            }
            return report;
        };

        let mut format = ErrorFormat::new(&message, source, position).filename(filename);
        if let Some(help) = &self.help {
            format = format.help(help);
        }
        format.format()
    }
}

impl From<LexError> for ViewCompilerError {
    fn from(err: LexError) -> Self {
        let error = Self::new(ErrorKind::Lexical, err.to_message()).at_line(err.line);
        match err.help() {
            Some(help) => error.with_help(help),
            None => error,
        }
    }
}

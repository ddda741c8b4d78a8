//! Token kinds produced by the lexer.

use crate::template::DelimiterType;

/// All token kinds in the template language.
///
/// Text outside delimiters is never tokenized: the sub-compilers copy it from
/// the source using the spans of the surrounding tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenKind {
    /// The trimmed body of a tag, or the arguments of a directive.
    Expression,
    /// Directive open delimiter (`<%` by default).
    DirectiveOpen,
    /// The leading identifier of a directive body (`show`, `part`, ...).
    DirectiveName,
    /// Directive close delimiter (`%>` by default).
    DirectiveClose,
    /// Sanitized tag open delimiter (`{{` by default).
    SanitizedTagOpen,
    /// Sanitized tag close delimiter (`}}` by default).
    SanitizedTagClose,
    /// Unsanitized tag open delimiter (`{{!` by default).
    UnsanitizedTagOpen,
    /// Unsanitized tag close delimiter (`!}}` by default).
    UnsanitizedTagClose,
    /// A backslash followed by a tag open delimiter. The value is the
    /// delimiter text, which is output literally.
    EscapedTagOpen,
}

impl TokenKind {
    /// Returns the open token kind for a delimiter type.
    pub fn open(kind: DelimiterType) -> Self {
        match kind {
            DelimiterType::Directive => Self::DirectiveOpen,
            DelimiterType::SanitizedTag => Self::SanitizedTagOpen,
            DelimiterType::UnsanitizedTag => Self::UnsanitizedTagOpen,
        }
    }

    /// Returns the close token kind for a delimiter type.
    pub fn close(kind: DelimiterType) -> Self {
        match kind {
            DelimiterType::Directive => Self::DirectiveClose,
            DelimiterType::SanitizedTag => Self::SanitizedTagClose,
            DelimiterType::UnsanitizedTag => Self::UnsanitizedTagClose,
        }
    }
}

/// Whether a tag's result is escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Sanitized,
    Unsanitized,
}

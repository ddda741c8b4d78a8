//! Lexer for the template language.
//!
//! The lexer is a state machine over the raw template contents. Text outside
//! delimiters is skipped rather than tokenized, so verbatim host code is never
//! reinterpreted; only delimiter-bounded regions produce tokens:
//!
//! ```text
//! <% show("header") %>   DirectiveOpen DirectiveName Expression DirectiveClose
//! {{ title }}            SanitizedTagOpen Expression SanitizedTagClose
//! {{! body !}}           UnsanitizedTagOpen Expression UnsanitizedTagClose
//! \{{                    EscapedTagOpen
//! ```
//!
//! Every token carries its byte span, which the sub-compilers use to copy the
//! text between regions.

mod consume;
pub mod errors;
#[cfg(test)]
mod tests;

use std::ops::Range;

use errors::{LexError, LexErrorKind, LexResult};

use super::syntax::TokenKind;
use crate::template::{DelimiterConfig, DelimiterType};

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// Delimiter text, directive name, or trimmed expression body.
    pub value: String,
    /// 1-based line of the region this token belongs to.
    pub line: usize,
    /// Byte range of the token in the input.
    pub span: Range<usize>,
}

/// Lexer state for context-sensitive tokenization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexerMode {
    /// Outside any delimiter.
    Text,
    /// Inside a directive or tag body, looking for the close delimiter.
    Region,
    /// Inside a quoted string within a region.
    StringLiteral { quote: char },
}

/// An open delimiter the lexer recognizes.
#[derive(Debug, Clone, Copy)]
struct Opener<'a> {
    kind: DelimiterType,
    open: &'a str,
    close: &'a str,
}

/// The region currently being lexed.
#[derive(Debug, Clone, Copy)]
struct OpenRegion<'a> {
    kind: DelimiterType,
    close: &'a str,
    body_start: usize,
    line: usize,
}

/// The lexer for template input.
pub struct Lexer<'a> {
    /// The input text.
    input: &'a str,
    /// Current byte position in the input.
    pos: usize,
    /// Current 1-based line.
    line: usize,
    /// Stack of lexer modes for nested contexts.
    mode_stack: Vec<LexerMode>,
    /// Open delimiters, longest first so `{{!` wins over `{{`.
    openers: Vec<Opener<'a>>,
    /// The region being lexed while in `Region` or `StringLiteral` mode.
    region: Option<OpenRegion<'a>>,
    /// Line where the current string literal was opened.
    string_opened_at: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for `input` using the given delimiters.
    ///
    /// Delimiter types with an empty open string are ignored.
    pub fn new(input: &'a str, delimiters: &'a DelimiterConfig) -> Self {
        let mut openers: Vec<Opener<'a>> = delimiters
            .iter()
            .filter(|(_, d)| !d.open.is_empty())
            .map(|(kind, d)| Opener {
                kind,
                open: d.open.as_str(),
                close: d.close.as_str(),
            })
            .collect();
        openers.sort_by(|a, b| b.open.len().cmp(&a.open.len()));

        Self {
            input,
            pos: 0,
            line: 1,
            mode_stack: vec![LexerMode::Text],
            openers,
            region: None,
            string_opened_at: 1,
            tokens: Vec::new(),
        }
    }

    /// Returns the current lexer mode.
    fn mode(&self) -> LexerMode {
        *self.mode_stack.last().unwrap_or(&LexerMode::Text)
    }

    /// Pushes a new lexer mode onto the stack.
    fn push_mode(&mut self, mode: LexerMode) {
        self.mode_stack.push(mode);
    }

    /// Pops the current lexer mode from the stack.
    fn pop_mode(&mut self) {
        if self.mode_stack.len() > 1 {
            self.mode_stack.pop();
        }
    }

    /// Tokenizes the entire input.
    pub fn tokenize(mut self) -> LexResult<Vec<Token>> {
        while self.pos < self.input.len() {
            match self.mode() {
                LexerMode::Text => self.lex_text(),
                LexerMode::Region => self.lex_region()?,
                LexerMode::StringLiteral { quote } => self.lex_string_literal(quote),
            }
        }
        self.finish()
    }

    /// Checks that no region is left open at end of input.
    fn finish(self) -> LexResult<Vec<Token>> {
        match (self.mode(), self.region) {
            (LexerMode::StringLiteral { quote }, _) => Err(LexError::unterminated_string(
                self.line,
                self.string_opened_at,
                quote,
            )),
            (LexerMode::Region, Some(region)) => {
                let kind = match region.kind {
                    DelimiterType::Directive => LexErrorKind::UnterminatedDirective,
                    _ => LexErrorKind::UnterminatedTag,
                };
                Err(LexError::unterminated_region(
                    kind,
                    self.line,
                    region.line,
                    region.close,
                ))
            }
            _ => Ok(self.tokens),
        }
    }

    /// Lexes outside any delimiter.
    fn lex_text(&mut self) {
        let remaining = self.remaining();

        // Backslash-escaped tag open delimiter
        if let Some(rest) = remaining.strip_prefix('\\')
            && let Some(opener) = self.match_opener(rest, true)
        {
            let start = self.pos;
            let line = self.line;
            self.advance_str(1 + opener.open.len());
            self.push_token(TokenKind::EscapedTagOpen, opener.open, line, start..self.pos);
            return;
        }

        if let Some(opener) = self.match_opener(remaining, false) {
            let start = self.pos;
            let line = self.line;
            self.advance_str(opener.open.len());
            self.push_token(TokenKind::open(opener.kind), opener.open, line, start..self.pos);
            self.region = Some(OpenRegion {
                kind: opener.kind,
                close: opener.close,
                body_start: self.pos,
                line,
            });
            self.push_mode(LexerMode::Region);
            return;
        }

        self.advance_char();
    }

    /// Lexes inside a directive or tag body.
    fn lex_region(&mut self) -> LexResult<()> {
        let Some(region) = self.region else {
            self.pop_mode();
            return Ok(());
        };

        if self.remaining().starts_with(region.close) {
            let body_end = self.pos;
            let close_line = self.line;
            self.advance_str(region.close.len());
            self.push_body(region, body_end)?;
            self.push_token(
                TokenKind::close(region.kind),
                region.close,
                close_line,
                body_end..self.pos,
            );
            self.region = None;
            self.pop_mode();
            return Ok(());
        }

        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.string_opened_at = self.line;
                self.advance_char();
                self.push_mode(LexerMode::StringLiteral { quote });
            }
            Some(_) => self.advance_char(),
            None => {}
        }
        Ok(())
    }

    /// Lexes inside a quoted string. Close delimiters are not recognized here.
    fn lex_string_literal(&mut self, quote: char) {
        match self.peek() {
            Some('\\') => {
                self.advance_char();
                if self.peek().is_some() {
                    self.advance_char();
                }
            }
            Some(c) if c == quote => {
                self.advance_char();
                self.pop_mode();
            }
            Some(_) => self.consume_while(|c| c != quote && c != '\\'),
            None => {}
        }
    }

    /// Emits the tokens for a region body once its close delimiter is found.
    fn push_body(&mut self, region: OpenRegion<'a>, body_end: usize) -> LexResult<()> {
        let body = &self.input[region.body_start..body_end];

        if region.kind != DelimiterType::Directive {
            self.push_token(
                TokenKind::Expression,
                body.trim(),
                region.line,
                region.body_start..body_end,
            );
            return Ok(());
        }

        let name_start = region.body_start + (body.len() - body.trim_start().len());
        let name_len = self.input[name_start..body_end]
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(body_end - name_start);
        if name_len == 0 {
            return Err(LexError::missing_directive_name(region.line, body));
        }

        let name_end = name_start + name_len;
        let name = &self.input[name_start..name_end];
        self.push_token(TokenKind::DirectiveName, name, region.line, name_start..name_end);

        let arguments = &self.input[name_end..body_end];
        if !arguments.trim().is_empty() {
            self.push_token(
                TokenKind::Expression,
                arguments.trim(),
                region.line,
                name_end..body_end,
            );
        }
        Ok(())
    }

    fn push_token(&mut self, kind: TokenKind, value: &str, line: usize, span: Range<usize>) {
        self.tokens.push(Token {
            kind,
            value: value.to_string(),
            line,
            span,
        });
    }

    /// Finds the longest open delimiter at the start of `text`.
    fn match_opener(&self, text: &str, tags_only: bool) -> Option<Opener<'a>> {
        self.openers
            .iter()
            .filter(|opener| !tags_only || opener.kind != DelimiterType::Directive)
            .find(|opener| text.starts_with(opener.open))
            .copied()
    }
}

/// Tokenizes `input` with the given delimiters.
pub fn tokenize(input: &str, delimiters: &DelimiterConfig) -> LexResult<Vec<Token>> {
    Lexer::new(input, delimiters).tokenize()
}

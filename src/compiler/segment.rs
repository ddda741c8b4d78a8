//! Groups a token stream into source segments.
//!
//! Both sub-compilers walk the template as a sequence of segments: the text
//! between regions, and one segment per directive, tag, or escaped tag open
//! delimiter. Every segment borrows from the source, so a sub-compiler can copy
//! the regions it does not handle byte for byte.

use super::lexer::{Token, tokenize};
use super::syntax::{TagKind, TokenKind};
use crate::template::{DelimiterConfig, DelimiterType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment<'s> {
    /// Verbatim text outside any delimiter.
    Text(&'s str),
    /// `\{{`: outputs `delimiter` in the tag pass, copied as `raw` before it.
    EscapedTagOpen { raw: &'s str, delimiter: &'s str },
    Directive {
        name: &'s str,
        expression: Option<&'s str>,
        line: usize,
        raw: &'s str,
    },
    Tag {
        kind: TagKind,
        body: &'s str,
        line: usize,
        /// Byte offset of the open delimiter.
        offset: usize,
        raw: &'s str,
    },
}

impl<'s> Segment<'s> {
    /// The source text this segment was built from.
    pub fn raw(&self) -> &'s str {
        match self {
            Segment::Text(text) => text,
            Segment::EscapedTagOpen { raw, .. }
            | Segment::Directive { raw, .. }
            | Segment::Tag { raw, .. } => raw,
        }
    }
}

/// Builds segments from `source` and the tokens the lexer produced for it.
pub(crate) fn build_segments<'s>(source: &'s str, tokens: &[Token]) -> Vec<Segment<'s>> {
    let mut segments = Vec::new();
    let mut cursor = 0;
    let mut iter = tokens.iter();

    while let Some(token) = iter.next() {
        flush_text(&mut segments, source, cursor, token.span.start);
        let start = token.span.start;

        match token.kind {
            TokenKind::EscapedTagOpen => {
                segments.push(Segment::EscapedTagOpen {
                    raw: &source[token.span.clone()],
                    delimiter: &source[token.span.start + 1..token.span.end],
                });
                cursor = token.span.end;
            }
            TokenKind::DirectiveOpen => {
                let mut name = "";
                let mut expression = None;
                let mut end = token.span.end;
                for inner in iter.by_ref() {
                    end = inner.span.end;
                    match inner.kind {
                        TokenKind::DirectiveName => name = &source[inner.span.clone()],
                        TokenKind::Expression => {
                            expression = Some(source[inner.span.clone()].trim());
                        }
                        _ => break,
                    }
                }
                segments.push(Segment::Directive {
                    name,
                    expression,
                    line: token.line,
                    raw: &source[start..end],
                });
                cursor = end;
            }
            TokenKind::SanitizedTagOpen | TokenKind::UnsanitizedTagOpen => {
                let kind = if token.kind == TokenKind::SanitizedTagOpen {
                    TagKind::Sanitized
                } else {
                    TagKind::Unsanitized
                };
                let mut body = "";
                let mut end = token.span.end;
                for inner in iter.by_ref() {
                    end = inner.span.end;
                    if inner.kind == TokenKind::Expression {
                        body = source[inner.span.clone()].trim();
                    } else {
                        break;
                    }
                }
                segments.push(Segment::Tag {
                    kind,
                    body,
                    line: token.line,
                    offset: start,
                    raw: &source[start..end],
                });
                cursor = end;
            }
            // Stray tokens only occur if the stream was not produced by the lexer
            _ => cursor = token.span.end,
        }
    }

    flush_text(&mut segments, source, cursor, source.len());
    segments
}

fn flush_text<'s>(segments: &mut Vec<Segment<'s>>, source: &'s str, from: usize, to: usize) {
    if from < to {
        segments.push(Segment::Text(&source[from..to]));
    }
}

/// Returns whether `text` holds a complete tag or an escaped tag open
/// delimiter. Text that does not lex, such as a lone `{{`, holds neither.
pub(crate) fn contains_tag(text: &str, config: &DelimiterConfig) -> bool {
    contains_tag_open(text, config)
        && tokenize(text, config).is_ok_and(|tokens| {
            tokens.iter().any(|token| {
                matches!(
                    token.kind,
                    TokenKind::SanitizedTagOpen
                        | TokenKind::UnsanitizedTagOpen
                        | TokenKind::EscapedTagOpen
                )
            })
        })
}

fn contains_tag_open(text: &str, config: &DelimiterConfig) -> bool {
    [DelimiterType::SanitizedTag, DelimiterType::UnsanitizedTag]
        .into_iter()
        .filter_map(|kind| config.get(kind))
        .any(|d| !d.open.is_empty() && text.contains(d.open.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(source: &str) -> Vec<Segment<'_>> {
        let tokens = tokenize(source, &DelimiterConfig::default()).unwrap();
        build_segments(source, &tokens)
    }

    #[test]
    fn test_segments_reassemble_the_source() {
        let source = "a <% show(\"x\") %> b {{ c }} \\{{ d }} {{! e !}}";
        let rebuilt: String = segments(source).iter().map(Segment::raw).collect();
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn test_directive_segment() {
        assert_eq!(
            segments("<% part(\"x\") %>"),
            vec![Segment::Directive {
                name: "part",
                expression: Some("(\"x\")"),
                line: 1,
                raw: "<% part(\"x\") %>",
            }]
        );
    }

    #[test]
    fn test_tag_and_escape_segments() {
        assert_eq!(
            segments("\\{{{{! x !}}"),
            vec![
                Segment::EscapedTagOpen {
                    raw: "\\{{",
                    delimiter: "{{",
                },
                Segment::Tag {
                    kind: TagKind::Unsanitized,
                    body: "x",
                    line: 1,
                    offset: 3,
                    raw: "{{! x !}}",
                },
            ]
        );
    }

    #[test]
    fn test_contains_tag() {
        let config = DelimiterConfig::default();
        assert!(contains_tag("a {{ b }}", &config));
        assert!(contains_tag("a {{! b !}}", &config));
        assert!(contains_tag("a \\{{ b", &config));
        assert!(!contains_tag("a <% b %>", &config));
        assert!(!contains_tag("type {{ to open a tag", &config));
        assert!(!contains_tag("plain", &config));
    }
}

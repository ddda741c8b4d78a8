//! The tag sub-compiler.
//!
//! Replaces every sanitized and unsanitized tag with its resolved value.
//! A body that names a visible tag is replaced by the tag value; anything else
//! is evaluated as an expression. Values that contain further tags are
//! compiled before they are escaped and inserted, so
//!
//! ```text
//! message = "world"
//! content = "Hello, {{message}}!"
//! {{!content!}}  =>  Hello, world!
//! ```
//!
//! A value is compiled again only when it holds a complete tag, so text such
//! as `type {{ to open a tag` is inserted as-is. Directives are copied
//! verbatim and the template is never mutated.

use tracing::trace;

use super::CompilerConfig;
use super::error::{ErrorKind, ViewCompilerError};
use super::expr::{self, Evaluator};
use super::lexer::tokenize;
use super::lines::LineMap;
use super::segment::{Segment, build_segments, contains_tag};
use super::syntax::TagKind;
use crate::escape::Escaper;
use crate::functions::FunctionRegistry;
use crate::template::Template;
use crate::value::render_value;

type Result<T> = std::result::Result<T, ViewCompilerError>;

pub(crate) struct TagCompiler<'c> {
    functions: &'c FunctionRegistry,
    escaper: &'c dyn Escaper,
    config: &'c CompilerConfig,
    /// Translates lines of the compiled contents back to template source lines.
    lines: Option<&'c LineMap>,
}

impl<'c> TagCompiler<'c> {
    pub fn new(
        functions: &'c FunctionRegistry,
        escaper: &'c dyn Escaper,
        config: &'c CompilerConfig,
    ) -> Self {
        Self {
            functions,
            escaper,
            config,
            lines: None,
        }
    }

    pub fn with_line_map(mut self, lines: &'c LineMap) -> Self {
        self.lines = Some(lines);
        self
    }

    pub fn compile(&self, template: &Template, contents: &str) -> Result<String> {
        self.compile_at_depth(template, contents, 0)
    }

    fn compile_at_depth(&self, template: &Template, contents: &str, depth: usize) -> Result<String> {
        let tokens = tokenize(contents, template.delimiter_config()).map_err(|err| {
            let err = ViewCompilerError::from(err);
            match (err.line, self.lines) {
                (Some(line), Some(lines)) if depth == 0 => {
                    let line = lines.translate_line(contents, line);
                    err.at_line(line)
                }
                _ => err,
            }
        })?;
        if tokens.is_empty() {
            return Ok(contents.to_string());
        }

        let mut out = String::with_capacity(contents.len());
        for segment in build_segments(contents, &tokens) {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Directive { raw, .. } => out.push_str(raw),
                Segment::EscapedTagOpen { delimiter, .. } => out.push_str(delimiter),
                Segment::Tag {
                    kind,
                    body,
                    line,
                    offset,
                    ..
                } => {
                    let line = match self.lines {
                        Some(lines) if depth == 0 => lines.line_at(contents, offset),
                        _ => line,
                    };
                    let mut value = self.resolve(template, body, line)?;

                    if contains_tag(&value, template.delimiter_config()) {
                        if depth + 1 > self.config.max_tag_depth {
                            return Err(ViewCompilerError::new(
                                ErrorKind::RecursionLimitExceeded,
                                format!(
                                    "tag `{body}` nests more than {} levels deep",
                                    self.config.max_tag_depth
                                ),
                            )
                            .at_line(line)
                            .with_help("check for a tag whose value refers to itself"));
                        }
                        // Errors inside a value belong to the tag that produced it
                        value = self
                            .compile_at_depth(template, &value, depth + 1)
                            .map_err(|err| err.at_line(line))?;
                    }

                    match kind {
                        TagKind::Sanitized => out.push_str(&self.escaper.escape(&value)),
                        TagKind::Unsanitized => out.push_str(&value),
                    }
                }
            }
        }
        Ok(out)
    }

    /// Resolves a trimmed tag body to its unescaped value.
    fn resolve(&self, template: &Template, body: &str, line: usize) -> Result<String> {
        if let Some(value) = template.tag(body) {
            trace!(tag = body, line, "resolved tag");
            return Ok(value.to_string());
        }

        let expr = expr::parse(body)
            .map_err(|err| ViewCompilerError::invalid_expression(&err, body, line))?;
        let value = Evaluator::new(template, self.functions)
            .evaluate(&expr)
            .map_err(|err| ViewCompilerError::evaluation(err, line))?;
        trace!(expression = body, line, "evaluated tag expression");
        Ok(render_value(&value))
    }
}

//! Source line tracking across compile stages.
//!
//! The directive stage splices part bodies into its output and drops part
//! definitions, so a line in its output is generally not the same line in the
//! template source. The directive stage records where each chunk of output came
//! from, and the tag stage uses that record to report source lines.

use super::error::ViewCompilerError;

/// Where line 1 of a piece of text sits in the template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineOrigin {
    /// The text was cut from the source starting at `first_line`.
    Source { first_line: usize },
    /// The text comes from elsewhere, such as a part inherited from a parent
    /// template. Every line reports the source line that pulled it in.
    Fixed(usize),
}

impl LineOrigin {
    pub const TOP: Self = Self::Source { first_line: 1 };

    /// Translates a 1-based line of the text into a source line.
    pub fn map(self, line: usize) -> usize {
        match self {
            Self::Source { first_line } => first_line + line.saturating_sub(1),
            Self::Fixed(line) => line,
        }
    }

    pub fn advances(self) -> bool {
        matches!(self, Self::Source { .. })
    }

    /// Rewrites the line of an error raised against the text.
    pub fn relocate(self, err: ViewCompilerError) -> ViewCompilerError {
        match err.line {
            Some(line) => {
                let line = self.map(line);
                err.at_line(line)
            }
            None => err,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct LineSpan {
    offset: usize,
    line: usize,
    advances: bool,
}

/// Maps byte offsets of compiled output back to source lines.
///
/// An empty map is the identity: output lines are source lines.
#[derive(Debug, Clone, Default)]
pub(crate) struct LineMap {
    spans: Vec<LineSpan>,
}

impl LineMap {
    /// Records that output starting at `offset` comes from source `line`.
    /// Offsets must be pushed in non-decreasing order.
    pub fn push(&mut self, offset: usize, line: usize, advances: bool) {
        self.spans.push(LineSpan {
            offset,
            line,
            advances,
        });
    }

    /// Returns the source line of byte `offset` in `output`.
    pub fn line_at(&self, output: &str, offset: usize) -> usize {
        let newlines = |from: usize| {
            output
                .get(from..offset)
                .unwrap_or_default()
                .matches('\n')
                .count()
        };

        let index = self.spans.partition_point(|span| span.offset <= offset);
        match index.checked_sub(1).and_then(|index| self.spans.get(index)) {
            Some(span) if span.advances => span.line + newlines(span.offset),
            Some(span) => span.line,
            None => 1 + newlines(0),
        }
    }

    /// Returns the source line of 1-based `line` in `output`.
    pub fn translate_line(&self, output: &str, line: usize) -> usize {
        let offset = output
            .split_inclusive('\n')
            .take(line.saturating_sub(1))
            .map(str::len)
            .sum();
        self.line_at(output, offset)
    }
}

//! Rustc-style error formatting with template source context.

/// A 1-based line and column in a source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    /// Computes the location of a byte offset. Columns count characters.
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let offset = floor_char_boundary(source, offset);
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|pos| pos + 1).unwrap_or(0);
        let column = source[line_start..offset].chars().count() + 1;
        Self { line, column }
    }
}

/// Returns the byte offset of the first non-blank character on `line`.
pub fn line_offset(source: &str, line: usize) -> Option<usize> {
    let mut start = 0;
    for (index, content) in source.split('\n').enumerate() {
        if index + 1 == line {
            let indent = content.len() - content.trim_start().len();
            return Some(start + indent.min(content.len()));
        }
        start += content.len() + 1;
    }
    None
}

fn floor_char_boundary(source: &str, offset: usize) -> usize {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Configuration for formatting an error with source context.
pub struct ErrorFormat<'a> {
    /// The error message (e.g., "undefined part: ...")
    pub message: &'a str,
    /// Template source
    pub source: &'a str,
    /// Byte position in source where error occurred
    pub position: usize,
    /// Filename to display
    pub filename: &'a str,
    /// Help text
    pub help: Option<&'a str>,
}

impl<'a> ErrorFormat<'a> {
    /// Creates a new error format configuration.
    pub fn new(message: &'a str, source: &'a str, position: usize) -> Self {
        Self {
            message,
            source,
            position,
            filename: "template",
            help: None,
        }
    }

    /// Sets the filename.
    pub fn filename(mut self, filename: &'a str) -> Self {
        self.filename = filename;
        self
    }

    /// Sets the help text.
    pub fn help(mut self, help: &'a str) -> Self {
        self.help = Some(help);
        self
    }

    /// Formats the error with source context.
    ///
    /// Output format:
    /// ```text
    /// error: message
    ///  --> file:line:column
    ///   |
    /// N | source line content
    ///   |     ^
    /// help: suggestion
    /// ```
    pub fn format(&self) -> String {
        let loc = SourceLocation::from_offset(self.source, self.position);

        let mut msg = format!("error: {}\n", self.message);
        msg.push_str(&format!(" --> {}:{}:{}\n", self.filename, loc.line, loc.column));

        if let Some(line_content) = self.source.split('\n').nth(loc.line - 1) {
            let line_content = line_content.trim_end_matches('\r');
            let expanded = line_content.replace('\t', "    ");

            // Visual caret column, accounting for expanded tabs
            let caret_col: usize = line_content
                .chars()
                .take(loc.column - 1)
                .map(|c| if c == '\t' { 4 } else { 1 })
                .sum();

            const MAX_LINE_LEN: usize = 80;
            const CONTEXT_CHARS: usize = 30;

            let chars: Vec<char> = expanded.chars().collect();
            let (display, display_col) = if chars.len() > MAX_LINE_LEN {
                let start = caret_col.saturating_sub(CONTEXT_CHARS).min(chars.len());
                let end = (caret_col + CONTEXT_CHARS).min(chars.len());
                let prefix = if start > 0 { "..." } else { "" };
                let suffix = if end < chars.len() { "..." } else { "" };
                let snippet: String = chars[start..end].iter().collect();
                (
                    format!("{prefix}{snippet}{suffix}"),
                    caret_col - start + prefix.len(),
                )
            } else {
                (expanded, caret_col)
            };

            let width = loc.line.to_string().len();
            msg.push_str(&format!("{:>width$} |\n", ""));
            msg.push_str(&format!("{:>width$} | {}\n", loc.line, display));
            msg.push_str(&format!("{:>width$} | {:>display_col$}^\n", "", ""));
        }

        if let Some(help) = self.help {
            msg.push_str(&format!("help: {}\n", help));
        }

        msg
    }
}

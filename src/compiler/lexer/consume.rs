use super::*;

impl<'a> Lexer<'a> {
    /// Returns the remaining input from the current position.
    pub(super) fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Peeks at the next character without consuming it.
    pub(super) fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Advances past one character, tracking newlines.
    pub(super) fn advance_char(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
            if c == '\n' {
                self.line += 1;
            }
        }
    }

    /// Advances past `n` bytes of known text (a delimiter), tracking newlines.
    pub(super) fn advance_str(&mut self, n: usize) {
        let end = (self.pos + n).min(self.input.len());
        self.line += self.input[self.pos..end].matches('\n').count();
        self.pos = end;
    }

    /// Consumes characters while the predicate is true.
    pub(super) fn consume_while<F: Fn(char) -> bool>(&mut self, pred: F) {
        while let Some(c) = self.peek() {
            if pred(c) {
                self.advance_char();
            } else {
                break;
            }
        }
    }
}

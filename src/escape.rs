//! Escaping strategies applied to sanitized tag output.

/// Escapes the resolved value of a sanitized tag before it is inserted.
///
/// Implementations must be deterministic. They need not be idempotent: a
/// sanitized tag whose value contains another sanitized tag is escaped once
/// per level.
pub trait Escaper: Send + Sync {
    fn escape(&self, text: &str) -> String;
}

impl<F> Escaper for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn escape(&self, text: &str) -> String {
        self(text)
    }
}

/// HTML entity encoding of `&`, `<`, `>`, `"` and `'`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlEscaper;

impl Escaper for HtmlEscaper {
    fn escape(&self, text: &str) -> String {
        escape_html(text)
    }
}

/// Leaves text untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawEscaper;

impl Escaper for RawEscaper {
    fn escape(&self, text: &str) -> String {
        text.to_owned()
    }
}

/// Encodes the HTML special characters of `input` as entities.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escaper_encodes_specials() {
        assert_eq!(
            HtmlEscaper.escape(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#039;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_html_escaper_is_not_idempotent() {
        assert_eq!(HtmlEscaper.escape("&amp;"), "&amp;amp;");
    }

    #[test]
    fn test_raw_escaper() {
        assert_eq!(RawEscaper.escape("a&w"), "a&w");
    }

    #[test]
    fn test_closure_escaper() {
        let upper = |text: &str| text.to_uppercase();
        assert_eq!(upper.escape("abc"), "ABC");
    }
}

//! Built-in functions available to every template.

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use serde_json::Value;
use thiserror::Error;

use super::arg;
use crate::escape::escape_html;
use crate::value::{is_truthy, render_value};

/// Failure raised by a built-in function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{function}(): {message}")]
pub struct FunctionError {
    pub function: &'static str,
    pub message: String,
}

impl FunctionError {
    fn new(function: &'static str, message: impl Into<String>) -> Self {
        Self {
            function,
            message: message.into(),
        }
    }
}

/// The allow-list of built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `upper(s)`
    Upper,
    /// `lower(s)`
    Lower,
    /// `capitalize(s)` - uppercases the first character.
    Capitalize,
    /// `reverse(s)` - reverses a string or an array.
    Reverse,
    /// `trim(s)`
    Trim,
    /// `length(v)` - characters of a string, items of an array or object.
    Length,
    /// `join(list, separator)`
    Join,
    /// `default(value, fallback)` - `fallback` when `value` is falsy.
    Default,
    /// `replace(s, from, to)`
    Replace,
    /// `nl2br(s)` - inserts `<br>` before each newline.
    Nl2br,
    /// `escape(s)` - HTML-escapes `s`, for use inside unsanitized tags.
    Escape,
    /// `json(v)` - compact JSON encoding.
    Json,
    /// `date(format, timestamp?)` - formats a Unix timestamp, or now.
    Date,
    /// `strtoupper(s)`, same as `upper`.
    StrToUpper,
    /// `strtolower(s)`, same as `lower`.
    StrToLower,
    /// `ucfirst(s)`, same as `capitalize`.
    UcFirst,
    /// `strrev(s)`, same as `reverse`.
    StrRev,
    /// `count(v)`, same as `length`.
    Count,
    /// `implode(separator, list)` - `join` with the arguments swapped. The
    /// list may also come first.
    Implode,
    /// `str_replace(from, to, s)` - `replace` with the subject last.
    StrReplace,
    /// `json_encode(v)`, same as `json`.
    JsonEncode,
    /// `htmlspecialchars(s)`, same as `escape`.
    HtmlSpecialChars,
}

impl Builtin {
    pub const ALL: [Builtin; 22] = [
        Builtin::Upper,
        Builtin::Lower,
        Builtin::Capitalize,
        Builtin::Reverse,
        Builtin::Trim,
        Builtin::Length,
        Builtin::Join,
        Builtin::Default,
        Builtin::Replace,
        Builtin::Nl2br,
        Builtin::Escape,
        Builtin::Json,
        Builtin::Date,
        Builtin::StrToUpper,
        Builtin::StrToLower,
        Builtin::UcFirst,
        Builtin::StrRev,
        Builtin::Count,
        Builtin::Implode,
        Builtin::StrReplace,
        Builtin::JsonEncode,
        Builtin::HtmlSpecialChars,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Upper => "upper",
            Self::Lower => "lower",
            Self::Capitalize => "capitalize",
            Self::Reverse => "reverse",
            Self::Trim => "trim",
            Self::Length => "length",
            Self::Join => "join",
            Self::Default => "default",
            Self::Replace => "replace",
            Self::Nl2br => "nl2br",
            Self::Escape => "escape",
            Self::Json => "json",
            Self::Date => "date",
            Self::StrToUpper => "strtoupper",
            Self::StrToLower => "strtolower",
            Self::UcFirst => "ucfirst",
            Self::StrRev => "strrev",
            Self::Count => "count",
            Self::Implode => "implode",
            Self::StrReplace => "str_replace",
            Self::JsonEncode => "json_encode",
            Self::HtmlSpecialChars => "htmlspecialchars",
        }
    }

    /// Calls the built-in with already-evaluated arguments.
    pub fn call(self, args: &[Value]) -> Result<Value, FunctionError> {
        let text = || render_value(arg(args, 0));
        let value = match self {
            Self::Upper | Self::StrToUpper => Value::from(text().to_uppercase()),
            Self::Lower | Self::StrToLower => Value::from(text().to_lowercase()),
            Self::Capitalize | Self::UcFirst => {
                let text = text();
                let mut chars = text.chars();
                let capitalized = match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                };
                Value::from(capitalized)
            }
            Self::Reverse | Self::StrRev => match arg(args, 0) {
                Value::Array(items) => Value::Array(items.iter().rev().cloned().collect()),
                other => Value::from(render_value(other).chars().rev().collect::<String>()),
            },
            Self::Trim => Value::from(text().trim()),
            Self::Length | Self::Count => {
                let len = match arg(args, 0) {
                    Value::Array(items) => items.len(),
                    Value::Object(map) => map.len(),
                    other => render_value(other).chars().count(),
                };
                Value::from(len)
            }
            Self::Join => {
                let Value::Array(items) = arg(args, 0) else {
                    return Err(FunctionError::new(self.name(), "first argument must be a list"));
                };
                Value::from(join(items, arg(args, 1)))
            }
            Self::Implode => match (arg(args, 0), arg(args, 1)) {
                (separator, Value::Array(items)) | (Value::Array(items), separator) => {
                    Value::from(join(items, separator))
                }
                _ => return Err(FunctionError::new(self.name(), "one argument must be a list")),
            },
            Self::Default => {
                let value = arg(args, 0);
                if is_truthy(value) {
                    value.clone()
                } else {
                    arg(args, 1).clone()
                }
            }
            Self::Replace => replace(self, arg(args, 0), arg(args, 1), arg(args, 2))?,
            Self::StrReplace => replace(self, arg(args, 2), arg(args, 0), arg(args, 1))?,
            Self::Nl2br => Value::from(text().replace('\n', "<br>\n")),
            Self::Escape | Self::HtmlSpecialChars => Value::from(escape_html(&text())),
            Self::Json | Self::JsonEncode => Value::from(arg(args, 0).to_string()),
            Self::Date => {
                let format = render_value(arg(args, 0));
                let moment = match arg(args, 1) {
                    Value::Null => Local::now(),
                    Value::Number(n) => {
                        let seconds = n.as_i64().ok_or_else(|| {
                            FunctionError::new(self.name(), "timestamp must be an integer")
                        })?;
                        Local.timestamp_opt(seconds, 0).single().ok_or_else(|| {
                            FunctionError::new(self.name(), format!("invalid timestamp {seconds}"))
                        })?
                    }
                    other => {
                        return Err(FunctionError::new(
                            self.name(),
                            format!("timestamp must be a number, got {other}"),
                        ));
                    }
                };
                Value::from(format_date(&format, &moment))
            }
        };
        Ok(value)
    }
}

fn join(items: &[Value], separator: &Value) -> String {
    items
        .iter()
        .map(render_value)
        .collect::<Vec<_>>()
        .join(&render_value(separator))
}

fn replace(
    builtin: Builtin,
    subject: &Value,
    from: &Value,
    to: &Value,
) -> Result<Value, FunctionError> {
    let from = render_value(from);
    if from.is_empty() {
        return Err(FunctionError::new(builtin.name(), "search string is empty"));
    }
    Ok(Value::from(render_value(subject).replace(&from, &render_value(to))))
}

/// Formats `moment` using single-letter format codes.
///
/// | code | meaning                       |
/// |------|-------------------------------|
/// | `Y`  | four digit year               |
/// | `y`  | two digit year                |
/// | `m`  | month, zero padded            |
/// | `n`  | month                         |
/// | `d`  | day of month, zero padded     |
/// | `j`  | day of month                  |
/// | `H`  | 24-hour hour, zero padded     |
/// | `G`  | 24-hour hour                  |
/// | `i`  | minutes, zero padded          |
/// | `s`  | seconds, zero padded          |
/// | `D`  | short weekday name            |
/// | `l`  | full weekday name             |
/// | `M`  | short month name              |
/// | `F`  | full month name               |
/// | `U`  | Unix timestamp                |
///
/// A backslash emits the next character literally; other characters are
/// copied as-is.
fn format_date<Tz>(format: &str, moment: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::with_capacity(format.len() * 2);
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        match c {
            'Y' => out.push_str(&format!("{:04}", moment.year())),
            'y' => out.push_str(&format!("{:02}", moment.year().rem_euclid(100))),
            'm' => out.push_str(&format!("{:02}", moment.month())),
            'n' => out.push_str(&moment.month().to_string()),
            'd' => out.push_str(&format!("{:02}", moment.day())),
            'j' => out.push_str(&moment.day().to_string()),
            'H' => out.push_str(&format!("{:02}", moment.hour())),
            'G' => out.push_str(&moment.hour().to_string()),
            'i' => out.push_str(&format!("{:02}", moment.minute())),
            's' => out.push_str(&format!("{:02}", moment.second())),
            'D' => out.push_str(&moment.format("%a").to_string()),
            'l' => out.push_str(&moment.format("%A").to_string()),
            'M' => out.push_str(&moment.format("%b").to_string()),
            'F' => out.push_str(&moment.format("%B").to_string()),
            'U' => out.push_str(&moment.timestamp().to_string()),
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

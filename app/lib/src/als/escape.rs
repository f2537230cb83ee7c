//! Escape sequence handling for ALS text values.
//!
//! Text values and column names are written as single words, so every
//! character with structural meaning in the format is backslash-escaped.
//!
//! # Reserved Tokens
//!
//! - `\0` - Represents a null value
//! - `\e` - Represents an empty string
//!
//! # Escape Sequences
//!
//! | Character | Escape |
//! |-----------|--------|
//! | `>` | `\>` |
//! | `*` | `\*` |
//! | `~` | `\~` |
//! | `|` | `\|` |
//! | `_` | `\_` |
//! | `#` | `\#` |
//! | `$` | `\$` |
//! | `:` | `\:` |
//! | `\` | `\\` |
//! | newline | `\n` |
//! | tab | `\t` |
//! | carriage return | `\r` |
//! | space | `\ ` |

use std::borrow::Cow;

use crate::error::{AlsError, Result};

/// Reserved token representing a null value.
///
/// ```
/// use als_engine::als::escape::NULL_TOKEN;
/// assert_eq!(NULL_TOKEN, "\\0");
/// ```
pub const NULL_TOKEN: &str = "\\0";

/// Reserved token representing an empty string.
///
/// ```
/// use als_engine::als::escape::EMPTY_TOKEN;
/// assert_eq!(EMPTY_TOKEN, "\\e");
/// ```
pub const EMPTY_TOKEN: &str = "\\e";

/// Check if a character must be escaped.
#[inline]
fn is_special(c: char) -> bool {
    matches!(
        c,
        '>' | '*' | '~' | '|' | '_' | '#' | '$' | ':' | '\\' | '\n' | '\t' | '\r' | ' '
    )
}

/// Check if a string needs escaping.
#[inline]
pub fn needs_escaping(s: &str) -> bool {
    s.chars().any(is_special)
}

/// Escape a text value for use as a single ALS word.
///
/// The empty string becomes [`EMPTY_TOKEN`]. Strings without special
/// characters are returned borrowed.
///
/// ```
/// use als_engine::als::escape::escape_text;
///
/// assert_eq!(escape_text("1>2"), "1\\>2");
/// assert_eq!(escape_text("a b"), "a\\ b");
/// assert_eq!(escape_text(""), "\\e");
/// ```
pub fn escape_text(s: &str) -> Cow<'_, str> {
    if s.is_empty() {
        return Cow::Borrowed(EMPTY_TOKEN);
    }
    if !needs_escaping(s) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len() + s.len() / 4);
    for c in s.chars() {
        match c {
            '\n' => result.push_str("\\n"),
            '\t' => result.push_str("\\t"),
            '\r' => result.push_str("\\r"),
            c if is_special(c) => {
                result.push('\\');
                result.push(c);
            }
            c => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Reverse [`escape_text`].
///
/// Words without a backslash are returned borrowed. The reserved tokens
/// are only meaningful as whole words: `\e` decodes to the empty string,
/// and `\0` is rejected because a null is not text.
///
/// # Errors
///
/// Returns `CorruptStream` at `line` for an unknown or incomplete escape
/// sequence.
pub fn unescape_text(s: &str, line: usize) -> Result<Cow<'_, str>> {
    if s == EMPTY_TOKEN {
        return Ok(Cow::Borrowed(""));
    }
    if !s.contains('\\') {
        return Ok(Cow::Borrowed(s));
    }

    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some(other) if is_special(other) => result.push(other),
            Some(other) => {
                return Err(AlsError::corrupt(
                    line,
                    format!("unknown escape sequence \\{} in '{}'", other, s),
                ));
            }
            None => {
                return Err(AlsError::corrupt(
                    line,
                    format!("incomplete escape sequence at end of '{}'", s),
                ));
            }
        }
    }
    Ok(Cow::Owned(result))
}

/// Check if a word is the null token.
#[inline]
pub fn is_null_token(s: &str) -> bool {
    s == NULL_TOKEN
}

/// Find the byte offset of the last `delimiter` not preceded by an escape.
pub fn rfind_unescaped(s: &str, delimiter: char) -> Option<usize> {
    let mut found = None;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == delimiter {
            found = Some(i);
        }
    }
    found
}

/// Split `s` on every `delimiter` not preceded by an escape.
pub fn split_unescaped(s: &str, delimiter: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == delimiter {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

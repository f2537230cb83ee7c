//! Typed literal words.
//!
//! Every value is written as one word whose form depends on the column's
//! declared type:
//!
//! | Type | Form | Example |
//! |------|------|---------|
//! | `int` | decimal | `-42` |
//! | `float` | shortest round-trip form | `1.5`, `1e-7`, `inf`, `NaN` |
//! | `bool` | `true` / `false` | `true` |
//! | `text` | escaped text | `hello\ world` |
//! | `mixed` | tag letter then typed form | `i42`, `f1.5`, `btrue`, `sabc` |
//!
//! `\0` is null in every type. A NaN whose bits differ from the canonical
//! NaN is written `NaN@` followed by its 16 hex digits.

use super::escape::{escape_text, is_null_token, unescape_text, NULL_TOKEN};
use crate::convert::{ColumnType, Value};
use crate::error::{AlsError, Result};

/// Wire name of a declared type.
pub fn type_name(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Integer => "int",
        ColumnType::Float => "float",
        ColumnType::Text => "text",
        ColumnType::Boolean => "bool",
        ColumnType::Mixed => "mixed",
    }
}

/// Look up a declared type by its wire name.
pub fn parse_type_name(name: &str) -> Option<ColumnType> {
    match name {
        "int" => Some(ColumnType::Integer),
        "float" => Some(ColumnType::Float),
        "text" => Some(ColumnType::Text),
        "bool" => Some(ColumnType::Boolean),
        "mixed" => Some(ColumnType::Mixed),
        _ => None,
    }
}

/// Append the literal word for `value` in a column of `declared` type.
pub fn write_literal(out: &mut String, value: &Value<'_>, declared: ColumnType) {
    if declared == ColumnType::Mixed {
        let sigil = match value {
            Value::Null => None,
            Value::Integer(_) => Some('i'),
            Value::Float(_) => Some('f'),
            Value::Boolean(_) => Some('b'),
            Value::Text(_) => Some('s'),
        };
        if let Some(sigil) = sigil {
            out.push(sigil);
        }
    }

    match value {
        Value::Null => out.push_str(NULL_TOKEN),
        Value::Integer(i) => out.push_str(&i.to_string()),
        Value::Float(f) => write_float(out, *f),
        Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Text(s) => out.push_str(&escape_text(s)),
    }
}

/// Append a float in a form that parses back to identical bits.
pub fn write_float(out: &mut String, f: f64) {
    if f.is_nan() && f.to_bits() != f64::NAN.to_bits() {
        out.push_str(&format!("NaN@{:016x}", f.to_bits()));
    } else {
        out.push_str(&format!("{:?}", f));
    }
}

/// Parse a literal word for a column of `declared` type.
pub fn parse_literal<'t>(word: &'t str, declared: ColumnType, line: usize) -> Result<Value<'t>> {
    if is_null_token(word) {
        return Ok(Value::Null);
    }

    match declared {
        ColumnType::Integer => parse_integer(word, line).map(Value::Integer),
        ColumnType::Float => parse_float(word, line).map(Value::Float),
        ColumnType::Boolean => parse_boolean(word, line).map(Value::Boolean),
        ColumnType::Text => unescape_text(word, line).map(Value::Text),
        ColumnType::Mixed => {
            let mut chars = word.chars();
            let sigil = chars.next();
            let rest = chars.as_str();
            match sigil {
                Some('i') => parse_integer(rest, line).map(Value::Integer),
                Some('f') => parse_float(rest, line).map(Value::Float),
                Some('b') => parse_boolean(rest, line).map(Value::Boolean),
                Some('s') => unescape_text(rest, line).map(Value::Text),
                _ => Err(AlsError::corrupt(
                    line,
                    format!("mixed literal '{}' has no type tag", word),
                )),
            }
        }
    }
}

/// Parse a decimal integer.
pub fn parse_integer(word: &str, line: usize) -> Result<i64> {
    word.parse::<i64>()
        .map_err(|_| AlsError::corrupt(line, format!("invalid integer literal '{}'", word)))
}

/// Parse a float written by [`write_float`].
pub fn parse_float(word: &str, line: usize) -> Result<f64> {
    let invalid = || AlsError::corrupt(line, format!("invalid float literal '{}'", word));
    if let Some(hex) = word.strip_prefix("NaN@") {
        let bits = u64::from_str_radix(hex, 16).map_err(|_| invalid())?;
        let value = f64::from_bits(bits);
        return if value.is_nan() { Ok(value) } else { Err(invalid()) };
    }
    word.parse::<f64>().map_err(|_| invalid())
}

fn parse_boolean(word: &str, line: usize) -> Result<bool> {
    match word {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(AlsError::corrupt(
            line,
            format!("invalid boolean literal '{}'", word),
        )),
    }
}

/// Parse a non-negative decimal count.
pub fn parse_count(word: &str, line: usize) -> Result<usize> {
    if word.is_empty() || !word.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AlsError::corrupt(line, format!("invalid count '{}'", word)));
    }
    word.parse::<usize>()
        .map_err(|_| AlsError::corrupt(line, format!("count '{}' is too large", word)))
}

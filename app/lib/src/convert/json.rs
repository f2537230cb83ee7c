//! JSON adapter.
//!
//! Reads a JSON array of objects into a [`Table`] and writes tables back as
//! one. Nested objects are flattened with dot-notation on read and rebuilt
//! on write. Keys missing from an object read as null.

use std::collections::{BTreeSet, HashMap};
use std::io;

use crate::convert::{Column, Table, TableSink, TableSource, Value};
use crate::error::{AlsError, Result};

/// Converts between JSON arrays of objects and tables.
///
/// Columns are ordered by name.
///
/// # Examples
///
/// ```
/// use als_engine::convert::{JsonAdapter, TableSource};
///
/// let json = r#"[{"id": 1, "name": "Alice"}, {"id": 2, "name": "Bob"}]"#;
/// let table = JsonAdapter::new().read_table(json).unwrap();
/// assert_eq!(table.column_names(), vec!["id", "name"]);
/// assert_eq!(table.row_count(), 2);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonAdapter {
    pretty: bool,
}

impl JsonAdapter {
    /// A compact JSON adapter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty-print written JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl TableSource for JsonAdapter {
    fn read_table<'a>(&self, input: &'a str) -> Result<Table<'a>> {
        if input.trim().is_empty() {
            return Ok(Table::empty());
        }

        let array = match serde_json::from_str(input)? {
            serde_json::Value::Array(array) => array,
            _ => return Err(invalid_data("Expected JSON array of objects")),
        };

        let mut rows = Vec::with_capacity(array.len());
        let mut names = BTreeSet::new();
        for item in &array {
            let serde_json::Value::Object(object) = item else {
                return Err(invalid_data("Array must contain only objects"));
            };
            let mut row = HashMap::new();
            flatten_object(object, "", &mut row);
            names.extend(row.keys().cloned());
            rows.push(row);
        }

        let columns = names
            .into_iter()
            .map(|name| {
                let values = rows
                    .iter()
                    .map(|row| row.get(&name).map_or(Value::Null, |v| json_to_value(v)))
                    .collect();
                Column::new(name, values)
            })
            .collect();
        Table::from_parts(columns, rows.len())
    }
}

impl TableSink for JsonAdapter {
    fn write_table(&self, table: &Table<'_>) -> Result<String> {
        let mut array = Vec::with_capacity(table.row_count());
        if table.column_count() > 0 {
            for row in table.rows() {
                let mut object = serde_json::Map::new();
                for (column, value) in table.columns().iter().zip(row) {
                    insert_nested(&mut object, &column.name, value_to_json(value));
                }
                array.push(serde_json::Value::Object(object));
            }
        }

        let output = if self.pretty {
            serde_json::to_string_pretty(&array)?
        } else {
            serde_json::to_string(&array)?
        };
        Ok(output)
    }
}

fn invalid_data(message: &str) -> AlsError {
    AlsError::JsonParseError(serde_json::Error::io(io::Error::new(
        io::ErrorKind::InvalidData,
        message.to_string(),
    )))
}

/// Flatten a JSON object using dot-notation for nested keys.
///
/// `{"user": {"name": "Alice"}}` becomes `user.name -> "Alice"`.
fn flatten_object<'j>(
    object: &'j serde_json::Map<String, serde_json::Value>,
    prefix: &str,
    out: &mut HashMap<String, &'j serde_json::Value>,
) {
    for (key, value) in object {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            serde_json::Value::Object(nested) => flatten_object(nested, &full_key, out),
            _ => {
                out.insert(full_key, value);
            }
        }
    }
}

/// Convert a `serde_json::Value` to our `Value` type.
///
/// Arrays are kept as their JSON text.
fn json_to_value(value: &serde_json::Value) -> Value<'static> {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n
                .as_f64()
                .map(Value::Float)
                .unwrap_or_else(|| Value::text_owned(n.to_string())),
        },
        serde_json::Value::String(s) => Value::text_owned(s.clone()),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            Value::text_owned(value.to_string())
        }
    }
}

/// Convert our `Value` type to `serde_json::Value`.
///
/// Non-finite floats have no JSON form and are written as null.
fn value_to_json(value: &Value<'_>) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::Number((*i).into()),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => serde_json::Value::String(s.to_string()),
        Value::Boolean(b) => serde_json::Value::Bool(*b),
    }
}

/// Insert a value, rebuilding nested objects for dot-notation keys.
///
/// If a path segment already holds a non-object value the full dotted key
/// is inserted flat instead.
fn insert_nested(
    object: &mut serde_json::Map<String, serde_json::Value>,
    key: &str,
    value: serde_json::Value,
) {
    let Some((head, rest)) = key.split_once('.') else {
        object.insert(key.to_string(), value);
        return;
    };

    let child = object
        .entry(head.to_string())
        .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
    match child {
        serde_json::Value::Object(nested) => insert_nested(nested, rest, value),
        _ => {
            object.insert(key.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ColumnType;
    use serde_json::json;

    fn read(input: &str) -> Table<'_> {
        JsonAdapter::new().read_table(input).unwrap()
    }

    #[test]
    fn test_read_json_basic() {
        let table = read(r#"[{"name": "Alice", "id": 1}, {"name": "Bob", "id": 2}]"#);
        assert_eq!(table.column_names(), vec!["id", "name"]);
        let row1 = table.get_row(1).unwrap();
        assert_eq!(row1[0].as_integer(), Some(2));
        assert_eq!(row1[1].as_str(), Some("Bob"));
    }

    #[test]
    fn test_read_json_empty() {
        assert_eq!(read("").column_count(), 0);
        let table = read("[]");
        assert_eq!(table.column_count(), 0);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_read_json_nested_objects() {
        let table = read(
            r#"[
                {"id": 1, "user": {"name": "Alice", "age": 30}},
                {"id": 2, "user": {"name": "Bob", "age": 25}}
            ]"#,
        );
        assert_eq!(table.column_names(), vec!["id", "user.age", "user.name"]);
        let age = table.get_column_by_name("user.age").unwrap();
        assert_eq!(age.values[1], Value::Integer(25));
    }

    #[test]
    fn test_read_json_missing_keys_and_nulls() {
        let table = read(
            r#"[
                {"id": 1, "name": "Alice", "email": null},
                {"id": 2, "email": "bob@example.com"}
            ]"#,
        );
        assert_eq!(table.column_count(), 3);
        let name = table.get_column_by_name("name").unwrap();
        assert!(name.values[1].is_null());
        let email = table.get_column_by_name("email").unwrap();
        assert!(email.values[0].is_null());
        assert_eq!(email.declared_type, ColumnType::Text);
    }

    #[test]
    fn test_read_json_types() {
        let table = read(r#"[{"i": 42, "f": 3.5, "b": true, "s": "hi", "a": [1, 2], "m": 1}, {"m": "x"}]"#);
        let types: HashMap<&str, ColumnType> = table
            .columns()
            .iter()
            .map(|c| (c.name.as_ref(), c.declared_type))
            .collect();
        assert_eq!(types["i"], ColumnType::Integer);
        assert_eq!(types["f"], ColumnType::Float);
        assert_eq!(types["b"], ColumnType::Boolean);
        assert_eq!(types["s"], ColumnType::Text);
        assert_eq!(types["a"], ColumnType::Text);
        assert_eq!(types["m"], ColumnType::Mixed);
        assert_eq!(table.get_column_by_name("a").unwrap().values[0], Value::text("[1,2]"));
    }

    #[test]
    fn test_read_json_errors() {
        for input in [r#"{"id": 1}"#, "[1, 2, 3]", r#"[{"id": 1"#] {
            let err = JsonAdapter::new().read_table(input).unwrap_err();
            assert!(matches!(err, AlsError::JsonParseError(_)), "input {}", input);
        }
    }

    #[test]
    fn test_write_json_nested() {
        let table = Table::new(vec![
            Column::new("id", vec![Value::Integer(1)]),
            Column::new("user.name", vec![Value::text("Alice")]),
            Column::new("user.age", vec![Value::Integer(30)]),
            Column::new("score", vec![Value::Float(f64::NAN)]),
        ])
        .unwrap();
        let json = JsonAdapter::new().write_table(&table).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, json!([{"id": 1, "user": {"name": "Alice", "age": 30}, "score": null}]));
    }

    #[test]
    fn test_write_json_empty() {
        assert_eq!(JsonAdapter::new().write_table(&Table::empty()).unwrap(), "[]");
    }

    #[test]
    fn test_insert_nested_conflict_stays_flat() {
        let mut object = serde_json::Map::new();
        insert_nested(&mut object, "a", json!(1));
        insert_nested(&mut object, "a.b", json!(2));
        assert_eq!(serde_json::Value::Object(object), json!({"a": 1, "a.b": 2}));
    }

    #[test]
    fn test_json_round_trip() {
        let input = r#"[{"active":true,"id":1,"user":{"name":"Alice"}},{"active":false,"id":2,"user":{"name":"Bob"}}]"#;
        let adapter = JsonAdapter::new();
        let table = adapter.read_table(input).unwrap();
        assert_eq!(adapter.write_table(&table).unwrap(), input);
    }
}

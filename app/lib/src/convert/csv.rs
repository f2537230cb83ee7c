//! CSV adapter.
//!
//! Reads CSV text into a [`Table`] and writes tables back as CSV. The first
//! record is the header. Each column gets a single type: the narrowest of
//! integer, float, boolean and text that writes every non-empty field back
//! unchanged. `02134`, ` 7`, `1e3` and `TRUE` therefore keep the column
//! text. Empty fields are null.

use crate::convert::{Column, Table, TableSink, TableSource, Value};
use crate::error::{AlsError, Result};

/// Converts between CSV text and tables.
///
/// # Examples
///
/// ```
/// use als_engine::convert::{CsvAdapter, TableSource};
///
/// let table = CsvAdapter::new().read_table("id,name\n1,Alice\n2,Bob").unwrap();
/// assert_eq!(table.column_count(), 2);
/// assert_eq!(table.row_count(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvAdapter {
    delimiter: u8,
}

impl CsvAdapter {
    /// A comma-separated adapter.
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Use a different field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl Default for CsvAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl TableSource for CsvAdapter {
    fn read_table<'a>(&self, input: &'a str) -> Result<Table<'a>> {
        if input.trim().is_empty() {
            return Ok(Table::empty());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .delimiter(self.delimiter)
            .from_reader(input.as_bytes());

        let names: Vec<String> = reader
            .headers()
            .map_err(|e| csv_error(&e, "Failed to read headers"))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut fields: Vec<Vec<String>> = vec![Vec::new(); names.len()];
        for result in reader.records() {
            let record = result.map_err(|e| csv_error(&e, "Failed to parse record"))?;
            for (column, field) in fields.iter_mut().zip(record.iter()) {
                column.push(field.to_string());
            }
        }

        let columns = names
            .into_iter()
            .zip(fields)
            .map(|(name, fields)| Column::new(name, infer_values(fields)))
            .collect();
        Table::new(columns)
    }
}

impl TableSink for CsvAdapter {
    fn write_table(&self, table: &Table<'_>) -> Result<String> {
        if table.column_count() == 0 {
            return Ok(String::new());
        }

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer
            .write_record(table.column_names())
            .map_err(|e| write_error(0, e))?;
        for (index, row) in table.rows().enumerate() {
            writer
                .write_record(row.iter().map(|value| value_to_field(value)))
                .map_err(|e| write_error(index + 2, e))?;
        }

        let bytes = writer.into_inner().map_err(|e| AlsError::CsvParseError {
            line: 0,
            column: 0,
            message: format!("Failed to flush writer: {}", e),
        })?;
        String::from_utf8(bytes).map_err(|e| AlsError::CsvParseError {
            line: 0,
            column: 0,
            message: format!("Failed to convert to UTF-8: {}", e),
        })
    }
}

fn csv_error(error: &csv::Error, context: &str) -> AlsError {
    let line = error
        .position()
        .map(|p| usize::try_from(p.line()).unwrap_or(usize::MAX))
        .unwrap_or(0);
    let column = match error.kind() {
        csv::ErrorKind::UnequalLengths { len, .. } => usize::try_from(*len).unwrap_or(usize::MAX),
        _ => 0,
    };
    AlsError::CsvParseError {
        line,
        column,
        message: format!("{}: {}", context, error),
    }
}

fn write_error(line: usize, error: csv::Error) -> AlsError {
    AlsError::CsvParseError {
        line,
        column: 0,
        message: format!("Failed to write record: {}", error),
    }
}

/// Type a column of raw fields.
///
/// A type is used only if every non-empty field is the canonical text of
/// its parsed value, so writing the column back reproduces each field.
/// Integers are tried before floats, and both before booleans.
fn infer_values(fields: Vec<String>) -> Vec<Value<'static>> {
    let parsers: [fn(&str) -> Option<Value<'static>>; 3] = [parse_integer, parse_float, parse_boolean];
    for parse in parsers {
        let typed: Option<Vec<Value<'static>>> = fields
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Some(Value::Null)
                } else {
                    parse(field).filter(|value| value_to_field(value) == *field)
                }
            })
            .collect();
        if let Some(values) = typed {
            return values;
        }
    }
    fields
        .into_iter()
        .map(|f| if f.is_empty() { Value::Null } else { Value::text_owned(f) })
        .collect()
}

fn parse_integer(s: &str) -> Option<Value<'static>> {
    s.parse().ok().map(Value::Integer)
}

fn parse_float(s: &str) -> Option<Value<'static>> {
    s.parse().ok().map(Value::Float)
}

fn parse_boolean(s: &str) -> Option<Value<'static>> {
    match s {
        "true" => Some(Value::Boolean(true)),
        "false" => Some(Value::Boolean(false)),
        _ => None,
    }
}

/// Convert a `Value` to its CSV field.
///
/// Floats keep a fractional part so they read back as floats.
fn value_to_field(value: &Value<'_>) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => format!("{:?}", f),
        Value::Text(s) => s.to_string(),
        Value::Boolean(b) => b.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ColumnType;

    fn read(input: &str) -> Table<'_> {
        CsvAdapter::new().read_table(input).unwrap()
    }

    #[test]
    fn test_read_csv_basic() {
        let table = read("id,name\n1,Alice\n2,Bob");
        assert_eq!(table.column_names(), vec!["id", "name"]);
        assert_eq!(table.row_count(), 2);

        let row0 = table.get_row(0).unwrap();
        assert_eq!(row0[0].as_integer(), Some(1));
        assert_eq!(row0[1].as_str(), Some("Alice"));
    }

    #[test]
    fn test_read_csv_empty() {
        let table = read("");
        assert_eq!(table.column_count(), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_read_csv_header_only() {
        let table = read("a,b\n");
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_column_type_inference() {
        let table = read("i,f,b,s,n\n1,1.5,true,x,\n2,2.0,false,1,\n");
        let types: Vec<ColumnType> = table.columns().iter().map(|c| c.declared_type).collect();
        assert_eq!(
            types,
            vec![
                ColumnType::Integer,
                ColumnType::Float,
                ColumnType::Boolean,
                ColumnType::Text,
                ColumnType::Text
            ]
        );
        let f = table.get_column_by_name("f").unwrap();
        assert_eq!(f.values[1], Value::Float(2.0));
        let s = table.get_column_by_name("s").unwrap();
        assert_eq!(s.values[1], Value::text("1"));
    }

    #[test]
    fn test_empty_fields_are_null() {
        let table = read("id,name\n1,\n,Bob\n");
        assert_eq!(table.get_row(0).unwrap()[1], &Value::Null);
        assert_eq!(table.get_row(1).unwrap()[0], &Value::Null);
        assert_eq!(table.get_column(0).unwrap().declared_type, ColumnType::Integer);
    }

    #[test]
    fn test_non_canonical_fields_stay_text() {
        let table = read("zip,pad,flag,sci,f\n02134,\" 42 \",TRUE,1e3,2\n00501,7,false,2,1.5\n");
        for column in table.columns() {
            assert_eq!(column.declared_type, ColumnType::Text, "column {}", column.name);
        }
        let zip = table.get_column_by_name("zip").unwrap();
        assert_eq!(zip.values[0], Value::text("02134"));
        let pad = table.get_column_by_name("pad").unwrap();
        assert_eq!(pad.values[0], Value::text(" 42 "));
    }

    #[test]
    fn test_canonical_special_floats() {
        let table = read("f\ninf\n-0.0\nNaN\n");
        let f = table.get_column(0).unwrap();
        assert_eq!(f.declared_type, ColumnType::Float);
        assert_eq!(f.values[0], Value::Float(f64::INFINITY));
        assert_eq!(f.values[1], Value::Float(-0.0));
    }

    #[test]
    fn test_column_count_mismatch() {
        let err = CsvAdapter::new().read_table("a,b\n1,2\n3\n").unwrap_err();
        match err {
            AlsError::CsvParseError { line, column, .. } => {
                assert_eq!(line, 3);
                assert_eq!(column, 1);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_header_is_shape_mismatch() {
        let err = CsvAdapter::new().read_table("a,a\n1,2\n").unwrap_err();
        assert!(matches!(err, AlsError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_write_csv() {
        let table = Table::new(vec![
            Column::new("id", vec![Value::Integer(1), Value::Null]),
            Column::new("score", vec![Value::Float(1.0), Value::Float(-0.5)]),
            Column::new("note", vec![Value::text("a,b"), Value::text("plain")]),
        ])
        .unwrap();
        let csv = CsvAdapter::new().write_table(&table).unwrap();
        assert_eq!(csv, "id,score,note\n1,1.0,\"a,b\"\n,-0.5,plain\n");
    }

    #[test]
    fn test_write_empty() {
        assert_eq!(CsvAdapter::new().write_table(&Table::empty()).unwrap(), "");
    }

    #[test]
    fn test_csv_round_trip() {
        let input = "id,score,active,name\n1,1.5,true,Alice\n2,,false,\"Smith, Bob\"\n";
        let adapter = CsvAdapter::new();
        let table = adapter.read_table(input).unwrap();
        assert_eq!(adapter.write_table(&table).unwrap(), input);
    }

    #[test]
    fn test_semicolon_delimiter() {
        let adapter = CsvAdapter::new().with_delimiter(b';');
        let table = adapter.read_table("a;b\n1;x\n").unwrap();
        assert_eq!(table.column_names(), vec!["a", "b"]);
        assert_eq!(adapter.write_table(&table).unwrap(), "a;b\n1;x\n");
    }
}

//! Canonical table model with zero-copy support.
//!
//! A [`Table`] is an ordered set of named, typed [`Column`]s that all hold
//! the same number of [`Value`]s. Construction enforces the table
//! invariants: equal column lengths, unique column names and values that
//! conform to each column's declared type.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{AlsError, Result};

/// Columnar table representation.
///
/// The lifetime parameter `'a` allows text values and column names to
/// borrow from the source buffer.
///
/// # Examples
///
/// ```
/// use als_engine::convert::{Column, Table, Value};
///
/// let table = Table::new(vec![
///     Column::new("id", vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]),
///     Column::new("name", vec![
///         Value::text("Alice"),
///         Value::text("Bob"),
///         Value::text("Charlie"),
///     ]),
/// ])
/// .unwrap();
///
/// assert_eq!(table.row_count(), 3);
/// assert_eq!(table.column_count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table<'a> {
    columns: Vec<Column<'a>>,
    row_count: usize,
}

impl<'a> Table<'a> {
    /// Build a table from columns, taking the row count from the first one.
    ///
    /// A table without columns has zero rows; use [`Table::from_parts`] to
    /// carry a row count without columns.
    pub fn new(columns: Vec<Column<'a>>) -> Result<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        Self::from_parts(columns, row_count)
    }

    /// Build a table with an explicit row count.
    pub fn from_parts(columns: Vec<Column<'a>>, row_count: usize) -> Result<Self> {
        let table = Self { columns, row_count };
        table.validate()?;
        Ok(table)
    }

    /// An empty table with no columns and no rows.
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            row_count: 0,
        }
    }

    /// Append a column, checking it against the existing shape.
    ///
    /// The first column pushed onto a column-less table sets the row count.
    pub fn push_column(&mut self, column: Column<'a>) -> Result<()> {
        if self.columns.is_empty() {
            self.row_count = column.len();
        }
        check_column(&column, self.row_count)?;
        if self.columns.iter().any(|c| c.name == column.name) {
            return Err(AlsError::shape(format!(
                "duplicate column name '{}'",
                column.name
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Re-check every table invariant.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.columns.len());
        for column in &self.columns {
            check_column(column, self.row_count)?;
            if !seen.insert(column.name.as_ref()) {
                return Err(AlsError::shape(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }
        Ok(())
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// All columns in order.
    pub fn columns(&self) -> &[Column<'a>] {
        &self.columns
    }

    /// Take the columns out of the table.
    pub fn into_columns(self) -> Vec<Column<'a>> {
        self.columns
    }

    /// Get a column by index.
    pub fn get_column(&self, index: usize) -> Option<&Column<'a>> {
        self.columns.get(index)
    }

    /// Get a column by name.
    pub fn get_column_by_name(&self, name: &str) -> Option<&Column<'a>> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get the column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_ref()).collect()
    }

    /// Get a row as a vector of values.
    ///
    /// Returns `None` if the row index is out of bounds.
    pub fn get_row(&self, index: usize) -> Option<Vec<&Value<'a>>> {
        if index >= self.row_count {
            return None;
        }
        Some(self.columns.iter().map(|col| &col.values[index]).collect())
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&Value<'a>>> {
        (0..self.row_count).map(move |i| self.columns.iter().map(|col| &col.values[i]).collect())
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Convert to an owned table (removes lifetime dependency).
    pub fn into_owned(self) -> Table<'static> {
        Table {
            columns: self.columns.into_iter().map(Column::into_owned).collect(),
            row_count: self.row_count,
        }
    }
}

impl Default for Table<'_> {
    fn default() -> Self {
        Self::empty()
    }
}

fn check_column(column: &Column<'_>, row_count: usize) -> Result<()> {
    if column.len() != row_count {
        return Err(AlsError::shape(format!(
            "column '{}' has {} values, expected {}",
            column.name,
            column.len(),
            row_count
        )));
    }
    if let Some((row, value)) = column
        .values
        .iter()
        .enumerate()
        .find(|(_, v)| !column.declared_type.can_represent(v))
    {
        return Err(AlsError::shape(format!(
            "column '{}' is declared {} but row {} holds {}",
            column.name,
            column.declared_type,
            row,
            value.type_name()
        )));
    }
    Ok(())
}

/// A single named column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column<'a> {
    /// Column name.
    pub name: Cow<'a, str>,
    /// Declared column type.
    pub declared_type: ColumnType,
    /// Column values.
    pub values: Vec<Value<'a>>,
}

impl<'a> Column<'a> {
    /// Create a new column, inferring its declared type from the values.
    pub fn new<S: Into<Cow<'a, str>>>(name: S, values: Vec<Value<'a>>) -> Self {
        let declared_type = ColumnType::infer(&values);
        Self {
            name: name.into(),
            declared_type,
            values,
        }
    }

    /// Create a column with an explicit type.
    ///
    /// Fails with `ShapeMismatch` if a value does not conform to the type.
    pub fn with_type<S: Into<Cow<'a, str>>>(
        name: S,
        values: Vec<Value<'a>>,
        declared_type: ColumnType,
    ) -> Result<Self> {
        let column = Self {
            name: name.into(),
            declared_type,
            values,
        };
        check_column(&column, column.len())?;
        Ok(column)
    }

    /// Get the number of values in the column.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the column is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value by index.
    pub fn get(&self, index: usize) -> Option<&Value<'a>> {
        self.values.get(index)
    }

    /// Convert to owned column (removes lifetime dependency).
    pub fn into_owned(self) -> Column<'static> {
        Column {
            name: Cow::Owned(self.name.into_owned()),
            declared_type: self.declared_type,
            values: self.values.into_iter().map(Value::into_owned).collect(),
        }
    }
}

/// A single cell value.
///
/// Floats compare by bit pattern, so `Value` is `Eq`, `Ord` and `Hash`
/// and two values are equal only if they decode to identical bits.
#[derive(Debug, Clone, Default)]
pub enum Value<'a> {
    /// Null/missing value.
    #[default]
    Null,
    /// Integer value (i64).
    Integer(i64),
    /// Floating point value (f64).
    Float(f64),
    /// Text value with zero-copy support.
    Text(Cow<'a, str>),
    /// Boolean value.
    Boolean(bool),
}

impl<'a> Value<'a> {
    /// Create a text value from a borrowed string.
    pub fn text(s: &'a str) -> Self {
        Value::Text(Cow::Borrowed(s))
    }

    /// Create a text value from an owned string.
    pub fn text_owned(s: String) -> Self {
        Value::Text(Cow::Owned(s))
    }

    /// Check if the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the value as an integer, if it is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a float, if it is one.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get the value as a string reference, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// Get the value as a boolean, if it is one.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The column type matching this value's tag, `None` for null.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Integer(_) => Some(ColumnType::Integer),
            Value::Float(_) => Some(ColumnType::Float),
            Value::Text(_) => Some(ColumnType::Text),
            Value::Boolean(_) => Some(ColumnType::Boolean),
        }
    }

    /// Human-readable tag name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Integer(_) => 2,
            Value::Float(_) => 3,
            Value::Text(_) => 4,
        }
    }

    /// Convert to owned value (removes lifetime dependency).
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Null => Value::Null,
            Value::Integer(i) => Value::Integer(i),
            Value::Float(f) => Value::Float(f),
            Value::Text(s) => Value::Text(Cow::Owned(s.into_owned())),
            Value::Boolean(b) => Value::Boolean(b),
        }
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value<'_> {}

impl Hash for Value<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Null => {}
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
            Value::Boolean(b) => b.hash(state),
        }
    }
}

impl Ord for Value<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<i64> for Value<'_> {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value<'_> {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<String> for Value<'_> {
    fn from(s: String) -> Self {
        Value::Text(Cow::Owned(s))
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Value::Text(Cow::Borrowed(s))
    }
}

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColumnType {
    /// Integer values (i64).
    Integer,
    /// Floating point values (f64).
    Float,
    /// Text values.
    #[default]
    Text,
    /// Boolean values.
    Boolean,
    /// More than one non-null tag.
    Mixed,
}

impl ColumnType {
    /// Infer the declared type from a value sequence.
    ///
    /// All-null and empty columns are declared `Text`.
    pub fn infer(values: &[Value<'_>]) -> ColumnType {
        let mut found: Option<ColumnType> = None;
        for value in values {
            match (found, value.column_type()) {
                (_, None) => {}
                (None, Some(t)) => found = Some(t),
                (Some(current), Some(t)) if current != t => return ColumnType::Mixed,
                _ => {}
            }
        }
        found.unwrap_or(ColumnType::Text)
    }

    /// Check if this type can represent the given value.
    ///
    /// Null fits every type. No numeric widening is applied: an integer
    /// does not fit a float column.
    pub fn can_represent(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ColumnType::Mixed, _) => true,
            (declared, v) => v.column_type() == Some(*declared),
        }
    }

    /// Whether arithmetic-sequence detection applies.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
            ColumnType::Mixed => "mixed",
        };
        f.write_str(name)
    }
}

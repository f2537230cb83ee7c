//! Data conversion types and utilities.
//!
//! This module contains the format-agnostic table model and the adapters
//! that move tables in and out of CSV and JSON.

pub mod csv;
pub mod json;
mod tabular;

pub use self::csv::CsvAdapter;
pub use self::json::JsonAdapter;
pub use tabular::{Column, ColumnType, Table, Value};

use crate::error::Result;

/// Reads a table from text.
///
/// The returned table may borrow from `input`.
pub trait TableSource {
    /// Parse `input` into a table.
    fn read_table<'a>(&self, input: &'a str) -> Result<Table<'a>>;
}

/// Writes a table as text.
pub trait TableSink {
    /// Render `table` in this sink's format.
    fn write_table(&self, table: &Table<'_>) -> Result<String>;
}

//! Main ALS compressor implementation.
//!
//! This module provides the `AlsCompressor` struct which validates a table,
//! chooses one encoding per column on the chunk scheduler and serializes
//! the result to ALS text.

use std::sync::Arc;

use log::debug;

use crate::als::{AlsDocument, AlsSerializer};
use crate::config::CompressorConfig;
use crate::convert::{CsvAdapter, JsonAdapter, Table, TableSource};
use crate::error::Result;
use crate::scheduler::ChunkScheduler;

use super::encoder::{ColumnSelection, ContextEncoder};
use super::stats::{ColumnStats, CompressionReport};

/// Main entry point for ALS compression.
///
/// The compressor mines every column for dictionary, arithmetic-sequence
/// and run-length patterns and keeps the cheapest one that clears the
/// context-fallback threshold. Columns without a worthwhile pattern are
/// stored raw.
///
/// # Thread Safety
///
/// `AlsCompressor` is `Send + Sync` and cheap to clone; clones share the
/// worker pool. Each call is independent and does not modify shared
/// state.
///
/// ```
/// use als_engine::AlsCompressor;
/// use std::sync::Arc;
/// use std::thread;
///
/// let compressor = Arc::new(AlsCompressor::new());
///
/// let handles: Vec<_> = (0..4).map(|i| {
///     let compressor = Arc::clone(&compressor);
///     thread::spawn(move || {
///         let csv = format!("id,value\n{},{}", i, i * 10);
///         compressor.compress_csv(&csv)
///     })
/// }).collect();
///
/// for handle in handles {
///     handle.join().unwrap().unwrap();
/// }
/// ```
///
/// # Parallel Processing
///
/// Columns are dealt round-robin into `parallelism` chunks that run on a
/// pool created once per compressor. The output is byte-identical for
/// every parallelism level.
#[derive(Debug, Clone)]
pub struct AlsCompressor {
    /// Compression configuration.
    config: CompressorConfig,
    /// Per-column strategy selection.
    encoder: Arc<ContextEncoder>,
    scheduler: ChunkScheduler,
}

impl AlsCompressor {
    /// Create a new compressor with default configuration.
    pub fn new() -> Self {
        Self::build(CompressorConfig::default())
    }

    /// Create a new compressor with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a setting is out of range.
    pub fn with_config(config: CompressorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: CompressorConfig) -> Self {
        Self {
            encoder: Arc::new(ContextEncoder::new(&config)),
            scheduler: ChunkScheduler::new(config.effective_parallelism()),
            config,
        }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &CompressorConfig {
        &self.config
    }

    /// Compress a table to ALS text.
    ///
    /// # Examples
    ///
    /// ```
    /// use als_engine::AlsCompressor;
    /// use als_engine::convert::{Column, Table, Value};
    ///
    /// let table = Table::new(vec![
    ///     Column::new("id", (1..=5).map(Value::Integer).collect()),
    /// ]).unwrap();
    ///
    /// let als = AlsCompressor::new().compress(&table).unwrap();
    /// assert_eq!(als, "!v1 5 1\n#id int seq 1+1*5\n");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the table is ragged, has duplicate column
    /// names, or holds a value its column type cannot represent.
    pub fn compress(&self, table: &Table<'_>) -> Result<String> {
        let doc = self.encode(table)?;
        Ok(AlsSerializer::new().serialize(&doc))
    }

    /// Choose an encoding for every column without serializing.
    pub fn encode<'a>(&self, table: &Table<'a>) -> Result<AlsDocument<'a>> {
        let selections = self.select(table)?;
        Ok(AlsDocument::new(
            table.row_count(),
            selections.into_iter().map(|s| s.column).collect(),
        ))
    }

    /// Compress a table and report the choice made for every column.
    pub fn compress_with_report(&self, table: &Table<'_>) -> Result<(String, CompressionReport)> {
        let selections = self.select(table)?;

        let mut stats = Vec::with_capacity(selections.len());
        let mut columns = Vec::with_capacity(selections.len());
        for (index, selection) in selections.into_iter().enumerate() {
            stats.push(ColumnStats {
                name: selection.column.name.to_string(),
                index,
                strategy: selection.column.strategy(),
                estimated_cost: selection.cost,
                raw_cost: selection.raw_cost,
                candidates: selection.candidates,
                output_bytes: 0,
            });
            columns.push(selection.column);
        }

        let doc = AlsDocument::new(table.row_count(), columns);
        let (output, sizes) = AlsSerializer::new().serialize_with_sizes(&doc);
        for (column, size) in stats.iter_mut().zip(sizes) {
            column.output_bytes = size;
        }

        let report = CompressionReport::new(
            table.row_count(),
            self.scheduler.parallelism(),
            output.len(),
            stats,
        );
        Ok((output, report))
    }

    /// Compress CSV text to ALS format.
    ///
    /// # Examples
    ///
    /// ```
    /// use als_engine::AlsCompressor;
    ///
    /// let compressor = AlsCompressor::new();
    /// let csv = "id,name\n1,Alice\n2,Bob\n3,Charlie";
    /// let als = compressor.compress_csv(csv).unwrap();
    /// assert!(als.starts_with("!v1 3 2\n"));
    /// ```
    pub fn compress_csv(&self, input: &str) -> Result<String> {
        self.compress_from(&CsvAdapter::new(), input)
    }

    /// Compress a JSON array of objects to ALS format.
    pub fn compress_json(&self, input: &str) -> Result<String> {
        self.compress_from(&JsonAdapter::new(), input)
    }

    /// Read a table with `source` and compress it.
    pub fn compress_from<S: TableSource>(&self, source: &S, input: &str) -> Result<String> {
        let table = source.read_table(input)?;
        self.compress(&table)
    }

    /// Compress a table without blocking the async executor.
    ///
    /// # Note
    ///
    /// This method requires the `async` feature to be enabled.
    #[cfg(feature = "async")]
    pub async fn compress_async(&self, table: Table<'static>) -> Result<String> {
        let compressor = self.clone();
        tokio::task::spawn_blocking(move || compressor.compress(&table))
            .await
            .map_err(|e| {
                crate::error::AlsError::IoError(std::io::Error::other(format!(
                    "Task join error: {}",
                    e
                )))
            })?
    }

    fn select<'a>(&self, table: &Table<'a>) -> Result<Vec<ColumnSelection<'a>>> {
        table.validate()?;
        debug!(
            "compressing {} column(s) x {} row(s)",
            table.column_count(),
            table.row_count()
        );
        let encoder = &self.encoder;
        self.scheduler
            .run(table.columns().iter().collect(), |column| Ok(encoder.encode(column)))
    }
}

impl Default for AlsCompressor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::als::{AlsParser, Strategy};
    use crate::config::ParserConfig;
    use crate::convert::{Column, ColumnType, Value};
    use crate::error::AlsError;

    fn compressor(parallelism: usize) -> AlsCompressor {
        AlsCompressor::with_config(CompressorConfig::new().with_parallelism(parallelism)).unwrap()
    }

    fn roundtrip(table: &Table<'_>) -> Table<'static> {
        let als = compressor(2).compress(table).unwrap();
        AlsParser::with_config(ParserConfig::new().with_parallelism(2))
            .unwrap()
            .decode(&als)
            .unwrap()
            .into_owned()
    }

    #[test]
    fn test_scenario_a() {
        let table = Table::new(vec![
            Column::new("id", (1..=5).map(Value::Integer).collect()),
            Column::new("status", vec![Value::text("active"); 5]),
        ])
        .unwrap();

        let doc = compressor(2).encode(&table).unwrap();
        assert_eq!(doc.columns[0].strategy(), Strategy::Arithmetic);
        assert!(matches!(
            doc.columns[1].strategy(),
            Strategy::Dictionary | Strategy::RunLength
        ));
        assert_eq!(roundtrip(&table), table);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CompressorConfig::new().with_ctx_fallback_threshold(0.0);
        assert!(matches!(
            AlsCompressor::with_config(config),
            Err(AlsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_ragged_table_is_shape_mismatch() {
        let mut table = Table::new(vec![Column::new("a", vec![Value::Integer(1)])]).unwrap();
        assert!(table
            .push_column(Column::new("b", vec![Value::Integer(1), Value::Integer(2)]))
            .is_err());

        // A table assembled from unchecked columns is caught at compress.
        let bad = Table::from_parts(
            vec![Column {
                name: "c".into(),
                declared_type: ColumnType::Integer,
                values: vec![Value::text("x")],
            }],
            1,
        );
        assert!(matches!(bad, Err(AlsError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_output_identical_across_parallelism() {
        let table = Table::new(vec![
            Column::new("a", (0..50).map(Value::Integer).collect()),
            Column::new("b", (0..50).map(|i| Value::Integer(i % 3)).collect()),
            Column::new("c", (0..50).map(|i| Value::text_owned(format!("r{}", i / 10))).collect()),
            Column::new("d", (0..50).map(|i| Value::Float(i as f64 * 0.5)).collect()),
            Column::new("e", (0..50).map(|i| Value::Boolean(i % 7 == 0)).collect()),
        ])
        .unwrap();

        let expected = compressor(1).compress(&table).unwrap();
        for parallelism in [2, 3, 4, 8] {
            assert_eq!(compressor(parallelism).compress(&table).unwrap(), expected);
        }
    }

    #[test]
    fn test_compress_with_report() {
        let table = Table::new(vec![
            Column::new("id", (1..=100).map(Value::Integer).collect()),
            Column::new("name", (0..100).map(|i| Value::text_owned(format!("user-{}", i))).collect()),
        ])
        .unwrap();

        let (als, report) = compressor(2).compress_with_report(&table).unwrap();
        assert_eq!(als, compressor(1).compress(&table).unwrap());
        assert_eq!(report.row_count, 100);
        assert_eq!(report.parallelism, 2);
        assert_eq!(report.output_bytes, als.len());
        assert_eq!(report.columns[0].strategy, Strategy::Arithmetic);
        assert_eq!(report.columns[1].strategy, Strategy::Raw);
        assert!(report.columns[0].output_bytes < report.columns[1].output_bytes);
        assert_eq!(report.most_effective_column().map(|c| c.name.as_str()), Some("id"));
    }

    #[test]
    fn test_compress_csv_and_json() {
        let als = compressor(1).compress_csv("id,name\n1,Alice\n2,Bob\n3,Carol\n").unwrap();
        assert!(als.starts_with("!v1 3 2\n#id int seq 1+1*3\n"));

        let als = compressor(1)
            .compress_json(r#"[{"a": 1, "b": "x"}, {"a": 2, "b": "x"}]"#)
            .unwrap();
        assert!(als.starts_with("!v1 2 2\n"));
    }

    #[test]
    fn test_empty_table() {
        let table = Table::empty();
        assert_eq!(compressor(3).compress(&table).unwrap(), "!v1 0 0\n");
    }

    #[test]
    fn test_compressor_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<AlsCompressor>();
    }
}

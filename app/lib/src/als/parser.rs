//! ALS format parser.
//!
//! Decoding runs in two passes. The structural pass is sequential: it reads
//! the header and splits every column record into name, declared type,
//! encoding tag and payload words, rejecting unknown tags up front. The
//! payload pass decodes and expands each record on the chunk scheduler.
//! Decoded values borrow from the input wherever no unescaping is needed.

use std::collections::HashSet;

use log::debug;

use super::document::{AlsDocument, EncodedColumn, Encoding, Progression, RunSegment, SequenceSegment, Strategy};
use super::escape::{rfind_unescaped, split_unescaped, unescape_text};
use super::literal::{parse_count, parse_float, parse_integer, parse_literal, parse_type_name};
use super::tokenizer::{Line, Tokenizer};
use crate::config::ParserConfig;
use crate::convert::{ColumnType, CsvAdapter, JsonAdapter, Table, TableSink};
use crate::error::{AlsError, Result};
use crate::pattern::index_width;
use crate::scheduler::ChunkScheduler;

/// A column record after the structural pass.
#[derive(Debug, Clone, PartialEq)]
struct ColumnRecord<'t> {
    line: usize,
    name: std::borrow::Cow<'t, str>,
    declared_type: ColumnType,
    strategy: Strategy,
    payload: Vec<&'t str>,
}

/// ALS format parser.
///
/// Parses ALS text back into an [`AlsDocument`] or straight into a
/// [`Table`]. Cloning is cheap and shares the worker pool.
///
/// # Parallel Processing
///
/// Column records are dealt round-robin into `parallelism` chunks and
/// decoded on a pool created once per parser. The result never depends on
/// the parallelism level.
#[derive(Debug, Clone)]
pub struct AlsParser {
    config: ParserConfig,
    scheduler: ChunkScheduler,
}

impl AlsParser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        let config = ParserConfig::default();
        let scheduler = ChunkScheduler::new(config.effective_parallelism());
        Self { config, scheduler }
    }

    /// Create a new parser with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a limit is out of range.
    pub fn with_config(config: ParserConfig) -> Result<Self> {
        config.validate()?;
        let scheduler = ChunkScheduler::new(config.effective_parallelism());
        Ok(Self { config, scheduler })
    }

    /// Get the parser configuration.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse ALS text into its encoded form without expanding the columns.
    ///
    /// Payloads are fully decoded and their value counts checked against
    /// the header.
    pub fn parse<'t>(&self, input: &'t str) -> Result<AlsDocument<'t>> {
        let (row_count, records) = self.read_structure(input)?;
        let columns = self
            .scheduler
            .run(records, |record| self.decode_record(record, row_count))?;
        Ok(AlsDocument::new(row_count, columns))
    }

    /// Decode ALS text into a table.
    ///
    /// # Example
    ///
    /// ```
    /// use als_engine::AlsParser;
    ///
    /// let table = AlsParser::new().decode("!v1 3 1\n#id int seq 1+1*3\n").unwrap();
    /// assert_eq!(table.row_count(), 3);
    /// assert_eq!(table.column_names(), vec!["id"]);
    /// ```
    ///
    /// # Errors
    ///
    /// - `CorruptStream` for a missing or malformed header, a record count
    ///   that differs from the header, or duplicate column names
    /// - `UnknownEncoding` for a tag outside `raw`, `dict`, `seq`, `rle`, `cyc`
    /// - `WorkerFailure` wrapping the `CorruptStream` of the first failing
    ///   chunk when a payload cannot be decoded
    pub fn decode<'t>(&self, input: &'t str) -> Result<Table<'t>> {
        let (row_count, records) = self.read_structure(input)?;
        let columns = self.scheduler.run(records, |record| {
            let line = record.line;
            self.decode_record(record, row_count)?
                .into_column(row_count)
                .map_err(|e| at_line(e, line))
        })?;
        debug!(
            "decoded {} column(s) of {} row(s)",
            columns.len(),
            row_count
        );
        Table::from_parts(columns, row_count).map_err(|e| match e {
            AlsError::ShapeMismatch { message } => AlsError::corrupt(0, message),
            other => other,
        })
    }

    /// Decode ALS text and hand the table to `sink`.
    pub fn decode_into<S: TableSink>(&self, sink: &S, input: &str) -> Result<String> {
        let table = self.decode(input)?;
        sink.write_table(&table)
    }

    /// Decode ALS text and render it as CSV.
    ///
    /// ```
    /// use als_engine::AlsParser;
    ///
    /// let csv = AlsParser::new().to_csv("!v1 2 1\n#name text raw Alice Bob\n").unwrap();
    /// assert_eq!(csv, "name\nAlice\nBob\n");
    /// ```
    pub fn to_csv(&self, input: &str) -> Result<String> {
        self.decode_into(&CsvAdapter::new(), input)
    }

    /// Decode ALS text and render it as a JSON array of objects.
    pub fn to_json(&self, input: &str) -> Result<String> {
        self.decode_into(&JsonAdapter::new(), input)
    }

    /// Decode ALS text without blocking the async executor.
    ///
    /// # Note
    ///
    /// This method requires the `async` feature to be enabled.
    #[cfg(feature = "async")]
    pub async fn decode_async(&self, input: String) -> Result<Table<'static>> {
        let parser = self.clone();
        tokio::task::spawn_blocking(move || parser.decode(&input).map(Table::into_owned))
            .await
            .map_err(|e| AlsError::IoError(std::io::Error::other(format!("Task join error: {}", e))))?
    }

    /// Read the header and split the column records.
    fn read_structure<'t>(&self, input: &'t str) -> Result<(usize, Vec<ColumnRecord<'t>>)> {
        if input.len() > self.config.max_input_size {
            return Err(AlsError::corrupt(
                1,
                format!(
                    "input of {} bytes exceeds the limit of {} bytes",
                    input.len(),
                    self.config.max_input_size
                ),
            ));
        }

        let mut lines = Tokenizer::new(input);
        let header = lines
            .next()
            .ok_or_else(|| AlsError::corrupt(1, "missing header"))?;
        let (row_count, column_count) = self.parse_header(&header)?;

        let mut records = Vec::with_capacity(column_count.min(4096));
        let mut names = HashSet::new();
        let mut last_line = header.number;
        for line in lines {
            last_line = line.number;
            if records.len() == column_count {
                return Err(AlsError::corrupt(
                    line.number,
                    format!("more column records than the {} declared", column_count),
                ));
            }
            let record = parse_record(line)?;
            if !names.insert(record.name.clone()) {
                return Err(AlsError::corrupt(
                    record.line,
                    format!("duplicate column name '{}'", record.name),
                ));
            }
            records.push(record);
        }

        if records.len() != column_count {
            return Err(AlsError::corrupt(
                last_line,
                format!(
                    "header declares {} column(s), stream has {}",
                    column_count,
                    records.len()
                ),
            ));
        }
        Ok((row_count, records))
    }

    fn parse_header(&self, header: &Line<'_>) -> Result<(usize, usize)> {
        let line = header.number;
        let [version, rows, columns] = header.words[..] else {
            return Err(AlsError::corrupt(
                line,
                "header must be '!v<version> <rows> <columns>'",
            ));
        };

        let version = version
            .strip_prefix("!v")
            .and_then(|v| v.parse::<u8>().ok())
            .ok_or_else(|| AlsError::corrupt(line, format!("invalid version marker '{}'", version)))?;
        if version != AlsDocument::CURRENT_VERSION {
            return Err(AlsError::corrupt(
                line,
                format!(
                    "unsupported format version {} (expected {})",
                    version,
                    AlsDocument::CURRENT_VERSION
                ),
            ));
        }

        let row_count = parse_count(rows, line)?;
        if row_count > self.config.max_row_count {
            return Err(AlsError::corrupt(
                line,
                format!(
                    "row count {} exceeds the limit of {}",
                    row_count, self.config.max_row_count
                ),
            ));
        }
        let column_count = parse_count(columns, line)?;
        Ok((row_count, column_count))
    }

    /// Decode the payload words of one record.
    fn decode_record<'t>(&self, record: ColumnRecord<'t>, row_count: usize) -> Result<EncodedColumn<'t>> {
        let ColumnRecord {
            line,
            name,
            declared_type,
            strategy,
            payload,
        } = record;

        let encoding = match strategy {
            Strategy::Raw => Encoding::Raw(
                payload
                    .iter()
                    .map(|word| parse_literal(word, declared_type, line))
                    .collect::<Result<_>>()?,
            ),
            Strategy::Dictionary => self.decode_dictionary(&payload, declared_type, row_count, line)?,
            Strategy::Arithmetic => decode_sequence(&payload, declared_type, line)?,
            Strategy::RunLength => decode_runs(&payload, declared_type, line)?,
            Strategy::Cycle => decode_cycle(&payload, declared_type, line)?,
        };

        let count = encoding
            .value_count()
            .ok_or_else(|| AlsError::corrupt(line, "value count overflows"))?;
        if count != row_count {
            return Err(AlsError::corrupt(
                line,
                format!(
                    "column '{}' holds {} values, header declares {} rows",
                    name, count, row_count
                ),
            ));
        }

        Ok(EncodedColumn {
            name,
            declared_type,
            encoding,
        })
    }

    fn decode_dictionary<'t>(
        &self,
        payload: &[&'t str],
        declared_type: ColumnType,
        row_count: usize,
        line: usize,
    ) -> Result<Encoding<'t>> {
        let (packed, entry_words) = payload
            .split_last()
            .ok_or_else(|| AlsError::corrupt(line, "dictionary record has no index word"))?;
        let packed = packed
            .strip_prefix('_')
            .ok_or_else(|| AlsError::corrupt(line, "dictionary index word must start with '_'"))?;

        if entry_words.len() > self.config.max_dictionary_entries {
            return Err(AlsError::corrupt(
                line,
                format!(
                    "dictionary has {} entries, limit is {}",
                    entry_words.len(),
                    self.config.max_dictionary_entries
                ),
            ));
        }
        let entries = entry_words
            .iter()
            .map(|word| parse_literal(word, declared_type, line))
            .collect::<Result<Vec<_>>>()?;

        let width = index_width(entries.len());
        let expected = row_count
            .checked_mul(width)
            .ok_or_else(|| AlsError::corrupt(line, "packed index length overflows"))?;
        if packed.len() != expected || !packed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AlsError::corrupt(
                line,
                format!(
                    "expected {} packed index digits of width {}, found '{}'",
                    expected,
                    width,
                    truncate(packed)
                ),
            ));
        }

        let mut indices = Vec::with_capacity(row_count);
        for digits in packed.as_bytes().chunks(width) {
            let index = digits
                .iter()
                .fold(0usize, |acc, d| acc * 10 + usize::from(d - b'0'));
            if index >= entries.len() {
                return Err(AlsError::corrupt(
                    line,
                    format!(
                        "dictionary index {} out of range ({} entries)",
                        index,
                        entries.len()
                    ),
                ));
            }
            indices.push(index);
        }

        Ok(Encoding::Dictionary { entries, indices })
    }
}

impl Default for AlsParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Split one record line into its structural parts.
fn parse_record(line: Line<'_>) -> Result<ColumnRecord<'_>> {
    let number = line.number;
    let (&name_word, rest) = line
        .words
        .split_first()
        .ok_or_else(|| AlsError::corrupt(number, "empty record"))?;
    let name = name_word
        .strip_prefix('#')
        .ok_or_else(|| AlsError::corrupt(number, format!("expected a column record, found '{}'", name_word)))?;
    let name = unescape_text(name, number)?;

    let [type_word, tag, payload @ ..] = rest else {
        return Err(AlsError::corrupt(
            number,
            format!("record for column '{}' needs a type and an encoding tag", name),
        ));
    };
    let declared_type = parse_type_name(type_word)
        .ok_or_else(|| AlsError::corrupt(number, format!("unknown column type '{}'", type_word)))?;
    let strategy = Strategy::from_tag(tag).ok_or_else(|| AlsError::UnknownEncoding {
        column: name.to_string(),
        tag: tag.to_string(),
    })?;

    Ok(ColumnRecord {
        line: number,
        name,
        declared_type,
        strategy,
        payload: payload.to_vec(),
    })
}

fn decode_sequence<'t>(payload: &[&'t str], declared_type: ColumnType, line: usize) -> Result<Encoding<'t>> {
    if !declared_type.is_numeric() {
        return Err(AlsError::corrupt(
            line,
            format!("arithmetic sequence in a {} column", declared_type),
        ));
    }

    let mut segments = Vec::with_capacity(payload.len());
    for word in payload {
        let Some((start, rest)) = word.split_once('+') else {
            segments.push(SequenceSegment::Literal(parse_literal(word, declared_type, line)?));
            continue;
        };
        let (step, len) = rest
            .rsplit_once('*')
            .ok_or_else(|| AlsError::corrupt(line, format!("sequence run '{}' has no length", word)))?;
        let len = parse_run_length(len, line)?;

        let progression = match declared_type {
            ColumnType::Integer => Progression::Integer {
                start: parse_integer(start, line)?,
                step: parse_integer(step, line)?,
            },
            _ => Progression::Float {
                start: parse_float(start, line)?,
                step: parse_float(step, line)?,
            },
        };
        if !progression.check_len(len) {
            return Err(AlsError::corrupt(
                line,
                format!("sequence run '{}' overflows i64", word),
            ));
        }
        segments.push(SequenceSegment::Run { progression, len });
    }
    Ok(Encoding::Arithmetic(segments))
}

fn decode_runs<'t>(payload: &[&'t str], declared_type: ColumnType, line: usize) -> Result<Encoding<'t>> {
    payload
        .iter()
        .map(|word| match rfind_unescaped(word, '*') {
            Some(star) => Ok(RunSegment::Run {
                value: parse_literal(&word[..star], declared_type, line)?,
                len: parse_run_length(&word[star + 1..], line)?,
            }),
            None => Ok(RunSegment::Literal(parse_literal(word, declared_type, line)?)),
        })
        .collect::<Result<_>>()
        .map(Encoding::RunLength)
}

fn decode_cycle<'t>(payload: &[&'t str], declared_type: ColumnType, line: usize) -> Result<Encoding<'t>> {
    let &[word] = payload else {
        return Err(AlsError::corrupt(
            line,
            format!("cycle record needs one payload word, found {}", payload.len()),
        ));
    };
    let star = rfind_unescaped(word, '*')
        .ok_or_else(|| AlsError::corrupt(line, format!("cycle '{}' has no length", truncate(word))))?;
    let len = parse_run_length(&word[star + 1..], line)?;

    let pattern = split_unescaped(&word[..star], '~')
        .into_iter()
        .map(|element| {
            if element.is_empty() {
                Err(AlsError::corrupt(line, "cycle pattern has an empty element"))
            } else {
                parse_literal(element, declared_type, line)
            }
        })
        .collect::<Result<Vec<_>>>()?;
    if pattern.len() > len {
        return Err(AlsError::corrupt(
            line,
            format!("cycle pattern of {} values is longer than its length {}", pattern.len(), len),
        ));
    }
    Ok(Encoding::Cycle { pattern, len })
}

fn parse_run_length(word: &str, line: usize) -> Result<usize> {
    match parse_count(word, line)? {
        0 => Err(AlsError::corrupt(line, "run length must be positive")),
        len => Ok(len),
    }
}

/// Attach a record line to an error raised without one.
fn at_line(error: AlsError, line: usize) -> AlsError {
    match error {
        AlsError::CorruptStream { line: 0, message } => AlsError::CorruptStream { line, message },
        other => other,
    }
}

fn truncate(s: &str) -> String {
    const SHOWN: usize = 32;
    match s.char_indices().nth(SHOWN) {
        Some((end, _)) => format!("{}...", &s[..end]),
        None => s.to_string(),
    }
}

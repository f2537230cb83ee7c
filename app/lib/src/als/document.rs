//! Encoded ALS document structure.
//!
//! An [`AlsDocument`] is the in-memory form of one ALS stream: a row count
//! and one [`EncodedColumn`] per table column, in table order. Each encoded
//! column carries enough metadata to regenerate its exact value sequence.

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

use crate::convert::{Column, ColumnType, Table, Value};
use crate::error::{AlsError, Result};

/// Encoding strategy of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Distinct values once plus packed indices.
    Dictionary,
    /// Arithmetic progressions with literals in between.
    Arithmetic,
    /// Runs of equal values with literals in between.
    RunLength,
    /// One short pattern repeated over the whole column.
    Cycle,
    /// The literal value sequence.
    Raw,
}

impl Strategy {
    /// All strategies in tie-break precedence order.
    pub const ALL: [Strategy; 5] = [
        Strategy::Dictionary,
        Strategy::Arithmetic,
        Strategy::RunLength,
        Strategy::Cycle,
        Strategy::Raw,
    ];

    /// The wire tag of this strategy.
    pub fn tag(self) -> &'static str {
        match self {
            Strategy::Dictionary => "dict",
            Strategy::Arithmetic => "seq",
            Strategy::RunLength => "rle",
            Strategy::Cycle => "cyc",
            Strategy::Raw => "raw",
        }
    }

    /// Look up a strategy by its wire tag.
    pub fn from_tag(tag: &str) -> Option<Strategy> {
        Strategy::ALL.into_iter().find(|s| s.tag() == tag)
    }

    /// Tie-break rank: lower wins among equal costs.
    pub fn precedence(self) -> u8 {
        match self {
            Strategy::Dictionary => 0,
            Strategy::Arithmetic => 1,
            Strategy::RunLength => 2,
            Strategy::Cycle => 3,
            Strategy::Raw => 4,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// An arithmetic progression `start, start + step, start + 2*step, ...`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progression {
    /// Integer terms; every term must fit in `i64`.
    Integer {
        /// First term
        start: i64,
        /// Difference between consecutive terms, never zero
        step: i64,
    },
    /// Float terms computed as `start + k * step`.
    Float {
        /// First term
        start: f64,
        /// Difference between consecutive terms, never zero
        step: f64,
    },
}

impl Progression {
    /// The `k`-th term, `None` on integer overflow.
    pub fn value_at(&self, k: usize) -> Option<Value<'static>> {
        match *self {
            Progression::Integer { start, step } => {
                let k = i64::try_from(k).ok()?;
                step.checked_mul(k)
                    .and_then(|offset| start.checked_add(offset))
                    .map(Value::Integer)
            }
            Progression::Float { start, step } => Some(Value::Float(start + (k as f64) * step)),
        }
    }

    /// Check that every term of a run of `len` values is representable.
    pub fn check_len(&self, len: usize) -> bool {
        match self {
            Progression::Integer { .. } => len == 0 || self.value_at(len - 1).is_some(),
            Progression::Float { .. } => true,
        }
    }
}

/// One segment of an arithmetic-sequence encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceSegment<'a> {
    /// `len` consecutive terms of a progression.
    Run {
        /// The progression the run follows
        progression: Progression,
        /// Number of terms, at least one
        len: usize,
    },
    /// A single value outside any run.
    Literal(Value<'a>),
}

/// One segment of a run-length encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum RunSegment<'a> {
    /// `len` copies of one value.
    Run {
        /// The repeated value
        value: Value<'a>,
        /// Number of copies, at least one
        len: usize,
    },
    /// A single value outside any run.
    Literal(Value<'a>),
}

/// The encoded payload of a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Encoding<'a> {
    /// Every value, in order.
    Raw(Vec<Value<'a>>),
    /// Distinct values in first-seen order plus one index per row.
    Dictionary {
        /// Distinct values
        entries: Vec<Value<'a>>,
        /// Position of each row's value in `entries`
        indices: Vec<usize>,
    },
    /// Progression runs and literals.
    Arithmetic(Vec<SequenceSegment<'a>>),
    /// Value runs and literals.
    RunLength(Vec<RunSegment<'a>>),
    /// `pattern` repeated until `len` values are produced.
    Cycle {
        /// One period of the column
        pattern: Vec<Value<'a>>,
        /// Total number of values
        len: usize,
    },
}

impl<'a> Encoding<'a> {
    /// The strategy this payload belongs to.
    pub fn strategy(&self) -> Strategy {
        match self {
            Encoding::Raw(_) => Strategy::Raw,
            Encoding::Dictionary { .. } => Strategy::Dictionary,
            Encoding::Arithmetic(_) => Strategy::Arithmetic,
            Encoding::RunLength(_) => Strategy::RunLength,
            Encoding::Cycle { .. } => Strategy::Cycle,
        }
    }

    /// Number of values this payload expands to, `None` on overflow.
    pub fn value_count(&self) -> Option<usize> {
        match self {
            Encoding::Raw(values) => Some(values.len()),
            Encoding::Dictionary { indices, .. } => Some(indices.len()),
            Encoding::Arithmetic(segments) => segments.iter().try_fold(0usize, |acc, s| {
                acc.checked_add(match s {
                    SequenceSegment::Run { len, .. } => *len,
                    SequenceSegment::Literal(_) => 1,
                })
            }),
            Encoding::RunLength(segments) => segments.iter().try_fold(0usize, |acc, s| {
                acc.checked_add(match s {
                    RunSegment::Run { len, .. } => *len,
                    RunSegment::Literal(_) => 1,
                })
            }),
            Encoding::Cycle { len, .. } => Some(*len),
        }
    }
}

/// The compressed representation of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedColumn<'a> {
    pub name: Cow<'a, str>,
    pub declared_type: ColumnType,
    pub encoding: Encoding<'a>,
}

impl<'a> EncodedColumn<'a> {
    /// The strategy used by this column.
    pub fn strategy(&self) -> Strategy {
        self.encoding.strategy()
    }

    /// Regenerate the value sequence, checking it holds `row_count` values.
    ///
    /// Errors are reported as `CorruptStream` at line 0, meaning the
    /// problem is not tied to a source line.
    pub fn expand(&self, row_count: usize) -> Result<Vec<Value<'a>>> {
        let count = self
            .encoding
            .value_count()
            .ok_or_else(|| self.corrupt("value count overflows"))?;
        if count != row_count {
            return Err(self.corrupt(format!(
                "decoded {} values, header declares {} rows",
                count, row_count
            )));
        }

        let mut values = Vec::with_capacity(row_count);
        match &self.encoding {
            Encoding::Raw(literals) => values.extend(literals.iter().cloned()),
            Encoding::Dictionary { entries, indices } => {
                for &index in indices {
                    let entry = entries.get(index).ok_or_else(|| {
                        self.corrupt(format!(
                            "dictionary index {} out of range ({} entries)",
                            index,
                            entries.len()
                        ))
                    })?;
                    values.push(entry.clone());
                }
            }
            Encoding::Arithmetic(segments) => {
                for segment in segments {
                    match segment {
                        SequenceSegment::Run { progression, len } => {
                            for k in 0..*len {
                                let value = progression.value_at(k).ok_or_else(|| {
                                    self.corrupt("arithmetic sequence overflows i64")
                                })?;
                                values.push(value);
                            }
                        }
                        SequenceSegment::Literal(value) => values.push(value.clone()),
                    }
                }
            }
            Encoding::RunLength(segments) => {
                for segment in segments {
                    match segment {
                        RunSegment::Run { value, len } => {
                            values.extend(std::iter::repeat(value).take(*len).cloned())
                        }
                        RunSegment::Literal(value) => values.push(value.clone()),
                    }
                }
            }
            Encoding::Cycle { pattern, len } => {
                if pattern.is_empty() {
                    return Err(self.corrupt("cycle has an empty pattern"));
                }
                values.extend(pattern.iter().cycle().take(*len).cloned());
            }
        }

        if let Some(bad) = values.iter().find(|v| !self.declared_type.can_represent(v)) {
            return Err(self.corrupt(format!(
                "{} value in {} column",
                bad.type_name(),
                self.declared_type
            )));
        }
        Ok(values)
    }

    /// Expand into a table column.
    pub fn into_column(self, row_count: usize) -> Result<Column<'a>> {
        let values = self.expand(row_count)?;
        Ok(Column {
            name: self.name,
            declared_type: self.declared_type,
            values,
        })
    }

    fn corrupt(&self, message: impl fmt::Display) -> AlsError {
        AlsError::corrupt(0, format!("column '{}': {}", self.name, message))
    }
}

/// A complete encoded table.
#[derive(Debug, Clone, PartialEq)]
pub struct AlsDocument<'a> {
    /// ALS format version.
    pub version: u8,
    /// Number of rows every column expands to.
    pub row_count: usize,
    /// Encoded columns in table order.
    pub columns: Vec<EncodedColumn<'a>>,
}

impl<'a> AlsDocument<'a> {
    /// Current ALS format version.
    pub const CURRENT_VERSION: u8 = 1;

    /// Create a document for the current format version.
    pub fn new(row_count: usize, columns: Vec<EncodedColumn<'a>>) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            row_count,
            columns,
        }
    }

    /// Get the number of columns in the document.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Count the columns using each strategy.
    pub fn strategy_counts(&self) -> Vec<(Strategy, usize)> {
        Strategy::ALL
            .into_iter()
            .map(|s| (s, self.columns.iter().filter(|c| c.strategy() == s).count()))
            .collect()
    }

    /// Expand every column sequentially and rebuild the table.
    pub fn into_table(self) -> Result<Table<'a>> {
        let row_count = self.row_count;
        let columns = self
            .columns
            .into_iter()
            .map(|c| c.into_column(row_count))
            .collect::<Result<Vec<_>>>()?;
        Table::from_parts(columns, row_count).map_err(|e| match e {
            AlsError::ShapeMismatch { message } => AlsError::corrupt(0, message),
            other => other,
        })
    }
}

//! ALS format serializer.
//!
//! Writes an [`AlsDocument`] as ALS text:
//!
//! ```text
//! !v1 <rows> <columns>
//! #<name> <type> <tag> <payload words...>
//! ```
//!
//! One record line per column, in column order. Payload words by tag:
//!
//! - `raw`: one literal per value
//! - `dict`: the entry literals, then `_` followed by the packed indices
//! - `seq`: literals and `<start>+<step>*<len>` runs
//! - `rle`: literals and `<literal>*<len>` runs
//! - `cyc`: a single `<literal>~<literal>...*<len>` word

use super::document::{AlsDocument, EncodedColumn, Encoding, Progression, RunSegment, SequenceSegment};
use super::escape::escape_text;
use super::literal::{type_name, write_float, write_literal};
use crate::pattern::index_width;

/// ALS format serializer.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlsSerializer;

impl AlsSerializer {
    /// Create a new serializer.
    pub fn new() -> Self {
        Self
    }

    /// Serialize a document to ALS text.
    ///
    /// # Example
    ///
    /// ```
    /// use als_engine::als::{AlsDocument, AlsSerializer, EncodedColumn, Encoding, RunSegment};
    /// use als_engine::convert::{ColumnType, Value};
    ///
    /// let doc = AlsDocument::new(3, vec![EncodedColumn {
    ///     name: "status".into(),
    ///     declared_type: ColumnType::Text,
    ///     encoding: Encoding::RunLength(vec![RunSegment::Run { value: Value::text("on"), len: 3 }]),
    /// }]);
    ///
    /// assert_eq!(AlsSerializer::new().serialize(&doc), "!v1 3 1\n#status text rle on*3\n");
    /// ```
    pub fn serialize(&self, doc: &AlsDocument<'_>) -> String {
        self.serialize_with_sizes(doc).0
    }

    /// Serialize a document and report the byte size of each column record.
    pub fn serialize_with_sizes(&self, doc: &AlsDocument<'_>) -> (String, Vec<usize>) {
        let mut output = String::new();
        self.serialize_header(&mut output, doc);

        let mut sizes = Vec::with_capacity(doc.columns.len());
        for column in &doc.columns {
            let before = output.len();
            self.serialize_column(&mut output, column);
            sizes.push(output.len() - before);
        }
        (output, sizes)
    }

    /// Serialize the header line.
    fn serialize_header(&self, output: &mut String, doc: &AlsDocument<'_>) {
        output.push_str(&format!(
            "!v{} {} {}\n",
            doc.version,
            doc.row_count,
            doc.columns.len()
        ));
    }

    /// Serialize one column record line.
    pub fn serialize_column(&self, output: &mut String, column: &EncodedColumn<'_>) {
        output.push('#');
        output.push_str(&escape_text(&column.name));
        output.push(' ');
        output.push_str(type_name(column.declared_type));
        output.push(' ');
        output.push_str(column.strategy().tag());

        let declared = column.declared_type;
        match &column.encoding {
            Encoding::Raw(values) => {
                for value in values {
                    output.push(' ');
                    write_literal(output, value, declared);
                }
            }
            Encoding::Dictionary { entries, indices } => {
                for entry in entries {
                    output.push(' ');
                    write_literal(output, entry, declared);
                }
                output.push_str(" _");
                let width = index_width(entries.len());
                output.reserve(indices.len() * width);
                for index in indices {
                    output.push_str(&format!("{:0width$}", index, width = width));
                }
            }
            Encoding::Arithmetic(segments) => {
                for segment in segments {
                    output.push(' ');
                    match segment {
                        SequenceSegment::Run { progression, len } => {
                            self.serialize_progression(output, progression);
                            output.push_str(&format!("*{}", len));
                        }
                        SequenceSegment::Literal(value) => write_literal(output, value, declared),
                    }
                }
            }
            Encoding::RunLength(segments) => {
                for segment in segments {
                    output.push(' ');
                    match segment {
                        RunSegment::Run { value, len } => {
                            write_literal(output, value, declared);
                            output.push_str(&format!("*{}", len));
                        }
                        RunSegment::Literal(value) => write_literal(output, value, declared),
                    }
                }
            }
            Encoding::Cycle { pattern, len } => {
                output.push(' ');
                for (i, value) in pattern.iter().enumerate() {
                    if i > 0 {
                        output.push('~');
                    }
                    write_literal(output, value, declared);
                }
                output.push_str(&format!("*{}", len));
            }
        }
        output.push('\n');
    }

    fn serialize_progression(&self, output: &mut String, progression: &Progression) {
        match *progression {
            Progression::Integer { start, step } => {
                output.push_str(&format!("{}+{}", start, step));
            }
            Progression::Float { start, step } => {
                write_float(output, start);
                output.push('+');
                write_float(output, step);
            }
        }
    }
}

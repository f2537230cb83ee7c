//! ALS (Adaptive Logic Stream) format types and operations.
//!
//! This module contains the encoded document model, the literal and escape
//! rules of the text format, and the serializer/parser pair that moves
//! documents in and out of ALS text.

mod document;
pub mod escape;
mod literal;
mod parser;
mod serializer;
mod tokenizer;

pub use document::{
    AlsDocument, EncodedColumn, Encoding, Progression, RunSegment, SequenceSegment, Strategy,
};
pub use escape::{is_null_token, needs_escaping, EMPTY_TOKEN, NULL_TOKEN};
pub use parser::AlsParser;
pub use serializer::AlsSerializer;
pub use tokenizer::{split_words, Line, Tokenizer};

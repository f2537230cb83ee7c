//! Compression components for ALS format.
//!
//! This module contains the per-column context encoder, the compressor
//! that drives it across a table, and the statistics report.

mod compressor;
mod encoder;
mod stats;

pub use compressor::AlsCompressor;
pub use encoder::{ColumnSelection, ContextEncoder};
pub use stats::{ColumnStats, CompressionReport};

//! # ALS Engine
//!
//! Lossless columnar compression for tabular data using the ALS
//! (Adaptive Logic Stream) text format.
//!
//! Every column of a table is mined for patterns (a dictionary of
//! repeated values, arithmetic progressions, runs of equal values and
//! short repeating cycles) and the cheapest pattern that beats the raw value list by the configured
//! margin is written. Decoding reproduces the exact table: column order,
//! declared types, nulls and float bit patterns included.
//!
//! ## Features
//!
//! - **Pattern-based compression**: dictionary, arithmetic-sequence,
//!   run-length and cycle encodings chosen per column by an explicit cost model
//! - **Deterministic parallelism**: columns are split into a fixed number
//!   of chunks on a worker pool; output bytes never depend on it
//! - **Multiple formats**: CSV and JSON adapters on both sides
//! - **Zero-copy decoding**: decoded text borrows from the ALS input
//! - **Thread-safe**: all public types implement `Send + Sync`
//!
//! ## Quick Start
//!
//! ### Compression
//!
//! ```rust
//! use als_engine::AlsCompressor;
//!
//! let compressor = AlsCompressor::new();
//!
//! let csv = "id,status\n1,active\n2,active\n3,active\n4,active\n5,active";
//! let als = compressor.compress_csv(csv).unwrap();
//! assert!(als.contains("#id int seq 1+1*5"));
//! ```
//!
//! ### Decompression
//!
//! ```rust
//! use als_engine::AlsParser;
//!
//! let parser = AlsParser::new();
//!
//! let als = "!v1 3 2\n#id int seq 1+1*3\n#name text raw Alice Bob Charlie\n";
//! let csv = parser.to_csv(als).unwrap();
//! assert_eq!(csv, "id,name\n1,Alice\n2,Bob\n3,Charlie\n");
//! ```
//!
//! ### Configuration
//!
//! ```rust
//! use als_engine::{AlsCompressor, CompressorConfig};
//!
//! let config = CompressorConfig::default()
//!     .with_ctx_fallback_threshold(1.5)
//!     .with_min_pattern_length(4)
//!     .with_parallelism(4);
//!
//! let compressor = AlsCompressor::with_config(config).unwrap();
//! ```
//!
//! ### Error Handling
//!
//! ```rust
//! use als_engine::{AlsError, AlsParser, ErrorKind};
//!
//! let parser = AlsParser::new();
//!
//! match parser.decode("!v1 2\n#id int raw 1 2\n") {
//!     Ok(_) => unreachable!(),
//!     Err(AlsError::CorruptStream { line, message }) => {
//!         eprintln!("corrupt stream at line {}: {}", line, message);
//!     }
//!     Err(e) if e.root().kind() == ErrorKind::UnknownEncoding => {
//!         eprintln!("written by a newer encoder: {}", e);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Module declarations
pub mod als;
pub mod compress;
pub mod config;
pub mod convert;
pub mod error;
pub mod pattern;
pub mod scheduler;

// Re-exports for convenience
pub use als::{
    AlsDocument, AlsParser, AlsSerializer, EncodedColumn, Encoding, Progression, RunSegment,
    SequenceSegment, Strategy, EMPTY_TOKEN, NULL_TOKEN,
};
pub use compress::{AlsCompressor, ColumnSelection, ColumnStats, CompressionReport, ContextEncoder};
pub use config::{CompressorConfig, ParserConfig, MAX_DICTIONARY_ENTRIES};
pub use convert::{Column, ColumnType, CsvAdapter, JsonAdapter, Table, TableSink, TableSource, Value};
pub use error::{AlsError, ErrorKind, Result};
pub use pattern::{
    Candidate, CostModel, CycleDetector, DictionaryDetector, MiningResult, PatternDetector, PatternMiner,
    RangeDetector, RunDetector,
};
pub use scheduler::ChunkScheduler;

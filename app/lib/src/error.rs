//! Error types for the ALS compression engine.
//!
//! The engine reports four core failure kinds (shape, stream corruption,
//! unknown encoding, worker failure) plus the ambient errors raised by the
//! CSV/JSON adapters, configuration validation and I/O.

use thiserror::Error;

/// Main error type for the ALS compression engine.
///
/// All operations that can fail return `Result<T, AlsError>`.
#[derive(Debug, Error)]
pub enum AlsError {
    /// A table invariant was violated before compression.
    ///
    /// Raised for ragged columns, duplicate column names and values that do
    /// not conform to their column's declared type.
    #[error("Shape mismatch: {message}")]
    ShapeMismatch {
        /// Description of the violated invariant
        message: String,
    },

    /// Malformed or truncated ALS input.
    #[error("Corrupt stream at line {line}: {message}")]
    CorruptStream {
        /// Line of the ALS text where the problem was detected (1-indexed)
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// A column record declares an encoding tag this parser does not know.
    #[error("Unknown encoding '{tag}' for column '{column}'")]
    UnknownEncoding {
        /// Name of the column carrying the tag
        column: String,
        /// The unrecognized tag
        tag: String,
    },

    /// A chunk job failed during parallel execution.
    ///
    /// Only the failure of the lowest-indexed chunk is reported.
    #[error("Worker failure in chunk {chunk}: {source}")]
    WorkerFailure {
        /// Index of the failing chunk
        chunk: usize,
        /// The error raised inside the chunk
        source: Box<AlsError>,
    },

    /// Invalid compressor or parser configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error parsing CSV input.
    #[error("CSV parsing error at line {line}, column {column}: {message}")]
    CsvParseError {
        /// Line number where the error occurred (1-indexed)
        line: usize,
        /// Column number where the error occurred (1-indexed)
        column: usize,
        /// Description of the parsing error
        message: String,
    },

    /// Error parsing JSON input.
    #[error("JSON parsing error: {0}")]
    JsonParseError(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Coarse classification of an [`AlsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// [`AlsError::ShapeMismatch`]
    ShapeMismatch,
    /// [`AlsError::CorruptStream`]
    CorruptStream,
    /// [`AlsError::UnknownEncoding`]
    UnknownEncoding,
    /// [`AlsError::WorkerFailure`]
    WorkerFailure,
    /// [`AlsError::InvalidConfig`]
    InvalidConfig,
    /// CSV or JSON adapter errors
    Adapter,
    /// [`AlsError::IoError`]
    Io,
}

impl AlsError {
    /// Shorthand for building a [`AlsError::ShapeMismatch`].
    pub fn shape(message: impl Into<String>) -> Self {
        AlsError::ShapeMismatch {
            message: message.into(),
        }
    }

    /// Shorthand for building a [`AlsError::CorruptStream`].
    pub fn corrupt(line: usize, message: impl Into<String>) -> Self {
        AlsError::CorruptStream {
            line,
            message: message.into(),
        }
    }

    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AlsError::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            AlsError::CorruptStream { .. } => ErrorKind::CorruptStream,
            AlsError::UnknownEncoding { .. } => ErrorKind::UnknownEncoding,
            AlsError::WorkerFailure { .. } => ErrorKind::WorkerFailure,
            AlsError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            AlsError::CsvParseError { .. } | AlsError::JsonParseError(_) => ErrorKind::Adapter,
            AlsError::IoError(_) => ErrorKind::Io,
        }
    }

    /// The innermost error, looking through any `WorkerFailure` wrappers.
    pub fn root(&self) -> &AlsError {
        let mut current = self;
        while let AlsError::WorkerFailure { source, .. } = current {
            current = source;
        }
        current
    }

    /// Whether the caller can fix the condition by changing its input.
    ///
    /// Parallelism never affects correctness, so a worker failure is judged
    /// by the error it wraps.
    pub fn is_caller_fixable(&self) -> bool {
        matches!(
            self.root().kind(),
            ErrorKind::ShapeMismatch | ErrorKind::CorruptStream
        )
    }
}

/// Type alias for Results using `AlsError`.
pub type Result<T> = std::result::Result<T, AlsError>;

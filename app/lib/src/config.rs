//! Configuration types for the ALS compression engine.
//!
//! Both structs are plain values with builder-style setters. They are
//! validated once when a compressor or parser is constructed and are
//! immutable afterwards.

use serde::{Deserialize, Serialize};

use crate::error::{AlsError, Result};

/// Largest dictionary a default parser accepts.
///
/// Compressor configurations may lower the entry limit but never raise it
/// past this value, so every stream they produce decodes with defaults.
pub const MAX_DICTIONARY_ENTRIES: usize = 65_536;

/// Configuration for the ALS compressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressorConfig {
    /// Minimum improvement ratio a pattern encoding must reach over raw.
    ///
    /// A candidate is accepted only if `cost <= raw_cost / threshold`.
    /// With a threshold of 1.0 or lower any strictly cheaper candidate is
    /// accepted.
    ///
    /// Default: 1.2
    pub ctx_fallback_threshold: f64,

    /// Minimum length of a run or arithmetic progression.
    ///
    /// Shorter runs are emitted as literals.
    ///
    /// Default: 3 values
    pub min_pattern_length: usize,

    /// Number of worker threads and chunks.
    ///
    /// - 0: Auto-detect based on available CPU cores
    /// - 1: Sequential execution
    /// - N: N chunks on a pool of N threads
    ///
    /// Default: 0 (auto)
    pub parallelism: usize,

    /// Upper bound on `distinct / row_count` for offering a dictionary.
    ///
    /// Default: 0.5
    pub max_dictionary_density: f64,

    /// Cost units charged per literal token.
    ///
    /// Structural numbers (dictionary indices, run lengths) cost one unit
    /// per decimal digit.
    ///
    /// Default: 8
    pub literal_token_weight: usize,

    /// Maximum number of entries in a dictionary.
    ///
    /// Must be between 1 and [`MAX_DICTIONARY_ENTRIES`].
    ///
    /// Default: 65,536 entries
    pub max_dictionary_entries: usize,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            ctx_fallback_threshold: 1.2,
            min_pattern_length: 3,
            parallelism: 0, // auto-detect
            max_dictionary_density: 0.5,
            literal_token_weight: 8,
            max_dictionary_entries: MAX_DICTIONARY_ENTRIES,
        }
    }
}

impl CompressorConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the context-fallback threshold.
    pub fn with_ctx_fallback_threshold(mut self, threshold: f64) -> Self {
        self.ctx_fallback_threshold = threshold;
        self
    }

    /// Set the minimum pattern length.
    pub fn with_min_pattern_length(mut self, length: usize) -> Self {
        self.min_pattern_length = length;
        self
    }

    /// Set the parallelism level.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Set the dictionary density bound.
    pub fn with_max_dictionary_density(mut self, density: f64) -> Self {
        self.max_dictionary_density = density;
        self
    }

    /// Set the literal token weight.
    pub fn with_literal_token_weight(mut self, weight: usize) -> Self {
        self.literal_token_weight = weight;
        self
    }

    /// Set the maximum dictionary entries limit.
    pub fn with_max_dictionary_entries(mut self, max: usize) -> Self {
        self.max_dictionary_entries = max;
        self
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if !self.ctx_fallback_threshold.is_finite() || self.ctx_fallback_threshold <= 0.0 {
            return Err(AlsError::InvalidConfig(format!(
                "ctx_fallback_threshold must be a positive number, got {}",
                self.ctx_fallback_threshold
            )));
        }
        if self.min_pattern_length < 2 {
            return Err(AlsError::InvalidConfig(format!(
                "min_pattern_length must be >= 2, got {}",
                self.min_pattern_length
            )));
        }
        if !(self.max_dictionary_density > 0.0 && self.max_dictionary_density <= 1.0) {
            return Err(AlsError::InvalidConfig(format!(
                "max_dictionary_density must be in (0, 1], got {}",
                self.max_dictionary_density
            )));
        }
        if self.literal_token_weight == 0 {
            return Err(AlsError::InvalidConfig(
                "literal_token_weight must be >= 1".to_string(),
            ));
        }
        if !(1..=MAX_DICTIONARY_ENTRIES).contains(&self.max_dictionary_entries) {
            return Err(AlsError::InvalidConfig(format!(
                "max_dictionary_entries must be in 1..={}, got {}",
                MAX_DICTIONARY_ENTRIES, self.max_dictionary_entries
            )));
        }
        Ok(())
    }

    /// The number of chunks/workers actually used.
    pub fn effective_parallelism(&self) -> usize {
        resolve_parallelism(self.parallelism)
    }
}

/// Configuration for the ALS parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Number of worker threads and chunks.
    ///
    /// - 0: Auto-detect based on available CPU cores
    /// - 1: Sequential execution
    /// - N: N chunks on a pool of N threads
    ///
    /// Default: 0 (auto)
    pub parallelism: usize,

    /// Maximum row count a stream may declare.
    ///
    /// This security limit prevents memory exhaustion from malicious
    /// headers.
    ///
    /// Default: 100,000,000 rows
    pub max_row_count: usize,

    /// Maximum number of entries in a dictionary.
    ///
    /// Default: 65,536 entries
    pub max_dictionary_entries: usize,

    /// Maximum input size in bytes.
    ///
    /// Default: 1,073,741,824 bytes (1 GB)
    pub max_input_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            parallelism: 0, // auto-detect
            max_row_count: 100_000_000,
            max_dictionary_entries: MAX_DICTIONARY_ENTRIES,
            max_input_size: 1_073_741_824, // 1 GB
        }
    }
}

impl ParserConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the parallelism level.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Set the maximum declared row count.
    pub fn with_max_row_count(mut self, max: usize) -> Self {
        self.max_row_count = max;
        self
    }

    /// Set the maximum dictionary entries limit.
    pub fn with_max_dictionary_entries(mut self, max: usize) -> Self {
        self.max_dictionary_entries = max;
        self
    }

    /// Set the maximum input size limit.
    pub fn with_max_input_size(mut self, max: usize) -> Self {
        self.max_input_size = max;
        self
    }

    /// Check that no limit is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_input_size == 0 {
            return Err(AlsError::InvalidConfig(
                "max_input_size must be >= 1".to_string(),
            ));
        }
        if self.max_dictionary_entries == 0 {
            return Err(AlsError::InvalidConfig(
                "max_dictionary_entries must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The number of chunks/workers actually used.
    pub fn effective_parallelism(&self) -> usize {
        resolve_parallelism(self.parallelism)
    }
}

fn resolve_parallelism(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

//! Pattern mining for ALS compression.
//!
//! The [`PatternMiner`] runs every detector over one column and returns
//! the candidates ranked by estimated cost, together with the cost of the
//! raw fallback.

mod cycle;
mod detector;
mod dictionary;
mod range;
mod repeat;

pub use cycle::CycleDetector;
pub use detector::{digit_count, index_width, Candidate, CostModel, PatternDetector};
pub use dictionary::DictionaryDetector;
pub use range::RangeDetector;
pub use repeat::RunDetector;

use crate::config::CompressorConfig;
use crate::convert::Column;

/// Outcome of mining one column.
#[derive(Debug, Clone, PartialEq)]
pub struct MiningResult<'a> {
    /// Cost of the raw encoding.
    pub raw_cost: usize,
    /// Pattern candidates, best first.
    pub candidates: Vec<Candidate<'a>>,
}

/// Runs all pattern detectors over a column.
pub struct PatternMiner {
    cost: CostModel,
    detectors: Vec<Box<dyn PatternDetector>>,
}

impl PatternMiner {
    /// Create a new miner with default configuration.
    pub fn new() -> Self {
        Self::with_config(&CompressorConfig::default())
    }

    /// Create a new miner from a compressor configuration.
    pub fn with_config(config: &CompressorConfig) -> Self {
        let detectors: Vec<Box<dyn PatternDetector>> = vec![
            Box::new(DictionaryDetector::new(
                config.max_dictionary_density,
                config.max_dictionary_entries,
            )),
            Box::new(RangeDetector::new(config.min_pattern_length)),
            Box::new(RunDetector::new(config.min_pattern_length)),
            Box::new(CycleDetector::new(config.min_pattern_length)),
        ];
        Self {
            cost: CostModel::new(config.literal_token_weight),
            detectors,
        }
    }

    /// The cost model used for estimates.
    pub fn cost_model(&self) -> &CostModel {
        &self.cost
    }

    /// Mine a column for pattern candidates.
    pub fn mine<'a>(&self, column: &Column<'a>) -> MiningResult<'a> {
        let mut candidates: Vec<Candidate<'a>> = self
            .detectors
            .iter()
            .filter_map(|detector| detector.detect(column, &self.cost))
            .collect();
        candidates.sort_by(|a, b| a.rank_cmp(b));

        MiningResult {
            raw_cost: self.cost.raw(column.len()),
            candidates,
        }
    }
}

impl Default for PatternMiner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PatternMiner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let strategies: Vec<_> = self.detectors.iter().map(|d| d.strategy()).collect();
        f.debug_struct("PatternMiner")
            .field("cost", &self.cost)
            .field("detectors", &strategies)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::als::Strategy;
    use crate::convert::Value;

    fn strategies(result: &MiningResult<'_>) -> Vec<Strategy> {
        result.candidates.iter().map(Candidate::strategy).collect()
    }

    #[test]
    fn test_miner_sequence_column() {
        let miner = PatternMiner::new();
        let column = Column::new("id", (1..=5).map(Value::Integer).collect());
        let result = miner.mine(&column);
        assert_eq!(result.raw_cost, 40);
        assert_eq!(strategies(&result), vec![Strategy::Arithmetic]);
    }

    #[test]
    fn test_miner_constant_column_ranks_runs_first() {
        let miner = PatternMiner::new();
        let column = Column::new("status", vec![Value::text("active"); 5]);
        let result = miner.mine(&column);
        assert_eq!(
            strategies(&result),
            vec![Strategy::RunLength, Strategy::Dictionary]
        );
        assert_eq!(result.candidates[0].cost, 9);
        assert_eq!(result.candidates[1].cost, 13);
    }

    #[test]
    fn test_miner_toggle_column_ranks_cycle_first() {
        let miner = PatternMiner::new();
        let column = Column::new(
            "side",
            (0..12).map(|i| Value::text(if i % 2 == 0 { "buy" } else { "sell" })).collect(),
        );
        let result = miner.mine(&column);
        assert_eq!(strategies(&result), vec![Strategy::Cycle, Strategy::Dictionary]);
        assert_eq!(result.candidates[0].cost, 18);
        assert_eq!(result.candidates[1].cost, 28);
    }

    #[test]
    fn test_miner_distinct_values() {
        let miner = PatternMiner::new();
        let column = Column::new(
            "name",
            ["x", "y", "z", "w"].iter().map(|&s| Value::text(s)).collect(),
        );
        assert!(miner.mine(&column).candidates.is_empty());
    }

    #[test]
    fn test_miner_empty_column() {
        let miner = PatternMiner::new();
        let column = Column::new("e", vec![]);
        let result = miner.mine(&column);
        assert_eq!(result.raw_cost, 0);
        assert!(result.candidates.is_empty());
    }

    #[test]
    fn test_miner_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PatternMiner>();
    }
}

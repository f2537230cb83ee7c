//! Context encoder: threshold-gated strategy selection per column.

use log::debug;

use crate::als::{EncodedColumn, Encoding, Strategy};
use crate::config::CompressorConfig;
use crate::convert::Column;
use crate::pattern::{MiningResult, PatternMiner};

/// The encoding chosen for one column and the costs behind the choice.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSelection<'a> {
    /// The encoded column.
    pub column: EncodedColumn<'a>,
    /// Cost of the chosen encoding.
    pub cost: usize,
    /// Cost of the raw encoding.
    pub raw_cost: usize,
    /// Number of pattern candidates found, accepted or not.
    pub candidates: usize,
}

/// Chooses one encoding per column.
///
/// A candidate is accepted only if `cost <= raw_cost / threshold`; with a
/// threshold of 1.0 or lower, any strictly cheaper candidate is accepted.
/// Among accepted candidates the cheapest wins, ties going to dictionary,
/// then arithmetic sequence, then run length, then cycle. Otherwise the column is
/// stored raw.
#[derive(Debug)]
pub struct ContextEncoder {
    miner: PatternMiner,
    threshold: f64,
}

impl ContextEncoder {
    /// Create an encoder from a compressor configuration.
    pub fn new(config: &CompressorConfig) -> Self {
        Self {
            miner: PatternMiner::with_config(config),
            threshold: config.ctx_fallback_threshold,
        }
    }

    /// Whether a candidate of `cost` clears the fallback threshold.
    pub fn accepts(&self, cost: usize, raw_cost: usize) -> bool {
        if self.threshold <= 1.0 {
            cost < raw_cost
        } else {
            (cost as f64) <= (raw_cost as f64) / self.threshold
        }
    }

    /// Encode one column.
    pub fn encode<'a>(&self, column: &Column<'a>) -> ColumnSelection<'a> {
        let MiningResult {
            raw_cost,
            candidates,
        } = self.miner.mine(column);
        let found = candidates.len();

        let chosen = candidates
            .into_iter()
            .next()
            .filter(|best| self.accepts(best.cost, raw_cost));

        let (encoding, cost) = match chosen {
            Some(candidate) => (candidate.encoding, candidate.cost),
            None => (Encoding::Raw(column.values.clone()), raw_cost),
        };

        debug!(
            "column '{}': {} (cost {} vs raw {}, {} candidate(s))",
            column.name,
            encoding.strategy(),
            cost,
            raw_cost,
            found
        );

        ColumnSelection {
            column: EncodedColumn {
                name: column.name.clone(),
                declared_type: column.declared_type,
                encoding,
            },
            cost,
            raw_cost,
            candidates: found,
        }
    }

    /// The strategy this encoder would pick for a column.
    pub fn choose(&self, column: &Column<'_>) -> Strategy {
        self.encode(column).column.strategy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::Value;

    fn encoder(threshold: f64) -> ContextEncoder {
        ContextEncoder::new(&CompressorConfig::new().with_ctx_fallback_threshold(threshold))
    }

    #[test]
    fn test_accepts_threshold_boundary() {
        let enc = encoder(2.0);
        assert!(enc.accepts(50, 100));
        assert!(!enc.accepts(51, 100));

        let enc = encoder(1.0);
        assert!(enc.accepts(99, 100));
        assert!(!enc.accepts(100, 100));

        let enc = encoder(0.5);
        assert!(!enc.accepts(100, 100));
        assert!(enc.accepts(0, 1));
    }

    #[test]
    fn test_scenario_a_choices() {
        let enc = encoder(1.2);
        let id = Column::new("id", (1..=5).map(Value::Integer).collect());
        let status = Column::new("status", vec![Value::text("active"); 5]);
        assert_eq!(enc.choose(&id), Strategy::Arithmetic);
        assert!(matches!(
            enc.choose(&status),
            Strategy::Dictionary | Strategy::RunLength
        ));
    }

    #[test]
    fn test_distinct_values_fall_back_to_raw() {
        let enc = encoder(1.2);
        let column = Column::new(
            "s",
            (0..20).map(|i| Value::text_owned(format!("value-{}", i))).collect(),
        );
        let selection = enc.encode(&column);
        assert_eq!(selection.column.strategy(), Strategy::Raw);
        assert_eq!(selection.cost, selection.raw_cost);
    }

    #[test]
    fn test_high_threshold_forces_raw() {
        let enc = encoder(1000.0);
        let column = Column::new("s", vec![Value::text("same"); 500]);
        let selection = enc.encode(&column);
        assert_eq!(selection.column.strategy(), Strategy::Raw);
        assert!(selection.candidates > 0);
    }

    #[test]
    fn test_tie_prefers_dictionary() {
        // With weight 2, 1 2 3 1 2 3 3 2 1 costs 3 * (2*2 + 1) = 15 as
        // sequences and 3*2 + 9*1 = 15 as a dictionary.
        let config = CompressorConfig::new()
            .with_literal_token_weight(2)
            .with_ctx_fallback_threshold(1.0);
        let enc = ContextEncoder::new(&config);
        let column = Column::new(
            "c",
            [1, 2, 3, 1, 2, 3, 3, 2, 1].iter().map(|&i| Value::Integer(i)).collect(),
        );
        let selection = enc.encode(&column);
        assert_eq!(selection.candidates, 2);
        assert_eq!(selection.cost, 15);
        assert_eq!(selection.column.strategy(), Strategy::Dictionary);
    }

    #[test]
    fn test_empty_column_is_raw() {
        let enc = encoder(1.2);
        let column = Column::new("e", vec![]);
        let selection = enc.encode(&column);
        assert_eq!(selection.column.strategy(), Strategy::Raw);
        assert_eq!(selection.cost, 0);
    }
}

//! Compression statistics.
//!
//! A [`CompressionReport`] is assembled after the chunk merge, so it is
//! built from plain values in column order and needs no synchronization.

use serde::Serialize;

use crate::als::Strategy;

/// Per-column compression statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    /// Column name.
    pub name: String,
    /// Column index.
    pub index: usize,
    /// Strategy chosen for this column.
    pub strategy: Strategy,
    /// Estimated cost of the chosen encoding, in cost units.
    pub estimated_cost: usize,
    /// Estimated cost of the raw encoding, in cost units.
    pub raw_cost: usize,
    /// Number of pattern candidates the miner found.
    pub candidates: usize,
    /// Bytes of the serialized column record, newline included.
    pub output_bytes: usize,
}

impl ColumnStats {
    /// Estimated improvement over raw (raw / chosen).
    pub fn estimated_ratio(&self) -> f64 {
        if self.estimated_cost == 0 {
            1.0
        } else {
            self.raw_cost as f64 / self.estimated_cost as f64
        }
    }

    /// Whether a pattern encoding was selected.
    pub fn used_pattern(&self) -> bool {
        self.strategy != Strategy::Raw
    }
}

/// Report for one compress call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionReport {
    /// Rows in the input table.
    pub row_count: usize,
    /// Number of chunks the columns were split into.
    pub parallelism: usize,
    /// Total bytes of ALS output.
    pub output_bytes: usize,
    /// Per-column statistics in column order.
    pub columns: Vec<ColumnStats>,
}

impl CompressionReport {
    /// Create a new report.
    pub fn new(
        row_count: usize,
        parallelism: usize,
        output_bytes: usize,
        columns: Vec<ColumnStats>,
    ) -> Self {
        Self {
            row_count,
            parallelism,
            output_bytes,
            columns,
        }
    }

    /// Sum of estimated costs of the chosen encodings.
    pub fn estimated_cost(&self) -> usize {
        self.columns.iter().map(|c| c.estimated_cost).sum()
    }

    /// Sum of estimated raw costs.
    pub fn raw_cost(&self) -> usize {
        self.columns.iter().map(|c| c.raw_cost).sum()
    }

    /// Overall estimated improvement over raw.
    pub fn estimated_ratio(&self) -> f64 {
        let cost = self.estimated_cost();
        if cost == 0 {
            1.0
        } else {
            self.raw_cost() as f64 / cost as f64
        }
    }

    /// Number of columns using `strategy`.
    pub fn strategy_count(&self, strategy: Strategy) -> usize {
        self.columns.iter().filter(|c| c.strategy == strategy).count()
    }

    /// Number of columns that used a pattern encoding.
    pub fn compressed_column_count(&self) -> usize {
        self.columns.iter().filter(|c| c.used_pattern()).count()
    }

    /// The column with the highest estimated ratio.
    pub fn most_effective_column(&self) -> Option<&ColumnStats> {
        self.columns
            .iter()
            .max_by(|a, b| a.estimated_ratio().total_cmp(&b.estimated_ratio()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(name: &str, index: usize, strategy: Strategy, cost: usize, raw: usize) -> ColumnStats {
        ColumnStats {
            name: name.to_string(),
            index,
            strategy,
            estimated_cost: cost,
            raw_cost: raw,
            candidates: usize::from(strategy != Strategy::Raw),
            output_bytes: 10,
        }
    }

    #[test]
    fn test_column_stats_ratio() {
        let column = stats("id", 0, Strategy::Arithmetic, 17, 40);
        assert!((column.estimated_ratio() - 40.0 / 17.0).abs() < 1e-9);
        assert!(column.used_pattern());
        assert_eq!(stats("e", 0, Strategy::Raw, 0, 0).estimated_ratio(), 1.0);
    }

    #[test]
    fn test_report_aggregates() {
        let report = CompressionReport::new(
            5,
            2,
            64,
            vec![
                stats("id", 0, Strategy::Arithmetic, 17, 40),
                stats("status", 1, Strategy::RunLength, 9, 40),
                stats("name", 2, Strategy::Raw, 40, 40),
            ],
        );
        assert_eq!(report.estimated_cost(), 66);
        assert_eq!(report.raw_cost(), 120);
        assert_eq!(report.compressed_column_count(), 2);
        assert_eq!(report.strategy_count(Strategy::Raw), 1);
        assert_eq!(report.most_effective_column().map(|c| c.name.as_str()), Some("status"));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = CompressionReport::new(1, 1, 12, vec![stats("a", 0, Strategy::Dictionary, 1, 2)]);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"strategy\":\"dictionary\""));
        assert!(json.contains("\"output_bytes\":12"));
    }
}

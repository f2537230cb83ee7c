//! Cycle pattern detection.
//!
//! Columns that alternate through a short pattern, such as
//! `buy, sell, buy, sell` or `true, false, true, false`, are encoded as
//! the pattern plus a total length (`buy~sell*4`).

use super::detector::{Candidate, CostModel, PatternDetector};
use crate::als::{Encoding, Strategy};
use crate::convert::{Column, Value};

/// Detector for columns that repeat one pattern from start to end.
///
/// The pattern must hold at least two values and appear at least twice.
/// A trailing partial repetition is allowed.
#[derive(Debug, Clone)]
pub struct CycleDetector {
    min_pattern_length: usize,
}

impl CycleDetector {
    /// Create a new cycle detector. Columns shorter than
    /// `min_pattern_length` are never cycles.
    pub fn new(min_pattern_length: usize) -> Self {
        Self { min_pattern_length }
    }

    /// Length of the shortest period of `values`, or `None` if the
    /// column does not repeat.
    ///
    /// Uses the prefix-function border: the shortest period of a
    /// sequence of length `n` is `n` minus its longest proper border.
    pub fn find_period(&self, values: &[Value<'_>]) -> Option<usize> {
        let n = values.len();
        if n < 2 {
            return None;
        }

        let mut border = vec![0usize; n];
        for i in 1..n {
            let mut k = border[i - 1];
            while k > 0 && values[i] != values[k] {
                k = border[k - 1];
            }
            if values[i] == values[k] {
                k += 1;
            }
            border[i] = k;
        }

        let period = n - border[n - 1];
        (period >= 2 && period <= n / 2).then_some(period)
    }
}

impl PatternDetector for CycleDetector {
    fn strategy(&self) -> Strategy {
        Strategy::Cycle
    }

    fn detect<'a>(&self, column: &Column<'a>, cost: &CostModel) -> Option<Candidate<'a>> {
        if column.len() < self.min_pattern_length {
            return None;
        }

        let period = self.find_period(&column.values)?;
        let len = column.len();
        Some(Candidate::new(
            cost.cycle(period, len),
            Encoding::Cycle {
                pattern: column.values[..period].to_vec(),
                len,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(values: &[&'static str]) -> Vec<Value<'static>> {
        values.iter().map(|&s| Value::text(s)).collect()
    }

    #[test]
    fn test_simple_toggle() {
        let detector = CycleDetector::new(3);
        let column = Column::new("side", texts(&["buy", "sell", "buy", "sell", "buy", "sell"]));
        let candidate = detector.detect(&column, &CostModel::default()).unwrap();
        assert_eq!(candidate.cost, 17);
        assert_eq!(
            candidate.encoding,
            Encoding::Cycle {
                pattern: texts(&["buy", "sell"]),
                len: 6
            }
        );
    }

    #[test]
    fn test_boolean_toggle_with_partial_tail() {
        let detector = CycleDetector::new(3);
        let values: Vec<Value> = (0..7).map(|i| Value::Boolean(i % 2 == 0)).collect();
        let column = Column::new("flag", values);
        let candidate = detector.detect(&column, &CostModel::default()).unwrap();
        assert!(matches!(
            candidate.encoding,
            Encoding::Cycle { ref pattern, len: 7 } if pattern.len() == 2
        ));
    }

    #[test]
    fn test_three_value_cycle_with_nulls() {
        let detector = CycleDetector::new(3);
        let values: Vec<Value> = (0..9)
            .map(|i| match i % 3 {
                0 => Value::Integer(5),
                1 => Value::Null,
                _ => Value::Integer(-2),
            })
            .collect();
        assert_eq!(detector.find_period(&values), Some(3));
    }

    #[test]
    fn test_all_same_is_not_a_cycle() {
        let detector = CycleDetector::new(3);
        assert_eq!(detector.find_period(&texts(&["a", "a", "a", "a"])), None);
    }

    #[test]
    fn test_irregular_is_not_a_cycle() {
        let detector = CycleDetector::new(3);
        assert_eq!(detector.find_period(&texts(&["a", "b", "a", "a", "b", "b"])), None);
        // Period 3 appears less than twice.
        assert_eq!(detector.find_period(&texts(&["a", "b", "c", "a", "b"])), None);
    }

    #[test]
    fn test_too_short() {
        let detector = CycleDetector::new(5);
        let column = Column::new("t", texts(&["x", "y", "x", "y"]));
        assert!(detector.detect(&column, &CostModel::default()).is_none());
        assert_eq!(detector.find_period(&column.values), Some(2));
    }

    #[test]
    fn test_float_cycle_compares_bitwise() {
        let detector = CycleDetector::new(2);
        let values = vec![Value::Float(0.0), Value::Float(-0.0), Value::Float(0.0), Value::Float(0.0)];
        assert_eq!(detector.find_period(&values), None);
    }
}

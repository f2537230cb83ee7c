//! Dictionary pattern detection.
//!
//! Columns with few distinct values are encoded as the distinct values in
//! first-appearance order plus one index per row.

use std::collections::HashMap;

use super::detector::{Candidate, CostModel, PatternDetector};
use crate::als::{Encoding, Strategy};
use crate::convert::{Column, Value};

/// Detector for dictionary-worthy repetition.
///
/// A dictionary is offered only when `distinct / rows` is below
/// `max_density` and the distinct count fits `max_entries`.
#[derive(Debug, Clone)]
pub struct DictionaryDetector {
    max_density: f64,
    max_entries: usize,
}

impl DictionaryDetector {
    /// Create a new dictionary detector.
    pub fn new(max_density: f64, max_entries: usize) -> Self {
        Self {
            max_density,
            max_entries,
        }
    }

    /// Build the entry table and index sequence.
    ///
    /// Gives up as soon as the distinct count passes `limit`.
    fn build<'a>(values: &[Value<'a>], limit: usize) -> Option<(Vec<Value<'a>>, Vec<usize>)> {
        let mut positions: HashMap<&Value<'a>, usize> = HashMap::new();
        let mut entries = Vec::new();
        let mut indices = Vec::with_capacity(values.len());

        for value in values {
            let index = match positions.get(value) {
                Some(&index) => index,
                None => {
                    if entries.len() == limit {
                        return None;
                    }
                    let index = entries.len();
                    positions.insert(value, index);
                    entries.push(value.clone());
                    index
                }
            };
            indices.push(index);
        }
        Some((entries, indices))
    }
}

impl PatternDetector for DictionaryDetector {
    fn strategy(&self) -> Strategy {
        Strategy::Dictionary
    }

    fn detect<'a>(&self, column: &Column<'a>, cost: &CostModel) -> Option<Candidate<'a>> {
        let rows = column.len();
        if rows == 0 {
            return None;
        }

        // Largest distinct count strictly below the density bound.
        let density_limit = (self.max_density * rows as f64).ceil() as usize;
        let limit = density_limit.saturating_sub(1).min(self.max_entries);
        if limit == 0 {
            return None;
        }

        let (entries, indices) = Self::build(&column.values, limit)?;
        let candidate_cost = cost.dictionary(entries.len(), rows);
        Some(Candidate::new(
            candidate_cost,
            Encoding::Dictionary { entries, indices },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_column(values: &[&'static str]) -> Column<'static> {
        Column::new("c", values.iter().map(|&s| Value::text(s)).collect())
    }

    #[test]
    fn test_dictionary_first_appearance_order() {
        let detector = DictionaryDetector::new(0.5, 65_536);
        let column = text_column(&["b", "a", "b", "b", "a", "b", "a", "b"]);
        let candidate = detector.detect(&column, &CostModel::default()).unwrap();
        match candidate.encoding {
            Encoding::Dictionary { entries, indices } => {
                assert_eq!(entries, vec![Value::text("b"), Value::text("a")]);
                assert_eq!(indices, vec![0, 1, 0, 0, 1, 0, 1, 0]);
            }
            other => panic!("unexpected encoding {:?}", other),
        }
        assert_eq!(candidate.cost, 2 * 8 + 8);
    }

    #[test]
    fn test_dictionary_density_bound_is_strict() {
        let detector = DictionaryDetector::new(0.5, 65_536);
        // 2 distinct of 4 rows is exactly 0.5: not offered.
        let column = text_column(&["a", "b", "a", "b"]);
        assert!(detector.detect(&column, &CostModel::default()).is_none());
        // 2 distinct of 5 rows is 0.4: offered.
        let column = text_column(&["a", "b", "a", "b", "a"]);
        assert!(detector.detect(&column, &CostModel::default()).is_some());
    }

    #[test]
    fn test_dictionary_respects_max_entries() {
        let detector = DictionaryDetector::new(1.0, 2);
        let column = text_column(&["a", "b", "c", "a", "b", "c", "a", "b", "c", "a"]);
        assert!(detector.detect(&column, &CostModel::default()).is_none());
    }

    #[test]
    fn test_dictionary_mixed_values_and_nulls() {
        let detector = DictionaryDetector::new(0.5, 65_536);
        let column = Column::new(
            "m",
            vec![
                Value::Integer(1),
                Value::Null,
                Value::text("1"),
                Value::Integer(1),
                Value::Null,
                Value::text("1"),
                Value::Integer(1),
            ],
        );
        let candidate = detector.detect(&column, &CostModel::default()).unwrap();
        match candidate.encoding {
            Encoding::Dictionary { entries, .. } => assert_eq!(entries.len(), 3),
            other => panic!("unexpected encoding {:?}", other),
        }
    }

    #[test]
    fn test_dictionary_empty_column() {
        let detector = DictionaryDetector::new(0.5, 65_536);
        let column = text_column(&[]);
        assert!(detector.detect(&column, &CostModel::default()).is_none());
    }
}

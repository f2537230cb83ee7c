//! Arithmetic sequence detection.
//!
//! Numeric columns are scanned left to right for runs that follow
//! `start + k * step` exactly. Each change of step starts a new run; runs
//! shorter than the minimum pattern length dissolve into literals.

use super::detector::{Candidate, CostModel, PatternDetector};
use crate::als::{Encoding, Progression, SequenceSegment, Strategy};
use crate::convert::{Column, Value};

/// Detector for arithmetic-sequence runs in Integer and Float columns.
#[derive(Debug, Clone)]
pub struct RangeDetector {
    min_pattern_length: usize,
}

impl RangeDetector {
    /// Create a new range detector with the given minimum pattern length.
    pub fn new(min_pattern_length: usize) -> Self {
        Self { min_pattern_length }
    }

    /// The progression through two consecutive values, if any.
    ///
    /// Zero, overflowing and non-finite steps never form a progression.
    /// Float progressions must reproduce `b` bit for bit.
    fn progression_between(a: &Value<'_>, b: &Value<'_>) -> Option<Progression> {
        match (a, b) {
            (Value::Integer(x), Value::Integer(y)) => {
                let step = y.checked_sub(*x)?;
                (step != 0).then_some(Progression::Integer { start: *x, step })
            }
            (Value::Float(x), Value::Float(y)) => {
                if !x.is_finite() || !y.is_finite() {
                    return None;
                }
                let step = y - x;
                if !step.is_finite() || step == 0.0 {
                    return None;
                }
                let progression = Progression::Float { start: *x, step };
                (progression.value_at(1).as_ref() == Some(b)).then_some(progression)
            }
            _ => None,
        }
    }

    /// How many leading values follow the progression exactly.
    fn run_length(values: &[Value<'_>], progression: &Progression) -> usize {
        values
            .iter()
            .enumerate()
            .take_while(|(k, v)| progression.value_at(*k).as_ref() == Some(*v))
            .count()
    }

    /// Split values into progression runs and literals.
    pub fn find_runs<'a>(&self, values: &[Value<'a>]) -> Vec<SequenceSegment<'a>> {
        let mut segments = Vec::new();
        let mut i = 0;
        while i < values.len() {
            let run = values
                .get(i + 1)
                .and_then(|next| Self::progression_between(&values[i], next))
                .map(|p| (p, Self::run_length(&values[i..], &p)))
                .filter(|&(_, len)| len >= self.min_pattern_length);

            match run {
                Some((progression, len)) => {
                    segments.push(SequenceSegment::Run { progression, len });
                    i += len;
                }
                None => {
                    segments.push(SequenceSegment::Literal(values[i].clone()));
                    i += 1;
                }
            }
        }
        segments
    }
}

impl PatternDetector for RangeDetector {
    fn strategy(&self) -> Strategy {
        Strategy::Arithmetic
    }

    fn detect<'a>(&self, column: &Column<'a>, cost: &CostModel) -> Option<Candidate<'a>> {
        if !column.declared_type.is_numeric() || column.len() < self.min_pattern_length {
            return None;
        }

        let segments = self.find_runs(&column.values);
        let mut total = 0usize;
        let mut has_run = false;
        for segment in &segments {
            total = total.saturating_add(match segment {
                SequenceSegment::Run { len, .. } => {
                    has_run = true;
                    cost.progression(*len)
                }
                SequenceSegment::Literal(_) => cost.literals(1),
            });
        }

        has_run.then(|| Candidate::new(total, Encoding::Arithmetic(segments)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Value<'static>> {
        values.iter().map(|&i| Value::Integer(i)).collect()
    }

    fn runs(segments: &[SequenceSegment<'_>]) -> Vec<(Progression, usize)> {
        segments
            .iter()
            .filter_map(|s| match s {
                SequenceSegment::Run { progression, len } => Some((*progression, *len)),
                SequenceSegment::Literal(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_detect_sequential() {
        let detector = RangeDetector::new(3);
        let column = Column::new("id", ints(&[1, 2, 3, 4, 5]));
        let candidate = detector.detect(&column, &CostModel::default()).unwrap();
        assert_eq!(candidate.cost, 17);
        match candidate.encoding {
            Encoding::Arithmetic(segments) => assert_eq!(
                segments,
                vec![SequenceSegment::Run {
                    progression: Progression::Integer { start: 1, step: 1 },
                    len: 5
                }]
            ),
            other => panic!("unexpected encoding {:?}", other),
        }
    }

    #[test]
    fn test_detect_step_changes() {
        let detector = RangeDetector::new(3);
        let segments = detector.find_runs(&ints(&[10, 20, 30, 40, 41, 42, 43, 43]));
        assert_eq!(
            runs(&segments),
            vec![
                (Progression::Integer { start: 10, step: 10 }, 4),
                (Progression::Integer { start: 41, step: 1 }, 3),
            ]
        );
        assert_eq!(segments.last(), Some(&SequenceSegment::Literal(Value::Integer(43))));
    }

    #[test]
    fn test_short_runs_become_literals() {
        let detector = RangeDetector::new(4);
        let column = Column::new("n", ints(&[1, 2, 3, 10, 20, 30]));
        assert!(detector.detect(&column, &CostModel::default()).is_none());
    }

    #[test]
    fn test_nulls_break_runs() {
        let detector = RangeDetector::new(3);
        let mut values = ints(&[1, 2, 3]);
        values.push(Value::Null);
        values.extend(ints(&[7, 6, 5, 4]));
        let segments = detector.find_runs(&values);
        assert_eq!(
            runs(&segments),
            vec![
                (Progression::Integer { start: 1, step: 1 }, 3),
                (Progression::Integer { start: 7, step: -1 }, 4),
            ]
        );
        assert_eq!(segments[1], SequenceSegment::Literal(Value::Null));
    }

    #[test]
    fn test_constant_values_are_not_sequences() {
        let detector = RangeDetector::new(3);
        let column = Column::new("c", ints(&[5, 5, 5, 5]));
        assert!(detector.detect(&column, &CostModel::default()).is_none());
    }

    #[test]
    fn test_overflowing_step_is_rejected() {
        let detector = RangeDetector::new(2);
        let segments = detector.find_runs(&ints(&[i64::MIN, i64::MAX]));
        assert!(runs(&segments).is_empty());
        assert_eq!(segments.len(), 2);

        let segments = detector.find_runs(&ints(&[i64::MAX - 2, i64::MAX - 1, i64::MAX]));
        assert_eq!(runs(&segments).len(), 1);
    }

    #[test]
    fn test_float_sequence_exact() {
        let detector = RangeDetector::new(3);
        let values: Vec<Value> = [0.5, 1.0, 1.5, 2.0].iter().map(|&f| Value::Float(f)).collect();
        let segments = detector.find_runs(&values);
        assert_eq!(
            runs(&segments),
            vec![(Progression::Float { start: 0.5, step: 0.5 }, 4)]
        );
    }

    #[test]
    fn test_float_sequence_requires_bitwise_match() {
        let detector = RangeDetector::new(3);
        // 0.1 + k * 0.1 drifts from the decimal literals.
        let values: Vec<Value> = [0.1, 0.2, 0.3, 0.4].iter().map(|&f| Value::Float(f)).collect();
        let mut position = 0;
        for segment in detector.find_runs(&values) {
            match segment {
                SequenceSegment::Run { progression, len } => {
                    for k in 0..len {
                        assert_eq!(progression.value_at(k).as_ref(), Some(&values[position + k]));
                    }
                    position += len;
                }
                SequenceSegment::Literal(value) => {
                    assert_eq!(value, values[position]);
                    position += 1;
                }
            }
        }
        assert_eq!(position, values.len());
    }

    #[test]
    fn test_non_numeric_columns_skipped() {
        let detector = RangeDetector::new(3);
        let column = Column::new(
            "m",
            vec![Value::Integer(1), Value::Integer(2), Value::Integer(3), Value::text("x")],
        );
        assert!(detector.detect(&column, &CostModel::default()).is_none());
    }
}

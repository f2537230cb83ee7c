//! Run-length pattern detection.
//!
//! Consecutive identical values of any type are collapsed into
//! `(value, run_length)` pairs.

use super::detector::{Candidate, CostModel, PatternDetector};
use crate::als::{Encoding, RunSegment, Strategy};
use crate::convert::{Column, Value};

/// Detector for runs of repeated values.
///
/// Runs shorter than the minimum pattern length are kept as literals.
#[derive(Debug, Clone)]
pub struct RunDetector {
    min_run_length: usize,
}

impl RunDetector {
    /// Create a new run detector with the given minimum run length.
    pub fn new(min_run_length: usize) -> Self {
        Self { min_run_length }
    }

    /// Split values into runs and literals.
    pub fn find_runs<'a>(&self, values: &[Value<'a>]) -> Vec<RunSegment<'a>> {
        let mut segments = Vec::new();
        let mut i = 0;
        while i < values.len() {
            let value = &values[i];
            let len = values[i..].iter().take_while(|v| *v == value).count();
            if len >= self.min_run_length {
                segments.push(RunSegment::Run {
                    value: value.clone(),
                    len,
                });
            } else {
                segments.extend(values[i..i + len].iter().cloned().map(RunSegment::Literal));
            }
            i += len;
        }
        segments
    }
}

impl PatternDetector for RunDetector {
    fn strategy(&self) -> Strategy {
        Strategy::RunLength
    }

    fn detect<'a>(&self, column: &Column<'a>, cost: &CostModel) -> Option<Candidate<'a>> {
        if column.len() < self.min_run_length {
            return None;
        }

        let segments = self.find_runs(&column.values);
        let mut total = 0usize;
        let mut has_run = false;
        for segment in &segments {
            total = total.saturating_add(match segment {
                RunSegment::Run { len, .. } => {
                    has_run = true;
                    cost.run(*len)
                }
                RunSegment::Literal(_) => cost.literals(1),
            });
        }

        has_run.then(|| Candidate::new(total, Encoding::RunLength(segments)))
    }
}

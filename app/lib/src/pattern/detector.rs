//! Pattern detector trait, candidates and the cost model.

use std::cmp::Ordering;

use crate::als::{Encoding, Strategy};
use crate::convert::Column;

/// Trait for pattern detection algorithms.
///
/// Implementors analyze one column and, if their pattern applies, return
/// a fully built [`Candidate`] with its estimated cost.
pub trait PatternDetector: Send + Sync {
    /// The strategy this detector produces.
    fn strategy(&self) -> Strategy;

    /// Analyze a column and return a candidate if the pattern applies.
    fn detect<'a>(&self, column: &Column<'a>, cost: &CostModel) -> Option<Candidate<'a>>;
}

/// A candidate encoding for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    /// Estimated size in cost units.
    pub cost: usize,
    /// The encoded payload.
    pub encoding: Encoding<'a>,
}

impl<'a> Candidate<'a> {
    /// Create a candidate of `cost` units.
    pub fn new(cost: usize, encoding: Encoding<'a>) -> Self {
        Self { cost, encoding }
    }

    /// The strategy of this candidate.
    pub fn strategy(&self) -> Strategy {
        self.encoding.strategy()
    }

    /// Order by cost, then by strategy precedence.
    pub fn rank_cmp(&self, other: &Candidate<'_>) -> Ordering {
        self.cost
            .cmp(&other.cost)
            .then_with(|| self.strategy().precedence().cmp(&other.strategy().precedence()))
    }
}

/// Token-count estimate of encoded size.
///
/// A literal token costs `literal_weight` units; each decimal digit of a
/// structural number (dictionary index, run length) costs one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostModel {
    literal_weight: usize,
}

impl CostModel {
    /// Create a cost model. A zero weight is clamped to one.
    pub fn new(literal_weight: usize) -> Self {
        Self {
            literal_weight: literal_weight.max(1),
        }
    }

    /// Units charged per literal token.
    pub fn literal_weight(&self) -> usize {
        self.literal_weight
    }

    /// Cost of `count` literal tokens.
    pub fn literals(&self, count: usize) -> usize {
        count.saturating_mul(self.literal_weight)
    }

    /// Cost of the raw encoding of `rows` values.
    pub fn raw(&self, rows: usize) -> usize {
        self.literals(rows)
    }

    /// Cost of a dictionary of `distinct` entries indexing `rows` values.
    pub fn dictionary(&self, distinct: usize, rows: usize) -> usize {
        self.literals(distinct)
            .saturating_add(rows.saturating_mul(index_width(distinct)))
    }

    /// Cost of one run-length run.
    pub fn run(&self, len: usize) -> usize {
        self.literal_weight.saturating_add(digit_count(len))
    }

    /// Cost of one arithmetic run (start and step literals plus length).
    pub fn progression(&self, len: usize) -> usize {
        self.literals(2).saturating_add(digit_count(len))
    }

    /// Cost of a cycle: one period of literals plus the total length.
    pub fn cycle(&self, period: usize, len: usize) -> usize {
        self.literals(period).saturating_add(digit_count(len))
    }

    /// Convert units back to whole literal tokens, rounding up.
    pub fn tokens(&self, units: usize) -> usize {
        units.div_ceil(self.literal_weight)
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::new(8)
    }
}

/// Number of decimal digits in `n`.
pub fn digit_count(n: usize) -> usize {
    let mut digits = 1;
    let mut rest = n / 10;
    while rest > 0 {
        digits += 1;
        rest /= 10;
    }
    digits
}

/// Fixed width of a packed dictionary index for `entries` entries.
pub fn index_width(entries: usize) -> usize {
    digit_count(entries.saturating_sub(1))
}

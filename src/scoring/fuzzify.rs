// src/scoring/fuzzify.rs
//! Fuzzification: crisp criterion scores → {low, medium, high} degrees.
//!
//! All three criteria share the same triangle shapes; each crisp score is
//! fuzzified independently. The triangles overlap so that every interior
//! point of [0,100] carries nonzero membership somewhere; exactly at 0 and
//! 100 all memberships are 0 (exclusive tails) and the defuzzifier's
//! neutral fallback takes over.

use serde::Serialize;

use super::membership::triangular;
use super::{Criterion, CriterionScores, Level};

/// Shared triangle breakpoints `(a, b, c)` for the linguistic terms.
pub const LOW_TRIANGLE: (f32, f32, f32) = (0.0, 25.0, 50.0);
pub const MEDIUM_TRIANGLE: (f32, f32, f32) = (25.0, 50.0, 75.0);
pub const HIGH_TRIANGLE: (f32, f32, f32) = (50.0, 75.0, 100.0);

/// Membership degrees of one crisp value in the three linguistic sets.
/// A possibility distribution, not a probability one; no need to sum to 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FuzzySet {
    pub low: f32,
    pub medium: f32,
    pub high: f32,
}

impl FuzzySet {
    /// Fuzzify a single crisp value against the shared triangles.
    pub fn of(x: f32) -> Self {
        let (la, lb, lc) = LOW_TRIANGLE;
        let (ma, mb, mc) = MEDIUM_TRIANGLE;
        let (ha, hb, hc) = HIGH_TRIANGLE;
        Self {
            low: triangular(x, la, lb, lc),
            medium: triangular(x, ma, mb, mc),
            high: triangular(x, ha, hb, hc),
        }
    }

    pub fn degree(&self, level: Level) -> f32 {
        match level {
            Level::Low => self.low,
            Level::Medium => self.medium,
            Level::High => self.high,
        }
    }
}

/// One fuzzy set per criterion, as produced by [`fuzzify`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FuzzifiedCriteria {
    pub clinical: FuzzySet,
    pub insurance: FuzzySet,
    pub personal: FuzzySet,
}

impl FuzzifiedCriteria {
    pub fn degree(&self, criterion: Criterion, level: Level) -> f32 {
        match criterion {
            Criterion::Clinical => self.clinical.degree(level),
            Criterion::Insurance => self.insurance.degree(level),
            Criterion::Personal => self.personal.degree(level),
        }
    }
}

/// Pure function of the three crisp scores.
pub fn fuzzify(scores: &CriterionScores) -> FuzzifiedCriteria {
    FuzzifiedCriteria {
        clinical: FuzzySet::of(scores.clinical),
        insurance: FuzzySet::of(scores.insurance),
        personal: FuzzySet::of(scores.personal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    fn set(x: f32) -> FuzzySet {
        FuzzySet::of(x)
    }

    #[test]
    fn boundary_table() {
        // x = 0: outer tail is exclusive, so everything is 0.
        let s = set(0.0);
        assert_eq!((s.low, s.medium, s.high), (0.0, 0.0, 0.0));

        // x = 25: peak of low, exclusive start of medium.
        let s = set(25.0);
        assert_eq!(s.low, 1.0);
        assert_eq!(s.medium, 0.0);
        assert_eq!(s.high, 0.0);

        // x = 50: peak of medium, shared zero edge of low and high.
        let s = set(50.0);
        assert_eq!(s.low, 0.0);
        assert_eq!(s.medium, 1.0);
        assert_eq!(s.high, 0.0);

        // x = 75: peak of high.
        let s = set(75.0);
        assert_eq!(s.medium, 0.0);
        assert_eq!(s.high, 1.0);

        // x = 100: outer tail again, everything 0.
        let s = set(100.0);
        assert_eq!((s.low, s.medium, s.high), (0.0, 0.0, 0.0));
    }

    #[test]
    fn interior_coverage_is_total() {
        // Every interior integer score must belong to at least one set.
        for x in 1..=99 {
            let s = set(x as f32);
            let total = s.low + s.medium + s.high;
            assert!(total > 0.0, "no membership at x={x}");
        }
    }

    #[test]
    fn overlap_zones_sum_to_one() {
        // Adjacent triangles are complementary between their peaks.
        for x in [30.0_f32, 37.5, 42.0, 55.0, 62.5, 70.0] {
            let s = set(x);
            let total = s.low + s.medium + s.high;
            assert!((total - 1.0).abs() < EPS, "sum {total} at x={x}");
        }
    }

    #[test]
    fn criteria_are_fuzzified_independently() {
        let f = fuzzify(&CriterionScores::new(10.0, 50.0, 90.0));
        assert!((f.clinical.low - 0.4).abs() < EPS);
        assert_eq!(f.insurance.medium, 1.0);
        assert!((f.personal.high - 0.4).abs() < EPS);
    }
}

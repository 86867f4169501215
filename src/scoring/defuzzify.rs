// src/scoring/defuzzify.rs
//! Center-of-Gravity defuzzification of the output priority set.

use serde::{Deserialize, Serialize};

use super::fuzzify::FuzzySet;
use super::Level;

/// Representative crisp centers for the output buckets.
pub const CENTER_LOW: f32 = 25.0;
pub const CENTER_MEDIUM: f32 = 50.0;
pub const CENTER_HIGH: f32 = 80.0;

/// Level mapping bounds, inclusive on the lower side.
pub const MEDIUM_MIN_SCORE: i32 = 40;
pub const HIGH_MIN_SCORE: i32 = 70;

/// Returned when no rule fired at all (zero denominator).
pub const NEUTRAL_SCORE: i32 = 50;

/// Crisp outcome of the fuzzy pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzyResult {
    pub score: i32,
    pub level: Level,
}

/// Weighted mean of the bucket centers, rounded half away from zero.
///
/// An empty priority set cannot occur for interior inputs (the triangles
/// tile (0,100)), but the exact endpoints 0 and 100 produce one; the
/// neutral default stands in instead of dividing by zero.
pub fn defuzzify(priority: &FuzzySet) -> FuzzyResult {
    let denominator = priority.low + priority.medium + priority.high;
    if denominator == 0.0 {
        return FuzzyResult {
            score: NEUTRAL_SCORE,
            level: Level::Medium,
        };
    }

    let numerator = priority.low * CENTER_LOW
        + priority.medium * CENTER_MEDIUM
        + priority.high * CENTER_HIGH;
    let score = (numerator / denominator).round() as i32;
    FuzzyResult {
        score,
        level: level_for(score),
    }
}

/// Qualitative level for a crisp priority score.
pub fn level_for(score: i32) -> Level {
    if score < MEDIUM_MIN_SCORE {
        Level::Low
    } else if score < HIGH_MIN_SCORE {
        Level::Medium
    } else {
        Level::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(low: f32, medium: f32, high: f32) -> FuzzySet {
        FuzzySet { low, medium, high }
    }

    #[test]
    fn empty_priority_returns_neutral_default() {
        let r = defuzzify(&set(0.0, 0.0, 0.0));
        assert_eq!(r.score, NEUTRAL_SCORE);
        assert_eq!(r.level, Level::Medium);
    }

    #[test]
    fn single_bucket_lands_on_its_center() {
        assert_eq!(defuzzify(&set(0.7, 0.0, 0.0)).score, 25);
        assert_eq!(defuzzify(&set(0.0, 0.3, 0.0)).score, 50);
        assert_eq!(defuzzify(&set(0.0, 0.0, 1.0)).score, 80);
    }

    #[test]
    fn weighted_mean_of_two_buckets() {
        // (0.5*25 + 0.5*80) / 1.0 = 52.5 → rounds half away from zero to 53.
        let r = defuzzify(&set(0.5, 0.0, 0.5));
        assert_eq!(r.score, 53);
        assert_eq!(r.level, Level::Medium);
    }

    #[test]
    fn level_bounds_are_half_open() {
        assert_eq!(level_for(39), Level::Low);
        assert_eq!(level_for(40), Level::Medium);
        assert_eq!(level_for(69), Level::Medium);
        assert_eq!(level_for(70), Level::High);
    }

    #[test]
    fn levels_follow_the_crisp_score() {
        assert_eq!(defuzzify(&set(1.0, 0.0, 0.0)).level, Level::Low);
        assert_eq!(defuzzify(&set(0.0, 1.0, 0.0)).level, Level::Medium);
        assert_eq!(defuzzify(&set(0.0, 0.0, 0.8)).level, Level::High);
    }
}

// src/scoring/ahp.rs
//! AHP aggregation: weighted linear combination of the three criteria.
//!
//! The full pairwise-comparison AHP is reduced to a single level here:
//! weights come in already normalized to percentages.

use serde::{Deserialize, Serialize};

use super::weights::NormalizedWeights;
use super::CriterionScores;

/// Scores strictly above this recommend a referral. The threshold value
/// itself does not; 60 stays "unlikely".
pub const REFERRAL_THRESHOLD: i32 = 60;

/// Crisp outcome of the AHP pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AhpResult {
    pub score: i32,
    pub recommended: bool,
}

/// Weighted sum of the scores, rounded half away from zero.
pub fn compute_ahp(scores: &CriterionScores, weights: &NormalizedWeights) -> AhpResult {
    let weighted = scores.clinical * (weights.clinical / 100.0)
        + scores.insurance * (weights.insurance / 100.0)
        + scores.personal * (weights.personal / 100.0);

    let score = weighted.round() as i32;
    AhpResult {
        score,
        recommended: score > REFERRAL_THRESHOLD,
    }
}

// src/scoring/mod.rs
//! Dual scoring engine: AHP weighted aggregation + fuzzy inference.
//!
//! Both pipelines consume the same three crisp criterion scores (0–100) and
//! run independently; neither holds state between calls. The HTTP layer is
//! responsible for clamping request input; these functions are total for
//! any numeric input and never panic on out-of-range values.

pub mod ahp;
pub mod defuzzify;
pub mod fuzzify;
pub mod membership;
pub mod rules;
pub mod weights;

use serde::{Deserialize, Serialize};

// Re-export convenient types and entry points.
pub use ahp::{compute_ahp, AhpResult, REFERRAL_THRESHOLD};
pub use defuzzify::{defuzzify, FuzzyResult};
pub use fuzzify::{fuzzify, FuzzifiedCriteria, FuzzySet};
pub use rules::{apply_rules, RULE_BANK};
pub use weights::{
    normalize_weights, CriterionWeights, NormalizedWeights, DEFAULT_WEIGHTS, ZERO_TOTAL_FALLBACK,
};

/// The three referral criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Clinical,
    Insurance,
    Personal,
}

/// Qualitative level, used both as a linguistic term during fuzzification
/// and as the final priority verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Low,
    Medium,
    High,
}

/// Crisp criterion scores in [0,100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriterionScores {
    pub clinical: f32,
    pub insurance: f32,
    pub personal: f32,
}

impl CriterionScores {
    pub fn new(clinical: f32, insurance: f32, personal: f32) -> Self {
        Self {
            clinical,
            insurance,
            personal,
        }
    }

    /// Copy with every score clamped to [0,100]. Upstream extraction output
    /// is not trusted to stay in range.
    pub fn clamped(&self) -> Self {
        fn c(x: f32) -> f32 {
            x.clamp(0.0, 100.0)
        }
        Self {
            clinical: c(self.clinical),
            insurance: c(self.insurance),
            personal: c(self.personal),
        }
    }
}

/// Combined output of both pipelines for one scoring call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub ahp: AhpResult,
    pub fuzzy: FuzzyResult,
}

/// Full fuzzy pipeline: fuzzification → rule bank → defuzzification.
pub fn compute_fuzzy(scores: &CriterionScores) -> FuzzyResult {
    defuzzify(&apply_rules(&fuzzify(scores)))
}

/// Run both pipelines over the same scores.
pub fn assess(scores: &CriterionScores, weights: &NormalizedWeights) -> Assessment {
    Assessment {
        ahp: compute_ahp(scores, weights),
        fuzzy: compute_fuzzy(scores),
    }
}

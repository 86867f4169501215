// src/scoring/weights.rs
//! Criterion weight normalization for the AHP aggregator.
//!
//! Raw weights arrive in slider units (non-negative, no upper bound) and
//! are normalized to percentages summing to 100 on every call. Rounding
//! for display is the UI's business; the fractions stay exact here.

use serde::{Deserialize, Serialize};

/// Raw, not-yet-normalized weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriterionWeights {
    pub clinical: f32,
    pub insurance: f32,
    pub personal: f32,
}

impl Default for CriterionWeights {
    /// Slider starting positions, mirroring the default split.
    fn default() -> Self {
        Self {
            clinical: 50.0,
            insurance: 25.0,
            personal: 25.0,
        }
    }
}

/// Percentages in [0,100] summing to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedWeights {
    pub clinical: f32,
    pub insurance: f32,
    pub personal: f32,
}

/// Fixed split used whenever the caller asks for defaults.
pub const DEFAULT_WEIGHTS: NormalizedWeights = NormalizedWeights {
    clinical: 50.0,
    insurance: 25.0,
    personal: 25.0,
};

/// Near-even split when every raw weight is zero. The personal slot absorbs
/// the rounding remainder; downstream consumers rely on this exact triple.
pub const ZERO_TOTAL_FALLBACK: NormalizedWeights = NormalizedWeights {
    clinical: 33.33,
    insurance: 33.33,
    personal: 33.34,
};

/// Normalize raw weights to percentages summing to 100.
///
/// `use_defaults` short-circuits to [`DEFAULT_WEIGHTS`] regardless of the
/// raw values, matching the "Use Defaults" toggle in the scoring form.
pub fn normalize_weights(raw: &CriterionWeights, use_defaults: bool) -> NormalizedWeights {
    if use_defaults {
        return DEFAULT_WEIGHTS;
    }

    let total = raw.clinical + raw.insurance + raw.personal;
    if total == 0.0 {
        return ZERO_TOTAL_FALLBACK;
    }

    NormalizedWeights {
        clinical: raw.clinical / total * 100.0,
        insurance: raw.insurance / total * 100.0,
        personal: raw.personal / total * 100.0,
    }
}

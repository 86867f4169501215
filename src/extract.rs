// src/extract.rs
//! Deterministic score extraction from free-text patient notes.
//!
//! This is the offline fallback for the AI extraction path: a keyword
//! lexicon per criterion shifts a neutral baseline up or down, a short
//! negation window inverts matched terms ("no severe pain" must not read
//! as urgent), and explicit `criterion: NN` markers in the notes override
//! the lexicon entirely for that criterion.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::scoring::CriterionScores;

/// Starting point for every criterion before any keyword evidence.
pub const BASELINE_SCORE: f32 = 50.0;

/// How many tokens back a negator still inverts a match.
const NEGATION_WINDOW: usize = 3;

#[derive(serde::Deserialize)]
struct Lexicon {
    clinical: HashMap<String, i32>,
    insurance: HashMap<String, i32>,
    personal: HashMap<String, i32>,
}

static LEXICON: Lazy<Lexicon> = Lazy::new(|| {
    let raw = include_str!("../extraction_lexicon.json");
    serde_json::from_str::<Lexicon>(raw).expect("valid extraction lexicon")
});

// Explicit markers like "clinical: 80", "insurance score = 40",
// "preference 70". First match wins per criterion.
static CLINICAL_OVERRIDE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:clinical|urgency)\s*(?:score)?\s*[:=]?\s*(\d{1,3})\b").expect("regex")
});
static INSURANCE_OVERRIDE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:insurance|coverage)\s*(?:score)?\s*[:=]?\s*(\d{1,3})\b").expect("regex")
});
static PERSONAL_OVERRIDE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:personal|preference)\s*(?:score)?\s*[:=]?\s*(\d{1,3})\b").expect("regex")
});

/// Extract the three criterion scores from unstructured notes.
/// Always returns values clamped to [0,100].
pub fn extract_scores(notes: &str) -> CriterionScores {
    let tokens: Vec<String> = tokenize(notes).collect();

    CriterionScores {
        clinical: criterion_score(notes, &tokens, &LEXICON.clinical, &CLINICAL_OVERRIDE),
        insurance: criterion_score(notes, &tokens, &LEXICON.insurance, &INSURANCE_OVERRIDE),
        personal: criterion_score(notes, &tokens, &LEXICON.personal, &PERSONAL_OVERRIDE),
    }
}

fn criterion_score(
    notes: &str,
    tokens: &[String],
    lexicon: &HashMap<String, i32>,
    over: &Regex,
) -> f32 {
    if let Some(explicit) = explicit_override(notes, over) {
        return explicit;
    }

    let mut score = BASELINE_SCORE;
    for i in 0..tokens.len() {
        let base = *lexicon.get(tokens[i].as_str()).unwrap_or(&0);
        if base == 0 {
            continue;
        }
        // Negator within the lookback window inverts the term.
        let negated = (1..=NEGATION_WINDOW).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
        let adj = if negated { -base } else { base };
        score += adj as f32;
    }
    score.clamp(0.0, 100.0)
}

fn explicit_override(notes: &str, re: &Regex) -> Option<f32> {
    let caps = re.captures(notes)?;
    let value: f32 = caps.get(1)?.as_str().parse().ok()?;
    Some(value.clamp(0.0, 100.0))
}

/// Alphanumeric tokens, lower-cased.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not" | "no" | "never" | "denies" | "without" | "isn't" | "wasn't" | "hasn't" | "won't"
    )
}

// src/scoring/rules.rs
//! Fixed Mamdani rule bank over fuzzified criteria.
//!
//! Rules are data, not branches: each entry names its antecedent (fuzzy
//! AND = min, fuzzy OR = max) and the output bucket it feeds. Buckets
//! accumulate by max, so evaluation order never matters and no rule can
//! lower a bucket. The whole bank is always evaluated, no short-circuit.

use super::fuzzify::{FuzzifiedCriteria, FuzzySet};
use super::Criterion::{Clinical, Insurance, Personal};
use super::Level::{High, Low, Medium};
use super::{Criterion, Level};

/// One `criterion IS level` operand of an antecedent.
#[derive(Debug, Clone, Copy)]
pub struct Term {
    pub criterion: Criterion,
    pub level: Level,
}

/// Antecedent combinator: `Any` is fuzzy OR, `All` is fuzzy AND.
#[derive(Debug, Clone, Copy)]
pub enum When {
    Any(&'static [Term]),
    All(&'static [Term]),
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub when: When,
    pub then: Level,
}

const fn t(criterion: Criterion, level: Level) -> Term {
    Term { criterion, level }
}

/// The referral priority rule bank.
pub static RULE_BANK: [Rule; 10] = [
    Rule {
        name: "urgent case or strong patient wish",
        when: When::Any(&[t(Clinical, High), t(Personal, High)]),
        then: High,
    },
    Rule {
        name: "moderate case with good coverage",
        when: When::All(&[t(Clinical, Medium), t(Insurance, High)]),
        then: Medium,
    },
    Rule {
        name: "urgent case despite poor coverage",
        when: When::All(&[t(Clinical, High), t(Insurance, Low)]),
        then: Medium,
    },
    Rule {
        name: "moderate case, moderate wish",
        when: When::All(&[t(Personal, Medium), t(Clinical, Medium)]),
        then: Medium,
    },
    Rule {
        name: "mild case",
        when: When::All(&[t(Clinical, Low)]),
        then: Low,
    },
    Rule {
        name: "reluctant patient, average coverage",
        when: When::All(&[t(Personal, Low), t(Insurance, Medium)]),
        then: Low,
    },
    Rule {
        name: "poor coverage, moderate case",
        when: When::All(&[t(Insurance, Low), t(Clinical, Medium)]),
        then: Low,
    },
    Rule {
        name: "everything speaks for referral",
        when: When::All(&[t(Clinical, High), t(Insurance, High), t(Personal, High)]),
        then: High,
    },
    Rule {
        name: "everything average",
        when: When::All(&[
            t(Clinical, Medium),
            t(Insurance, Medium),
            t(Personal, Medium),
        ]),
        then: Medium,
    },
    Rule {
        name: "everything low",
        when: When::All(&[t(Clinical, Low), t(Insurance, Low), t(Personal, Low)]),
        then: Low,
    },
];

impl When {
    /// Evaluated truth value of the antecedent against the fuzzified inputs.
    pub fn firing_strength(&self, inputs: &FuzzifiedCriteria) -> f32 {
        match self {
            When::All(terms) => terms
                .iter()
                .map(|t| inputs.degree(t.criterion, t.level))
                .fold(1.0, f32::min),
            When::Any(terms) => terms
                .iter()
                .map(|t| inputs.degree(t.criterion, t.level))
                .fold(0.0, f32::max),
        }
    }
}

/// Evaluate the full bank and accumulate the output priority set.
pub fn apply_rules(inputs: &FuzzifiedCriteria) -> FuzzySet {
    let mut priority = FuzzySet::default();
    for rule in &RULE_BANK {
        let strength = rule.when.firing_strength(inputs);
        let bucket = match rule.then {
            Level::Low => &mut priority.low,
            Level::Medium => &mut priority.medium,
            Level::High => &mut priority.high,
        };
        *bucket = bucket.max(strength);
    }
    priority
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{fuzzify, CriterionScores};

    const EPS: f32 = 1e-6;

    fn priority_for(clinical: f32, insurance: f32, personal: f32) -> FuzzySet {
        apply_rules(&fuzzify(&CriterionScores::new(clinical, insurance, personal)))
    }

    #[test]
    fn bank_covers_all_buckets() {
        let mut low = 0;
        let mut medium = 0;
        let mut high = 0;
        for rule in &RULE_BANK {
            match rule.then {
                Level::Low => low += 1,
                Level::Medium => medium += 1,
                Level::High => high += 1,
            }
        }
        assert_eq!((low, medium, high), (4, 4, 2));
    }

    #[test]
    fn rule_names_are_unique() {
        let mut names: Vec<&str> = RULE_BANK.iter().map(|r| r.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), RULE_BANK.len());
    }

    #[test]
    fn all_medium_fires_the_consensus_rule_at_full_strength() {
        let p = priority_for(50.0, 50.0, 50.0);
        assert_eq!(p.medium, 1.0);
        assert_eq!(p.low, 0.0);
        assert_eq!(p.high, 0.0);
    }

    #[test]
    fn and_takes_the_minimum_operand() {
        // clinical.medium = 1.0, insurance.high = 0.4 → rule 2 fires at 0.4.
        let inputs = fuzzify(&CriterionScores::new(50.0, 60.0, 0.0));
        let strength = RULE_BANK[1].when.firing_strength(&inputs);
        assert!((strength - 0.4).abs() < EPS, "got {strength}");
    }

    #[test]
    fn or_takes_the_maximum_operand() {
        // clinical.high = 0.2, personal.high = 0.8 → rule 1 fires at 0.8.
        let inputs = fuzzify(&CriterionScores::new(55.0, 0.0, 70.0));
        let strength = RULE_BANK[0].when.firing_strength(&inputs);
        assert!((strength - 0.8).abs() < EPS, "got {strength}");
    }

    #[test]
    fn buckets_accumulate_by_max_not_sum() {
        // Several low rules fire here; the bucket must be their max, which
        // cannot exceed any single membership degree (all ≤ 1).
        let p = priority_for(10.0, 10.0, 10.0);
        assert!((p.low - 0.4).abs() < EPS, "low bucket {}", p.low);
        assert_eq!(p.medium, 0.0);
        assert_eq!(p.high, 0.0);
    }

    #[test]
    fn no_rule_ever_decreases_a_bucket() {
        // Strong high evidence plus weak low evidence: the high bucket keeps
        // the stronger of its two feeding rules.
        let p = priority_for(80.0, 80.0, 80.0);
        assert!(p.high > 0.0);
        // clinical.high(80) = 0.8 via rule 1; rule 8 fires at min of three
        // 0.8s = 0.8 as well.
        assert!((p.high - 0.8).abs() < EPS);
    }
}

// src/history.rs
//! In-memory log of recent assessments for the /debug endpoints.

use serde::Serialize;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::scoring::{Assessment, Level};

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentRecord {
    pub ts_unix: u64,
    pub ahp_score: i32,
    pub recommended: bool,
    pub fuzzy_score: i32,
    pub fuzzy_level: Level,
}

#[derive(Debug)]
pub struct ScoreHistory {
    inner: Mutex<Vec<AssessmentRecord>>,
    cap: usize,
}

impl ScoreHistory {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: Mutex::new(Vec::with_capacity(cap.min(10_000))),
            cap: cap.min(10_000),
        }
    }

    pub fn push(&self, a: &Assessment) {
        let entry = AssessmentRecord {
            ts_unix: now_unix(),
            ahp_score: a.ahp.score,
            recommended: a.ahp.recommended,
            fuzzy_score: a.fuzzy.score,
            fuzzy_level: a.fuzzy.level,
        };

        let mut v = self.inner.lock().expect("history mutex poisoned");
        v.push(entry);
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
    }

    pub fn snapshot_last_n(&self, n: usize) -> Vec<AssessmentRecord> {
        let v = self.inner.lock().expect("history mutex poisoned");
        let start = v.len().saturating_sub(n);
        v[start..].to_vec()
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{assess, CriterionScores, DEFAULT_WEIGHTS};

    fn sample(clinical: f32) -> Assessment {
        assess(
            &CriterionScores::new(clinical, 50.0, 50.0),
            &DEFAULT_WEIGHTS,
        )
    }

    #[test]
    fn keeps_only_the_newest_entries() {
        let h = ScoreHistory::with_capacity(2);
        h.push(&sample(10.0));
        h.push(&sample(50.0));
        h.push(&sample(90.0));

        let snap = h.snapshot_last_n(10);
        assert_eq!(snap.len(), 2);
        // The oldest entry (clinical 10 → lowest AHP) must be gone.
        assert!(snap.iter().all(|r| r.ahp_score >= 50));
    }

    #[test]
    fn snapshot_returns_at_most_n() {
        let h = ScoreHistory::with_capacity(100);
        for _ in 0..5 {
            h.push(&sample(50.0));
        }
        assert_eq!(h.snapshot_last_n(3).len(), 3);
        assert_eq!(h.snapshot_last_n(50).len(), 5);
    }
}

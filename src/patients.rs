// src/patients.rs
//! In-memory patient store: CRUD plus name search.
//!
//! Persistence is a collaborator concern outside this service; the store
//! keeps the same narrow interface a database-backed one would expose.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Names at least this similar count as a match when no substring hits.
const NAME_SIMILARITY_FLOOR: f64 = 0.85;

#[derive(Debug, Clone, Serialize)]
pub struct Patient {
    pub id: u64,
    pub name: String,
    pub age: u32,
    pub notes: String,
    pub is_active: bool,
    pub last_visit: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientInput {
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub last_visit: Option<DateTime<Utc>>,
}

/// Partial update; absent fields keep their current values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
    pub last_visit: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct PatientStore {
    inner: Mutex<Vec<Patient>>,
    next_id: AtomicU64,
}

impl PatientStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn add(&self, input: PatientInput) -> Patient {
        let patient = Patient {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            name: input.name,
            age: input.age,
            notes: input.notes,
            is_active: input.is_active.unwrap_or(true),
            last_visit: input.last_visit.unwrap_or_else(Utc::now),
        };
        let mut v = self.inner.lock().expect("patient store poisoned");
        v.push(patient.clone());
        patient
    }

    /// All patients, most recently visited first.
    pub fn list(&self) -> Vec<Patient> {
        let v = self.inner.lock().expect("patient store poisoned");
        let mut out = v.clone();
        out.sort_by(|a, b| b.last_visit.cmp(&a.last_visit));
        out
    }

    pub fn get(&self, id: u64) -> Option<Patient> {
        let v = self.inner.lock().expect("patient store poisoned");
        v.iter().find(|p| p.id == id).cloned()
    }

    pub fn update(&self, id: u64, update: PatientUpdate) -> Option<Patient> {
        let mut v = self.inner.lock().expect("patient store poisoned");
        let p = v.iter_mut().find(|p| p.id == id)?;
        if let Some(name) = update.name {
            p.name = name;
        }
        if let Some(age) = update.age {
            p.age = age;
        }
        if let Some(notes) = update.notes {
            p.notes = notes;
        }
        if let Some(is_active) = update.is_active {
            p.is_active = is_active;
        }
        if let Some(last_visit) = update.last_visit {
            p.last_visit = last_visit;
        }
        Some(p.clone())
    }

    pub fn remove(&self, id: u64) -> bool {
        let mut v = self.inner.lock().expect("patient store poisoned");
        let before = v.len();
        v.retain(|p| p.id != id);
        v.len() < before
    }

    /// Case-insensitive substring search; when nothing matches, fall back
    /// to near-matches so a typo still finds the record.
    pub fn search_by_name(&self, query: &str) -> Vec<Patient> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return Vec::new();
        }

        let v = self.inner.lock().expect("patient store poisoned");
        let mut hits: Vec<Patient> = v
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&q))
            .cloned()
            .collect();

        if hits.is_empty() {
            hits = v
                .iter()
                .filter(|p| strsim::jaro_winkler(&p.name.to_lowercase(), &q) >= NAME_SIMILARITY_FLOOR)
                .cloned()
                .collect();
        }

        hits.sort_by(|a, b| b.last_visit.cmp(&a.last_visit));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn input(name: &str, age: u32) -> PatientInput {
        PatientInput {
            name: name.to_string(),
            age,
            notes: String::new(),
            is_active: None,
            last_visit: None,
        }
    }

    #[test]
    fn add_assigns_increasing_ids_and_defaults() {
        let store = PatientStore::new();
        let a = store.add(input("Alice Tan", 34));
        let b = store.add(input("Budi Santoso", 52));
        assert!(b.id > a.id);
        assert!(a.is_active, "new patients default to active");
    }

    #[test]
    fn crud_round_trip() {
        let store = PatientStore::new();
        let p = store.add(input("Citra Dewi", 41));

        let fetched = store.get(p.id).expect("patient exists");
        assert_eq!(fetched.name, "Citra Dewi");

        let updated = store
            .update(
                p.id,
                PatientUpdate {
                    age: Some(42),
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .expect("update hits");
        assert_eq!(updated.age, 42);
        assert!(!updated.is_active);
        assert_eq!(updated.name, "Citra Dewi", "untouched fields survive");

        assert!(store.remove(p.id));
        assert!(store.get(p.id).is_none());
        assert!(!store.remove(p.id), "second delete is a no-op");
    }

    #[test]
    fn list_orders_by_last_visit_descending() {
        let store = PatientStore::new();
        let older = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();

        store.add(PatientInput {
            last_visit: Some(older),
            ..input("Old Visit", 60)
        });
        store.add(PatientInput {
            last_visit: Some(newer),
            ..input("New Visit", 30)
        });

        let all = store.list();
        assert_eq!(all[0].name, "New Visit");
        assert_eq!(all[1].name, "Old Visit");
    }

    #[test]
    fn search_matches_substring_case_insensitively() {
        let store = PatientStore::new();
        store.add(input("Dewi Lestari", 29));
        store.add(input("Rahmat Hidayat", 45));

        let hits = store.search_by_name("dewi");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Dewi Lestari");
    }

    #[test]
    fn search_falls_back_to_near_matches() {
        let store = PatientStore::new();
        store.add(input("Siti Rahayu", 37));

        // One transposition away; substring search misses, fuzzy does not.
        let hits = store.search_by_name("siti rahayu");
        assert_eq!(hits.len(), 1);
        let hits = store.search_by_name("siti rahayo");
        assert_eq!(hits.len(), 1, "near match should still hit");

        assert!(store.search_by_name("completely different").is_empty());
    }
}

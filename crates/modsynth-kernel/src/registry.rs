//! Provenance registry: which loader generated which name.
//!
//! The registry is an explicit service shared through `Arc`. Loaders write
//! to it after a successful generation; anyone may query it. A process-wide
//! default instance backs the free query functions in the crate root, and
//! tests build private instances so they never observe each other.
//!
//! Entries are written once. Under [`RegistryPolicy::FirstWriterWins`] a
//! second record for the same name is ignored; under
//! [`RegistryPolicy::RejectDuplicates`] a record from a different loader is
//! an error. Check and write happen under one write lock, so racing
//! generations of the same name leave exactly one entry.

use crate::error::RegistryError;
use crate::loader::LoaderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryPolicy {
    #[default]
    FirstWriterWins,
    RejectDuplicates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenanceRecord {
    pub name: String,
    pub loader: LoaderId,
    /// Glob of the rule that produced the name.
    pub pattern: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    AlreadyRecorded,
}

#[derive(Debug, Default)]
pub struct ProvenanceRegistry {
    policy: RegistryPolicy,
    entries: RwLock<BTreeMap<String, ProvenanceRecord>>,
}

impl ProvenanceRegistry {
    pub fn new(policy: RegistryPolicy) -> Self {
        Self {
            policy,
            entries: RwLock::default(),
        }
    }

    /// The process-wide registry used by loaders that were not given one.
    pub fn global() -> Arc<ProvenanceRegistry> {
        static GLOBAL: OnceLock<Arc<ProvenanceRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(Arc::default).clone()
    }

    pub fn policy(&self) -> RegistryPolicy {
        self.policy
    }

    pub fn record(
        &self,
        name: &str,
        loader: &LoaderId,
        pattern: &str,
    ) -> Result<RecordOutcome, RegistryError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = entries.get(name) {
            if self.policy == RegistryPolicy::RejectDuplicates && existing.loader != *loader {
                return Err(RegistryError::DuplicateGeneration {
                    name: name.to_string(),
                    existing: existing.loader.clone(),
                    attempted: loader.clone(),
                });
            }
            return Ok(RecordOutcome::AlreadyRecorded);
        }
        entries.insert(
            name.to_string(),
            ProvenanceRecord {
                name: name.to_string(),
                loader: loader.clone(),
                pattern: pattern.to_string(),
                recorded_at: Utc::now(),
            },
        );
        Ok(RecordOutcome::Recorded)
    }

    pub fn generated_by(&self, name: &str) -> Option<LoaderId> {
        self.read(|entries| entries.get(name).map(|record| record.loader.clone()))
    }

    pub fn was_generated(&self, name: &str) -> bool {
        self.read(|entries| entries.contains_key(name))
    }

    pub fn record_for(&self, name: &str) -> Option<ProvenanceRecord> {
        self.read(|entries| entries.get(name).cloned())
    }

    /// Names generated by `loader`, sorted.
    pub fn names_generated_by(&self, loader: &LoaderId) -> Vec<String> {
        self.read(|entries| {
            entries
                .values()
                .filter(|record| record.loader == *loader)
                .map(|record| record.name.clone())
                .collect()
        })
    }

    /// All records, sorted by name.
    pub fn snapshot(&self) -> Vec<ProvenanceRecord> {
        self.read(|entries| entries.values().cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.read(BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.read(BTreeMap::is_empty)
    }

    /// Forget every record. Meant for test harnesses.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn read<T>(&self, f: impl FnOnce(&BTreeMap<String, ProvenanceRecord>) -> T) -> T {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        f(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    fn id(label: &str) -> LoaderId {
        LoaderId::new(label)
    }

    #[test]
    fn unknown_names_have_no_provenance() {
        let registry = ProvenanceRegistry::default();
        assert!(!registry.was_generated("Never::Made"));
        assert_eq!(registry.generated_by("Never::Made"), None);
        assert!(registry.record_for("Never::Made").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn first_writer_wins_silently() {
        let registry = ProvenanceRegistry::default();
        assert_eq!(
            registry.record("A::B", &id("first"), "A::*").expect("record"),
            RecordOutcome::Recorded
        );
        assert_eq!(
            registry.record("A::B", &id("second"), "**").expect("record"),
            RecordOutcome::AlreadyRecorded
        );
        assert_eq!(registry.generated_by("A::B"), Some(id("first")));
        let record = registry.record_for("A::B").expect("record exists");
        assert_eq!(record.pattern, "A::*");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn reject_duplicates_refuses_other_loaders_only() {
        let registry = ProvenanceRegistry::new(RegistryPolicy::RejectDuplicates);
        registry.record("A::B", &id("first"), "A::*").expect("record");
        assert_eq!(
            registry.record("A::B", &id("first"), "A::*").expect("same loader"),
            RecordOutcome::AlreadyRecorded
        );
        let err = registry
            .record("A::B", &id("second"), "**")
            .expect_err("different loader should be rejected");
        assert!(matches!(
            err,
            RegistryError::DuplicateGeneration { ref existing, .. } if *existing == id("first")
        ));
        assert_eq!(registry.generated_by("A::B"), Some(id("first")));
    }

    #[test]
    fn names_generated_by_filters_and_sorts() {
        let registry = ProvenanceRegistry::default();
        registry.record("Z::One", &id("a"), "**").expect("record");
        registry.record("B::Two", &id("b"), "**").expect("record");
        registry.record("A::Three", &id("a"), "**").expect("record");
        assert_eq!(registry.names_generated_by(&id("a")), ["A::Three", "Z::One"]);
        let names: Vec<_> = registry.snapshot().into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["A::Three", "B::Two", "Z::One"]);
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn racing_records_leave_one_entry() {
        let registry = Arc::new(ProvenanceRegistry::default());
        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|n| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    registry
                        .record("Race::Name", &LoaderId::new(format!("loader-{n}")), "**")
                        .expect("first writer wins never errors")
                })
            })
            .collect();
        let outcomes: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread should finish"))
            .collect();
        assert_eq!(
            outcomes
                .iter()
                .filter(|o| **o == RecordOutcome::Recorded)
                .count(),
            1
        );
        assert_eq!(registry.len(), 1);
        assert!(registry.was_generated("Race::Name"));
    }
}

//! In-memory progress for long-running imports.
//!
//! Imports run synchronously inside one request; a polling endpoint reads
//! coarse progress out of this table by opaque import id. The table is an
//! explicit injectable component on application state, not a hidden global.
//! Entries older than an hour are dropped on every write.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportPhase {
    Validating,
    Importing,
    Completed,
    Failed,
}

#[derive(Clone, Debug, Serialize)]
pub struct ImportProgress {
    pub import_id: String,
    pub phase: ImportPhase,
    /// Entity type currently being replayed, while importing.
    pub current_type: Option<String>,
    pub created: BTreeMap<String, usize>,
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Progress entries keyed by import id. Never shared across concurrent
/// imports beyond each one writing its own key.
#[derive(Debug, Default)]
pub struct ImportProgressTable {
    entries: Mutex<HashMap<String, ImportProgress>>,
}

impl ImportProgressTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, import_id: &str) {
        self.write(import_id, |entry| {
            entry.phase = ImportPhase::Validating;
        });
    }

    pub fn importing(&self, import_id: &str, current_type: &str) {
        self.write(import_id, |entry| {
            entry.phase = ImportPhase::Importing;
            entry.current_type = Some(current_type.to_string());
        });
    }

    pub fn record_created(&self, import_id: &str, entity_type: &str, count: usize) {
        self.write(import_id, |entry| {
            entry.created.insert(entity_type.to_string(), count);
        });
    }

    pub fn complete(&self, import_id: &str, created: BTreeMap<String, usize>) {
        self.write(import_id, |entry| {
            entry.phase = ImportPhase::Completed;
            entry.current_type = None;
            entry.created = created;
        });
    }

    pub fn fail(&self, import_id: &str, message: &str) {
        self.write(import_id, |entry| {
            entry.phase = ImportPhase::Failed;
            entry.current_type = None;
            entry.error = Some(message.to_string());
        });
    }

    pub fn get(&self, import_id: &str) -> Option<ImportProgress> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.get(import_id).cloned()
    }

    fn write<F: FnOnce(&mut ImportProgress)>(&self, import_id: &str, apply: F) {
        let now = Utc::now();
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        evict_stale(&mut entries, now);

        let entry = entries
            .entry(import_id.to_string())
            .or_insert_with(|| ImportProgress {
                import_id: import_id.to_string(),
                phase: ImportPhase::Validating,
                current_type: None,
                created: BTreeMap::new(),
                error: None,
                updated_at: now,
            });
        apply(entry);
        entry.updated_at = now;
    }
}

fn evict_stale(entries: &mut HashMap<String, ImportProgress>, now: DateTime<Utc>) {
    let cutoff = now - Duration::hours(1);
    entries.retain(|_, entry| entry.updated_at > cutoff);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let table = ImportProgressTable::new();
        table.start("imp-1");
        assert_eq!(table.get("imp-1").expect("entry").phase, ImportPhase::Validating);

        table.importing("imp-1", "Application");
        let entry = table.get("imp-1").expect("entry");
        assert_eq!(entry.phase, ImportPhase::Importing);
        assert_eq!(entry.current_type.as_deref(), Some("Application"));

        table.record_created("imp-1", "Application", 3);
        table.complete("imp-1", BTreeMap::from([("Application".to_string(), 3)]));
        let entry = table.get("imp-1").expect("entry");
        assert_eq!(entry.phase, ImportPhase::Completed);
        assert_eq!(entry.created.get("Application"), Some(&3));
        assert!(entry.current_type.is_none());
    }

    #[test]
    fn test_failure_records_message() {
        let table = ImportProgressTable::new();
        table.start("imp-2");
        table.fail("imp-2", "checksum mismatch for resume.pdf");

        let entry = table.get("imp-2").expect("entry");
        assert_eq!(entry.phase, ImportPhase::Failed);
        assert!(entry.error.as_deref().expect("message").contains("checksum"));
    }

    #[test]
    fn test_unknown_import_id() {
        let table = ImportProgressTable::new();
        assert!(table.get("nope").is_none());
    }

    #[test]
    fn test_eviction_drops_entries_older_than_an_hour() {
        let now = Utc::now();
        let mut entries = HashMap::new();
        entries.insert(
            "stale".to_string(),
            ImportProgress {
                import_id: "stale".to_string(),
                phase: ImportPhase::Completed,
                current_type: None,
                created: BTreeMap::new(),
                error: None,
                updated_at: now - Duration::hours(2),
            },
        );
        entries.insert(
            "fresh".to_string(),
            ImportProgress {
                import_id: "fresh".to_string(),
                phase: ImportPhase::Importing,
                current_type: None,
                created: BTreeMap::new(),
                error: None,
                updated_at: now - Duration::minutes(5),
            },
        );

        evict_stale(&mut entries, now);
        assert!(!entries.contains_key("stale"));
        assert!(entries.contains_key("fresh"));
    }

    #[test]
    fn test_writes_evict_stale_entries() {
        let table = ImportProgressTable::new();
        table.start("old");
        {
            let mut entries = table
                .entries
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(entry) = entries.get_mut("old") {
                entry.updated_at = Utc::now() - Duration::hours(3);
            }
        }

        table.start("new");
        assert!(table.get("old").is_none());
        assert!(table.get("new").is_some());
    }
}

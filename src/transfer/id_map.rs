//! Per-import translation table from original to freshly generated ids.

use std::collections::HashMap;

/// Maps `(entity type, original id)` to the id generated during this import.
///
/// Built incrementally as records are created and consulted by every later
/// foreign-key rewrite. Scoped to a single import run; never persisted and
/// never shared between concurrent imports.
#[derive(Debug, Default)]
pub struct IdMap {
    entries: HashMap<(String, String), String>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mapping. Re-adding the same key overwrites.
    pub fn add(&mut self, entity_type: &str, original_id: &str, new_id: &str) {
        self.entries.insert(
            (entity_type.to_string(), original_id.to_string()),
            new_id.to_string(),
        );
    }

    pub fn get(&self, entity_type: &str, original_id: &str) -> Option<&str> {
        self.entries
            .get(&(entity_type.to_string(), original_id.to_string()))
            .map(String::as_str)
    }

    pub fn contains(&self, entity_type: &str, original_id: &str) -> bool {
        self.get(entity_type, original_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get() {
        let mut map = IdMap::new();
        map.add("Application", "old-1", "new-1");

        assert_eq!(map.get("Application", "old-1"), Some("new-1"));
        assert!(map.contains("Application", "old-1"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_missing_mapping() {
        let map = IdMap::new();
        assert_eq!(map.get("Application", "old-1"), None);
        assert!(!map.contains("Application", "old-1"));
        assert!(map.is_empty());
    }

    #[test]
    fn test_types_are_distinct_namespaces() {
        let mut map = IdMap::new();
        map.add("Application", "1", "app-new");
        map.add("Round", "1", "round-new");

        assert_eq!(map.get("Application", "1"), Some("app-new"));
        assert_eq!(map.get("Round", "1"), Some("round-new"));
    }

    #[test]
    fn test_overwrite_allowed() {
        let mut map = IdMap::new();
        map.add("Status", "s1", "first");
        map.add("Status", "s1", "second");

        assert_eq!(map.get("Status", "s1"), Some("second"));
        assert_eq!(map.len(), 1);
    }
}

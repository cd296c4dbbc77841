//! Entity type registry with explicit topological ordering.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DatabaseTransaction};
use serde_json::{Map, Value as JsonValue};

use crate::errors::TransferResult;

use super::id_map::IdMap;

/// How records of an entity type are tied back to their owning user.
/// Declared per type; export derives its query shape from this.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ownership {
    /// Rows carry a `user_id` column filtered directly.
    UserColumn,
    /// The type is the account type itself; the row is the user.
    SelfUser,
    /// Owned through the parent application.
    ViaApplication,
    /// Owned through a round, then its application.
    ViaRound,
}

/// Id pair produced by staging one imported record.
#[derive(Debug, Clone)]
pub struct CreatedRecord {
    pub new_id: String,
    pub original_id: Option<String>,
}

/// Schema-aware adapter for one registered entity type.
///
/// Descriptors own everything type-specific: how to query a user's rows,
/// which relationships get expanded one level deep on export, which columns
/// are foreign keys and what type they reference, and which columns hold
/// file store paths.
#[async_trait]
pub trait EntityDescriptor: Send + Sync {
    /// Registry name, PascalCase singular ("Application").
    fn type_name(&self) -> &'static str;

    fn ownership(&self) -> Ownership;

    /// Explicit foreign-key column to referenced type name mapping. Columns
    /// not listed here fall back to the `*_id` name heuristic on import.
    fn foreign_keys(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// Columns holding upload-root-relative file paths.
    fn file_fields(&self) -> &'static [&'static str] {
        &[]
    }

    /// All records the user owns, serialized with one level of relationship
    /// expansion and the original id stashed on each record.
    async fn export_for_user(
        &self,
        db: &DatabaseConnection,
        user_id: &str,
    ) -> TransferResult<Vec<JsonValue>>;

    /// Stage one serialized record inside the import transaction. The commit
    /// stays with the caller.
    async fn import_record(
        &self,
        txn: &DatabaseTransaction,
        record: &Map<String, JsonValue>,
        user_id: &str,
        id_map: &IdMap,
    ) -> TransferResult<CreatedRecord>;
}

/// A registered entity type and its topological rank.
#[derive(Clone)]
pub struct Registration {
    pub order: i32,
    pub descriptor: Arc<dyn EntityDescriptor>,
}

/// Ordered collection of entity registrations.
///
/// Lower ranks are parents: a type must never rank below a type that holds a
/// foreign key to it. The registry does not verify acyclicity; callers are
/// responsible for declaring a valid order.
#[derive(Clone, Default)]
pub struct EntityRegistry {
    entries: Vec<Registration>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type at a rank. Idempotent per type name: registering an
    /// already-known name replaces its rank and descriptor in place, keeping
    /// the original position for tie breaks.
    pub fn register(&mut self, order: i32, descriptor: Arc<dyn EntityDescriptor>) {
        let name = descriptor.type_name();
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|r| r.descriptor.type_name() == name)
        {
            existing.order = order;
            existing.descriptor = descriptor;
        } else {
            self.entries.push(Registration { order, descriptor });
        }
    }

    /// All registrations ascending by rank. Equal ranks keep registration
    /// order (stable sort).
    pub fn ordered(&self) -> Vec<&Registration> {
        let mut out: Vec<&Registration> = self.entries.iter().collect();
        out.sort_by_key(|r| r.order);
        out
    }

    pub fn get(&self, type_name: &str) -> Option<&Registration> {
        self.entries
            .iter()
            .find(|r| r.descriptor.type_name() == type_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

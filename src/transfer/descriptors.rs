//! Descriptors for every entity type that travels through an archive.
//!
//! Registry ranks are topological: statuses and round types come before the
//! applications and rounds that reference them, applications before their
//! rounds, rounds before their media. Import replays types in this order so
//! every child foreign key can find its parent's fresh id in the id map.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, JoinType,
    ModelTrait, QueryFilter, QuerySelect, RelationTrait,
};
use serde_json::{Map, Value as JsonValue};

use crate::database::entities::{
    applications, job_leads, profiles, round_media, round_types, rounds, status_events, statuses,
    users,
};
use crate::errors::TransferResult;

use super::id_map::IdMap;
use super::registry::{CreatedRecord, EntityDescriptor, EntityRegistry, Ownership};
use super::serializer;

/// Registry wired with every archivable entity type at its topological rank.
pub fn default_registry() -> EntityRegistry {
    let mut registry = EntityRegistry::new();
    registry.register(0, Arc::new(UserDescriptor));
    registry.register(10, Arc::new(StatusDescriptor));
    registry.register(20, Arc::new(RoundTypeDescriptor));
    registry.register(30, Arc::new(ProfileDescriptor));
    registry.register(40, Arc::new(JobLeadDescriptor));
    registry.register(50, Arc::new(ApplicationDescriptor));
    registry.register(60, Arc::new(RoundDescriptor));
    registry.register(70, Arc::new(RoundMediaDescriptor));
    registry.register(80, Arc::new(StatusEventDescriptor));
    registry
}

fn push_record(records: &mut Vec<JsonValue>, mut record: Map<String, JsonValue>, id: &str) {
    serializer::stash_original_id(&mut record, id);
    records.push(JsonValue::Object(record));
}

pub struct UserDescriptor;

#[async_trait]
impl EntityDescriptor for UserDescriptor {
    fn type_name(&self) -> &'static str {
        "User"
    }

    fn ownership(&self) -> Ownership {
        Ownership::SelfUser
    }

    async fn export_for_user(
        &self,
        db: &DatabaseConnection,
        user_id: &str,
    ) -> TransferResult<Vec<JsonValue>> {
        let mut records = Vec::new();
        if let Some(user) = users::Entity::find_by_id(user_id).one(db).await? {
            let mut record = serializer::serialize_model(&user);
            // Credential material never leaves the database.
            record.remove("password_hash");
            push_record(&mut records, record, &user.id);
        }
        Ok(records)
    }

    async fn import_record(
        &self,
        _txn: &DatabaseTransaction,
        _record: &Map<String, JsonValue>,
        _user_id: &str,
        _id_map: &IdMap,
    ) -> TransferResult<CreatedRecord> {
        // The engine skips this type; imported data always attaches to the
        // already-authenticated user.
        Err(crate::errors::TransferError::ImportFailed(
            "user accounts are never created by import".to_string(),
        ))
    }
}

pub struct StatusDescriptor;

#[async_trait]
impl EntityDescriptor for StatusDescriptor {
    fn type_name(&self) -> &'static str {
        "Status"
    }

    fn ownership(&self) -> Ownership {
        Ownership::UserColumn
    }

    async fn export_for_user(
        &self,
        db: &DatabaseConnection,
        user_id: &str,
    ) -> TransferResult<Vec<JsonValue>> {
        let rows = statuses::Entity::find()
            .filter(statuses::Column::UserId.eq(user_id))
            .all(db)
            .await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            push_record(&mut records, serializer::serialize_model(&row), &row.id);
        }
        Ok(records)
    }

    async fn import_record(
        &self,
        txn: &DatabaseTransaction,
        record: &Map<String, JsonValue>,
        user_id: &str,
        id_map: &IdMap,
    ) -> TransferResult<CreatedRecord> {
        let (active, new_id, original_id) = serializer::apply_record::<statuses::ActiveModel>(
            record,
            self.foreign_keys(),
            user_id,
            id_map,
        );
        active.insert(txn).await?;
        Ok(CreatedRecord {
            new_id,
            original_id,
        })
    }
}

pub struct RoundTypeDescriptor;

#[async_trait]
impl EntityDescriptor for RoundTypeDescriptor {
    fn type_name(&self) -> &'static str {
        "RoundType"
    }

    fn ownership(&self) -> Ownership {
        Ownership::UserColumn
    }

    async fn export_for_user(
        &self,
        db: &DatabaseConnection,
        user_id: &str,
    ) -> TransferResult<Vec<JsonValue>> {
        let rows = round_types::Entity::find()
            .filter(round_types::Column::UserId.eq(user_id))
            .all(db)
            .await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            push_record(&mut records, serializer::serialize_model(&row), &row.id);
        }
        Ok(records)
    }

    async fn import_record(
        &self,
        txn: &DatabaseTransaction,
        record: &Map<String, JsonValue>,
        user_id: &str,
        id_map: &IdMap,
    ) -> TransferResult<CreatedRecord> {
        let (active, new_id, original_id) = serializer::apply_record::<round_types::ActiveModel>(
            record,
            self.foreign_keys(),
            user_id,
            id_map,
        );
        active.insert(txn).await?;
        Ok(CreatedRecord {
            new_id,
            original_id,
        })
    }
}

pub struct ProfileDescriptor;

#[async_trait]
impl EntityDescriptor for ProfileDescriptor {
    fn type_name(&self) -> &'static str {
        "Profile"
    }

    fn ownership(&self) -> Ownership {
        Ownership::UserColumn
    }

    async fn export_for_user(
        &self,
        db: &DatabaseConnection,
        user_id: &str,
    ) -> TransferResult<Vec<JsonValue>> {
        let rows = profiles::Entity::find()
            .filter(profiles::Column::UserId.eq(user_id))
            .all(db)
            .await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            push_record(&mut records, serializer::serialize_model(&row), &row.id);
        }
        Ok(records)
    }

    async fn import_record(
        &self,
        txn: &DatabaseTransaction,
        record: &Map<String, JsonValue>,
        user_id: &str,
        id_map: &IdMap,
    ) -> TransferResult<CreatedRecord> {
        let (active, new_id, original_id) = serializer::apply_record::<profiles::ActiveModel>(
            record,
            self.foreign_keys(),
            user_id,
            id_map,
        );
        active.insert(txn).await?;
        Ok(CreatedRecord {
            new_id,
            original_id,
        })
    }
}

pub struct JobLeadDescriptor;

#[async_trait]
impl EntityDescriptor for JobLeadDescriptor {
    fn type_name(&self) -> &'static str {
        "JobLead"
    }

    fn ownership(&self) -> Ownership {
        Ownership::UserColumn
    }

    async fn export_for_user(
        &self,
        db: &DatabaseConnection,
        user_id: &str,
    ) -> TransferResult<Vec<JsonValue>> {
        let rows = job_leads::Entity::find()
            .filter(job_leads::Column::UserId.eq(user_id))
            .all(db)
            .await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            push_record(&mut records, serializer::serialize_model(&row), &row.id);
        }
        Ok(records)
    }

    async fn import_record(
        &self,
        txn: &DatabaseTransaction,
        record: &Map<String, JsonValue>,
        user_id: &str,
        id_map: &IdMap,
    ) -> TransferResult<CreatedRecord> {
        let (active, new_id, original_id) = serializer::apply_record::<job_leads::ActiveModel>(
            record,
            self.foreign_keys(),
            user_id,
            id_map,
        );
        active.insert(txn).await?;
        Ok(CreatedRecord {
            new_id,
            original_id,
        })
    }
}

pub struct ApplicationDescriptor;

#[async_trait]
impl EntityDescriptor for ApplicationDescriptor {
    fn type_name(&self) -> &'static str {
        "Application"
    }

    fn ownership(&self) -> Ownership {
        Ownership::UserColumn
    }

    fn foreign_keys(&self) -> &'static [(&'static str, &'static str)] {
        &[("status_id", "Status")]
    }

    fn file_fields(&self) -> &'static [&'static str] {
        &["resume_path", "cover_letter_path"]
    }

    async fn export_for_user(
        &self,
        db: &DatabaseConnection,
        user_id: &str,
    ) -> TransferResult<Vec<JsonValue>> {
        let rows = applications::Entity::find()
            .filter(applications::Column::UserId.eq(user_id))
            .all(db)
            .await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let mut record = serializer::serialize_model(&row);

            let status = row.find_related(statuses::Entity).one(db).await?;
            record.insert(
                serializer::relation_key("status"),
                status
                    .map(|s| JsonValue::Object(serializer::serialize_model(&s)))
                    .unwrap_or(JsonValue::Null),
            );

            let related_rounds = row.find_related(rounds::Entity).all(db).await?;
            record.insert(
                serializer::relation_key("rounds"),
                JsonValue::Array(
                    related_rounds
                        .iter()
                        .map(|r| JsonValue::Object(serializer::serialize_model(r)))
                        .collect(),
                ),
            );

            push_record(&mut records, record, &row.id);
        }
        Ok(records)
    }

    async fn import_record(
        &self,
        txn: &DatabaseTransaction,
        record: &Map<String, JsonValue>,
        user_id: &str,
        id_map: &IdMap,
    ) -> TransferResult<CreatedRecord> {
        let (active, new_id, original_id) = serializer::apply_record::<applications::ActiveModel>(
            record,
            self.foreign_keys(),
            user_id,
            id_map,
        );
        active.insert(txn).await?;
        Ok(CreatedRecord {
            new_id,
            original_id,
        })
    }
}

pub struct RoundDescriptor;

#[async_trait]
impl EntityDescriptor for RoundDescriptor {
    fn type_name(&self) -> &'static str {
        "Round"
    }

    fn ownership(&self) -> Ownership {
        Ownership::ViaApplication
    }

    fn foreign_keys(&self) -> &'static [(&'static str, &'static str)] {
        &[("application_id", "Application"), ("round_type_id", "RoundType")]
    }

    async fn export_for_user(
        &self,
        db: &DatabaseConnection,
        user_id: &str,
    ) -> TransferResult<Vec<JsonValue>> {
        let rows = rounds::Entity::find()
            .join(JoinType::InnerJoin, rounds::Relation::Applications.def())
            .filter(applications::Column::UserId.eq(user_id))
            .all(db)
            .await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let mut record = serializer::serialize_model(&row);

            let round_type = row.find_related(round_types::Entity).one(db).await?;
            record.insert(
                serializer::relation_key("round_type"),
                round_type
                    .map(|t| JsonValue::Object(serializer::serialize_model(&t)))
                    .unwrap_or(JsonValue::Null),
            );

            let media = row.find_related(round_media::Entity).all(db).await?;
            record.insert(
                serializer::relation_key("media"),
                JsonValue::Array(
                    media
                        .iter()
                        .map(|m| JsonValue::Object(serializer::serialize_model(m)))
                        .collect(),
                ),
            );

            push_record(&mut records, record, &row.id);
        }
        Ok(records)
    }

    async fn import_record(
        &self,
        txn: &DatabaseTransaction,
        record: &Map<String, JsonValue>,
        user_id: &str,
        id_map: &IdMap,
    ) -> TransferResult<CreatedRecord> {
        let (active, new_id, original_id) = serializer::apply_record::<rounds::ActiveModel>(
            record,
            self.foreign_keys(),
            user_id,
            id_map,
        );
        active.insert(txn).await?;
        Ok(CreatedRecord {
            new_id,
            original_id,
        })
    }
}

pub struct RoundMediaDescriptor;

#[async_trait]
impl EntityDescriptor for RoundMediaDescriptor {
    fn type_name(&self) -> &'static str {
        "RoundMedia"
    }

    fn ownership(&self) -> Ownership {
        Ownership::ViaRound
    }

    fn foreign_keys(&self) -> &'static [(&'static str, &'static str)] {
        &[("round_id", "Round")]
    }

    fn file_fields(&self) -> &'static [&'static str] {
        &["file_path"]
    }

    async fn export_for_user(
        &self,
        db: &DatabaseConnection,
        user_id: &str,
    ) -> TransferResult<Vec<JsonValue>> {
        let rows = round_media::Entity::find()
            .join(JoinType::InnerJoin, round_media::Relation::Rounds.def())
            .join(JoinType::InnerJoin, rounds::Relation::Applications.def())
            .filter(applications::Column::UserId.eq(user_id))
            .all(db)
            .await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            push_record(&mut records, serializer::serialize_model(&row), &row.id);
        }
        Ok(records)
    }

    async fn import_record(
        &self,
        txn: &DatabaseTransaction,
        record: &Map<String, JsonValue>,
        user_id: &str,
        id_map: &IdMap,
    ) -> TransferResult<CreatedRecord> {
        let (active, new_id, original_id) = serializer::apply_record::<round_media::ActiveModel>(
            record,
            self.foreign_keys(),
            user_id,
            id_map,
        );
        active.insert(txn).await?;
        Ok(CreatedRecord {
            new_id,
            original_id,
        })
    }
}

pub struct StatusEventDescriptor;

#[async_trait]
impl EntityDescriptor for StatusEventDescriptor {
    fn type_name(&self) -> &'static str {
        "StatusEvent"
    }

    fn ownership(&self) -> Ownership {
        Ownership::ViaApplication
    }

    fn foreign_keys(&self) -> &'static [(&'static str, &'static str)] {
        &[("application_id", "Application"), ("status_id", "Status")]
    }

    async fn export_for_user(
        &self,
        db: &DatabaseConnection,
        user_id: &str,
    ) -> TransferResult<Vec<JsonValue>> {
        let rows = status_events::Entity::find()
            .join(
                JoinType::InnerJoin,
                status_events::Relation::Applications.def(),
            )
            .filter(applications::Column::UserId.eq(user_id))
            .all(db)
            .await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let mut record = serializer::serialize_model(&row);

            let status = row.find_related(statuses::Entity).one(db).await?;
            record.insert(
                serializer::relation_key("status"),
                status
                    .map(|s| JsonValue::Object(serializer::serialize_model(&s)))
                    .unwrap_or(JsonValue::Null),
            );

            push_record(&mut records, record, &row.id);
        }
        Ok(records)
    }

    async fn import_record(
        &self,
        txn: &DatabaseTransaction,
        record: &Map<String, JsonValue>,
        user_id: &str,
        id_map: &IdMap,
    ) -> TransferResult<CreatedRecord> {
        let (active, new_id, original_id) = serializer::apply_record::<status_events::ActiveModel>(
            record,
            self.foreign_keys(),
            user_id,
            id_map,
        );
        active.insert(txn).await?;
        Ok(CreatedRecord {
            new_id,
            original_id,
        })
    }
}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A tracked job application. `resume_path` and `cover_letter_path` are
/// upload-root-relative paths into the content-addressed file store.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "applications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub status_id: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub job_url: Option<String>,
    pub location: Option<String>,
    pub source: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub resume_path: Option<String>,
    pub cover_letter_path: Option<String>,
    pub notes: Option<String>,
    pub applied_on: Option<ChronoDate>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::statuses::Entity",
        from = "Column::StatusId",
        to = "super::statuses::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Statuses,
    #[sea_orm(has_many = "super::rounds::Entity")]
    Rounds,
    #[sea_orm(has_many = "super::status_events::Entity")]
    StatusEvents,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::statuses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Statuses.def()
    }
}

impl Related<super::rounds::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rounds.def()
    }
}

impl Related<super::status_events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Saved job postings that have not been applied to yet. `state` is one of
/// "new", "dismissed" or "converted" (converted leads spawn an application).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "job_leads")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub state: String,
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
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const STATE_NEW: &str = "new";
pub const STATE_DISMISSED: &str = "dismissed";
pub const STATE_CONVERTED: &str = "converted";

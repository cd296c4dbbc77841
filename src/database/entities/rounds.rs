use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An interview round attached to an application. `sequence` orders the
/// rounds within an application; it is also used for archive folder names.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rounds")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub application_id: String,
    pub round_type_id: Option<String>,
    pub sequence: Option<i32>,
    pub scheduled_at: Option<ChronoDateTimeUtc>,
    pub outcome: Option<String>,
    pub notes: Option<String>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::applications::Entity",
        from = "Column::ApplicationId",
        to = "super::applications::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Applications,
    #[sea_orm(
        belongs_to = "super::round_types::Entity",
        from = "Column::RoundTypeId",
        to = "super::round_types::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    RoundTypes,
    #[sea_orm(has_many = "super::round_media::Entity")]
    RoundMedia,
}

impl Related<super::applications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Applications.def()
    }
}

impl Related<super::round_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoundTypes.def()
    }
}

impl Related<super::round_media::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoundMedia.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

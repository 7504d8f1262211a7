use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Supplier whose trucks unload at the dock.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "companies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    /// Trimmed, lower-cased name; unique
    #[sea_orm(unique)]
    pub name_key: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::unloading_event::Entity")]
    UnloadingEvents,
}

impl Related<super::unloading_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UnloadingEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

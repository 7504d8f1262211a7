use chrono::{DateTime, NaiveDateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(12))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EventType {
    #[sea_orm(string_value = "complete")]
    Complete,
    #[sea_orm(string_value = "incomplete")]
    Incomplete,
    #[sea_orm(string_value = "special")]
    Special,
}

impl Default for EventType {
    fn default() -> Self {
        Self::Complete
    }
}

/// One truck arrival recorded against a day ledger.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "unloading_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub ledger_id: Uuid,
    pub company_id: Option<Uuid>,
    pub driver_name: String,
    pub driver_phone: String,
    pub plate: String,
    pub event_type: EventType,
    pub note: String,
    /// Dock wall-clock time of arrival
    pub arrival: NaiveDateTime,
    pub duration_minutes: i32,
    pub estimated_end: NaiveDateTime,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::day_ledger::Entity",
        from = "Column::LedgerId",
        to = "super::day_ledger::Column::Id",
        on_delete = "Cascade"
    )]
    DayLedger,
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id",
        on_delete = "SetNull"
    )]
    Company,
    #[sea_orm(has_many = "super::line_item::Entity")]
    LineItems,
}

impl Related<super::day_ledger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DayLedger.def()
    }
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LineItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

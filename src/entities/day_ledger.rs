use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
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
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LedgerState {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "closed")]
    Closed,
}

/// One calendar day of unloading activity.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "day_ledgers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub ledger_date: NaiveDate,
    pub state: LedgerState,
    /// Snapshot taken at close time; stale while reopened
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_pallets: Decimal,
    pub closed_at: Option<DateTime<Utc>>,
    #[sea_orm(column_type = "Text")]
    pub notes: String,
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

impl Model {
    pub fn is_closed(&self) -> bool {
        self.state == LedgerState::Closed
    }
}

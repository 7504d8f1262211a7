use chrono::{DateTime, Utc};
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
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ProductCategory {
    #[sea_orm(string_value = "paper")]
    Paper,
    #[sea_orm(string_value = "dry-foods")]
    DryFoods,
    #[sea_orm(string_value = "beverages")]
    Beverages,
    #[sea_orm(string_value = "dairy")]
    Dairy,
    #[sea_orm(string_value = "cleaning")]
    Cleaning,
    #[sea_orm(string_value = "oils")]
    Oils,
    #[sea_orm(string_value = "snacks")]
    Snacks,
    #[sea_orm(string_value = "other")]
    Other,
}

impl Default for ProductCategory {
    fn default() -> Self {
        Self::Other
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub name_key: String,
    pub category: ProductCategory,
    pub units_per_layer: i32,
    pub layers_per_pallet: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::line_item::Entity")]
    LineItems,
}

impl Related<super::line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LineItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Units that make up one full pallet.
    pub fn full_pallet_units(&self) -> i64 {
        i64::from(self.units_per_layer) * i64::from(self.layers_per_pallet)
    }
}

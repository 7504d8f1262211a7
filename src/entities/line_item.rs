use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::services::pallets::pallet_equivalent;

/// One product's quantity within an unloading event.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "line_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub event_id: Uuid,
    pub product_id: Uuid,
    /// Position within the event, starting at 1
    pub line_no: i32,
    pub full_pallets: i32,
    pub loose_units: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::unloading_event::Entity",
        from = "Column::EventId",
        to = "super::unloading_event::Column::Id",
        on_delete = "Cascade"
    )]
    UnloadingEvent,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<super::unloading_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UnloadingEvent.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Pallet-equivalent of this line given the product's packing.
    pub fn pallet_equivalent(&self, product: &super::product::Model) -> Decimal {
        pallet_equivalent(
            i64::from(self.full_pallets),
            i64::from(self.loose_units),
            i64::from(product.units_per_layer),
            i64::from(product.layers_per_pallet),
        )
    }
}

use crate::{
    config::AppConfig,
    entities::{
        company::{self, Entity as Company},
        day_ledger::{self, Entity as DayLedger},
        line_item::{self, Entity as LineItem},
        product::{self, Entity as Product},
        unloading_event::{self, Entity as UnloadingEvent, EventType},
    },
    errors::ServiceError,
    services::{day_ledger::get_or_create_ledger, pallets},
};
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    str::FromStr,
    sync::Arc,
};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Shown in place of a company name when an event has none.
pub const NO_COMPANY: &str = "—";

const CLOCK_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct LineItemInput {
    pub product_id: Option<Uuid>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub full_pallets: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub loose_units: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct RegisterEventInput {
    pub company_id: Option<Uuid>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub driver_name: String,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub driver_phone: String,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub plate: String,
    /// complete, incomplete or special; defaults to complete
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub note: String,
    #[validate(range(min = 0, max = 1440))]
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    #[validate]
    pub items: Vec<LineItemInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct LineItemView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product: String,
    pub full_pallets: i32,
    pub loose_units: i32,
    pub pallet_equivalent: Decimal,
}

/// An unloading event with its company and items resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct EventView {
    pub id: Uuid,
    pub ledger_date: NaiveDate,
    pub company_id: Option<Uuid>,
    /// Company name, or "—" when the event has no company
    pub company: String,
    pub driver_name: String,
    pub driver_phone: String,
    pub plate: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub note: String,
    /// Arrival as HH:MM
    pub arrival: String,
    /// Estimated end as HH:MM
    pub estimated_end: String,
    pub arrived_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub duration_minutes: i32,
    pub total_pallets: Decimal,
    pub items: Vec<LineItemView>,
}

impl EventView {
    fn build(
        event: unloading_event::Model,
        ledger_date: NaiveDate,
        company: Option<&company::Model>,
        items: Vec<(line_item::Model, product::Model)>,
    ) -> Self {
        let items: Vec<LineItemView> = items
            .into_iter()
            .map(|(item, product)| LineItemView {
                pallet_equivalent: item.pallet_equivalent(&product),
                id: item.id,
                product_id: product.id,
                product: product.name,
                full_pallets: item.full_pallets,
                loose_units: item.loose_units,
            })
            .collect();
        let total_pallets = pallets::event_total(items.iter().map(|i| i.pallet_equivalent));

        Self {
            id: event.id,
            ledger_date,
            company_id: event.company_id,
            company: company
                .map(|c| c.name.clone())
                .unwrap_or_else(|| NO_COMPANY.to_string()),
            driver_name: event.driver_name,
            driver_phone: event.driver_phone,
            plate: event.plate,
            event_type: event.event_type,
            note: event.note,
            arrival: event.arrival.format(CLOCK_FORMAT).to_string(),
            estimated_end: event.estimated_end.format(CLOCK_FORMAT).to_string(),
            arrived_at: event.arrival,
            ends_at: event.estimated_end,
            duration_minutes: event.duration_minutes,
            total_pallets,
            items,
        }
    }

    pub fn has_company(&self) -> bool {
        self.company_id.is_some()
    }
}

/// Line items of the given events paired with their products, in line order.
pub(crate) async fn load_items<C: ConnectionTrait>(
    db: &C,
    event_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<(line_item::Model, product::Model)>>, ServiceError> {
    let mut by_event: HashMap<Uuid, Vec<(line_item::Model, product::Model)>> = HashMap::new();
    if event_ids.is_empty() {
        return Ok(by_event);
    }

    let rows = LineItem::find()
        .filter(line_item::Column::EventId.is_in(event_ids.iter().copied()))
        .order_by_asc(line_item::Column::EventId)
        .order_by_asc(line_item::Column::LineNo)
        .find_also_related(Product)
        .all(db)
        .await?;

    for (item, product) in rows {
        let product = product.ok_or_else(|| {
            ServiceError::InternalError(format!("Line item {} has no product", item.id))
        })?;
        by_event.entry(item.event_id).or_default().push((item, product));
    }
    Ok(by_event)
}

/// Resolves companies and items for events of one ledger, keeping their order.
pub(crate) async fn load_event_views<C: ConnectionTrait>(
    db: &C,
    ledger_date: NaiveDate,
    events: Vec<unloading_event::Model>,
) -> Result<Vec<EventView>, ServiceError> {
    let event_ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
    let company_ids: HashSet<Uuid> = events.iter().filter_map(|e| e.company_id).collect();

    let companies: HashMap<Uuid, company::Model> = if company_ids.is_empty() {
        HashMap::new()
    } else {
        Company::find()
            .filter(company::Column::Id.is_in(company_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect()
    };
    let mut items = load_items(db, &event_ids).await?;

    Ok(events
        .into_iter()
        .map(|event| {
            let company = event.company_id.and_then(|id| companies.get(&id));
            let event_items = items.remove(&event.id).unwrap_or_default();
            EventView::build(event, ledger_date, company, event_items)
        })
        .collect())
}

/// Events of a ledger, newest arrival first.
pub(crate) async fn ledger_events<C: ConnectionTrait>(
    db: &C,
    ledger: &day_ledger::Model,
) -> Result<Vec<EventView>, ServiceError> {
    let events = UnloadingEvent::find()
        .filter(unloading_event::Column::LedgerId.eq(ledger.id))
        .order_by_desc(unloading_event::Column::Arrival)
        .order_by_desc(unloading_event::Column::CreatedAt)
        .all(db)
        .await?;
    load_event_views(db, ledger.ledger_date, events).await
}

/// Truck arrivals and their line items.
#[derive(Clone)]
pub struct UnloadingService {
    db: Arc<DatabaseConnection>,
    config: Arc<AppConfig>,
}

impl UnloadingService {
    pub fn new(db: Arc<DatabaseConnection>, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    /// Records one truck arrival on the ledger for `ledger_date`.
    ///
    /// Checks run in order: ledger open, input well-formed, company exists,
    /// at least one item, every product exists. Nothing is written unless all of them pass.
    #[instrument(skip(self, input))]
    pub async fn register(
        &self,
        ledger_date: NaiveDate,
        arrival: NaiveDateTime,
        input: RegisterEventInput,
    ) -> Result<EventView, ServiceError> {
        crate::tracing::with_metrics("register_event", || {
            self.register_in_txn(ledger_date, arrival, input)
        })
        .await
    }

    async fn register_in_txn(
        &self,
        ledger_date: NaiveDate,
        arrival: NaiveDateTime,
        input: RegisterEventInput,
    ) -> Result<EventView, ServiceError> {
        let ledger = get_or_create_ledger(&*self.db, ledger_date).await?;
        let txn = self.db.begin().await?;

        // A closed day rejects every registration, well-formed or not.
        let ledger = DayLedger::find_by_id(ledger.id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Day {} not found", ledger_date)))?;
        if ledger.is_closed() {
            return Err(ServiceError::LedgerClosed(ledger_date));
        }

        input.validate()?;
        let event_type = match input.event_type.as_deref().map(str::trim) {
            None | Some("") => EventType::default(),
            Some(raw) => EventType::from_str(&raw.to_lowercase()).map_err(|_| {
                ServiceError::ValidationError(format!("Unknown event type '{}'", raw))
            })?,
        };
        let duration_minutes = input
            .duration_minutes
            .unwrap_or_else(|| i32::try_from(self.config.default_unload_minutes).unwrap_or(30));

        let company_id = input
            .company_id
            .ok_or_else(|| ServiceError::InvalidReference("A company is required".to_string()))?;
        let company = Company::find_by_id(company_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidReference(format!("Company {} does not exist", company_id))
            })?;

        if input.items.is_empty() {
            return Err(ServiceError::EmptyItems);
        }

        let mut product_ids = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let product_id = item.product_id.ok_or_else(|| {
                ServiceError::InvalidReference("Line item is missing its product".to_string())
            })?;
            product_ids.push(product_id);
        }
        let products: HashMap<Uuid, product::Model> = Product::find()
            .filter(product::Column::Id.is_in(product_ids.iter().copied()))
            .all(&txn)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        if let Some(missing) = product_ids.iter().find(|id| !products.contains_key(id)) {
            return Err(ServiceError::InvalidReference(format!(
                "Product {} does not exist",
                missing
            )));
        }

        let event = unloading_event::ActiveModel {
            id: Set(Uuid::new_v4()),
            ledger_id: Set(ledger.id),
            company_id: Set(Some(company.id)),
            driver_name: Set(input.driver_name.trim().to_string()),
            driver_phone: Set(input.driver_phone.trim().to_string()),
            plate: Set(input.plate.trim().to_uppercase()),
            event_type: Set(event_type),
            note: Set(input.note.trim().to_string()),
            arrival: Set(arrival),
            duration_minutes: Set(duration_minutes),
            estimated_end: Set(arrival + Duration::minutes(i64::from(duration_minutes))),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        let mut saved_items = Vec::with_capacity(input.items.len());
        for ((line_no, item), product_id) in (1..).zip(input.items.iter()).zip(product_ids) {
            let saved = line_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                event_id: Set(event.id),
                product_id: Set(product_id),
                line_no: Set(line_no),
                full_pallets: Set(item.full_pallets),
                loose_units: Set(item.loose_units),
            }
            .insert(&txn)
            .await?;
            if let Some(product) = products.get(&product_id) {
                saved_items.push((saved, product.clone()));
            }
        }

        txn.commit().await?;

        let view = EventView::build(event, ledger_date, Some(&company), saved_items);
        info!(
            event_id = %view.id,
            company = %view.company,
            items = view.items.len(),
            total_pallets = %view.total_pallets,
            "Unloading event registered"
        );
        Ok(view)
    }

    /// Removes an event and its items while its day is open.
    #[instrument(skip(self))]
    pub async fn delete(&self, event_id: Uuid) -> Result<(), ServiceError> {
        crate::tracing::with_metrics("delete_event", || self.delete_in_txn(event_id)).await
    }

    async fn delete_in_txn(&self, event_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let event = UnloadingEvent::find_by_id(event_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Event {} not found", event_id)))?;
        let ledger = DayLedger::find_by_id(event.ledger_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!("Event {} has no ledger", event_id))
            })?;
        if ledger.is_closed() {
            return Err(ServiceError::LedgerClosed(ledger.ledger_date));
        }

        LineItem::delete_many()
            .filter(line_item::Column::EventId.eq(event_id))
            .exec(&txn)
            .await?;
        UnloadingEvent::delete_by_id(event_id).exec(&txn).await?;

        txn.commit().await?;
        info!(event_id = %event_id, ledger_date = %ledger.ledger_date, "Unloading event deleted");
        Ok(())
    }

    /// One event with company, items and products.
    #[instrument(skip(self))]
    pub async fn get_event(&self, event_id: Uuid) -> Result<EventView, ServiceError> {
        let (event, ledger) = UnloadingEvent::find_by_id(event_id)
            .find_also_related(DayLedger)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Event {} not found", event_id)))?;
        let ledger = ledger.ok_or_else(|| {
            ServiceError::InternalError(format!("Event {} has no ledger", event_id))
        })?;

        load_event_views(&*self.db, ledger.ledger_date, vec![event])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::NotFound(format!("Event {} not found", event_id)))
    }
}

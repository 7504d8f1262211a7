use crate::{
    entities::{
        day_ledger::{self, Entity as DayLedger, LedgerState},
        unloading_event::{self, Entity as UnloadingEvent},
    },
    errors::{is_unique_violation, ServiceError},
    services::{
        pallets,
        unloading::{ledger_events, load_items, EventView},
    },
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Default number of past ledgers offered by [`DayLedgerService::list_ledgers`].
pub const RECENT_LEDGERS_LIMIT: u64 = 15;

/// Returns the ledger for `date`, creating an open one on first touch.
pub(crate) async fn get_or_create_ledger<C: ConnectionTrait>(
    db: &C,
    date: NaiveDate,
) -> Result<day_ledger::Model, ServiceError> {
    if let Some(existing) = find_ledger(db, date).await? {
        return Ok(existing);
    }
    insert_ledger(db, date).await
}

/// Inserts an open ledger for `date`, or returns the row a concurrent
/// caller inserted first.
async fn insert_ledger<C: ConnectionTrait>(
    db: &C,
    date: NaiveDate,
) -> Result<day_ledger::Model, ServiceError> {
    let model = day_ledger::ActiveModel {
        id: Set(Uuid::new_v4()),
        ledger_date: Set(date),
        state: Set(LedgerState::Open),
        total_pallets: Set(Decimal::ZERO),
        closed_at: Set(None),
        notes: Set(String::new()),
        created_at: Set(Utc::now()),
    };

    match model.insert(db).await {
        Ok(created) => {
            info!(ledger_date = %date, "Day ledger opened");
            Ok(with_day_scale(created))
        }
        Err(err) if is_unique_violation(&err) => {
            warn!(ledger_date = %date, "Concurrent ledger creation; using existing row");
            find_ledger(db, date).await?.ok_or_else(|| {
                ServiceError::InternalError(format!("Ledger {} vanished after conflict", date))
            })
        }
        Err(err) => Err(err.into()),
    }
}

async fn find_ledger<C: ConnectionTrait>(
    db: &C,
    date: NaiveDate,
) -> Result<Option<day_ledger::Model>, ServiceError> {
    Ok(DayLedger::find()
        .filter(day_ledger::Column::LedgerDate.eq(date))
        .one(db)
        .await?
        .map(with_day_scale))
}

fn with_day_scale(mut model: day_ledger::Model) -> day_ledger::Model {
    model.total_pallets = pallets::day_scale(model.total_pallets);
    model
}

/// Flips an open ledger to closed with its frozen total. Returns `false`
/// when the ledger was no longer open.
async fn freeze_if_open<C: ConnectionTrait>(
    db: &C,
    ledger_id: Uuid,
    total: Decimal,
    notes: &str,
) -> Result<bool, ServiceError> {
    let flipped = DayLedger::update_many()
        .col_expr(day_ledger::Column::State, Expr::value(LedgerState::Closed))
        .col_expr(day_ledger::Column::TotalPallets, Expr::value(total))
        .col_expr(day_ledger::Column::ClosedAt, Expr::value(Some(Utc::now())))
        .col_expr(day_ledger::Column::Notes, Expr::value(notes.trim().to_string()))
        .filter(day_ledger::Column::Id.eq(ledger_id))
        .filter(day_ledger::Column::State.eq(LedgerState::Open))
        .exec(db)
        .await?;
    Ok(flipped.rows_affected > 0)
}

/// Sum of event totals for a ledger, recomputed from the stored rows.
pub(crate) async fn live_total<C: ConnectionTrait>(
    db: &C,
    ledger_id: Uuid,
) -> Result<Decimal, ServiceError> {
    let event_ids: Vec<Uuid> = UnloadingEvent::find()
        .select_only()
        .column(unloading_event::Column::Id)
        .filter(unloading_event::Column::LedgerId.eq(ledger_id))
        .into_tuple()
        .all(db)
        .await?;

    let items = load_items(db, &event_ids).await?;
    let event_totals = event_ids.iter().map(|id| {
        pallets::event_total(
            items
                .get(id)
                .into_iter()
                .flatten()
                .map(|(item, product)| item.pallet_equivalent(product)),
        )
    });
    Ok(pallets::ledger_total(event_totals))
}

/// Ledger header without its events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct LedgerView {
    pub id: Uuid,
    pub ledger_date: NaiveDate,
    pub state: LedgerState,
    /// Total frozen at the last close
    pub total_pallets: Decimal,
    pub closed_at: Option<DateTime<Utc>>,
    pub notes: String,
}

impl From<day_ledger::Model> for LedgerView {
    fn from(model: day_ledger::Model) -> Self {
        Self {
            id: model.id,
            ledger_date: model.ledger_date,
            state: model.state,
            total_pallets: pallets::day_scale(model.total_pallets),
            closed_at: model.closed_at,
            notes: model.notes,
        }
    }
}

/// Live view of one day: state, summed total and events newest first.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DaySummary {
    pub ledger_date: NaiveDate,
    pub state: LedgerState,
    /// Sum of event totals, rounded to two places
    pub total_pallets: Decimal,
    pub closed_at: Option<DateTime<Utc>>,
    pub notes: String,
    pub event_count: usize,
    pub events: Vec<EventView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CloseDayInput {
    #[serde(default)]
    pub notes: String,
}

/// Open/closed state machine for day ledgers.
#[derive(Clone)]
pub struct DayLedgerService {
    db: Arc<DatabaseConnection>,
}

impl DayLedgerService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn get_or_create(&self, date: NaiveDate) -> Result<day_ledger::Model, ServiceError> {
        get_or_create_ledger(&*self.db, date).await
    }

    /// Existing ledger for `date`; never creates one.
    pub async fn get_by_date(&self, date: NaiveDate) -> Result<day_ledger::Model, ServiceError> {
        find_ledger(&*self.db, date)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("No ledger for {}", date)))
    }

    /// Freezes the recomputed total and flips the ledger to closed.
    ///
    /// The flip is a compare-and-set on `state = open`, so of two racing
    /// closes exactly one succeeds and the other sees `AlreadyClosed`.
    #[instrument(skip(self, notes))]
    pub async fn close(
        &self,
        date: NaiveDate,
        notes: &str,
    ) -> Result<day_ledger::Model, ServiceError> {
        crate::tracing::with_metrics("close_day", || self.close_in_txn(date, notes)).await
    }

    async fn close_in_txn(
        &self,
        date: NaiveDate,
        notes: &str,
    ) -> Result<day_ledger::Model, ServiceError> {
        let ledger = get_or_create_ledger(&*self.db, date).await?;
        let txn = self.db.begin().await?;

        let ledger = DayLedger::find_by_id(ledger.id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("No ledger for {}", date)))?;
        if ledger.is_closed() {
            return Err(ServiceError::AlreadyClosed(date));
        }

        let total = live_total(&txn, ledger.id).await?;
        if !freeze_if_open(&txn, ledger.id, total, notes).await? {
            return Err(ServiceError::AlreadyClosed(date));
        }

        let closed = DayLedger::find_by_id(ledger.id)
            .one(&txn)
            .await?
            .map(with_day_scale)
            .ok_or_else(|| ServiceError::NotFound(format!("No ledger for {}", date)))?;
        txn.commit().await?;

        info!(ledger_date = %date, total_pallets = %closed.total_pallets, "Day closed");
        Ok(closed)
    }

    /// Puts the ledger back to open from any state; the frozen total stays
    /// until the next close.
    #[instrument(skip(self))]
    pub async fn reopen(&self, date: NaiveDate) -> Result<day_ledger::Model, ServiceError> {
        crate::tracing::with_metrics("reopen_day", || self.reopen_in_txn(date)).await
    }

    async fn reopen_in_txn(&self, date: NaiveDate) -> Result<day_ledger::Model, ServiceError> {
        let ledger = get_or_create_ledger(&*self.db, date).await?;
        let txn = self.db.begin().await?;

        DayLedger::update_many()
            .col_expr(day_ledger::Column::State, Expr::value(LedgerState::Open))
            .col_expr(
                day_ledger::Column::ClosedAt,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .filter(day_ledger::Column::Id.eq(ledger.id))
            .exec(&txn)
            .await?;

        let reopened = DayLedger::find_by_id(ledger.id)
            .one(&txn)
            .await?
            .map(with_day_scale)
            .ok_or_else(|| ServiceError::NotFound(format!("No ledger for {}", date)))?;
        txn.commit().await?;

        info!(ledger_date = %date, "Day reopened");
        Ok(reopened)
    }

    /// Live summary for `date`, creating its ledger on first touch.
    #[instrument(skip(self))]
    pub async fn day_summary(&self, date: NaiveDate) -> Result<DaySummary, ServiceError> {
        let ledger = get_or_create_ledger(&*self.db, date).await?;
        let events = ledger_events(&*self.db, &ledger).await?;
        let total_pallets = pallets::ledger_total(events.iter().map(|e| e.total_pallets));

        Ok(DaySummary {
            ledger_date: ledger.ledger_date,
            state: ledger.state,
            total_pallets,
            closed_at: ledger.closed_at,
            notes: ledger.notes,
            event_count: events.len(),
            events,
        })
    }

    /// Most recent ledgers, newest first, optionally skipping one date.
    #[instrument(skip(self))]
    pub async fn list_ledgers(
        &self,
        exclude: Option<NaiveDate>,
        limit: Option<u64>,
    ) -> Result<Vec<day_ledger::Model>, ServiceError> {
        let mut select = DayLedger::find();
        if let Some(date) = exclude {
            select = select.filter(day_ledger::Column::LedgerDate.ne(date));
        }
        Ok(select
            .order_by_desc(day_ledger::Column::LedgerDate)
            .limit(limit.unwrap_or(RECENT_LEDGERS_LIMIT))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(with_day_scale)
            .collect())
    }
}

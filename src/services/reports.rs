use crate::{
    entities::{
        day_ledger::{self, Entity as DayLedger},
        unloading_event::{self, Entity as UnloadingEvent},
    },
    errors::ServiceError,
    services::{
        day_ledger::LedgerView,
        pallets::{self, TOTAL_SCALE},
        unloading::{load_event_views, EventView, NO_COMPANY},
    },
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

/// Events of one company (or of no company) with their running subtotal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct CompanyGroup {
    pub company_id: Option<Uuid>,
    pub company: String,
    pub events: Vec<EventView>,
    pub subtotal_pallets: Decimal,
}

/// Groups events by company, keeping first-seen group order and the
/// given event order inside each group.
pub fn group_by_company(events: Vec<EventView>) -> Vec<CompanyGroup> {
    let mut groups: Vec<CompanyGroup> = Vec::new();

    for event in events {
        let idx = match groups.iter().position(|g| g.company_id == event.company_id) {
            Some(idx) => idx,
            None => {
                groups.push(CompanyGroup {
                    company_id: event.company_id,
                    company: if event.has_company() {
                        event.company.clone()
                    } else {
                        NO_COMPANY.to_string()
                    },
                    events: Vec::new(),
                    subtotal_pallets: Decimal::ZERO,
                });
                groups.len() - 1
            }
        };

        let group = &mut groups[idx];
        group.subtotal_pallets =
            (group.subtotal_pallets + event.total_pallets).round_dp(TOTAL_SCALE);
        group.events.push(event);
    }

    groups
}

/// Grouped detail of one day.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DayDetail {
    pub ledger: LedgerView,
    pub groups: Vec<CompanyGroup>,
    /// Number of groups, the company-less group included
    pub total_companies: usize,
    pub total_events: usize,
    /// Live sum of all events, rounded to two places
    pub total_pallets: Decimal,
}

impl DayDetail {
    pub fn from_events(ledger: day_ledger::Model, events: Vec<EventView>) -> Self {
        let total_events = events.len();
        let total_pallets = pallets::ledger_total(events.iter().map(|e| e.total_pallets));
        let groups = group_by_company(events);
        let total_companies = groups.len();

        Self {
            ledger: ledger.into(),
            groups,
            total_companies,
            total_events,
            total_pallets,
        }
    }
}

/// Read-only grouped views over stored ledgers.
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DatabaseConnection>,
}

impl ReportService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Detail of an existing ledger, open or closed. Events are ordered by
    /// company name then arrival, with company-less events last.
    #[instrument(skip(self))]
    pub async fn view_day(&self, date: NaiveDate) -> Result<DayDetail, ServiceError> {
        let ledger = DayLedger::find()
            .filter(day_ledger::Column::LedgerDate.eq(date))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("No ledger for {}", date)))?;

        let events = UnloadingEvent::find()
            .filter(unloading_event::Column::LedgerId.eq(ledger.id))
            .all(&*self.db)
            .await?;
        let mut views = load_event_views(&*self.db, ledger.ledger_date, events).await?;
        sort_for_report(&mut views);

        Ok(DayDetail::from_events(ledger, views))
    }
}

fn sort_for_report(events: &mut [EventView]) {
    events.sort_by(|a, b| {
        b.has_company()
            .cmp(&a.has_company())
            .then_with(|| a.company.to_lowercase().cmp(&b.company.to_lowercase()))
            .then_with(|| a.arrived_at.cmp(&b.arrived_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::unloading_event::EventType;
    use chrono::{NaiveDateTime, NaiveTime};
    use rust_decimal_macros::dec;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 12, 9)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    fn event(company: Option<(Uuid, &str)>, arrival: NaiveDateTime, total: Decimal) -> EventView {
        EventView {
            id: Uuid::new_v4(),
            ledger_date: arrival.date(),
            company_id: company.map(|(id, _)| id),
            company: company
                .map(|(_, name)| name.to_string())
                .unwrap_or_else(|| NO_COMPANY.to_string()),
            driver_name: String::new(),
            driver_phone: String::new(),
            plate: String::new(),
            event_type: EventType::Complete,
            note: String::new(),
            arrival: arrival.format("%H:%M").to_string(),
            estimated_end: arrival.format("%H:%M").to_string(),
            arrived_at: arrival,
            ends_at: arrival,
            duration_minutes: 0,
            total_pallets: total,
            items: Vec::new(),
        }
    }

    #[test]
    fn groups_keep_first_seen_order_and_subtotals() {
        let acme = (Uuid::new_v4(), "Acme");
        let zeta = (Uuid::new_v4(), "Zeta");
        let events = vec![
            event(Some(zeta), at(8, 0), dec!(1.005)),
            event(Some(acme), at(9, 0), dec!(2)),
            event(None, at(9, 30), dec!(0.5)),
            event(Some(zeta), at(10, 0), dec!(1.0051)),
        ];

        let groups = group_by_company(events);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].company, "Zeta");
        assert_eq!(groups[0].events.len(), 2);
        // 1.005 -> 1.00 (half-even), then 1.00 + 1.0051 -> 2.01
        assert_eq!(groups[0].subtotal_pallets, dec!(2.01));
        assert_eq!(groups[1].company, "Acme");
        assert_eq!(groups[2].company_id, None);
        assert_eq!(groups[2].company, NO_COMPANY);
        assert_eq!(groups[2].subtotal_pallets, dec!(0.5));
    }

    #[test]
    fn empty_input_gives_no_groups() {
        assert!(group_by_company(Vec::new()).is_empty());
    }

    #[test]
    fn report_order_is_company_then_arrival_with_orphans_last() {
        let acme = (Uuid::new_v4(), "acme");
        let beta = (Uuid::new_v4(), "Beta");
        let mut events = vec![
            event(None, at(6, 0), dec!(1)),
            event(Some(beta), at(7, 0), dec!(1)),
            event(Some(acme), at(11, 0), dec!(1)),
            event(Some(acme), at(8, 0), dec!(1)),
        ];
        sort_for_report(&mut events);

        let order: Vec<(&str, NaiveDateTime)> = events
            .iter()
            .map(|e| (e.company.as_str(), e.arrived_at))
            .collect();
        assert_eq!(
            order,
            vec![
                ("acme", at(8, 0)),
                ("acme", at(11, 0)),
                ("Beta", at(7, 0)),
                (NO_COMPANY, at(6, 0)),
            ]
        );
    }
}

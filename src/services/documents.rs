//! Plain-text hard copies: the driver receipt and the printable day summary.

use crate::services::{reports::DayDetail, unloading::EventView};
use chrono::NaiveDate;
use std::fmt::Write;

const RULE_WIDTH: usize = 56;
const PRODUCT_WIDTH: usize = 28;

/// Content type of every rendered document.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Download name for the day summary of `date`.
pub fn day_filename(date: NaiveDate) -> String {
    format!("unloading_{}.txt", date.format("%Y-%m-%d"))
}

/// Download name for the receipt of one event.
pub fn receipt_filename(event: &EventView) -> String {
    format!(
        "receipt_{}_{}.txt",
        event.ledger_date.format("%Y-%m-%d"),
        event.arrival.replace(':', "")
    )
}

fn rule(out: &mut String, ch: char) {
    out.push_str(&ch.to_string().repeat(RULE_WIDTH));
    out.push('\n');
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let kept: String = value.chars().take(width.saturating_sub(1)).collect();
        format!("{}~", kept)
    }
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

fn write_items(out: &mut String, event: &EventView) {
    let _ = writeln!(
        out,
        "{:<width$} {:>6} {:>6} {:>10}",
        "Product",
        "Full",
        "Loose",
        "Pallets",
        width = PRODUCT_WIDTH
    );
    for item in &event.items {
        let _ = writeln!(
            out,
            "{:<width$} {:>6} {:>6} {:>10}",
            truncate(&item.product, PRODUCT_WIDTH),
            item.full_pallets,
            item.loose_units,
            item.pallet_equivalent,
            width = PRODUCT_WIDTH
        );
    }
}

/// Receipt handed to the driver for one unloading event.
pub fn render_receipt(issuer: &str, event: &EventView) -> String {
    let mut out = String::new();
    rule(&mut out, '=');
    let _ = writeln!(out, "{}", issuer);
    let _ = writeln!(out, "UNLOADING RECEIPT");
    rule(&mut out, '=');
    let _ = writeln!(out, "Date:      {}", event.ledger_date.format("%d/%m/%Y"));
    let _ = writeln!(out, "Arrival:   {}", event.arrival);
    let _ = writeln!(
        out,
        "Est. end:  {} ({} min)",
        event.estimated_end, event.duration_minutes
    );
    let _ = writeln!(out, "Company:   {}", event.company);
    let _ = writeln!(out, "Driver:    {}", or_dash(&event.driver_name));
    let _ = writeln!(out, "Phone:     {}", or_dash(&event.driver_phone));
    let _ = writeln!(out, "Plate:     {}", or_dash(&event.plate));
    let _ = writeln!(out, "Type:      {}", event.event_type);
    if !event.note.is_empty() {
        let _ = writeln!(out, "Note:      {}", event.note);
    }
    rule(&mut out, '-');
    write_items(&mut out, event);
    rule(&mut out, '-');
    let _ = writeln!(out, "TOTAL PALLETS: {}", event.total_pallets);
    rule(&mut out, '=');
    out
}

/// Printable summary of a whole day grouped by company.
pub fn render_day_summary(issuer: &str, detail: &DayDetail) -> String {
    let ledger = &detail.ledger;
    let mut out = String::new();
    rule(&mut out, '=');
    let _ = writeln!(out, "{}", issuer);
    let _ = writeln!(out, "DAILY UNLOADING SUMMARY");
    rule(&mut out, '=');
    let _ = writeln!(out, "Date:      {}", ledger.ledger_date.format("%d/%m/%Y"));
    let _ = writeln!(out, "State:     {}", ledger.state);
    if let Some(closed_at) = ledger.closed_at {
        let _ = writeln!(out, "Closed at: {}", closed_at.format("%d/%m/%Y %H:%M UTC"));
    }
    if !ledger.notes.is_empty() {
        let _ = writeln!(out, "Notes:     {}", ledger.notes);
    }

    for group in &detail.groups {
        out.push('\n');
        rule(&mut out, '-');
        let _ = writeln!(
            out,
            "{} ({} trucks, {} pallets)",
            group.company,
            group.events.len(),
            group.subtotal_pallets
        );
        rule(&mut out, '-');
        for event in &group.events {
            let _ = writeln!(
                out,
                "{}-{}  {}  {}  [{}]  {} pallets",
                event.arrival,
                event.estimated_end,
                or_dash(&event.plate),
                or_dash(&event.driver_name),
                event.event_type,
                event.total_pallets
            );
            for item in &event.items {
                let _ = writeln!(
                    out,
                    "    {:<width$} {:>4} + {:>4} = {}",
                    truncate(&item.product, PRODUCT_WIDTH),
                    item.full_pallets,
                    item.loose_units,
                    item.pallet_equivalent,
                    width = PRODUCT_WIDTH
                );
            }
        }
    }

    out.push('\n');
    rule(&mut out, '=');
    let _ = writeln!(out, "Companies: {}", detail.total_companies);
    let _ = writeln!(out, "Trucks:    {}", detail.total_events);
    let _ = writeln!(out, "TOTAL PALLETS: {}", detail.total_pallets);
    rule(&mut out, '=');
    out
}

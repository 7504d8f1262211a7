//! Unit conversion from loose units to fractional pallets.

use rust_decimal::Decimal;

/// Decimal places kept for line-item and event pallet equivalents.
pub const EQUIVALENT_SCALE: u32 = 4;
/// Decimal places kept for ledger totals and per-company subtotals.
pub const TOTAL_SCALE: u32 = 2;

/// Whole pallets plus loose units expressed as a fraction of a full pallet.
///
/// The loose fraction is rounded to four places before it is added, and the
/// sum is rounded again. A packing with zero capacity contributes nothing.
pub fn pallet_equivalent(
    full_pallets: i64,
    loose_units: i64,
    units_per_layer: i64,
    layers_per_pallet: i64,
) -> Decimal {
    let mut total = Decimal::from(full_pallets);
    let capacity = units_per_layer.saturating_mul(layers_per_pallet);
    if loose_units > 0 && capacity > 0 {
        let fraction = Decimal::from(loose_units) / Decimal::from(capacity);
        total += fraction.round_dp(EQUIVALENT_SCALE);
    }
    total.round_dp(EQUIVALENT_SCALE)
}

/// Total of one unloading event from its line equivalents.
pub fn event_total<I>(equivalents: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    equivalents
        .into_iter()
        .sum::<Decimal>()
        .round_dp(EQUIVALENT_SCALE)
}

/// Day total from event totals, always carried at two places.
pub fn ledger_total<I>(event_totals: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    day_scale(event_totals.into_iter().sum::<Decimal>())
}

/// Brings a day total to exactly two places. Stores that keep decimals as
/// floating point hand back `0.4` for a frozen `0.40`.
pub fn day_scale(total: Decimal) -> Decimal {
    let mut total = total.round_dp(TOTAL_SCALE);
    total.rescale(TOTAL_SCALE);
    total
}

//! Property-based tests for the pallet conversion and grouping rules.
//!
//! These use proptest to check the rounding contract across packing
//! configurations the unit tests only sample.

use dock_ledger::services::pallets::{event_total, ledger_total, pallet_equivalent};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn capacity_strategy() -> impl Strategy<Value = (i64, i64)> {
    (1i64..=60, 1i64..=20)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn loose_units_add_rounded_fraction_of_capacity(
        full in 0i64..500,
        loose in 0i64..5_000,
        (per_layer, layers) in capacity_strategy(),
    ) {
        let capacity = Decimal::from(per_layer * layers);
        let expected = Decimal::from(full) + (Decimal::from(loose) / capacity).round_dp(4);
        prop_assert_eq!(pallet_equivalent(full, loose, per_layer, layers), expected);
    }

    #[test]
    fn zero_capacity_ignores_loose_units(
        full in 0i64..500,
        loose in 0i64..5_000,
        other in 0i64..20,
        zero_layers in any::<bool>(),
    ) {
        let (per_layer, layers) = if zero_layers { (other, 0) } else { (0, other) };
        prop_assert_eq!(pallet_equivalent(full, loose, per_layer, layers), Decimal::from(full));
    }

    #[test]
    fn no_loose_units_is_exactly_full_pallets(
        full in 0i64..10_000,
        (per_layer, layers) in capacity_strategy(),
    ) {
        prop_assert_eq!(pallet_equivalent(full, 0, per_layer, layers), Decimal::from(full));
    }

    #[test]
    fn equivalents_never_exceed_four_places(
        full in 0i64..500,
        loose in 0i64..5_000,
        (per_layer, layers) in capacity_strategy(),
    ) {
        prop_assert!(pallet_equivalent(full, loose, per_layer, layers).scale() <= 4);
    }

    #[test]
    fn totals_keep_their_scales(
        lines in prop::collection::vec((0i64..50, 0i64..400, 1i64..=12, 1i64..=12), 1..8),
    ) {
        let equivalents: Vec<Decimal> = lines
            .iter()
            .map(|&(full, loose, per_layer, layers)| {
                pallet_equivalent(full, loose, per_layer, layers)
            })
            .collect();
        let event = event_total(equivalents.iter().copied());
        prop_assert!(event.scale() <= 4);

        let day = ledger_total([event, event]);
        prop_assert!(day.scale() <= 2);
        prop_assert!((day - event * Decimal::from(2)).abs() <= Decimal::new(5, 3));
    }
}

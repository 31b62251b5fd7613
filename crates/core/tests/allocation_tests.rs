// ═══════════════════════════════════════════════════════════════════
// Allocation Tests: WeightAllocator add/remove/set_weight/finalize,
// submission payload
// ═══════════════════════════════════════════════════════════════════

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use investment_simulator_core::errors::CoreError;
use investment_simulator_core::models::allocation::AssetAllocation;
use investment_simulator_core::services::allocation_service::{
    percent_to_fraction, round_percent, WeightAllocator,
};

fn allocation_of(tickers: &[&str]) -> AssetAllocation {
    let allocator = WeightAllocator::new();
    let mut allocation = AssetAllocation::new();
    for t in tickers {
        allocator.add(&mut allocation, t).unwrap();
    }
    allocation
}

fn weights(allocation: &AssetAllocation) -> Vec<Decimal> {
    allocation.entries().iter().map(|e| e.weight).collect()
}

// ═══════════════════════════════════════════════════════════════════
// add
// ═══════════════════════════════════════════════════════════════════

mod add {
    use super::*;

    #[test]
    fn first_asset_takes_everything() {
        let allocation = allocation_of(&["A"]);
        assert_eq!(weights(&allocation), vec![dec!(100)]);
    }

    #[test]
    fn second_asset_splits_evenly() {
        let allocation = allocation_of(&["A", "B"]);
        assert_eq!(weights(&allocation), vec![dec!(50), dec!(50)]);
    }

    #[test]
    fn third_asset_enters_at_half() {
        let allocation = allocation_of(&["A", "B", "C"]);
        assert_eq!(weights(&allocation), vec![dec!(25), dec!(25), dec!(50)]);
        assert_eq!(allocation.total(), dec!(100));
    }

    #[test]
    fn rescales_existing_weights_proportionally() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B"]);
        allocator.set_weight(&mut allocation, "A", dec!(80)).unwrap();

        allocator.add(&mut allocation, "C").unwrap();
        assert_eq!(weights(&allocation), vec![dec!(40), dec!(10), dec!(50)]);
    }

    #[test]
    fn keeps_insertion_order() {
        let allocation = allocation_of(&["VALE3.SA", "AAPL", "IVVB11.SA"]);
        assert_eq!(allocation.tickers(), vec!["VALE3.SA", "AAPL", "IVVB11.SA"]);
    }

    #[test]
    fn normalizes_ticker() {
        let allocation = allocation_of(&["  petr4.sa "]);
        assert!(allocation.contains("PETR4.SA"));
        assert_eq!(allocation.tickers(), vec!["PETR4.SA"]);
    }

    #[test]
    fn duplicate_is_rejected_and_state_kept() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B"]);
        let before = allocation.clone();

        let err = allocator.add(&mut allocation, "a").unwrap_err();
        assert!(matches!(err, CoreError::AssetAlreadySelected(t) if t == "A"));
        assert_eq!(allocation, before);
    }

    #[test]
    fn empty_ticker_is_rejected() {
        let allocator = WeightAllocator::new();
        let mut allocation = AssetAllocation::new();
        let err = allocator.add(&mut allocation, "   ").unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
        assert!(allocation.is_empty());
    }

    #[test]
    fn sum_stays_within_tolerance() {
        let allocator = WeightAllocator::new();
        let mut allocation = AssetAllocation::new();
        for (i, t) in ["A", "B", "C", "D", "E", "F", "G"].iter().enumerate() {
            allocator.add(&mut allocation, t).unwrap();
            let tolerance = dec!(0.01) * Decimal::from(i + 1);
            assert!((allocation.total() - dec!(100)).abs() <= tolerance);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// remove
// ═══════════════════════════════════════════════════════════════════

mod remove {
    use super::*;

    #[test]
    fn survivors_are_not_rescaled() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B", "C"]);
        allocator.remove(&mut allocation, "C").unwrap();

        assert_eq!(weights(&allocation), vec![dec!(25), dec!(25)]);
        assert_eq!(allocation.total(), dec!(50));
    }

    #[test]
    fn remove_last_then_add_gives_full_weight() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["X"]);
        allocator.remove(&mut allocation, "X").unwrap();
        assert!(allocation.is_empty());

        allocator.add(&mut allocation, "Y").unwrap();
        assert_eq!(allocation.weight_of("Y"), Some(dec!(100)));
    }

    #[test]
    fn unknown_ticker_is_rejected() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A"]);
        let err = allocator.remove(&mut allocation, "B").unwrap_err();
        assert!(matches!(err, CoreError::AssetNotSelected(t) if t == "B"));
        assert_eq!(allocation.len(), 1);
    }
}

// ═══════════════════════════════════════════════════════════════════
// set_weight
// ═══════════════════════════════════════════════════════════════════

mod set_weight {
    use super::*;

    #[test]
    fn raising_one_shrinks_the_other() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B"]);
        allocator.set_weight(&mut allocation, "A", dec!(80)).unwrap();

        assert_eq!(allocation.weight_of("A"), Some(dec!(80)));
        assert_eq!(allocation.weight_of("B"), Some(dec!(20)));
    }

    #[test]
    fn lowering_leaves_total_below_hundred() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B"]);
        allocator.set_weight(&mut allocation, "A", dec!(80)).unwrap();
        allocator.set_weight(&mut allocation, "B", dec!(10)).unwrap();

        assert_eq!(allocation.weight_of("A"), Some(dec!(80)));
        assert_eq!(allocation.weight_of("B"), Some(dec!(10)));
        assert_eq!(allocation.total(), dec!(90));
    }

    #[test]
    fn single_asset_is_set_directly() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A"]);
        allocator.set_weight(&mut allocation, "A", dec!(42.5)).unwrap();
        assert_eq!(allocation.weight_of("A"), Some(dec!(42.5)));
    }

    #[test]
    fn others_at_zero_are_not_scaled() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B"]);
        allocator.set_weight(&mut allocation, "B", dec!(0)).unwrap();
        allocator.set_weight(&mut allocation, "A", dec!(100)).unwrap();

        assert_eq!(weights(&allocation), vec![dec!(100), dec!(0)]);
    }

    #[test]
    fn input_above_hundred_is_clamped() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B"]);
        allocator.set_weight(&mut allocation, "A", dec!(150)).unwrap();

        assert_eq!(allocation.weight_of("A"), Some(dec!(100)));
        assert_eq!(allocation.weight_of("B"), Some(dec!(0)));
    }

    #[test]
    fn negative_input_is_clamped_to_zero() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B"]);
        allocator.set_weight(&mut allocation, "A", dec!(-5)).unwrap();

        assert_eq!(allocation.weight_of("A"), Some(dec!(0)));
        assert_eq!(allocation.weight_of("B"), Some(dec!(50)));
    }

    #[test]
    fn input_is_rounded_to_cents() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B"]);
        allocator.set_weight(&mut allocation, "A", dec!(12.345)).unwrap();
        assert_eq!(allocation.weight_of("A"), Some(dec!(12.35)));
    }

    #[test]
    fn total_never_exceeds_hundred_after_edit() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B", "C"]);
        for (t, w) in [("A", dec!(70)), ("C", dec!(45.55)), ("B", dec!(99.99)), ("A", dec!(33.33))] {
            allocator.set_weight(&mut allocation, t, w).unwrap();
            assert!(allocation.total() <= dec!(100), "total {} after {t}={w}", allocation.total());
        }
    }

    #[test]
    fn positive_others_strictly_decrease_under_rounding() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B", "C"]);
        allocator.set_weight(&mut allocation, "C", dec!(99.98)).unwrap();
        assert_eq!(weights(&allocation), vec![dec!(0.01), dec!(0.01), dec!(99.98)]);

        // 0.01 × 0.5 rounds back to 0.01; each still loses a cent.
        allocator.set_weight(&mut allocation, "C", dec!(99.99)).unwrap();
        assert_eq!(weights(&allocation), vec![dec!(0), dec!(0), dec!(99.99)]);
    }

    #[test]
    fn unknown_ticker_is_rejected() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A"]);
        let err = allocator.set_weight(&mut allocation, "Z", dec!(10)).unwrap_err();
        assert!(matches!(err, CoreError::AssetNotSelected(_)));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Raw input
// ═══════════════════════════════════════════════════════════════════

mod raw_input {
    use super::*;

    #[test]
    fn text_is_parsed() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B"]);
        let applied = allocator.set_weight_from_input(&mut allocation, "A", " 62.5 ").unwrap();

        assert!(applied);
        assert_eq!(allocation.weight_of("A"), Some(dec!(62.5)));
        assert_eq!(allocation.weight_of("B"), Some(dec!(37.5)));
    }

    #[test]
    fn non_numeric_text_is_ignored() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B"]);
        let before = allocation.clone();

        for raw in ["", "abc", "12,5%", "NaN", "inf"] {
            let applied = allocator.set_weight_from_input(&mut allocation, "A", raw).unwrap();
            assert!(!applied, "{raw:?} should be ignored");
        }
        assert_eq!(allocation, before);
    }

    #[test]
    fn exponent_text_is_accepted() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B"]);
        assert!(allocator.set_weight_from_input(&mut allocation, "A", "1e3").unwrap());
        assert_eq!(allocation.weight_of("A"), Some(dec!(100)));
    }

    #[test]
    fn slider_nan_and_infinity_are_ignored() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B"]);
        assert!(!allocator.set_weight_f64(&mut allocation, "A", f64::NAN).unwrap());
        assert!(!allocator.set_weight_f64(&mut allocation, "A", f64::INFINITY).unwrap());
        assert_eq!(allocation.weight_of("A"), Some(dec!(50)));
    }

    #[test]
    fn slider_value_is_applied() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B"]);
        assert!(allocator.set_weight_f64(&mut allocation, "A", 75.0).unwrap());
        assert_eq!(allocation.weight_of("A"), Some(dec!(75)));
        assert_eq!(allocation.weight_of("B"), Some(dec!(25)));
    }

    #[test]
    fn unknown_ticker_still_errors() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A"]);
        assert!(allocator.set_weight_from_input(&mut allocation, "Q", "10").is_err());
    }
}

// ═══════════════════════════════════════════════════════════════════
// finalize
// ═══════════════════════════════════════════════════════════════════

mod finalize {
    use super::*;

    #[test]
    fn rescales_short_total_to_hundred() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B"]);
        allocator.set_weight(&mut allocation, "A", dec!(80)).unwrap();
        allocator.set_weight(&mut allocation, "B", dec!(10)).unwrap();

        allocator.finalize(&mut allocation);
        assert_eq!(weights(&allocation), vec![dec!(88.89), dec!(11.11)]);
        assert_eq!(allocation.total(), dec!(100));
    }

    #[test]
    fn residual_cent_goes_to_largest() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B", "C"]);
        allocator.set_weight(&mut allocation, "C", dec!(33.33)).unwrap();
        allocator.set_weight(&mut allocation, "A", dec!(33.33)).unwrap();
        allocator.set_weight(&mut allocation, "B", dec!(33.33)).unwrap();
        assert_eq!(allocation.total(), dec!(99.99));

        allocator.finalize(&mut allocation);
        assert_eq!(weights(&allocation), vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
    }

    #[test]
    fn loaded_weights_are_rounded_to_cents() {
        let allocator = WeightAllocator::new();
        let json = r#"{"entries":[
            {"ticker":"A","weight":"33.3333"},
            {"ticker":"B","weight":"33.3333"},
            {"ticker":"C","weight":"33.3333"}
        ]}"#;
        let mut allocation: AssetAllocation = serde_json::from_str(json).unwrap();
        assert_eq!(weights(&allocation), vec![dec!(33.33), dec!(33.33), dec!(33.33)]);

        allocator.finalize(&mut allocation);
        assert_eq!(allocation.total(), dec!(100));
        let once = weights(&allocation);
        allocator.finalize(&mut allocation);
        assert_eq!(weights(&allocation), once);
    }

    #[test]
    fn loaded_weights_are_clamped() {
        let json = r#"{"entries":[{"ticker":"A","weight":150},{"ticker":"B","weight":"-3"}]}"#;
        let allocation: AssetAllocation = serde_json::from_str(json).unwrap();
        assert_eq!(weights(&allocation), vec![dec!(100), dec!(0)]);
    }

    #[test]
    fn is_idempotent() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B", "C"]);
        allocator.set_weight(&mut allocation, "B", dec!(7.77)).unwrap();
        allocator.remove(&mut allocation, "C").unwrap();

        allocator.finalize(&mut allocation);
        let once = allocation.clone();
        allocator.finalize(&mut allocation);
        assert_eq!(allocation, once);
        assert_eq!(allocation.total(), dec!(100));
    }

    #[test]
    fn zero_total_is_left_alone() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B"]);
        allocator.set_weight(&mut allocation, "A", dec!(0)).unwrap();
        allocator.set_weight(&mut allocation, "B", dec!(0)).unwrap();

        allocator.finalize(&mut allocation);
        assert_eq!(weights(&allocation), vec![dec!(0), dec!(0)]);
    }

    #[test]
    fn empty_allocation_is_noop() {
        let allocator = WeightAllocator::new();
        let mut allocation = AssetAllocation::new();
        allocator.finalize(&mut allocation);
        assert!(allocation.is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Submission payload
// ═══════════════════════════════════════════════════════════════════

mod submission {
    use super::*;

    #[test]
    fn thirds_submit_as_four_decimal_fractions() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B", "C"]);
        allocator.set_weight(&mut allocation, "C", dec!(33.34)).unwrap();
        allocator.set_weight(&mut allocation, "A", dec!(33.33)).unwrap();
        allocator.set_weight(&mut allocation, "B", dec!(33.33)).unwrap();

        let payload = allocator.submit(&mut allocation);
        let pesos: Vec<Decimal> = payload.iter().map(|e| e.peso).collect();
        assert_eq!(pesos, vec![dec!(0.3333), dec!(0.3333), dec!(0.3334)]);
    }

    #[test]
    fn zero_weights_are_excluded() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B"]);
        allocator.set_weight(&mut allocation, "A", dec!(100)).unwrap();

        let payload = allocator.submission_payload(&allocation);
        assert_eq!(payload.len(), 1);
        assert_eq!(payload[0].ticker, "A");
        assert_eq!(payload[0].peso, dec!(1));
    }

    #[test]
    fn submit_finalizes_first() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B"]);
        allocator.set_weight(&mut allocation, "A", dec!(80)).unwrap();
        allocator.set_weight(&mut allocation, "B", dec!(10)).unwrap();

        let payload = allocator.submit(&mut allocation);
        assert_eq!(allocation.total(), dec!(100));
        assert_eq!(payload[0].peso, dec!(0.8889));
        assert_eq!(payload[1].peso, dec!(0.1111));
    }

    #[test]
    fn empty_allocation_gives_empty_payload() {
        let allocator = WeightAllocator::new();
        let mut allocation = AssetAllocation::new();
        assert!(allocator.submit(&mut allocation).is_empty());
    }

    #[test]
    fn peso_serializes_as_json_number() {
        let allocator = WeightAllocator::new();
        let mut allocation = allocation_of(&["A", "B"]);
        allocator.set_weight(&mut allocation, "A", dec!(33.33)).unwrap();

        let payload = allocator.submission_payload(&allocation);
        let json = serde_json::to_string(&payload[0]).unwrap();
        assert_eq!(json, r#"{"ticker":"A","peso":0.3333}"#);
    }

    #[test]
    fn fraction_and_percent_rounding_are_separate() {
        assert_eq!(round_percent(dec!(12.345)), dec!(12.35));
        assert_eq!(round_percent(dec!(-0.125)), dec!(-0.13));
        assert_eq!(percent_to_fraction(dec!(12.345)), dec!(0.1235));
        assert_eq!(percent_to_fraction(dec!(33.33)), dec!(0.3333));
    }
}

//! Property-based tests for validator-sweep
//!
//! - Test the sweep invariants over random checkpoint tables
//! - Run with ProptestConfig::with_cases(100)

use proptest::prelude::*;
use validator_sweep::aggregate::{aggregate, AggregateConfig, Granularity};
use validator_sweep::filter::filter_by_accuracy;
use validator_sweep::normalize::{best_accuracy, normalize};
use validator_sweep::record::{CheckpointRecord, DomainType, RecordTable, TARGET_ACCURACY};
use validator_sweep::stats::spearman;
use validator_sweep::sweep::{
    min_accuracy, sweep, threshold_grid, ThresholdAxis, NO_FILTER_SENTINEL,
};

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Accuracy or score in [0, 1], occasionally undefined
fn arb_value() -> impl Strategy<Value = f64> {
    prop_oneof![
        9 => 0.0f64..=1.0,
        1 => Just(f64::NAN),
    ]
}

/// Table of up to `max_rows` rows spread over a few validators
fn arb_table(max_rows: usize) -> impl Strategy<Value = RecordTable> {
    prop::collection::vec((0usize..3, arb_value(), arb_value(), arb_value()), 0..max_rows).prop_map(
        |rows| {
            rows.into_iter()
                .zip(0u64..)
                .map(|((validator, score, src, target), epoch)| {
                    CheckpointRecord::builder("officehome", "DANNConfig", format!("V{validator}"))
                        .src_domains(["art"])
                        .target_domains(["real"])
                        .epoch(epoch)
                        .score(score)
                        .accuracy("src_val_macro", src)
                        .accuracy(TARGET_ACCURACY, target)
                        .build()
                })
                .collect()
        },
    )
}

fn arb_domain() -> impl Strategy<Value = DomainType> {
    prop_oneof![Just(DomainType::Source), Just(DomainType::Target)]
}

fn config(top_n: usize) -> AggregateConfig {
    AggregateConfig::new(Granularity::PerTask, top_n).unwrap()
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========================================================================
    // Threshold Filter Properties
    // ========================================================================

    /// Property: the sentinel keeps every row, in order
    #[test]
    fn prop_sentinel_keeps_full_table(
        table in arb_table(60),
        baseline in 0.0f64..=1.0,
        domain in arb_domain()
    ) {
        let min = min_accuracy(baseline, NO_FILTER_SENTINEL);
        let kept = filter_by_accuracy(&table.view(), min, domain);
        prop_assert_eq!(kept.len(), table.len());
        for (kept, original) in kept.iter().zip(table.records()) {
            prop_assert!(std::ptr::eq(kept, original));
        }
    }

    /// Property: raising the threshold never increases the surviving row count
    #[test]
    fn prop_filter_monotonic(
        table in arb_table(60),
        baseline in 0.0f64..=1.0,
        domain in arb_domain()
    ) {
        let counts: Vec<usize> = threshold_grid()
            .into_iter()
            .skip(1)
            .map(|t| filter_by_accuracy(&table.view(), min_accuracy(baseline, t), domain).len())
            .collect();
        for pair in counts.windows(2) {
            prop_assert!(pair[0] >= pair[1], "count rose from {} to {}", pair[0], pair[1]);
        }
    }

    // ========================================================================
    // Aggregator Properties
    // ========================================================================

    /// Property: top-N accuracy lies within the group's accuracy range
    #[test]
    fn prop_top_n_within_accuracy_range(
        table in arb_table(60),
        top_n in 1usize..10
    ) {
        for stats in aggregate(&table.view(), &config(top_n)) {
            let accs: Vec<f64> = table
                .records()
                .iter()
                .filter(|r| r.validator() == stats.key.validator)
                .filter_map(CheckpointRecord::scored_accuracy)
                .map(|(_, acc)| acc)
                .collect();
            let lo = accs.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = accs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(stats.predicted_best_acc >= lo - 1e-12);
            prop_assert!(stats.predicted_best_acc <= hi + 1e-12);
        }
    }

    /// Property: emitted correlations lie in [-1, 1]
    #[test]
    fn prop_correlation_bounded(
        table in arb_table(60)
    ) {
        for stats in aggregate(&table.view(), &config(1)) {
            if let Some(r) = stats.correlation {
                prop_assert!((-1.0..=1.0).contains(&r));
            }
        }
    }

    /// Property: fewer than two pairs never yields a correlation
    #[test]
    fn prop_short_input_has_no_correlation(
        x in prop::collection::vec(0.0f64..1.0, 0..2)
    ) {
        prop_assert!(spearman(&x, &x).is_none());
    }

    // ========================================================================
    // Sweep Properties
    // ========================================================================

    /// Property: sweeping never trips the sentinel check, and the sentinel
    /// rows match aggregating the whole slice
    #[test]
    fn prop_sweep_sentinel_matches_unfiltered(
        table in arb_table(40),
        baseline in 0.0f64..=1.0,
        domain in arb_domain()
    ) {
        let axis = ThresholdAxis::single(domain, baseline);
        let result = sweep(&table.view(), &axis, &config(2)).unwrap();
        let unfiltered = aggregate(&table.view(), &config(2));
        let sentinel = result.at_threshold(NO_FILTER_SENTINEL);

        prop_assert_eq!(sentinel.len(), unfiltered.len());
        for (row, stats) in sentinel.iter().zip(&unfiltered) {
            prop_assert_eq!(&row.key, &stats.key);
            prop_assert_eq!(row.predicted_best_acc, Some(stats.predicted_best_acc));
        }
    }

    // ========================================================================
    // Normalizer Properties
    // ========================================================================

    /// Property: normalized value is the raw value over the group's best accuracy
    #[test]
    fn prop_normalization_divides_by_best(
        table in arb_table(40),
        baseline in 0.0f64..=1.0,
        top_n in 1usize..5
    ) {
        let axis = ThresholdAxis::single(DomainType::Source, baseline);
        let raw = sweep(&table.view(), &axis, &config(top_n)).unwrap();
        let best = best_accuracy(&table.view(), &config(top_n));
        let normalized = normalize(raw.clone(), &table.view(), &config(top_n)).unwrap();

        prop_assert_eq!(raw.len(), normalized.len());
        for (before, after) in raw.rows().iter().zip(normalized.rows()) {
            let group_best = best.iter().find(|(k, _)| *k == before.key).map(|(_, b)| *b);
            prop_assert_eq!(after.best_acc, group_best);
            match (before.predicted_best_acc, group_best) {
                (Some(acc), Some(b)) if b > 0.0 => {
                    let ratio = after.predicted_best_acc.unwrap();
                    prop_assert!((ratio - acc / b).abs() < 1e-12);
                }
                _ => prop_assert!(after.predicted_best_acc.is_none()),
            }
        }
    }
}

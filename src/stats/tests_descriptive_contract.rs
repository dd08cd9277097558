// =========================================================================
// FALSIFY-AGG: fold aggregation contract (validar stats)
//
// References:
//   - Hyndman & Fan (1996) "Sample Quantiles in Statistical Packages"
// =========================================================================

use super::*;

/// FALSIFY-AGG-001: A single fold reduces to its own value with zero spread
#[test]
fn falsify_agg_001_single_fold_idempotent() {
    let stats = aggregate(&[FoldMetrics::named([("accuracy", 0.83)])]).expect("valid input");
    let s = stats.get("accuracy").expect("metric present");

    assert_eq!(s.mean, 0.83, "FALSIFIED AGG-001: mean={} != 0.83", s.mean);
    assert_eq!(s.std, 0.0, "FALSIFIED AGG-001: std={} != 0", s.std);
    assert_eq!(s.median, 0.83, "FALSIFIED AGG-001: median={}", s.median);
}

/// FALSIFY-AGG-002: Raw values are kept in fold order and never padded
#[test]
fn falsify_agg_002_raw_values_in_fold_order() {
    let folds: Vec<FoldMetrics> = [0.4, 0.1, 0.3].iter().map(|&v| v.into()).collect();
    let stats = aggregate(&folds).expect("valid input");
    let s = stats.get(SCALAR_METRIC).expect("scalar metric present");

    assert_eq!(
        s.values,
        vec![0.4, 0.1, 0.3],
        "FALSIFIED AGG-002: values={:?}",
        s.values
    );
}

/// FALSIFY-AGG-003: min <= median <= max and min <= mean <= max
#[test]
fn falsify_agg_003_ordering_bounds() {
    let s = summarize(&[0.91, 0.42, 0.77, 0.65, 0.88, 0.12]).expect("valid input");

    assert!(
        s.min <= s.median && s.median <= s.max,
        "FALSIFIED AGG-003: median={} outside [{}, {}]",
        s.median,
        s.min,
        s.max
    );
    assert!(
        s.min <= s.mean && s.mean <= s.max,
        "FALSIFIED AGG-003: mean={} outside [{}, {}]",
        s.mean,
        s.min,
        s.max
    );
}

/// FALSIFY-AGG-004: Aggregation does not depend on fold order
#[test]
fn falsify_agg_004_order_independent() {
    let a = summarize(&[0.5, 0.9, 0.7, 0.6]).expect("valid input");
    let b = summarize(&[0.6, 0.7, 0.9, 0.5]).expect("valid input");

    assert!((a.mean - b.mean).abs() < 1e-12, "FALSIFIED AGG-004: mean");
    assert!((a.std - b.std).abs() < 1e-12, "FALSIFIED AGG-004: std");
    assert_eq!(a.median, b.median, "FALSIFIED AGG-004: median");
}

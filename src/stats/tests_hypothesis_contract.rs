// =========================================================================
// FALSIFY-HT: hypothesis testing contract (validar stats)
//
// References:
//   - Welch (1947) "The generalization of 'Student's' problem when several
//     different population variances are involved"
//   - Cohen (1988) "Statistical Power Analysis for the Behavioral Sciences"
// =========================================================================

use super::*;

/// FALSIFY-HT-001: p-value is in [0, 1]
#[test]
fn falsify_ht_001_pvalue_bounded() {
    let result = compare(&[2.0, 2.5, 3.0, 3.5, 4.0], &[2.2, 2.9, 3.1, 3.3], 0.05)
        .expect("valid input");

    assert!(
        (0.0..=1.0).contains(&result.p_value),
        "FALSIFIED HT-001: p-value={} outside [0,1]",
        result.p_value
    );
}

/// FALSIFY-HT-002: Clearly separated series are significant
#[test]
fn falsify_ht_002_detects_difference() {
    let group1 = [1.0, 1.1, 1.2, 0.9, 1.0, 1.1, 0.95, 1.05];
    let group2 = [5.0, 5.1, 5.2, 4.9, 5.0, 5.1, 4.95, 5.05];
    let result = compare(&group1, &group2, 0.05).expect("valid input");

    assert!(
        result.significant && result.p_value < 0.05,
        "FALSIFIED HT-002: p-value={} >= 0.05 for clearly different groups",
        result.p_value
    );
}

/// FALSIFY-HT-003: Swapping arguments negates d and keeps p
#[test]
fn falsify_ht_003_symmetry() {
    let a = [0.81, 0.79, 0.84, 0.80, 0.83];
    let b = [0.76, 0.78, 0.75, 0.80, 0.77];
    let ab = compare(&a, &b, 0.05).expect("valid input");
    let ba = compare(&b, &a, 0.05).expect("valid input");

    assert_eq!(
        ab.effect_size, -ba.effect_size,
        "FALSIFIED HT-003: d(a,b)={} d(b,a)={}",
        ab.effect_size, ba.effect_size
    );
    assert_eq!(
        ab.p_value, ba.p_value,
        "FALSIFIED HT-003: p(a,b)={} p(b,a)={}",
        ab.p_value, ba.p_value
    );
}

/// FALSIFY-HT-004: Identical constant series never throw and are not significant
#[test]
fn falsify_ht_004_degenerate_equal() {
    let result = compare(&[5.0, 5.0, 5.0], &[5.0, 5.0, 5.0], 0.05).expect("no error");

    assert!(!result.significant, "FALSIFIED HT-004: significant");
    assert_eq!(result.p_value, 1.0, "FALSIFIED HT-004: p={}", result.p_value);
}

/// FALSIFY-HT-005: Confidence interval contains the mean difference
#[test]
fn falsify_ht_005_interval_contains_difference() {
    let result = compare(&[10.0, 12.0, 11.5, 13.0, 9.5], &[9.0, 11.0, 10.0, 9.5], 0.05)
        .expect("valid input");
    let (lo, hi) = result.confidence_interval;

    assert!(
        lo <= result.mean_difference && result.mean_difference <= hi,
        "FALSIFIED HT-005: diff={} outside [{lo}, {hi}]",
        result.mean_difference
    );
}

/// FALSIFY-HT-006: Interval excludes zero exactly when significant at 1 - level
#[test]
fn falsify_ht_006_interval_agrees_with_test() {
    let a = [0.61, 0.64, 0.60, 0.66, 0.63];
    let b = [0.58, 0.60, 0.57, 0.61, 0.62];
    let result = Comparator::new()
        .with_alpha(0.05)
        .with_confidence_level(0.95)
        .compare(&a, &b)
        .expect("valid input");
    let (lo, hi) = result.confidence_interval;
    let excludes_zero = lo > 0.0 || hi < 0.0;

    assert_eq!(
        excludes_zero, result.significant,
        "FALSIFIED HT-006: interval [{lo}, {hi}] vs p={}",
        result.p_value
    );
}

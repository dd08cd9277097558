// =========================================================================
// FALSIFY-KF: fold partitioning contract (validar model_selection)
//
// References:
//   - Stone (1974) "Cross-Validatory Choice and Assessment of Predictions"
//   - Kohavi (1995) "A Study of Cross-Validation and Bootstrap for
//     Accuracy Estimation and Model Selection"
// =========================================================================

use super::*;
use std::collections::HashSet;

/// FALSIFY-KF-001: K-Fold produces exactly K folds
#[test]
fn falsify_kf_001_produces_k_folds() {
    let partition = KFold::new(5).split(100).expect("valid k");

    assert_eq!(
        partition.k(),
        5,
        "FALSIFIED KF-001: folds={}, expected 5",
        partition.k()
    );
}

/// FALSIFY-KF-002: Every sample appears in exactly one test fold
#[test]
fn falsify_kf_002_every_sample_in_one_test_fold() {
    let partition = KFold::new(5).split(20).expect("valid k");

    let mut test_counts = vec![0usize; 20];
    for fold in &partition {
        for &idx in &fold.test {
            test_counts[idx] += 1;
        }
    }

    for (i, &count) in test_counts.iter().enumerate() {
        assert_eq!(
            count, 1,
            "FALSIFIED KF-002: sample {i} appeared in {count} test folds (expected 1)"
        );
    }
}

/// FALSIFY-KF-003: Train + test indices cover all samples per fold
#[test]
fn falsify_kf_003_train_test_cover_all() {
    let n = 17; // not divisible by k
    let partition = KFold::new(4).split(n).expect("valid k");

    for fold in &partition {
        let mut all: Vec<usize> = fold.train.iter().chain(&fold.test).copied().collect();
        all.sort_unstable();
        all.dedup();

        assert_eq!(
            all.len(),
            n,
            "FALSIFIED KF-003: fold {} covers {} samples, expected {n}",
            fold.index,
            all.len()
        );
    }
}

/// FALSIFY-KF-004: Train and test sets are disjoint within each fold
#[test]
fn falsify_kf_004_train_test_disjoint() {
    let partition = KFold::new(3).split(30).expect("valid k");

    for fold in &partition {
        let train_set: HashSet<usize> = fold.train.iter().copied().collect();
        let overlap = fold.test.iter().filter(|i| train_set.contains(i)).count();
        assert_eq!(
            overlap, 0,
            "FALSIFIED KF-004: fold {} has {overlap}-sample overlap between train/test",
            fold.index
        );
    }
}

/// FALSIFY-KF-005: Block sizes differ by at most one, larger blocks first
#[test]
fn falsify_kf_005_block_sizes() {
    let sizes = KFold::new(4).split(18).expect("valid k").test_sizes();

    assert_eq!(
        sizes,
        vec![5, 5, 4, 4],
        "FALSIFIED KF-005: sizes={sizes:?}"
    );
}

/// FALSIFY-KF-006: Stratified folds keep every class within one of count / k
#[test]
fn falsify_kf_006_stratification_bound() {
    let labels: Vec<u8> = (0..53).map(|i| (i % 3) as u8 + u8::from(i % 7 == 0)).collect();
    let k = 4;
    let partition = StratifiedKFold::new(k)
        .with_random_state(11)
        .split(&labels)
        .expect("valid labels");

    let mut totals: BTreeMap<u8, usize> = BTreeMap::new();
    for &l in &labels {
        *totals.entry(l).or_default() += 1;
    }

    let distribution = partition.class_distribution(&labels).expect("aligned");
    for (fold_idx, counts) in distribution.iter().enumerate() {
        for (label, &total) in &totals {
            let got = counts.get(label).copied().unwrap_or(0) as f64;
            let expected = total as f64 / k as f64;
            assert!(
                (got - expected).abs() <= 1.0,
                "FALSIFIED KF-006: fold {fold_idx} label {label}: {got} vs {expected}"
            );
        }
    }
}

/// FALSIFY-KF-007: Same inputs and seed give the same folds
#[test]
fn falsify_kf_007_deterministic() {
    let labels: Vec<i32> = (0..40).map(|i| i % 2).collect();
    let labels = Some(&labels[..]);
    let a = partition(40, 5, PartitionMode::Stratified, labels, 99).expect("valid");
    let b = partition(40, 5, PartitionMode::Stratified, labels, 99).expect("valid");

    assert_eq!(a, b, "FALSIFIED KF-007: repeated partition differs");
}

mod kf_proptest_falsify {
    use super::*;
    use proptest::prelude::*;

    /// FALSIFY-KF-001-prop: K folds for random k/n
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn falsify_kf_001_prop_k_folds(
            k in 2..=10usize,
            n in 10..=50usize,
        ) {
            let partition = KFold::new(k).split(n).expect("k <= n");
            prop_assert_eq!(
                partition.k(),
                k,
                "FALSIFIED KF-001-prop: folds={} != k={}",
                partition.k(), k
            );
        }
    }

    /// FALSIFY-KF-002-prop: Every sample appears in exactly one test fold
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn falsify_kf_002_prop_sample_coverage(
            k in 2..=5usize,
            n in 10..=30usize,
            seed in any::<u64>(),
        ) {
            let partition = KFold::new(k).with_random_state(seed).split(n).expect("k <= n");

            let mut test_counts = vec![0usize; n];
            for fold in &partition {
                for &idx in &fold.test {
                    test_counts[idx] += 1;
                }
            }

            for (i, &count) in test_counts.iter().enumerate() {
                prop_assert_eq!(
                    count, 1,
                    "FALSIFIED KF-002-prop: sample {} appeared {} times",
                    i, count
                );
            }
        }
    }
}

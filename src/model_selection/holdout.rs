//! Train/validation/test holdout splits.
//!
//! A holdout split carves the samples into a handful of disjoint groups by
//! ratio (for example 70/15/15) instead of rotating through K folds. With
//! labels, each class is split separately so every group keeps the class
//! proportions.

use crate::error::{Result, ValidarError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

const RATIO_TOLERANCE: f64 = 1e-3;

/// Split `n_samples` indices into groups sized by `ratios`.
///
/// Group sizes are allocated with the largest-remainder rule, so they always
/// sum to the number of samples. When `labels` is given the allocation runs
/// per class.
///
/// # Errors
///
/// `Configuration` when fewer than two ratios are given, a ratio is not
/// positive, the ratios do not sum to 1, labels are misaligned, or a group
/// would end up empty.
///
/// # Example
///
/// ```
/// use validar::model_selection::holdout_split;
///
/// let labels: Vec<u8> = (0..100).map(|i| u8::from(i % 4 == 0)).collect();
/// let groups = holdout_split(100, Some(&labels[..]), &[0.70, 0.15, 0.15], 42)
///     .expect("valid ratios");
///
/// let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
/// assert_eq!(sizes.iter().sum::<usize>(), 100);
/// assert_eq!(sizes[0], 70);
/// ```
pub fn holdout_split<L: Ord>(
    n_samples: usize,
    labels: Option<&[L]>,
    ratios: &[f64],
    seed: u64,
) -> Result<Vec<Vec<usize>>> {
    validate_ratios(ratios)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut groups: Vec<Vec<usize>> = vec![Vec::new(); ratios.len()];

    match labels {
        Some(labels) => {
            if labels.len() != n_samples {
                return Err(ValidarError::configuration(
                    "labels.len()",
                    labels.len(),
                    format!("n_samples ({n_samples})"),
                ));
            }
            let mut class_indices: BTreeMap<&L, Vec<usize>> = BTreeMap::new();
            for (i, label) in labels.iter().enumerate() {
                class_indices.entry(label).or_default().push(i);
            }
            for indices in class_indices.values_mut() {
                indices.shuffle(&mut rng);
                deal_by_ratio(indices, ratios, &mut groups);
            }
            for group in &mut groups {
                group.shuffle(&mut rng);
            }
        }
        None => {
            let mut indices: Vec<usize> = (0..n_samples).collect();
            indices.shuffle(&mut rng);
            deal_by_ratio(&indices, ratios, &mut groups);
        }
    }

    if let Some(empty) = groups.iter().position(Vec::is_empty) {
        return Err(ValidarError::configuration(
            &format!("ratios[{empty}]"),
            ratios[empty],
            format!("a ratio that yields at least one of {n_samples} samples"),
        ));
    }

    Ok(groups)
}

fn validate_ratios(ratios: &[f64]) -> Result<()> {
    if ratios.len() < 2 {
        return Err(ValidarError::configuration(
            "ratios.len()",
            ratios.len(),
            ">= 2",
        ));
    }
    if let Some(bad) = ratios.iter().find(|r| !(r.is_finite() && **r > 0.0)) {
        return Err(ValidarError::configuration("ratio", bad, "> 0"));
    }
    let total: f64 = ratios.iter().sum();
    if (total - 1.0).abs() > RATIO_TOLERANCE {
        return Err(ValidarError::configuration(
            "sum(ratios)",
            total,
            "1.0 (within 1e-3)",
        ));
    }
    Ok(())
}

fn deal_by_ratio(indices: &[usize], ratios: &[f64], groups: &mut [Vec<usize>]) {
    let counts = allocate(indices.len(), ratios);
    let mut start = 0;
    for (group, count) in groups.iter_mut().zip(counts) {
        group.extend_from_slice(&indices[start..start + count]);
        start += count;
    }
}

/// Largest-remainder allocation of `n` items; ties go to the earlier group.
fn allocate(n: usize, ratios: &[f64]) -> Vec<usize> {
    let total: f64 = ratios.iter().sum();
    let exact: Vec<f64> = ratios.iter().map(|r| n as f64 * r / total).collect();
    // 1e-9 absorbs products like 10.0 * 0.7 landing just under 7
    let mut counts: Vec<usize> = exact.iter().map(|e| (e + 1e-9).floor() as usize).collect();

    let assigned: usize = counts.iter().sum();
    let mut order: Vec<usize> = (0..ratios.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - counts[a] as f64;
        let rb = exact[b] - counts[b] as f64;
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    for &g in order.iter().take(n.saturating_sub(assigned)) {
        counts[g] += 1;
    }
    counts
}

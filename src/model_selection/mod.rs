//! Fold partitioning and cross-validation orchestration.
//!
//! This module provides tools for:
//! - Random and stratified K-Fold partitioning ([`partition`], [`KFold`], [`StratifiedKFold`])
//! - Stratified train/validation/test holdout splits ([`holdout_split`])
//! - Running caller-supplied train/evaluate functions over the folds
//!   ([`CrossValidator`], [`run_kfold`], [`compare_models`])
//!
//! Partitioning consumes its randomness once, up front, from an explicit
//! RNG. Nothing here touches a process-wide generator.

mod cross_validation;
mod holdout;

pub use cross_validation::{
    compare_models, run_kfold, CrossValidator, Evaluator, FailureStage, FoldFailure, FoldRecord,
    ModelComparison, ModelRun, ModelSpec, RunResult, SyncModelSpec, TimingSummary, Trainer,
};
pub use holdout::holdout_split;

use crate::config::{validate_k, PartitionMode, PartitionOptions};
use crate::error::{Result, ValidarError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// One fold: a held-out test set and its complement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fold {
    /// Position of the fold in the partition
    pub index: usize,
    /// Training indices (every index not in `test`)
    pub train: Vec<usize>,
    /// Held-out indices
    pub test: Vec<usize>,
}

/// Non-fatal observation made while partitioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PartitionWarning {
    /// A class has fewer members than folds, so some folds lack it.
    SparseClass {
        /// Debug rendering of the label
        label: String,
        /// Number of samples carrying the label
        count: usize,
        /// Number of folds
        k: usize,
    },
}

impl std::fmt::Display for PartitionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SparseClass { label, count, k } => write!(
                f,
                "class {label} has {count} samples for {k} folds; {} folds will not contain it",
                k - count
            ),
        }
    }
}

/// A complete K-Fold partition of `n_samples` indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partition {
    /// Folds in index order
    pub folds: Vec<Fold>,
    /// How indices were assigned
    pub mode: PartitionMode,
    /// Sparse-class and similar warnings
    pub warnings: Vec<PartitionWarning>,
    n_samples: usize,
}

impl Partition {
    /// Number of folds.
    #[must_use]
    pub fn k(&self) -> usize {
        self.folds.len()
    }

    /// Number of partitioned samples.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Iterate over the folds.
    pub fn iter(&self) -> std::slice::Iter<'_, Fold> {
        self.folds.iter()
    }

    /// Test-set sizes per fold.
    #[must_use]
    pub fn test_sizes(&self) -> Vec<usize> {
        self.folds.iter().map(|f| f.test.len()).collect()
    }

    /// Label counts of each fold's test set.
    ///
    /// `labels` must be the vector the partition was built from (or any
    /// vector aligned with the samples).
    pub fn class_distribution<L: Ord + Clone>(
        &self,
        labels: &[L],
    ) -> Result<Vec<BTreeMap<L, usize>>> {
        if labels.len() != self.n_samples {
            return Err(ValidarError::dimension_mismatch(
                "labels",
                self.n_samples,
                labels.len(),
            ));
        }
        Ok(self
            .folds
            .iter()
            .map(|fold| {
                let mut counts = BTreeMap::new();
                for &i in &fold.test {
                    *counts.entry(labels[i].clone()).or_insert(0) += 1;
                }
                counts
            })
            .collect())
    }
}

impl<'a> IntoIterator for &'a Partition {
    type Item = &'a Fold;
    type IntoIter = std::slice::Iter<'a, Fold>;

    fn into_iter(self) -> Self::IntoIter {
        self.folds.iter()
    }
}

/// Partition `n_samples` indices into `k` folds, seeding the RNG from `seed`.
///
/// Calling twice with the same arguments yields identical folds.
///
/// # Errors
///
/// `ValidarError::Configuration` when `k < 2`, `k > n_samples`, or stratified
/// mode is requested without labels or with labels of the wrong length.
///
/// # Example
///
/// ```
/// use validar::config::PartitionMode;
/// use validar::model_selection::partition;
///
/// let labels: Vec<u8> = (0..10).map(|i| u8::from(i < 6)).collect();
/// let folds = partition(10, 2, PartitionMode::Stratified, Some(&labels[..]), 42)
///     .expect("valid partition");
///
/// let dist = folds.class_distribution(&labels).expect("aligned labels");
/// assert_eq!(dist[0][&1], 3);
/// assert_eq!(dist[1][&0], 2);
/// ```
pub fn partition<L: Ord + Debug>(
    n_samples: usize,
    k: usize,
    mode: PartitionMode,
    labels: Option<&[L]>,
    seed: u64,
) -> Result<Partition> {
    let mut rng = StdRng::seed_from_u64(seed);
    partition_with_rng(n_samples, k, mode, labels, &mut rng)
}

/// Partition with options bundled in a [`PartitionOptions`].
pub fn partition_with_options<L: Ord + Debug>(
    n_samples: usize,
    options: &PartitionOptions,
    labels: Option<&[L]>,
) -> Result<Partition> {
    partition(n_samples, options.k, options.mode, labels, options.seed)
}

/// Partition using a caller-owned RNG.
///
/// The RNG is only touched here, so randomness consumed later by training
/// code cannot change the folds.
pub fn partition_with_rng<L: Ord + Debug, R: Rng + ?Sized>(
    n_samples: usize,
    k: usize,
    mode: PartitionMode,
    labels: Option<&[L]>,
    rng: &mut R,
) -> Result<Partition> {
    validate_k(k, n_samples)?;

    let (test_folds, warnings) = match mode {
        PartitionMode::Random => (random_blocks(n_samples, k, rng), Vec::new()),
        PartitionMode::Stratified => {
            let labels = labels.ok_or_else(|| {
                ValidarError::configuration(
                    "labels",
                    "None",
                    "a label vector when mode = stratified",
                )
            })?;
            if labels.len() != n_samples {
                return Err(ValidarError::configuration(
                    "labels.len()",
                    labels.len(),
                    format!("n_samples ({n_samples})"),
                ));
            }
            stratified_blocks(labels, k, rng)
        }
    };

    for warning in &warnings {
        log::warn!("{warning}");
    }

    Ok(Partition {
        folds: complete_folds(test_folds, n_samples),
        mode,
        warnings,
        n_samples,
    })
}

/// Shuffle `[0, n)` and cut it into `k` contiguous blocks; the first
/// `n mod k` blocks get one extra element.
fn random_blocks<R: Rng + ?Sized>(n_samples: usize, k: usize, rng: &mut R) -> Vec<Vec<usize>> {
    let mut indices: Vec<usize> = (0..n_samples).collect();
    indices.shuffle(rng);

    let fold_size = n_samples / k;
    let remainder = n_samples % k;

    let mut blocks = Vec::with_capacity(k);
    let mut start = 0;
    for i in 0..k {
        let size = if i < remainder {
            fold_size + 1
        } else {
            fold_size
        };
        blocks.push(indices[start..start + size].to_vec());
        start += size;
    }
    blocks
}

/// Deal each class's shuffled indices round-robin across folds, then shuffle
/// each fold.
fn stratified_blocks<L: Ord + Debug, R: Rng + ?Sized>(
    labels: &[L],
    k: usize,
    rng: &mut R,
) -> (Vec<Vec<usize>>, Vec<PartitionWarning>) {
    // BTreeMap keeps class order, and therefore RNG consumption, stable.
    let mut class_indices: BTreeMap<&L, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        class_indices.entry(label).or_default().push(i);
    }

    let mut blocks: Vec<Vec<usize>> = vec![Vec::new(); k];
    let mut warnings = Vec::new();

    for (label, indices) in &mut class_indices {
        if indices.len() < k {
            warnings.push(PartitionWarning::SparseClass {
                label: format!("{label:?}"),
                count: indices.len(),
                k,
            });
        }
        indices.shuffle(rng);
        for (position, &sample) in indices.iter().enumerate() {
            blocks[position % k].push(sample);
        }
    }

    for block in &mut blocks {
        block.shuffle(rng);
    }

    (blocks, warnings)
}

/// Attach the complement of each test block as its training set.
fn complete_folds(test_blocks: Vec<Vec<usize>>, n_samples: usize) -> Vec<Fold> {
    let mut fold_of = vec![0usize; n_samples];
    for (j, block) in test_blocks.iter().enumerate() {
        for &i in block {
            fold_of[i] = j;
        }
    }

    test_blocks
        .into_iter()
        .enumerate()
        .map(|(index, test)| {
            let mut train = Vec::with_capacity(n_samples - test.len());
            train.extend((0..n_samples).filter(|&i| fold_of[i] != index));
            Fold { index, train, test }
        })
        .collect()
}

/// K-Fold cross-validator.
///
/// Shuffles the indices under a fixed seed and splits them into K blocks.
/// Each block is used once as test set while the remaining K-1 form the
/// training set.
///
/// # Example
///
/// ```rust
/// use validar::model_selection::KFold;
///
/// let kfold = KFold::new(5).with_random_state(7);
/// let partition = kfold.split(12).expect("5 <= 12");
///
/// for fold in &partition {
///     println!("Train: {:?}, Test: {:?}", fold.train, fold.test);
/// }
/// assert_eq!(partition.test_sizes(), vec![3, 3, 2, 2, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct KFold {
    n_splits: usize,
    random_state: u64,
}

impl KFold {
    /// Create a new K-Fold cross-validator.
    ///
    /// # Arguments
    ///
    /// * `n_splits` - Number of folds. Must be at least 2.
    #[must_use]
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            random_state: crate::config::DEFAULT_SEED,
        }
    }

    /// Set random state for reproducible shuffling.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }

    /// Generate the folds for `n_samples` samples.
    pub fn split(&self, n_samples: usize) -> Result<Partition> {
        partition::<()>(
            n_samples,
            self.n_splits,
            PartitionMode::Random,
            None,
            self.random_state,
        )
    }
}

/// Stratified K-Fold cross-validator.
///
/// Maintains the class proportions of `labels` in every fold: each fold's
/// count of a class differs from `class_count / k` by at most one.
///
/// # Example
///
/// ```rust
/// use validar::model_selection::StratifiedKFold;
///
/// let labels = vec!["a", "a", "a", "a", "b", "b", "b", "b", "c", "c"];
/// let skfold = StratifiedKFold::new(2).with_random_state(3);
///
/// let partition = skfold.split(&labels).expect("valid labels");
/// assert_eq!(partition.k(), 2);
/// assert!(partition.warnings.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct StratifiedKFold {
    n_splits: usize,
    random_state: u64,
}

impl StratifiedKFold {
    /// Create a new Stratified K-Fold cross-validator.
    #[must_use]
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            random_state: crate::config::DEFAULT_SEED,
        }
    }

    /// Set random state for reproducible shuffling.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }

    /// Generate stratified folds for `labels`.
    pub fn split<L: Ord + Debug>(&self, labels: &[L]) -> Result<Partition> {
        partition(
            labels.len(),
            self.n_splits,
            PartitionMode::Stratified,
            Some(labels),
            self.random_state,
        )
    }
}

#[cfg(test)]
#[path = "tests_kfold_contract.rs"]
mod tests_kfold_contract;

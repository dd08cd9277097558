//! Run configuration for cross-validation and model comparison.
//!
//! All settings live in [`ValidationConfig`], which is plain data: it derives
//! serde so callers can keep it next to their own experiment configuration,
//! and it is checked by [`ValidationConfig::validate`] before any fold runs.
//!
//! # Example
//!
//! ```
//! use validar::config::{PartitionMode, ValidationConfig};
//!
//! let config = ValidationConfig::new(5)
//!     .with_mode(PartitionMode::Stratified)
//!     .with_seed(7)
//!     .with_alpha(0.01);
//!
//! assert!(config.validate(100).is_ok());
//! assert!(config.validate(3).is_err()); // k > n_samples
//! ```

use crate::error::{Result, ValidarError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Default number of folds.
pub const DEFAULT_K: usize = 5;
/// Default partition seed.
pub const DEFAULT_SEED: u64 = 42;
/// Default significance level.
pub const DEFAULT_ALPHA: f64 = 0.05;
/// Default confidence level for mean-difference intervals.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;
/// Default score distance under which two models count as tied.
pub const DEFAULT_TIE_EPSILON: f64 = 1e-9;

/// How sample indices are assigned to folds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionMode {
    /// Shuffle all indices, then cut into contiguous blocks.
    #[default]
    Random,
    /// Deal each class's shuffled indices round-robin across folds.
    Stratified,
}

impl std::fmt::Display for PartitionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Random => write!(f, "random"),
            Self::Stratified => write!(f, "stratified"),
        }
    }
}

/// Fold partitioning options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionOptions {
    /// Number of folds
    pub k: usize,
    /// Random or stratified assignment
    pub mode: PartitionMode,
    /// Seed for the partition RNG, consumed before any fold runs
    pub seed: u64,
}

impl Default for PartitionOptions {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            mode: PartitionMode::Random,
            seed: DEFAULT_SEED,
        }
    }
}

impl PartitionOptions {
    /// Random partitioning into `k` folds with the default seed.
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ..Self::default()
        }
    }

    /// Set the partition mode.
    #[must_use]
    pub fn with_mode(mut self, mode: PartitionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the seed for reproducible partitioning.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks `2 <= k <= n_samples`.
    pub fn validate(&self, n_samples: usize) -> Result<()> {
        validate_k(self.k, n_samples)
    }
}

pub(crate) fn validate_k(k: usize, n_samples: usize) -> Result<()> {
    if k < 2 || k > n_samples {
        return Err(ValidarError::configuration(
            "k",
            k,
            format!("2 <= k <= n_samples ({n_samples})"),
        ));
    }
    Ok(())
}

/// Complete configuration of a validation or comparison run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Fold partitioning
    pub partition: PartitionOptions,
    /// Significance level before multiple-comparison correction
    pub alpha: f64,
    /// Confidence level of the mean-difference interval
    pub confidence_level: f64,
    /// Models whose scores differ by less than this are tied
    pub tie_epsilon: f64,
    /// Per-metric weights for the ranking score (equal weights when absent)
    pub metric_weights: Option<BTreeMap<String, f64>>,
    /// Metric compared between models; the weighted per-fold score when absent
    pub primary_metric: Option<String>,
    /// Wall-clock budget for one fold's train + evaluate
    pub fold_timeout: Option<Duration>,
    /// Run folds on the rayon thread pool
    pub parallel: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            partition: PartitionOptions::default(),
            alpha: DEFAULT_ALPHA,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            tie_epsilon: DEFAULT_TIE_EPSILON,
            metric_weights: None,
            primary_metric: None,
            fold_timeout: None,
            parallel: false,
        }
    }
}

impl ValidationConfig {
    /// Configuration for `k` folds, everything else default.
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self {
            partition: PartitionOptions::new(k),
            ..Self::default()
        }
    }

    /// Set the partition mode.
    #[must_use]
    pub fn with_mode(mut self, mode: PartitionMode) -> Self {
        self.partition.mode = mode;
        self
    }

    /// Set the partition seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.partition.seed = seed;
        self
    }

    /// Set the significance level.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the confidence level of mean-difference intervals.
    #[must_use]
    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    /// Set the tie epsilon used by the ranking selector.
    #[must_use]
    pub fn with_tie_epsilon(mut self, epsilon: f64) -> Self {
        self.tie_epsilon = epsilon;
        self
    }

    /// Weight metrics in the ranking score. Metrics without a weight count zero.
    #[must_use]
    pub fn with_metric_weights(mut self, weights: BTreeMap<String, f64>) -> Self {
        self.metric_weights = Some(weights);
        self
    }

    /// Compare models on a single metric instead of the weighted score.
    #[must_use]
    pub fn with_primary_metric(mut self, metric: impl Into<String>) -> Self {
        self.primary_metric = Some(metric.into());
        self
    }

    /// Treat folds slower than `timeout` as failures.
    #[must_use]
    pub fn with_fold_timeout(mut self, timeout: Duration) -> Self {
        self.fold_timeout = Some(timeout);
        self
    }

    /// Run folds concurrently.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Validate every parameter against a dataset of `n_samples`.
    pub fn validate(&self, n_samples: usize) -> Result<()> {
        self.partition.validate(n_samples)?;
        self.validate_statistics()
    }

    /// Validate the statistical parameters only.
    pub fn validate_statistics(&self) -> Result<()> {
        validate_alpha(self.alpha)?;
        validate_confidence_level(self.confidence_level)?;
        if !self.tie_epsilon.is_finite() || self.tie_epsilon < 0.0 {
            return Err(ValidarError::configuration(
                "tie_epsilon",
                self.tie_epsilon,
                "finite and >= 0",
            ));
        }
        if let Some(weights) = &self.metric_weights {
            validate_weights(weights)?;
        }
        if let Some(timeout) = self.fold_timeout {
            if timeout.is_zero() {
                return Err(ValidarError::configuration(
                    "fold_timeout",
                    "0s",
                    "a positive duration",
                ));
            }
        }
        Ok(())
    }
}

pub(crate) fn validate_alpha(alpha: f64) -> Result<()> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(ValidarError::configuration("alpha", alpha, "0 < alpha < 1"));
    }
    Ok(())
}

pub(crate) fn validate_confidence_level(level: f64) -> Result<()> {
    if !(level > 0.0 && level < 1.0) {
        return Err(ValidarError::configuration(
            "confidence_level",
            level,
            "0 < confidence_level < 1",
        ));
    }
    Ok(())
}

pub(crate) fn validate_weights(weights: &BTreeMap<String, f64>) -> Result<()> {
    for (name, &w) in weights {
        if !w.is_finite() || w < 0.0 {
            return Err(ValidarError::configuration(
                &format!("metric_weights[{name}]"),
                w,
                "finite and >= 0",
            ));
        }
    }
    if weights.values().sum::<f64>() <= 0.0 {
        return Err(ValidarError::configuration(
            "metric_weights",
            "all zero",
            "at least one positive weight",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ValidationConfig::default();
        assert_eq!(config.partition.k, 5);
        assert_eq!(config.partition.mode, PartitionMode::Random);
        assert_eq!(config.partition.seed, 42);
        assert!((config.alpha - 0.05).abs() < f64::EPSILON);
        assert!((config.confidence_level - 0.95).abs() < f64::EPSILON);
        assert!((config.tie_epsilon - 1e-9).abs() < f64::EPSILON);
        assert!(!config.parallel);
    }

    #[test]
    fn test_k_bounds() {
        assert!(ValidationConfig::new(2).validate(2).is_ok());
        assert!(ValidationConfig::new(10).validate(10).is_ok());

        let err = ValidationConfig::new(1).validate(10).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("k = 1"));

        let err = ValidationConfig::new(11).validate(10).unwrap_err();
        assert!(err.to_string().contains("n_samples (10)"));
    }

    #[test]
    fn test_alpha_bounds() {
        assert!(ValidationConfig::new(2).with_alpha(0.0).validate(4).is_err());
        assert!(ValidationConfig::new(2).with_alpha(1.0).validate(4).is_err());
        assert!(ValidationConfig::new(2)
            .with_alpha(f64::NAN)
            .validate(4)
            .is_err());
        assert!(ValidationConfig::new(2).with_alpha(0.01).validate(4).is_ok());
    }

    #[test]
    fn test_confidence_level_bounds() {
        assert!(ValidationConfig::new(2)
            .with_confidence_level(1.0)
            .validate(4)
            .is_err());
        assert!(ValidationConfig::new(2)
            .with_confidence_level(0.99)
            .validate(4)
            .is_ok());
    }

    #[test]
    fn test_weights_validation() {
        let mut weights = BTreeMap::new();
        weights.insert("accuracy".to_string(), -1.0);
        let config = ValidationConfig::new(2).with_metric_weights(weights.clone());
        assert!(config.validate(4).is_err());

        weights.insert("accuracy".to_string(), 0.0);
        let config = ValidationConfig::new(2).with_metric_weights(weights.clone());
        assert!(config.validate(4).is_err());

        weights.insert("f1".to_string(), 2.0);
        let config = ValidationConfig::new(2).with_metric_weights(weights);
        assert!(config.validate(4).is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ValidationConfig::new(2).with_fold_timeout(Duration::ZERO);
        assert!(config.validate(4).is_err());
    }

    #[test]
    fn test_serde_roundtrip_with_partial_input() {
        let json = r#"{"partition":{"k":3,"mode":"stratified","seed":9},"alpha":0.1}"#;
        let config: ValidationConfig = serde_json::from_str(json).expect("valid config json");
        assert_eq!(config.partition.k, 3);
        assert_eq!(config.partition.mode, PartitionMode::Stratified);
        assert!((config.alpha - 0.1).abs() < f64::EPSILON);
        assert!((config.confidence_level - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(PartitionMode::Random.to_string(), "random");
        assert_eq!(PartitionMode::Stratified.to_string(), "stratified");
    }
}

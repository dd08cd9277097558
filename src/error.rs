//! Error types for Validar operations.
//!
//! Configuration and structural errors are fatal and surface before (or
//! instead of) a result. Per-fold failures are not errors: they are recorded
//! as [`FoldFailure`](crate::model_selection::FoldFailure) entries and only
//! escalate to [`ValidarError::RunFailure`] when every fold of a run fails.

use crate::model_selection::FoldFailure;
use thiserror::Error;

/// Main error type for Validar operations.
///
/// # Examples
///
/// ```
/// use validar::error::ValidarError;
///
/// let err = ValidarError::configuration("k", 1, "2 <= k <= n_samples (10)");
/// assert!(err.to_string().contains("Invalid configuration"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidarError {
    /// A run parameter violates its constraint (invalid `k`, missing or
    /// misaligned labels, bad alpha, negative weights).
    #[error("Invalid configuration: {param} = {value}, expected {constraint}")]
    Configuration {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Fold results expose different metric name sets.
    #[error(
        "Structural mismatch in fold {fold_index}: expected metrics {expected:?}, got {actual:?}"
    )]
    StructuralMismatch {
        /// Fold whose metrics disagree with the first fold
        fold_index: usize,
        /// Metric names of the first successful fold
        expected: Vec<String>,
        /// Metric names of the offending fold
        actual: Vec<String>,
    },

    /// Every fold of a run failed.
    #[error("Run failed: all {} folds failed ({})", failures.len(), summarize_failures(failures))]
    RunFailure {
        /// Underlying per-fold failures, in fold order
        failures: Vec<FoldFailure>,
    },

    /// Not enough observations for the requested statistic.
    #[error("Insufficient data for {context}: need at least {required}, got {actual}")]
    InsufficientData {
        /// Operation that needed the data
        context: String,
        /// Minimum number of observations
        required: usize,
        /// Number of observations supplied
        actual: usize,
    },

    /// Both series have zero variance, so a t statistic is undefined.
    #[error("Degenerate variance in {context}: both series are constant")]
    DegenerateVariance {
        /// Operation that needed a non-zero standard error
        context: String,
    },

    /// A sample index lies outside the dataset.
    #[error("Index {index} out of bounds (len={len})")]
    IndexOutOfBounds {
        /// Offending index
        index: usize,
        /// Dataset length
        len: usize,
    },

    /// Parallel collections disagree in length.
    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Collection being checked
        context: String,
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },
}

fn summarize_failures(failures: &[FoldFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("fold {}: {}", f.fold_index, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidarError {
    /// Create a configuration error for `param` holding `value`.
    #[must_use]
    pub fn configuration(
        param: &str,
        value: impl std::fmt::Display,
        constraint: impl Into<String>,
    ) -> Self {
        Self::Configuration {
            param: param.to_string(),
            value: value.to_string(),
            constraint: constraint.into(),
        }
    }

    /// Create an insufficient data error
    #[must_use]
    pub fn insufficient_data(context: &str, required: usize, actual: usize) -> Self {
        Self::InsufficientData {
            context: context.to_string(),
            required,
            actual,
        }
    }

    /// Create a dimension mismatch error
    #[must_use]
    pub fn dimension_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            context: context.to_string(),
            expected,
            actual,
        }
    }

    /// Returns true for errors raised before any fold runs.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, ValidarError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_selection::FailureStage;

    #[test]
    fn test_configuration_display() {
        let err = ValidarError::configuration("k", 1, "2 <= k <= 10");
        let msg = err.to_string();
        assert!(msg.contains("Invalid configuration"));
        assert!(msg.contains("k = 1"));
        assert!(msg.contains("2 <= k <= 10"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_structural_mismatch_display() {
        let err = ValidarError::StructuralMismatch {
            fold_index: 3,
            expected: vec!["accuracy".to_string()],
            actual: vec!["f1".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("fold 3"));
        assert!(msg.contains("accuracy"));
        assert!(msg.contains("f1"));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_run_failure_lists_folds() {
        let err = ValidarError::RunFailure {
            failures: vec![
                FoldFailure::new(0, FailureStage::Train, "diverged"),
                FoldFailure::new(1, FailureStage::Evaluate, "nan loss"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("all 2 folds failed"));
        assert!(msg.contains("fold 0: diverged"));
        assert!(msg.contains("fold 1: nan loss"));
    }

    #[test]
    fn test_insufficient_data_helper() {
        let err = ValidarError::insufficient_data("comparison series", 1, 0);
        let msg = err.to_string();
        assert!(msg.contains("comparison series"));
        assert!(msg.contains("at least 1"));
    }

    #[test]
    fn test_dimension_mismatch_helper() {
        let err = ValidarError::dimension_mismatch("labels", 100, 99);
        assert!(err.to_string().contains("expected 100, got 99"));
    }

    #[test]
    fn test_degenerate_variance_display() {
        let err = ValidarError::DegenerateVariance {
            context: "welch t-test".to_string(),
        };
        assert!(err.to_string().contains("welch t-test"));
    }

    #[test]
    fn test_index_out_of_bounds_display() {
        let err = ValidarError::IndexOutOfBounds { index: 10, len: 5 };
        let msg = err.to_string();
        assert!(msg.contains("Index 10"));
        assert!(msg.contains("len=5"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ValidarError>();
    }
}

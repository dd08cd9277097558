//! Aggregation and statistical comparison of cross-validation results.
//!
//! - [`descriptive`]: mean, sample standard deviation, min, max and median of
//!   each metric across folds, with the raw per-fold values kept in order
//! - [`hypothesis`]: Welch's t-test, confidence intervals, Cohen's d and
//!   Bonferroni-corrected all-pairs comparison
//!
//! # Examples
//!
//! ```
//! use validar::stats::{aggregate, compare, FoldMetrics};
//!
//! let model_a: Vec<FoldMetrics> = [0.82, 0.85, 0.80].iter().map(|&v| v.into()).collect();
//! let stats = aggregate(&model_a).expect("consistent metrics");
//! let accuracy = stats.get("score").expect("scalar results are named 'score'");
//!
//! let result = compare(&accuracy.values, &[0.70, 0.72, 0.69], 0.05).expect("valid series");
//! assert!(result.mean_difference > 0.0);
//! ```

pub mod descriptive;
pub mod hypothesis;

pub use descriptive::{
    aggregate, summarize, AggregatedStatistics, FoldMetrics, MetricSummary, SCALAR_METRIC,
};
pub use hypothesis::{
    compare, compare_many, welch_ttest, Comparator, ComparisonReport, Correction,
    NamedComparison, PairwiseComparison, StatisticsWarning, TTestResult, EFFECT_SIZE_SENTINEL,
};

//! Per-fold metric aggregation.
//!
//! Reduces the metrics returned by each fold into mean, sample standard
//! deviation, min, max and median per metric, keeping the raw per-fold values
//! in fold order for later hypothesis testing.

use crate::error::{Result, ValidarError};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Metric name used for folds that return a single scalar.
pub const SCALAR_METRIC: &str = "score";

/// What an evaluate function returns for one fold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FoldMetrics {
    /// A single unnamed score, reported as [`SCALAR_METRIC`].
    Scalar(f64),
    /// Named metrics.
    Named(BTreeMap<String, f64>),
}

impl FoldMetrics {
    /// Build named metrics from `(name, value)` pairs.
    ///
    /// ```
    /// use validar::stats::FoldMetrics;
    ///
    /// let m = FoldMetrics::named([("accuracy", 0.9), ("f1", 0.85)]);
    /// assert_eq!(m.get("f1"), Some(0.85));
    /// ```
    pub fn named<K: Into<String>>(pairs: impl IntoIterator<Item = (K, f64)>) -> Self {
        Self::Named(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Metric names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        match self {
            Self::Scalar(_) => vec![SCALAR_METRIC.to_string()],
            Self::Named(map) => map.keys().cloned().collect(),
        }
    }

    /// Value of one metric.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        match self {
            Self::Scalar(v) if name == SCALAR_METRIC => Some(*v),
            Self::Scalar(_) => None,
            Self::Named(map) => map.get(name).copied(),
        }
    }

    /// All `(name, value)` pairs in name order.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        match self {
            Self::Scalar(v) => BTreeMap::from([(SCALAR_METRIC.to_string(), *v)]),
            Self::Named(map) => map.clone(),
        }
    }
}

impl From<f64> for FoldMetrics {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<f32> for FoldMetrics {
    fn from(value: f32) -> Self {
        Self::Scalar(f64::from(value))
    }
}

impl From<BTreeMap<String, f64>> for FoldMetrics {
    fn from(map: BTreeMap<String, f64>) -> Self {
        Self::Named(map)
    }
}

impl From<HashMap<String, f64>> for FoldMetrics {
    fn from(map: HashMap<String, f64>) -> Self {
        Self::Named(map.into_iter().collect())
    }
}

impl<const N: usize> From<[(&str, f64); N]> for FoldMetrics {
    fn from(pairs: [(&str, f64); N]) -> Self {
        Self::named(pairs)
    }
}

/// Summary statistics of one metric across folds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    /// Arithmetic mean
    pub mean: f64,
    /// Sample standard deviation (n - 1), zero for a single value
    pub std: f64,
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
    /// Median (average of the middle pair for even counts)
    pub median: f64,
    /// Per-fold values in fold order
    pub values: Vec<f64>,
}

impl MetricSummary {
    /// Number of values summarized.
    #[must_use]
    pub fn n(&self) -> usize {
        self.values.len()
    }

    /// Sample variance.
    #[must_use]
    pub fn variance(&self) -> f64 {
        self.std * self.std
    }
}

/// Summarize a series of values.
///
/// # Errors
///
/// `InsufficientData` for an empty series.
///
/// # Example
///
/// ```
/// use validar::stats::summarize;
///
/// let s = summarize(&[0.8, 0.9, 0.7, 1.0]).expect("non-empty");
/// assert!((s.mean - 0.85).abs() < 1e-12);
/// assert!((s.median - 0.85).abs() < 1e-12);
/// assert_eq!(s.min, 0.7);
/// assert_eq!(s.max, 1.0);
/// ```
pub fn summarize(values: &[f64]) -> Result<MetricSummary> {
    if values.is_empty() {
        return Err(ValidarError::insufficient_data("metric summary", 1, 0));
    }
    let n = values.len();
    let (mean, variance) = mean_and_variance(values);
    let std = variance.sqrt();

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    Ok(MetricSummary {
        mean,
        std,
        min: sorted[0],
        max: sorted[n - 1],
        median: quantile_sorted(&sorted, 0.5),
        values: values.to_vec(),
    })
}

/// Mean and sample variance of `values`.
///
/// A constant series yields its own value and exactly zero variance; summing
/// and dividing would leave the mean an ulp off and the variance positive.
/// An empty series yields `(NaN, 0)`.
pub(crate) fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    let Some(&first) = values.first() else {
        return (f64::NAN, 0.0);
    };
    if values.iter().all(|&v| v == first) {
        return (first, 0.0);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    (mean, sample_variance(values, mean))
}

/// Sample variance around `mean`; zero when fewer than two values.
fn sample_variance(values: &[f64], mean: f64) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    values.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
}

/// Quantile of sorted data by linear interpolation (R-7, Hyndman & Fan 1996).
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let h = (n - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    let fraction = h - lo as f64;
    sorted[lo] + fraction * (sorted[hi] - sorted[lo])
}

/// Summary statistics for every metric of a run.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct AggregatedStatistics {
    metrics: BTreeMap<String, MetricSummary>,
}

impl AggregatedStatistics {
    /// Statistics holding a single metric.
    #[must_use]
    pub fn from_summary(name: impl Into<String>, summary: MetricSummary) -> Self {
        Self {
            metrics: BTreeMap::from([(name.into(), summary)]),
        }
    }

    /// Summary of one metric.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MetricSummary> {
        self.metrics.get(name)
    }

    /// Metric names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(String::as_str)
    }

    /// Iterate over `(name, summary)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricSummary)> {
        self.metrics.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of metrics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Returns true when no metric was aggregated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Number of folds behind the statistics.
    #[must_use]
    pub fn n_folds(&self) -> usize {
        self.metrics.values().next().map_or(0, MetricSummary::n)
    }

    /// Mean of every metric.
    #[must_use]
    pub fn means(&self) -> BTreeMap<String, f64> {
        self.metrics
            .iter()
            .map(|(k, v)| (k.clone(), v.mean))
            .collect()
    }
}

/// Aggregate per-fold metrics.
///
/// # Errors
///
/// - `StructuralMismatch` when a fold's metric names differ from the first fold's
/// - `InsufficientData` when `results` is empty
///
/// # Example
///
/// ```
/// use validar::stats::{aggregate, FoldMetrics};
///
/// let folds = vec![
///     FoldMetrics::named([("accuracy", 0.8), ("f1", 0.7)]),
///     FoldMetrics::named([("accuracy", 0.9), ("f1", 0.8)]),
/// ];
/// let stats = aggregate(&folds).expect("consistent metrics");
/// assert_eq!(stats.get("accuracy").map(|s| s.values.clone()), Some(vec![0.8, 0.9]));
/// ```
pub fn aggregate(results: &[FoldMetrics]) -> Result<AggregatedStatistics> {
    aggregate_indexed(results.iter().enumerate())
}

/// Aggregate metrics tagged with their fold index; the index only feeds error
/// messages.
pub(crate) fn aggregate_indexed<'a>(
    results: impl IntoIterator<Item = (usize, &'a FoldMetrics)>,
) -> Result<AggregatedStatistics> {
    let mut expected: Option<Vec<String>> = None;
    let mut series: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for (fold_index, metrics) in results {
        let names = metrics.names();
        match &expected {
            None => {
                for name in &names {
                    series.insert(name.clone(), Vec::new());
                }
                expected = Some(names);
            }
            Some(first) if *first != names => {
                return Err(ValidarError::StructuralMismatch {
                    fold_index,
                    expected: first.clone(),
                    actual: names,
                });
            }
            Some(_) => {}
        }
        for (name, value) in metrics.to_map() {
            if let Some(values) = series.get_mut(&name) {
                values.push(value);
            }
        }
    }

    if expected.is_none() {
        return Err(ValidarError::insufficient_data("aggregation", 1, 0));
    }

    let mut metrics = BTreeMap::new();
    for (name, values) in series {
        if values.iter().all(|v| *v == values[0]) && values.len() > 1 {
            log::debug!("metric '{name}' is constant across {} folds", values.len());
        }
        metrics.insert(name, summarize(&values)?);
    }
    Ok(AggregatedStatistics { metrics })
}

#[cfg(test)]
#[path = "tests_descriptive_contract.rs"]
mod tests_descriptive_contract;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_values_have_exact_mean_and_zero_std() {
        for n in [3, 6, 7] {
            let s = summarize(&vec![0.7; n]).expect("non-empty");
            assert_eq!(s.mean, 0.7, "n={n}");
            assert_eq!(s.std, 0.0, "n={n}");
            assert_eq!(s.median, 0.7);
        }
    }

    #[test]
    fn test_mean_and_variance_of_varying_series() {
        let (mean, var) = mean_and_variance(&[1.0, 2.0, 3.0]);
        assert_eq!(mean, 2.0);
        assert_eq!(var, 1.0);
        assert!(mean_and_variance(&[]).0.is_nan());
    }

    #[test]
    fn test_summarize_basic() {
        let s = summarize(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).expect("non-empty");
        assert!((s.mean - 5.0).abs() < 1e-12);
        // sample variance = 32 / 7
        assert!((s.std - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 9.0);
        assert!((s.median - 4.5).abs() < 1e-12);
        assert_eq!(s.n(), 8);
    }

    #[test]
    fn test_summarize_single_value_has_zero_std() {
        let s = summarize(&[0.75]).expect("non-empty");
        assert_eq!(s.mean, 0.75);
        assert_eq!(s.std, 0.0);
        assert_eq!(s.median, 0.75);
    }

    #[test]
    fn test_summarize_empty() {
        assert!(matches!(
            summarize(&[]),
            Err(ValidarError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_summarize_odd_median() {
        let s = summarize(&[3.0, 1.0, 2.0]).expect("non-empty");
        assert_eq!(s.median, 2.0);
        assert_eq!(s.values, vec![3.0, 1.0, 2.0], "values keep fold order");
    }

    #[test]
    fn test_constant_metric_reported() {
        let folds = vec![FoldMetrics::Scalar(0.9); 4];
        let stats = aggregate(&folds).expect("consistent");
        let s = stats.get(SCALAR_METRIC).expect("scalar metric present");
        assert_eq!(s.std, 0.0);
        assert!((s.mean - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_structural_mismatch() {
        let folds = vec![
            FoldMetrics::named([("accuracy", 0.8)]),
            FoldMetrics::named([("accuracy", 0.9)]),
            FoldMetrics::named([("accuracy", 0.9), ("f1", 0.5)]),
        ];
        match aggregate(&folds) {
            Err(ValidarError::StructuralMismatch {
                fold_index,
                expected,
                actual,
            }) => {
                assert_eq!(fold_index, 2);
                assert_eq!(expected, vec!["accuracy"]);
                assert_eq!(actual, vec!["accuracy", "f1"]);
            }
            other => panic!("expected structural mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_scalar_and_named_mix_mismatch() {
        let folds = vec![FoldMetrics::Scalar(0.5), FoldMetrics::named([("f1", 0.5)])];
        assert!(matches!(
            aggregate(&folds),
            Err(ValidarError::StructuralMismatch { fold_index: 1, .. })
        ));
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate(&[]).is_err());
    }

    #[test]
    fn test_fold_metrics_conversions() {
        assert_eq!(FoldMetrics::from(0.5), FoldMetrics::Scalar(0.5));
        assert_eq!(FoldMetrics::from(0.5_f32), FoldMetrics::Scalar(0.5));
        let mut hm = HashMap::new();
        hm.insert("a".to_string(), 1.0);
        assert_eq!(FoldMetrics::from(hm).get("a"), Some(1.0));
        let from_array: FoldMetrics = [("x", 2.0)].into();
        assert_eq!(from_array.names(), vec!["x"]);
        assert_eq!(FoldMetrics::Scalar(1.0).get("other"), None);
    }

    #[test]
    fn test_aggregated_accessors() {
        let folds = vec![
            FoldMetrics::named([("a", 1.0), ("b", 3.0)]),
            FoldMetrics::named([("a", 2.0), ("b", 5.0)]),
        ];
        let stats = aggregate(&folds).expect("consistent");
        assert_eq!(stats.len(), 2);
        assert_eq!(stats.n_folds(), 2);
        assert_eq!(stats.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(stats.means()["b"], 4.0);
        assert!(!stats.is_empty());
    }

    #[test]
    fn test_serializes_as_metric_map() {
        let stats = aggregate(&[FoldMetrics::Scalar(1.0)]).expect("consistent");
        let json = serde_json::to_value(&stats).expect("serializable");
        assert_eq!(json["score"]["mean"], 1.0);
        assert_eq!(json["score"]["values"][0], 1.0);
    }
}

//! Statistical comparison of per-fold metric series.
//!
//! Implements Welch's unequal-variance t-test, confidence intervals on the
//! mean difference, Cohen's d effect size, and all-pairs comparison with a
//! Bonferroni correction.
//!
//! # Degenerate variance
//!
//! Constant series (every fold returned the same value) have no spread, so
//! the t statistic is undefined. Instead of dividing by zero:
//!
//! - equal means: `p_value = 1.0`, not significant, `effect_size = 0`
//! - different means: `p_value = 0.0`, significant, `effect_size` is
//!   `±EFFECT_SIZE_SENTINEL`
//!
//! Both cases attach a [`StatisticsWarning`] to the comparison. Constant
//! metrics usually mean a metric calculator upstream is broken.
//!
//! # Example
//!
//! ```
//! use validar::stats::compare;
//!
//! let model_a = [0.91, 0.89, 0.93, 0.90, 0.92];
//! let model_b = [0.71, 0.74, 0.69, 0.72, 0.70];
//!
//! let result = compare(&model_a, &model_b, 0.05).expect("valid series");
//! assert!(result.significant);
//! assert!(result.effect_size > 0.0);
//! assert!(result.confidence_interval.0 > 0.0);
//! ```

use crate::config::{
    validate_alpha, validate_confidence_level, DEFAULT_ALPHA, DEFAULT_CONFIDENCE_LEVEL,
};
use crate::error::{Result, ValidarError};
use crate::selection::{select_best, BestModel, RankingOptions};
use crate::stats::descriptive::{
    mean_and_variance, summarize, AggregatedStatistics, SCALAR_METRIC,
};
use serde::Serialize;
use std::collections::BTreeSet;

/// Magnitude reported as Cohen's d when both series are constant with
/// different means.
pub const EFFECT_SIZE_SENTINEL: f64 = 1.0e6;

/// Result of a t-test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TTestResult {
    /// t-statistic
    pub statistic: f64,

    /// p-value (two-tailed)
    pub p_value: f64,

    /// Degrees of freedom
    pub df: f64,
}

/// Welch's two-sample t-test (unequal variances).
///
/// H₀: μ₁ = μ₂
/// H₁: μ₁ ≠ μ₂
///
/// Degrees of freedom follow Welch–Satterthwaite.
///
/// # Errors
///
/// - `InsufficientData` when either sample has fewer than 2 observations
/// - `DegenerateVariance` when both samples are constant
pub fn welch_ttest(sample1: &[f64], sample2: &[f64]) -> Result<TTestResult> {
    let n1 = sample1.len();
    let n2 = sample2.len();
    if n1 < 2 || n2 < 2 {
        return Err(ValidarError::insufficient_data(
            "welch t-test",
            2,
            n1.min(n2),
        ));
    }

    let a = SeriesMoments::new(sample1);
    let b = SeriesMoments::new(sample2);
    let se2 = a.var / a.n + b.var / b.n;
    if se2 <= 0.0 {
        return Err(ValidarError::DegenerateVariance {
            context: "welch t-test".to_string(),
        });
    }

    let statistic = (a.mean - b.mean) / se2.sqrt();
    let df = welch_df(&a, &b);
    Ok(TTestResult {
        statistic,
        p_value: t_two_tailed_pvalue(statistic, df),
        df,
    })
}

/// Mean, variance and size of one series.
#[derive(Debug, Clone, Copy)]
struct SeriesMoments {
    mean: f64,
    var: f64,
    n: f64,
}

impl SeriesMoments {
    fn new(values: &[f64]) -> Self {
        let (mean, var) = mean_and_variance(values);
        Self {
            mean,
            var,
            n: values.len() as f64,
        }
    }

    /// Contribution to the Welch–Satterthwaite denominator.
    fn df_term(&self) -> f64 {
        if self.n < 2.0 {
            return 0.0;
        }
        (self.var / self.n).powi(2) / (self.n - 1.0)
    }
}

fn welch_df(a: &SeriesMoments, b: &SeriesMoments) -> f64 {
    let numerator = (a.var / a.n + b.var / b.n).powi(2);
    numerator / (a.df_term() + b.df_term())
}

/// Non-fatal conditions found while comparing two series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticsWarning {
    /// Both series constant and equal.
    ZeroVarianceEqualMeans,
    /// Both series constant with different values.
    ZeroVarianceUnequalMeans,
    /// A series has a single observation, so its variance is taken as zero.
    SingleObservation {
        /// Size of the first series
        n_a: usize,
        /// Size of the second series
        n_b: usize,
    },
}

impl StatisticsWarning {
    /// True for the zero-variance warnings.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        matches!(
            self,
            Self::ZeroVarianceEqualMeans | Self::ZeroVarianceUnequalMeans
        )
    }

    fn reversed(self) -> Self {
        match self {
            Self::SingleObservation { n_a, n_b } => Self::SingleObservation { n_a: n_b, n_b: n_a },
            other => other,
        }
    }
}

impl std::fmt::Display for StatisticsWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroVarianceEqualMeans => {
                write!(f, "both series have zero variance and equal means")
            }
            Self::ZeroVarianceUnequalMeans => write!(
                f,
                "both series have zero variance but different means; check the metric calculation"
            ),
            Self::SingleObservation { n_a, n_b } => write!(
                f,
                "series sizes ({n_a}, {n_b}) include a single observation; its variance is taken as zero"
            ),
        }
    }
}

/// Outcome of comparing the metric series of two models.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairwiseComparison {
    /// Mean of the first series
    pub mean_a: f64,
    /// Mean of the second series
    pub mean_b: f64,
    /// `mean_a - mean_b`
    pub mean_difference: f64,
    /// Welch t statistic
    pub statistic: f64,
    /// Welch–Satterthwaite degrees of freedom
    pub df: f64,
    /// Two-tailed p-value, never adjusted
    pub p_value: f64,
    /// `p_value < alpha`
    pub significant: bool,
    /// Threshold `significant` was decided against (after correction)
    pub alpha: f64,
    /// Confidence level of `confidence_interval`
    pub confidence_level: f64,
    /// Interval on the mean difference
    pub confidence_interval: (f64, f64),
    /// Cohen's d with pooled standard deviation
    pub effect_size: f64,
    /// Sizes of the two series
    pub sample_sizes: (usize, usize),
    /// Degenerate-statistics and small-sample warnings
    pub warnings: Vec<StatisticsWarning>,
}

impl PairwiseComparison {
    /// The same comparison with the two series swapped.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            mean_a: self.mean_b,
            mean_b: self.mean_a,
            mean_difference: -self.mean_difference,
            statistic: -self.statistic,
            df: self.df,
            p_value: self.p_value,
            significant: self.significant,
            alpha: self.alpha,
            confidence_level: self.confidence_level,
            confidence_interval: (-self.confidence_interval.1, -self.confidence_interval.0),
            effect_size: -self.effect_size,
            sample_sizes: (self.sample_sizes.1, self.sample_sizes.0),
            warnings: self.warnings.iter().map(|w| w.reversed()).collect(),
        }
    }

    /// True when a zero-variance warning is attached.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.warnings.iter().any(StatisticsWarning::is_degenerate)
    }

    fn reevaluate(&mut self, alpha: f64) {
        self.alpha = alpha;
        self.significant = self.p_value < alpha;
    }
}

/// Multiple-comparison correction applied by [`compare_many`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Correction {
    /// Two models, one comparison.
    None,
    /// `alpha / number_of_comparisons`.
    Bonferroni,
}

/// One entry of a [`ComparisonReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedComparison {
    /// First model
    pub model_a: String,
    /// Second model
    pub model_b: String,
    /// Position of `model_a` in the caller's order
    pub index_a: usize,
    /// Position of `model_b` in the caller's order
    pub index_b: usize,
    /// Statistics, oriented as `model_a` vs `model_b`
    #[serde(flatten)]
    pub result: PairwiseComparison,
}

/// All pairwise comparisons between M models plus the recommended model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    /// Model names in caller order
    pub models: Vec<String>,
    /// `M·(M-1)/2` comparisons, ordered by `(index_a, index_b)`
    pub comparisons: Vec<NamedComparison>,
    /// Requested significance level
    pub alpha: f64,
    /// Level each comparison was tested against
    pub corrected_alpha: f64,
    /// Correction that produced `corrected_alpha`
    pub correction: Correction,
    /// Recommended model
    pub best: Option<BestModel>,
}

impl ComparisonReport {
    /// Comparison between two models, oriented as `a` vs `b`.
    #[must_use]
    pub fn between(&self, a: &str, b: &str) -> Option<PairwiseComparison> {
        self.comparisons.iter().find_map(|c| {
            if c.model_a == a && c.model_b == b {
                Some(c.result.clone())
            } else if c.model_a == b && c.model_b == a {
                Some(c.result.reversed())
            } else {
                None
            }
        })
    }

    /// Whether two models differ significantly at the corrected level.
    #[must_use]
    pub fn is_significant(&self, a: &str, b: &str) -> Option<bool> {
        self.between(a, b).map(|c| c.significant)
    }

    /// Comparisons carrying a zero-variance warning.
    pub fn degenerate(&self) -> impl Iterator<Item = &NamedComparison> {
        self.comparisons.iter().filter(|c| c.result.is_degenerate())
    }
}

/// Configurable pairwise comparator.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparator {
    alpha: f64,
    confidence_level: f64,
}

impl Default for Comparator {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
        }
    }
}

impl Comparator {
    /// Comparator with `alpha = 0.05` and 95% intervals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the significance level.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the confidence level of the mean-difference interval.
    #[must_use]
    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    fn validate(&self) -> Result<()> {
        validate_alpha(self.alpha)?;
        validate_confidence_level(self.confidence_level)
    }

    /// Compare two metric series.
    ///
    /// # Errors
    ///
    /// `InsufficientData` when a series is empty, `Configuration` for an
    /// invalid alpha or confidence level.
    pub fn compare(&self, series_a: &[f64], series_b: &[f64]) -> Result<PairwiseComparison> {
        self.validate()?;
        if series_a.is_empty() || series_b.is_empty() {
            return Err(ValidarError::insufficient_data(
                "comparison series",
                1,
                series_a.len().min(series_b.len()),
            ));
        }

        let a = SeriesMoments::new(series_a);
        let b = SeriesMoments::new(series_b);
        let sample_sizes = (series_a.len(), series_b.len());
        let mean_difference = a.mean - b.mean;

        let mut warnings = Vec::new();
        if sample_sizes.0 < 2 || sample_sizes.1 < 2 {
            warnings.push(StatisticsWarning::SingleObservation {
                n_a: sample_sizes.0,
                n_b: sample_sizes.1,
            });
        }

        let se2 = a.var / a.n + b.var / b.n;
        let pooled_dof = a.n + b.n - 2.0;
        let df_fallback = pooled_dof.max(1.0);

        if se2 <= 0.0 {
            let equal = mean_difference == 0.0;
            let warning = if equal {
                StatisticsWarning::ZeroVarianceEqualMeans
            } else {
                StatisticsWarning::ZeroVarianceUnequalMeans
            };
            log::warn!("degenerate comparison: {warning}");
            warnings.push(warning);

            let (statistic, p_value, effect_size) = if equal {
                (0.0, 1.0, 0.0)
            } else {
                let sign = mean_difference.signum();
                (sign * f64::INFINITY, 0.0, sign * EFFECT_SIZE_SENTINEL)
            };
            return Ok(PairwiseComparison {
                mean_a: a.mean,
                mean_b: b.mean,
                mean_difference,
                statistic,
                df: df_fallback,
                p_value,
                significant: p_value < self.alpha,
                alpha: self.alpha,
                confidence_level: self.confidence_level,
                confidence_interval: (mean_difference, mean_difference),
                effect_size,
                sample_sizes,
                warnings,
            });
        }

        let se = se2.sqrt();
        let statistic = mean_difference / se;
        let df = welch_df(&a, &b);
        let p_value = t_two_tailed_pvalue(statistic, df);

        let t_crit = t_quantile(0.5 + self.confidence_level / 2.0, df);
        let half_width = t_crit * se;

        // se2 > 0 implies some series with n >= 2 has spread, so pooled > 0.
        let pooled_var = ((a.n - 1.0) * a.var + (b.n - 1.0) * b.var) / pooled_dof;
        let effect_size = mean_difference / pooled_var.sqrt();

        Ok(PairwiseComparison {
            mean_a: a.mean,
            mean_b: b.mean,
            mean_difference,
            statistic,
            df,
            p_value,
            significant: p_value < self.alpha,
            alpha: self.alpha,
            confidence_level: self.confidence_level,
            confidence_interval: (mean_difference - half_width, mean_difference + half_width),
            effect_size,
            sample_sizes,
            warnings,
        })
    }

    /// Compare every pair of models.
    ///
    /// With more than two models, `significant` is re-evaluated against the
    /// Bonferroni level `alpha / number_of_comparisons`; `p_value` stays raw.
    /// The report's `best` model is the one with the highest series mean,
    /// ties resolved by [`select_best`].
    ///
    /// # Errors
    ///
    /// `Configuration` for fewer than two models or duplicate names,
    /// `InsufficientData` for an empty series.
    pub fn compare_many<N, V>(&self, series: &[(N, V)]) -> Result<ComparisonReport>
    where
        N: AsRef<str>,
        V: AsRef<[f64]>,
    {
        self.validate()?;
        let models: Vec<String> = series.iter().map(|(n, _)| n.as_ref().to_string()).collect();
        check_model_names(&models)?;

        let n_comparisons = models.len() * (models.len() - 1) / 2;
        let (correction, corrected_alpha) = if models.len() > 2 {
            (Correction::Bonferroni, self.alpha / n_comparisons as f64)
        } else {
            (Correction::None, self.alpha)
        };

        let mut comparisons = Vec::with_capacity(n_comparisons);
        for i in 0..series.len() {
            for j in (i + 1)..series.len() {
                let mut result = self.compare(series[i].1.as_ref(), series[j].1.as_ref())?;
                result.reevaluate(corrected_alpha);
                comparisons.push(NamedComparison {
                    model_a: models[i].clone(),
                    model_b: models[j].clone(),
                    index_a: i,
                    index_b: j,
                    result,
                });
            }
        }

        let mut report = ComparisonReport {
            models,
            comparisons,
            alpha: self.alpha,
            corrected_alpha,
            correction,
            best: None,
        };

        let aggregates = series
            .iter()
            .map(|(name, values)| {
                summarize(values.as_ref()).map(|summary| {
                    (
                        name.as_ref().to_string(),
                        AggregatedStatistics::from_summary(SCALAR_METRIC, summary),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;
        report.best = Some(select_best(&aggregates, &report, &RankingOptions::default())?);

        Ok(report)
    }
}

pub(crate) fn check_model_names(models: &[String]) -> Result<()> {
    if models.len() < 2 {
        return Err(ValidarError::configuration(
            "models",
            models.len(),
            "at least 2 models to compare",
        ));
    }
    let mut seen = BTreeSet::new();
    if let Some(dup) = models.iter().find(|m| !seen.insert(m.as_str())) {
        return Err(ValidarError::configuration(
            "model name",
            dup,
            "unique model names",
        ));
    }
    Ok(())
}

/// Compare two metric series at significance level `alpha` with a 95%
/// confidence interval.
pub fn compare(series_a: &[f64], series_b: &[f64], alpha: f64) -> Result<PairwiseComparison> {
    Comparator::new().with_alpha(alpha).compare(series_a, series_b)
}

/// Compare every pair of named series at level `alpha`, with a Bonferroni
/// correction when more than two models are given.
///
/// ```
/// use validar::stats::{compare_many, Correction};
///
/// let series = vec![
///     ("cnn", vec![0.90, 0.92, 0.91]),
///     ("resnet", vec![0.95, 0.94, 0.96]),
///     ("baseline", vec![0.60, 0.62, 0.61]),
/// ];
/// let report = compare_many(&series, 0.05).expect("valid series");
/// assert_eq!(report.comparisons.len(), 3);
/// assert_eq!(report.correction, Correction::Bonferroni);
/// assert_eq!(report.best.as_ref().map(|b| b.name.as_str()), Some("resnet"));
/// ```
pub fn compare_many<N, V>(series: &[(N, V)], alpha: f64) -> Result<ComparisonReport>
where
    N: AsRef<str>,
    V: AsRef<[f64]>,
{
    Comparator::new().with_alpha(alpha).compare_many(series)
}

// ============================================================================
// Student t distribution
// ============================================================================

/// Two-tailed p-value `P(|T| >= |t|)` for `df` degrees of freedom.
pub(crate) fn t_two_tailed_pvalue(t: f64, df: f64) -> f64 {
    if t.is_nan() || df.is_nan() {
        return f64::NAN;
    }
    if t.is_infinite() {
        return 0.0;
    }
    let x = df / (df + t * t);
    incomplete_beta(df / 2.0, 0.5, x).clamp(0.0, 1.0)
}

/// Student t cumulative distribution function.
pub(crate) fn t_cdf(t: f64, df: f64) -> f64 {
    let tail = 0.5 * t_two_tailed_pvalue(t, df);
    if t >= 0.0 {
        1.0 - tail
    } else {
        tail
    }
}

/// Inverse of [`t_cdf`] by bisection.
pub(crate) fn t_quantile(p: f64, df: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    if (p - 0.5).abs() < f64::EPSILON {
        return 0.0;
    }
    if p < 0.5 {
        return -t_quantile(1.0 - p, df);
    }

    let mut lo = 0.0;
    let mut hi = 1.0;
    while t_cdf(hi, df) < p && hi < 1e12 {
        lo = hi;
        hi *= 2.0;
    }
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if t_cdf(mid, df) < p {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < 1e-12 * hi.max(1.0) {
            break;
        }
    }
    0.5 * (lo + hi)
}

/// Regularized incomplete beta function I_x(a, b).
fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_bt = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let bt = ln_bt.exp();

    // The fraction converges fast only below the mean of Beta(a, b); above
    // it use I_x(a, b) = 1 - I_{1-x}(b, a).
    let (p, q, y, flipped) = if x < (a + 1.0) / (a + b + 2.0) {
        (a, b, x, false)
    } else {
        (b, a, 1.0 - x, true)
    };
    let fraction = lentz(|m| beta_fraction_term(p, q, y, m));
    if !fraction.converged {
        log::debug!(
            "incomplete beta I_{x}({a}, {b}) did not converge in {} terms",
            fraction.terms
        );
    }

    let tail = bt / (p * fraction.value);
    if flipped {
        1.0 - tail
    } else {
        tail
    }
}

/// Numerator of the m-th level of the continued fraction
/// I_x(a, b) = x^a (1-x)^b / (a B(a, b)) / (1 + d_1 / (1 + d_2 / (1 + ...))).
fn beta_fraction_term(a: f64, b: f64, x: f64, m: usize) -> f64 {
    let k = (m / 2) as f64;
    if m % 2 == 0 {
        k * (b - k) * x / ((a + 2.0 * k - 1.0) * (a + 2.0 * k))
    } else {
        -(a + k) * (a + b + k) * x / ((a + 2.0 * k) * (a + 2.0 * k + 1.0))
    }
}

/// Result of evaluating a continued fraction.
#[derive(Debug, Clone, Copy)]
struct FractionValue {
    value: f64,
    terms: usize,
    converged: bool,
}

/// Evaluate `1 + d_1 / (1 + d_2 / (1 + ...))` by the modified Lentz method,
/// with `numerator(m)` giving `d_m`.
fn lentz(numerator: impl Fn(usize) -> f64) -> FractionValue {
    const MAX_TERMS: usize = 600;
    const TOLERANCE: f64 = 1e-14;
    const FLOOR: f64 = 1e-300;

    let nonzero = |v: f64| if v.abs() < FLOOR { FLOOR } else { v };

    let mut value = 1.0;
    let mut c = 1.0;
    let mut d = 0.0;
    for m in 1..=MAX_TERMS {
        let dm = numerator(m);
        d = 1.0 / nonzero(1.0 + dm * d);
        c = nonzero(1.0 + dm / c);
        let delta = c * d;
        value *= delta;
        if (delta - 1.0).abs() < TOLERANCE {
            return FractionValue {
                value,
                terms: m,
                converged: true,
            };
        }
    }
    FractionValue {
        value,
        terms: MAX_TERMS,
        converged: false,
    }
}

/// Natural log of the gamma function (Lanczos approximation, g = 7).
fn ln_gamma(z: f64) -> f64 {
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if z < 0.5 {
        // Reflection formula: Γ(z)Γ(1-z) = π / sin(πz)
        let pi = std::f64::consts::PI;
        return (pi / (pi * z).sin()).ln() - ln_gamma(1.0 - z);
    }

    let z = z - 1.0;
    let mut x = COEFFS[0];
    for (i, &c) in COEFFS.iter().enumerate().skip(1) {
        x += c / (z + i as f64);
    }
    let t = z + 7.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (z + 0.5) * t.ln() - t + x.ln()
}

#[cfg(test)]
#[path = "tests_hypothesis_contract.rs"]
mod tests_hypothesis_contract;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ln_gamma_known_values() {
        assert!(ln_gamma(1.0).abs() < 1e-12);
        assert!(ln_gamma(2.0).abs() < 1e-12);
        assert!((ln_gamma(5.0) - 24.0_f64.ln()).abs() < 1e-10);
        assert!((ln_gamma(0.5) - std::f64::consts::PI.sqrt().ln()).abs() < 1e-10);
    }

    #[test]
    fn test_incomplete_beta_closed_forms() {
        for &x in &[0.05, 0.3, 0.5, 0.8, 0.97] {
            // I_x(1, 1) = x and I_x(a, 1) = x^a
            assert!((incomplete_beta(1.0, 1.0, x) - x).abs() < 1e-12, "x={x}");
            assert!((incomplete_beta(3.5, 1.0, x) - x.powf(3.5)).abs() < 1e-12, "x={x}");
            // symmetry: I_x(a, b) = 1 - I_{1-x}(b, a)
            let lhs = incomplete_beta(2.5, 7.0, x);
            let rhs = 1.0 - incomplete_beta(7.0, 2.5, 1.0 - x);
            assert!((lhs - rhs).abs() < 1e-12, "x={x}");
        }
        assert!((incomplete_beta(4.0, 4.0, 0.5) - 0.5).abs() < 1e-12);
        assert_eq!(incomplete_beta(2.0, 3.0, 0.0), 0.0);
        assert_eq!(incomplete_beta(2.0, 3.0, 1.0), 1.0);
    }

    #[test]
    fn test_lentz_converges_on_golden_ratio() {
        // 1 + 1/(1 + 1/(1 + ...)) = φ
        let fraction = lentz(|_| 1.0);
        assert!(fraction.converged);
        assert!((fraction.value - (1.0 + 5f64.sqrt()) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_t_pvalue_cauchy() {
        // df = 1 is the Cauchy distribution: P(|T| > 1) = 0.5
        assert!((t_two_tailed_pvalue(1.0, 1.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_t_pvalue_reference_values() {
        // scipy.stats.t.sf(2.0, 10) * 2
        assert!((t_two_tailed_pvalue(2.0, 10.0) - 0.073_388_6).abs() < 1e-5);
        assert!((t_two_tailed_pvalue(-2.0, 10.0) - 0.073_388_6).abs() < 1e-5);
        assert!((t_two_tailed_pvalue(0.0, 10.0) - 1.0).abs() < 1e-12);
        assert_eq!(t_two_tailed_pvalue(f64::INFINITY, 3.0), 0.0);
    }

    #[test]
    fn test_t_quantile_reference_values() {
        assert!((t_quantile(0.975, 10.0) - 2.228_138_9).abs() < 1e-5);
        assert!((t_quantile(0.975, 1000.0) - 1.962_339).abs() < 1e-4);
        assert!((t_quantile(0.025, 10.0) + 2.228_138_9).abs() < 1e-5);
        assert_eq!(t_quantile(0.5, 4.0), 0.0);
    }

    #[test]
    fn test_t_cdf_monotone() {
        let mut prev = 0.0;
        for i in -20..=20 {
            let c = t_cdf(f64::from(i) * 0.5, 4.0);
            assert!(c >= prev);
            prev = c;
        }
    }

    #[test]
    fn test_welch_ttest_reference() {
        let a = [27.5, 21.0, 19.0, 23.6, 17.0, 17.9, 16.9, 20.1, 21.9, 22.6];
        let b = [27.1, 22.0, 20.8, 23.4, 23.4, 23.5, 25.8, 22.0, 24.8, 20.2];
        let r = welch_ttest(&a, &b).expect("valid samples");
        assert!((r.statistic + 2.035_66).abs() < 1e-4, "t = {}", r.statistic);
        assert!((r.df - 15.4979).abs() < 1e-3, "df = {}", r.df);
        assert!((r.p_value - 0.059_25).abs() < 1e-4, "p = {}", r.p_value);
    }

    #[test]
    fn test_welch_ttest_errors() {
        assert!(matches!(
            welch_ttest(&[1.0], &[1.0, 2.0]),
            Err(ValidarError::InsufficientData { .. })
        ));
        assert!(matches!(
            welch_ttest(&[1.0, 1.0], &[2.0, 2.0]),
            Err(ValidarError::DegenerateVariance { .. })
        ));
    }

    #[test]
    fn test_compare_identical_constant_series() {
        let r = compare(&[5.0, 5.0, 5.0], &[5.0, 5.0, 5.0], 0.05).expect("no error");
        assert!(!r.significant);
        assert_eq!(r.p_value, 1.0);
        assert_eq!(r.effect_size, 0.0);
        assert_eq!(r.warnings, vec![StatisticsWarning::ZeroVarianceEqualMeans]);
        assert!(r.is_degenerate());
    }

    #[test]
    fn test_compare_same_constant_with_different_fold_counts() {
        // 0.7 summed three times and six times rounds to different means
        let r = compare(&[0.7; 3], &[0.7; 6], 0.05).expect("no error");
        assert_eq!(r.mean_a, 0.7);
        assert_eq!(r.mean_b, 0.7);
        assert_eq!(r.p_value, 1.0);
        assert!(!r.significant);
        assert_eq!(r.effect_size, 0.0);
        assert_eq!(r.warnings, vec![StatisticsWarning::ZeroVarianceEqualMeans]);
    }

    #[test]
    fn test_compare_constant_series_different_means() {
        let r = compare(&[0.9; 5], &[0.7; 5], 0.05).expect("no error");
        assert!(r.significant);
        assert_eq!(r.p_value, 0.0);
        assert_eq!(r.effect_size, EFFECT_SIZE_SENTINEL);
        assert!(r.warnings.contains(&StatisticsWarning::ZeroVarianceUnequalMeans));

        let reversed = compare(&[0.7; 5], &[0.9; 5], 0.05).expect("no error");
        assert_eq!(reversed.effect_size, -EFFECT_SIZE_SENTINEL);
    }

    #[test]
    fn test_compare_cohens_d() {
        // means 2 and 4, both sample variances 1 -> pooled sd 1 -> d = -2
        let r = compare(&[1.0, 2.0, 3.0], &[3.0, 4.0, 5.0], 0.05).expect("valid");
        assert!((r.effect_size + 2.0).abs() < 1e-12);
        assert!((r.mean_difference + 2.0).abs() < 1e-12);
        assert_eq!(r.sample_sizes, (3, 3));
        assert!(r.confidence_interval.0 < r.mean_difference);
        assert!(r.confidence_interval.1 > r.mean_difference);
    }

    #[test]
    fn test_compare_one_constant_series() {
        let r = compare(&[0.5, 0.5, 0.5, 0.5], &[0.4, 0.6, 0.5, 0.7], 0.05).expect("valid");
        assert!(r.warnings.is_empty());
        assert!(r.p_value > 0.05);
        assert!(r.effect_size.is_finite());
    }

    #[test]
    fn test_compare_single_observation() {
        let r = compare(&[0.8], &[0.5, 0.6, 0.7], 0.05).expect("valid");
        assert!(r
            .warnings
            .contains(&StatisticsWarning::SingleObservation { n_a: 1, n_b: 3 }));
        assert!(r.p_value.is_finite());
        assert!(r.df > 0.0);
    }

    #[test]
    fn test_compare_empty_series() {
        assert!(matches!(
            compare(&[], &[1.0], 0.05),
            Err(ValidarError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_compare_invalid_alpha() {
        assert!(compare(&[1.0, 2.0], &[1.0, 2.0], 1.5)
            .unwrap_err()
            .is_configuration());
    }

    #[test]
    fn test_confidence_level_widens_interval() {
        let a = [0.81, 0.85, 0.79, 0.88, 0.83];
        let b = [0.78, 0.80, 0.77, 0.82, 0.79];
        let narrow = Comparator::new()
            .with_confidence_level(0.90)
            .compare(&a, &b)
            .expect("valid");
        let wide = Comparator::new()
            .with_confidence_level(0.99)
            .compare(&a, &b)
            .expect("valid");
        let width = |c: &PairwiseComparison| c.confidence_interval.1 - c.confidence_interval.0;
        assert!(width(&wide) > width(&narrow));
        assert_eq!(wide.confidence_level, 0.99);
    }

    #[test]
    fn test_compare_many_two_models_uncorrected() {
        let series = vec![("a", vec![1.0, 2.0, 3.0]), ("b", vec![2.0, 3.0, 4.0])];
        let report = compare_many(&series, 0.05).expect("valid");
        assert_eq!(report.correction, Correction::None);
        assert_eq!(report.corrected_alpha, 0.05);
        assert_eq!(report.comparisons.len(), 1);
    }

    #[test]
    fn test_compare_many_bonferroni_reevaluates() {
        // p for the first pair (~0.034) lands between 0.05 / 6 and 0.05
        let a = vec![0.80, 0.82, 0.84, 0.86, 0.88];
        let b = vec![0.76, 0.78, 0.80, 0.82, 0.81];
        let pair = compare(&a, &b, 0.05).expect("valid");
        assert!(pair.significant);

        let series = vec![
            ("a", a),
            ("b", b),
            ("c", vec![0.1, 0.2, 0.3, 0.2, 0.1]),
            ("d", vec![0.5, 0.6, 0.4, 0.5, 0.6]),
        ];
        let report = compare_many(&series, 0.05).expect("valid");
        assert_eq!(report.comparisons.len(), 6);
        assert_eq!(report.correction, Correction::Bonferroni);
        assert!((report.corrected_alpha - 0.05 / 6.0).abs() < 1e-15);

        let ab = report.between("a", "b").expect("pair present");
        assert_eq!(ab.p_value, pair.p_value, "raw p-value is reported");
        assert!(!ab.significant, "not significant after correction");
        assert_eq!(ab.alpha, report.corrected_alpha);
    }

    #[test]
    fn test_report_between_is_oriented() {
        let series = vec![("x", vec![1.0, 2.0, 3.0]), ("y", vec![4.0, 5.0, 7.0])];
        let report = compare_many(&series, 0.05).expect("valid");
        let xy = report.between("x", "y").expect("present");
        let yx = report.between("y", "x").expect("present");
        assert_eq!(xy.effect_size, -yx.effect_size);
        assert_eq!(xy.mean_a, yx.mean_b);
        assert!(report.between("x", "z").is_none());
        assert_eq!(report.best.as_ref().map(|b| b.name.as_str()), Some("y"));
    }

    #[test]
    fn test_compare_many_rejects_bad_model_sets() {
        let one = vec![("a", vec![1.0, 2.0])];
        assert!(compare_many(&one, 0.05).unwrap_err().is_configuration());
        let dup = vec![("a", vec![1.0, 2.0]), ("a", vec![1.0, 3.0])];
        assert!(compare_many(&dup, 0.05).unwrap_err().is_configuration());
    }

    #[test]
    fn test_report_degenerate_iterator() {
        let series = vec![
            ("a", vec![1.0, 1.0]),
            ("b", vec![1.0, 1.0]),
            ("c", vec![0.5, 0.7]),
        ];
        let report = compare_many(&series, 0.05).expect("valid");
        let degenerate: Vec<_> = report.degenerate().collect();
        assert_eq!(degenerate.len(), 1);
        assert_eq!(degenerate[0].model_a, "a");
    }

    #[test]
    fn test_report_serializes() {
        let series = vec![("a", vec![0.9, 0.9]), ("b", vec![0.7, 0.7])];
        let report = compare_many(&series, 0.05).expect("valid");
        let json = serde_json::to_value(&report).expect("serializable");
        assert_eq!(json["comparisons"][0]["model_a"], "a");
        assert_eq!(json["comparisons"][0]["p_value"], 0.0);
        assert_eq!(json["correction"], "none");
    }
}

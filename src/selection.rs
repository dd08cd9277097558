//! Significance-aware model ranking.
//!
//! Each model gets one scalar score: the mean of its metric means, optionally
//! weighted per metric. Only metrics reported by every model take part, so
//! a model cannot win by reporting an extra easy metric.
//!
//! Models whose score lies within `tie_epsilon` of the top score are tied.
//! Among tied models, one whose comparison against the next-best model is
//! not significant at the report's corrected level is preferred; remaining
//! ties go to the first model in caller order.

use crate::config::{validate_weights, ValidationConfig, DEFAULT_TIE_EPSILON};
use crate::error::{Result, ValidarError};
use crate::stats::hypothesis::check_model_names;
use crate::stats::{AggregatedStatistics, ComparisonReport};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Scoring and tie-break options for [`select_best`].
#[derive(Debug, Clone, PartialEq)]
pub struct RankingOptions {
    /// Distance from the top score under which models count as tied
    pub tie_epsilon: f64,
    /// Per-metric weights; `None` weighs every shared metric equally
    pub weights: Option<BTreeMap<String, f64>>,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            tie_epsilon: DEFAULT_TIE_EPSILON,
            weights: None,
        }
    }
}

impl RankingOptions {
    /// Equal weights and the default tie epsilon.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tie epsilon.
    #[must_use]
    pub fn with_tie_epsilon(mut self, epsilon: f64) -> Self {
        self.tie_epsilon = epsilon;
        self
    }

    /// Weigh metrics; metrics without a weight count zero.
    #[must_use]
    pub fn with_weights(mut self, weights: BTreeMap<String, f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.tie_epsilon.is_finite() || self.tie_epsilon < 0.0 {
            return Err(ValidarError::configuration(
                "tie_epsilon",
                self.tie_epsilon,
                "finite and >= 0",
            ));
        }
        if let Some(weights) = &self.weights {
            validate_weights(weights)?;
        }
        Ok(())
    }
}

impl From<&ValidationConfig> for RankingOptions {
    fn from(config: &ValidationConfig) -> Self {
        Self {
            tie_epsilon: config.tie_epsilon,
            weights: config.metric_weights.clone(),
        }
    }
}

/// Score of one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelScore {
    /// Model name
    pub name: String,
    /// Weighted mean of metric means
    pub score: f64,
}

/// The recommended model plus everything needed to audit the choice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestModel {
    /// Winning model
    pub name: String,
    /// Position of the winner in caller order
    pub index: usize,
    /// Winner's score
    pub score: f64,
    /// Scores of all models, in caller order
    pub scores: Vec<ModelScore>,
    /// Other models within `tie_epsilon` of the winner
    pub tied_with: Vec<String>,
    /// Whether the winner differs significantly from the next-best model;
    /// `None` when the report holds no such comparison
    pub significant_over_runner_up: Option<bool>,
}

/// Pick the best model from aggregated per-model statistics.
///
/// # Errors
///
/// - `Configuration` for an empty model list, duplicate names, invalid
///   options, or when no metric is shared by every model (or none of the
///   shared metrics carries a positive weight)
///
/// # Example
///
/// ```
/// use validar::selection::{select_best, RankingOptions};
/// use validar::stats::{compare_many, summarize, AggregatedStatistics};
///
/// let a = [0.81, 0.83, 0.80, 0.82];
/// let b = [0.70, 0.72, 0.69, 0.71];
/// let report = compare_many(&[("a", &a[..]), ("b", &b[..])], 0.05).expect("valid series");
///
/// let aggregates = vec![
///     ("a".to_string(), AggregatedStatistics::from_summary("acc", summarize(&a).expect("non-empty"))),
///     ("b".to_string(), AggregatedStatistics::from_summary("acc", summarize(&b).expect("non-empty"))),
/// ];
/// let best = select_best(&aggregates, &report, &RankingOptions::default()).expect("valid");
/// assert_eq!(best.name, "a");
/// assert_eq!(best.significant_over_runner_up, Some(true));
/// ```
pub fn select_best(
    aggregates: &[(String, AggregatedStatistics)],
    report: &ComparisonReport,
    options: &RankingOptions,
) -> Result<BestModel> {
    options.validate()?;
    if aggregates.is_empty() {
        return Err(ValidarError::configuration(
            "models",
            0,
            "at least 1 model to rank",
        ));
    }
    if aggregates.len() > 1 {
        let names: Vec<String> = aggregates.iter().map(|(n, _)| n.clone()).collect();
        check_model_names(&names)?;
    }

    let shared = shared_metrics(aggregates);
    if shared.is_empty() {
        return Err(ValidarError::configuration(
            "metrics",
            "none shared",
            "at least one metric reported by every model",
        ));
    }

    let scores = aggregates
        .iter()
        .map(|(name, stats)| {
            let means = shared
                .iter()
                .filter_map(|m| stats.get(m).map(|s| (m.as_str(), s.mean)));
            weighted_mean(means, options.weights.as_ref())
                .map(|score| ModelScore {
                    name: name.clone(),
                    score,
                })
                .ok_or_else(|| {
                    ValidarError::configuration(
                        "metric_weights",
                        "zero on every shared metric",
                        "a positive weight on at least one shared metric",
                    )
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let order = ranking_order(&scores);
    let top = scores[order[0]].score;
    let tied: Vec<usize> = order
        .iter()
        .copied()
        .filter(|&i| within(top, scores[i].score, options.tie_epsilon))
        .collect();

    let winner = if tied.len() > 1 {
        break_tie(&tied, &order, &scores, report)
    } else {
        order[0]
    };

    let runner_up = order.iter().copied().find(|&i| i != winner);
    let significant_over_runner_up =
        runner_up.and_then(|r| report.is_significant(&scores[winner].name, &scores[r].name));

    let tied_with: Vec<String> = tied
        .iter()
        .filter(|&&i| i != winner)
        .map(|&i| scores[i].name.clone())
        .collect();
    if !tied_with.is_empty() {
        log::info!(
            "model '{}' tied with {:?} within {}; picked by tie-break",
            scores[winner].name,
            tied_with,
            options.tie_epsilon
        );
    }

    Ok(BestModel {
        name: scores[winner].name.clone(),
        index: winner,
        score: scores[winner].score,
        scores,
        tied_with,
        significant_over_runner_up,
    })
}

/// Metric names reported by every model.
fn shared_metrics(aggregates: &[(String, AggregatedStatistics)]) -> Vec<String> {
    let mut iter = aggregates.iter();
    let Some((_, first)) = iter.next() else {
        return Vec::new();
    };
    let mut shared: BTreeSet<String> = first.names().map(str::to_string).collect();
    for (_, stats) in iter {
        shared.retain(|m| stats.get(m).is_some());
    }
    shared.into_iter().collect()
}

/// Weighted mean of `(metric, value)` pairs.
///
/// Without weights every metric counts equally. Returns `None` when the
/// total weight is zero.
pub(crate) fn weighted_mean<'a>(
    values: impl IntoIterator<Item = (&'a str, f64)>,
    weights: Option<&BTreeMap<String, f64>>,
) -> Option<f64> {
    let mut total = 0.0;
    let mut weight_sum = 0.0;
    for (name, value) in values {
        let w = match weights {
            Some(weights) => weights.get(name).copied().unwrap_or(0.0),
            None => 1.0,
        };
        if w > 0.0 {
            total += w * value;
            weight_sum += w;
        }
    }
    (weight_sum > 0.0).then(|| total / weight_sum)
}

/// Model indices by descending score; equal scores keep caller order and
/// NaN ranks last.
fn ranking_order(scores: &[ModelScore]) -> Vec<usize> {
    let key = |s: f64| if s.is_nan() { f64::NEG_INFINITY } else { s };
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| key(scores[b].score).total_cmp(&key(scores[a].score)));
    order
}

fn within(top: f64, score: f64, epsilon: f64) -> bool {
    top == score || (top - score).abs() <= epsilon
}

/// Among `tied` (caller order), prefer a model that is not significantly
/// different from the best model outside the tie.
fn break_tie(
    tied: &[usize],
    order: &[usize],
    scores: &[ModelScore],
    report: &ComparisonReport,
) -> usize {
    let mut candidates = tied.to_vec();
    candidates.sort_unstable();

    let next_best = order.iter().copied().find(|i| !tied.contains(i));
    if let Some(next) = next_best {
        let not_significant = candidates.iter().copied().find(|&c| {
            report.is_significant(&scores[c].name, &scores[next].name) == Some(false)
        });
        if let Some(choice) = not_significant {
            return choice;
        }
    }
    candidates[0]
}

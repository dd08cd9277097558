//! Cross-validation orchestration.
//!
//! For every fold the orchestrator builds the train and test subsets, times
//! the caller's train function, times the caller's evaluate function and
//! records the metrics. A fold whose train or evaluate step returns an error,
//! panics, or overruns the configured timeout becomes a [`FoldFailure`]; the
//! run continues with the next fold. Only a run in which every fold failed
//! is an error.

use super::{partition_with_options, Fold, Partition, PartitionWarning};
use crate::config::{PartitionOptions, ValidationConfig};
use crate::dataset::Dataset;
use crate::error::{Result, ValidarError};
use crate::selection::{select_best, weighted_mean, RankingOptions};
use crate::stats::descriptive::aggregate_indexed;
use crate::stats::hypothesis::check_model_names;
use crate::stats::{
    summarize, AggregatedStatistics, Comparator, ComparisonReport, FoldMetrics, MetricSummary,
};
use rayon::prelude::*;
use serde::{Serialize, Serializer};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Debug, Display};
use std::marker::PhantomData;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

/// Builds a model from a training subset.
///
/// Implemented for every `Fn(&D) -> Result<M, E>` with `E: Display`.
pub trait Trainer<D> {
    /// Trained model handed to the evaluator
    type Model;
    /// Training error, recorded as a fold failure
    type Error: Display;

    /// Train on `train`.
    fn train(&self, train: &D) -> std::result::Result<Self::Model, Self::Error>;
}

impl<D, M, E, F> Trainer<D> for F
where
    F: Fn(&D) -> std::result::Result<M, E>,
    E: Display,
{
    type Model = M;
    type Error = E;

    fn train(&self, train: &D) -> std::result::Result<M, E> {
        self(train)
    }
}

/// Scores a trained model on a test subset.
///
/// Implemented for every `Fn(&M, &D) -> Result<R, E>` where `R` converts into
/// [`FoldMetrics`] (an `f64`, a metric map, or `[(&str, f64); N]`).
pub trait Evaluator<M, D> {
    /// Evaluation error, recorded as a fold failure
    type Error: Display;

    /// Evaluate `model` on `test`.
    fn evaluate(&self, model: &M, test: &D) -> std::result::Result<FoldMetrics, Self::Error>;
}

impl<M, D, R, E, F> Evaluator<M, D> for F
where
    F: Fn(&M, &D) -> std::result::Result<R, E>,
    R: Into<FoldMetrics>,
    E: Display,
{
    type Error = E;

    fn evaluate(&self, model: &M, test: &D) -> std::result::Result<FoldMetrics, E> {
        self(model, test).map(Into::into)
    }
}

/// Step at which a fold failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// The train function returned an error or panicked
    Train,
    /// The evaluate function returned an error or panicked
    Evaluate,
    /// Train plus evaluate exceeded the fold timeout
    Timeout,
}

impl Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Train => write!(f, "train"),
            Self::Evaluate => write!(f, "evaluate"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// A fold that produced no metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoldFailure {
    /// Index of the failed fold
    pub fold_index: usize,
    /// Step that failed
    pub stage: FailureStage,
    /// Error or panic message
    pub message: String,
}

impl FoldFailure {
    /// Record a failure of `fold_index` at `stage`.
    #[must_use]
    pub fn new(fold_index: usize, stage: FailureStage, message: impl Into<String>) -> Self {
        Self {
            fold_index,
            stage,
            message: message.into(),
        }
    }
}

impl Display for FoldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fold {} failed during {}: {}",
            self.fold_index, self.stage, self.message
        )
    }
}

/// Metrics and timings of one successful fold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldRecord {
    /// Fold index
    pub fold_index: usize,
    /// Training subset size
    pub train_size: usize,
    /// Test subset size
    pub test_size: usize,
    /// Wall time of the train function
    #[serde(serialize_with = "as_secs")]
    pub train_time: Duration,
    /// Wall time of the evaluate function
    #[serde(serialize_with = "as_secs")]
    pub eval_time: Duration,
    /// What the evaluate function returned
    pub metrics: FoldMetrics,
}

fn as_secs<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Train and evaluation durations across successful folds, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingSummary {
    /// Training time per fold
    pub train: MetricSummary,
    /// Evaluation time per fold
    pub evaluate: MetricSummary,
}

/// Outcome of one cross-validation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    /// Successful folds in fold order
    pub per_fold: Vec<FoldRecord>,
    /// Statistics over the successful folds
    pub aggregated: AggregatedStatistics,
    /// Wall time of the whole run
    #[serde(serialize_with = "as_secs")]
    pub total_time: Duration,
    /// Failed folds in fold order
    pub failures: Vec<FoldFailure>,
    /// Non-fatal partitioning warnings
    pub partition_warnings: Vec<PartitionWarning>,
    /// Number of folds attempted
    pub n_folds: usize,
}

impl RunResult {
    /// Number of folds that produced metrics.
    #[must_use]
    pub fn n_succeeded(&self) -> usize {
        self.per_fold.len()
    }

    /// True when no fold failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Per-fold values of one metric, in fold order.
    #[must_use]
    pub fn metric_values(&self, name: &str) -> Option<&[f64]> {
        self.aggregated.get(name).map(|s| s.values.as_slice())
    }

    /// Summary of train and evaluation times across successful folds.
    #[must_use]
    pub fn timing(&self) -> Option<TimingSummary> {
        let train: Vec<f64> = self
            .per_fold
            .iter()
            .map(|r| r.train_time.as_secs_f64())
            .collect();
        let evaluate: Vec<f64> = self
            .per_fold
            .iter()
            .map(|r| r.eval_time.as_secs_f64())
            .collect();
        Some(TimingSummary {
            train: summarize(&train).ok()?,
            evaluate: summarize(&evaluate).ok()?,
        })
    }
}

/// A named candidate for [`compare_models`].
///
/// [`ModelSpec::new`] accepts any trainer, including ones holding `Cell` or
/// `RefCell` state, for the sequential [`CrossValidator::compare`].
/// [`CrossValidator::par_compare`] needs trainers built with
/// [`ModelSpec::new_sync`].
pub struct ModelSpec<'a, D, M, E = String, T = dyn Trainer<D, Model = M, Error = E> + 'a>
where
    T: ?Sized,
{
    name: String,
    trainer: &'a T,
    _types: PhantomData<fn(&D) -> (M, E)>,
}

/// A [`ModelSpec`] whose trainer may be shared across threads.
pub type SyncModelSpec<'a, D, M, E = String> =
    ModelSpec<'a, D, M, E, dyn Trainer<D, Model = M, Error = E> + Sync + 'a>;

impl<'a, D, M, E> ModelSpec<'a, D, M, E> {
    /// Name a train function.
    pub fn new<T>(name: impl Into<String>, trainer: &'a T) -> Self
    where
        T: Trainer<D, Model = M, Error = E> + 'a,
    {
        Self {
            name: name.into(),
            trainer,
            _types: PhantomData,
        }
    }
}

impl<'a, D, M, E> SyncModelSpec<'a, D, M, E> {
    /// Name a train function that is safe to call from several threads.
    pub fn new_sync<T>(name: impl Into<String>, trainer: &'a T) -> Self
    where
        T: Trainer<D, Model = M, Error = E> + Sync + 'a,
    {
        Self {
            name: name.into(),
            trainer,
            _types: PhantomData,
        }
    }
}

impl<D, M, E, T: ?Sized> ModelSpec<'_, D, M, E, T> {
    /// Model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<D, M, E, T: ?Sized> Debug for ModelSpec<'_, D, M, E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSpec")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Cross-validation result of one model in a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelRun {
    /// Model name
    pub name: String,
    /// Per-fold metrics, failures and aggregates
    pub result: RunResult,
    /// Per-fold series fed to the comparator, in fold order
    pub series: Vec<f64>,
}

/// Outcome of comparing several models on shared folds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelComparison {
    /// One run per model, in caller order
    pub runs: Vec<ModelRun>,
    /// Pairwise statistics and the recommended model
    pub report: ComparisonReport,
}

impl ModelComparison {
    /// Name of the recommended model.
    #[must_use]
    pub fn best(&self) -> Option<&str> {
        self.report.best.as_ref().map(|b| b.name.as_str())
    }

    /// Run of one model.
    #[must_use]
    pub fn run(&self, name: &str) -> Option<&ModelRun> {
        self.runs.iter().find(|r| r.name == name)
    }

    /// Every fold failure, tagged with its model.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &FoldFailure)> {
        self.runs
            .iter()
            .flat_map(|r| r.result.failures.iter().map(move |f| (r.name.as_str(), f)))
    }
}

/// Runs train/evaluate cycles over folds according to a [`ValidationConfig`].
///
/// # Example
///
/// ```
/// use validar::config::ValidationConfig;
/// use validar::model_selection::CrossValidator;
///
/// let data: Vec<f64> = (0..20).map(f64::from).collect();
/// let train = |train: &Vec<f64>| -> Result<f64, String> {
///     Ok(train.iter().sum::<f64>() / train.len() as f64)
/// };
/// let evaluate = |mean: &f64, test: &Vec<f64>| -> Result<f64, String> {
///     let mse = test.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / test.len() as f64;
///     Ok(-mse)
/// };
///
/// let cv = CrossValidator::new(ValidationConfig::new(4));
/// let result = cv.run(&data, None::<&[u8]>, &train, &evaluate).expect("valid run");
/// assert_eq!(result.n_succeeded(), 4);
/// assert_eq!(result.metric_values("score").map(<[f64]>::len), Some(4));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CrossValidator {
    config: ValidationConfig,
}

impl CrossValidator {
    /// Create a validator for `config`.
    #[must_use]
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// The run configuration.
    #[must_use]
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Partition `n_samples` samples as configured.
    pub fn partition<L: Ord + Debug>(
        &self,
        n_samples: usize,
        labels: Option<&[L]>,
    ) -> Result<Partition> {
        self.config.validate(n_samples)?;
        partition_with_options(n_samples, &self.config.partition, labels)
    }

    /// Partition `dataset` and run every fold sequentially.
    ///
    /// # Errors
    ///
    /// - `Configuration` before any fold runs
    /// - `RunFailure` when every fold fails
    /// - `StructuralMismatch` when folds report different metric names
    pub fn run<D, L, T, V>(
        &self,
        dataset: &D,
        labels: Option<&[L]>,
        trainer: &T,
        evaluator: &V,
    ) -> Result<RunResult>
    where
        D: Dataset,
        L: Ord + Debug,
        T: Trainer<D> + ?Sized,
        V: Evaluator<T::Model, D>,
    {
        let partition = self.partition(dataset.len(), labels)?;
        self.run_with_partition(dataset, &partition, trainer, evaluator)
    }

    /// Run every fold of an existing partition sequentially.
    pub fn run_with_partition<D, T, V>(
        &self,
        dataset: &D,
        partition: &Partition,
        trainer: &T,
        evaluator: &V,
    ) -> Result<RunResult>
    where
        D: Dataset,
        T: Trainer<D> + ?Sized,
        V: Evaluator<T::Model, D>,
    {
        check_partition(dataset, partition)?;
        let started = self.log_start(dataset, partition);
        let outcomes: Vec<_> = partition
            .iter()
            .map(|fold| run_fold(dataset, fold, trainer, evaluator, self.config.fold_timeout))
            .collect();
        finish(outcomes, partition, started)
    }

    /// Like [`run`](Self::run), but folds run on the rayon thread pool when
    /// `parallel` is enabled in the configuration.
    ///
    /// Train and evaluate functions must tolerate concurrent calls on
    /// disjoint subsets. Results are reported in fold order regardless of
    /// completion order.
    pub fn par_run<D, L, T, V>(
        &self,
        dataset: &D,
        labels: Option<&[L]>,
        trainer: &T,
        evaluator: &V,
    ) -> Result<RunResult>
    where
        D: Dataset + Sync,
        L: Ord + Debug,
        T: Trainer<D> + Sync + ?Sized,
        V: Evaluator<T::Model, D> + Sync,
    {
        let partition = self.partition(dataset.len(), labels)?;
        self.par_run_with_partition(dataset, &partition, trainer, evaluator)
    }

    /// Parallel counterpart of [`run_with_partition`](Self::run_with_partition).
    pub fn par_run_with_partition<D, T, V>(
        &self,
        dataset: &D,
        partition: &Partition,
        trainer: &T,
        evaluator: &V,
    ) -> Result<RunResult>
    where
        D: Dataset + Sync,
        T: Trainer<D> + Sync + ?Sized,
        V: Evaluator<T::Model, D> + Sync,
    {
        if !self.config.parallel {
            return self.run_with_partition(dataset, partition, trainer, evaluator);
        }
        check_partition(dataset, partition)?;
        let started = self.log_start(dataset, partition);
        let timeout = self.config.fold_timeout;
        // indexed collect keeps fold order
        let outcomes: Vec<_> = partition
            .folds
            .par_iter()
            .map(|fold| run_fold(dataset, fold, trainer, evaluator, timeout))
            .collect();
        finish(outcomes, partition, started)
    }

    /// Cross-validate several models on one shared partition and compare them.
    ///
    /// Every model sees exactly the same folds, derived from a single
    /// partitioning call. Each model contributes one series to the
    /// comparator: the configured `primary_metric` per fold or, without one,
    /// the per-fold (weighted) mean of the metrics all models report.
    ///
    /// # Errors
    ///
    /// - `Configuration` for invalid settings, fewer than two models,
    ///   duplicate names, or a `primary_metric` some model does not report
    /// - `RunFailure` or `StructuralMismatch` from any model's run
    pub fn compare<D, L, M, E, T, V>(
        &self,
        dataset: &D,
        labels: Option<&[L]>,
        models: &[ModelSpec<'_, D, M, E, T>],
        evaluator: &V,
    ) -> Result<ModelComparison>
    where
        D: Dataset,
        L: Ord + Debug,
        E: Display,
        T: Trainer<D, Model = M, Error = E> + ?Sized,
        V: Evaluator<M, D>,
    {
        let partition = self.prepare_comparison(dataset, labels, models)?;
        let results = models
            .iter()
            .map(|spec| {
                log::info!("cross-validating model '{}'", spec.name);
                self.run_with_partition(dataset, &partition, spec.trainer, evaluator)
                    .map_err(|e| log_model_error(&spec.name, e))
            })
            .collect::<Result<Vec<_>>>()?;
        self.build_comparison(models, results)
    }

    /// Like [`compare`](Self::compare), with each model's folds run through
    /// [`par_run_with_partition`](Self::par_run_with_partition).
    ///
    /// Models are usually built with [`ModelSpec::new_sync`].
    pub fn par_compare<D, L, M, E, T, V>(
        &self,
        dataset: &D,
        labels: Option<&[L]>,
        models: &[ModelSpec<'_, D, M, E, T>],
        evaluator: &V,
    ) -> Result<ModelComparison>
    where
        D: Dataset + Sync,
        L: Ord + Debug,
        E: Display,
        T: Trainer<D, Model = M, Error = E> + Sync + ?Sized,
        V: Evaluator<M, D> + Sync,
    {
        let partition = self.prepare_comparison(dataset, labels, models)?;
        let results = models
            .iter()
            .map(|spec| {
                log::info!("cross-validating model '{}'", spec.name);
                self.par_run_with_partition(dataset, &partition, spec.trainer, evaluator)
                    .map_err(|e| log_model_error(&spec.name, e))
            })
            .collect::<Result<Vec<_>>>()?;
        self.build_comparison(models, results)
    }

    fn prepare_comparison<D, L, M, E, T: ?Sized>(
        &self,
        dataset: &D,
        labels: Option<&[L]>,
        models: &[ModelSpec<'_, D, M, E, T>],
    ) -> Result<Partition>
    where
        D: Dataset,
        L: Ord + Debug,
    {
        let names: Vec<String> = models.iter().map(|m| m.name.clone()).collect();
        check_model_names(&names)?;
        self.partition(dataset.len(), labels)
    }

    fn build_comparison<D, M, E, T: ?Sized>(
        &self,
        models: &[ModelSpec<'_, D, M, E, T>],
        results: Vec<RunResult>,
    ) -> Result<ModelComparison> {
        let (metrics, weights) = self.comparison_metrics(models, &results)?;

        let runs = models
            .iter()
            .zip(results)
            .map(|(spec, result)| {
                let series = composite_series(&result, &metrics, weights.as_ref());
                ModelRun {
                    name: spec.name.clone(),
                    result,
                    series,
                }
            })
            .collect::<Vec<_>>();

        let series: Vec<(&str, &[f64])> = runs
            .iter()
            .map(|r| (r.name.as_str(), r.series.as_slice()))
            .collect();
        let mut report = Comparator::new()
            .with_alpha(self.config.alpha)
            .with_confidence_level(self.config.confidence_level)
            .compare_many(&series)?;

        let aggregates: Vec<(String, AggregatedStatistics)> = runs
            .iter()
            .map(|r| (r.name.clone(), r.result.aggregated.clone()))
            .collect();
        let options = RankingOptions {
            tie_epsilon: self.config.tie_epsilon,
            weights,
        };
        let best = select_best(&aggregates, &report, &options)?;
        log::info!(
            "best model '{}' (score {:.6}, significant over runner-up: {:?})",
            best.name,
            best.score,
            best.significant_over_runner_up
        );
        report.best = Some(best);

        Ok(ModelComparison { runs, report })
    }

    /// Metrics the comparison series is built from, and their weights.
    fn comparison_metrics<D, M, E, T: ?Sized>(
        &self,
        models: &[ModelSpec<'_, D, M, E, T>],
        results: &[RunResult],
    ) -> Result<(Vec<String>, Option<BTreeMap<String, f64>>)> {
        if let Some(primary) = &self.config.primary_metric {
            if let Some((spec, _)) = models
                .iter()
                .zip(results)
                .find(|(_, r)| r.aggregated.get(primary).is_none())
            {
                return Err(ValidarError::configuration(
                    "primary_metric",
                    primary,
                    format!("a metric reported by model '{}'", spec.name),
                ));
            }
            let weights = BTreeMap::from([(primary.clone(), 1.0)]);
            return Ok((vec![primary.clone()], Some(weights)));
        }

        let mut shared: Option<BTreeSet<&str>> = None;
        for result in results {
            let names: BTreeSet<&str> = result.aggregated.names().collect();
            shared = Some(match shared {
                Some(acc) => acc.intersection(&names).copied().collect(),
                None => names,
            });
        }
        let shared: Vec<String> = shared
            .unwrap_or_default()
            .into_iter()
            .map(str::to_string)
            .collect();
        if shared.is_empty() {
            return Err(ValidarError::configuration(
                "metrics",
                "none shared",
                "at least one metric reported by every model",
            ));
        }
        Ok((shared, self.config.metric_weights.clone()))
    }

    fn log_start<D: Dataset>(&self, dataset: &D, partition: &Partition) -> Instant {
        log::info!(
            "running {}-fold cross-validation ({}) on {} samples",
            partition.k(),
            partition.mode,
            dataset.len()
        );
        Instant::now()
    }
}

fn log_model_error(name: &str, error: ValidarError) -> ValidarError {
    log::warn!("model '{name}' failed: {error}");
    error
}

/// Per-fold comparison values in fold order.
fn composite_series(
    result: &RunResult,
    metrics: &[String],
    weights: Option<&BTreeMap<String, f64>>,
) -> Vec<f64> {
    result
        .per_fold
        .iter()
        .filter_map(|record| {
            let values = metrics
                .iter()
                .filter_map(|m| record.metrics.get(m).map(|v| (m.as_str(), v)));
            weighted_mean(values, weights)
        })
        .collect()
}

fn check_partition<D: Dataset>(dataset: &D, partition: &Partition) -> Result<()> {
    dataset.validate()?;
    if partition.n_samples() != dataset.len() {
        return Err(ValidarError::dimension_mismatch(
            "partition samples",
            dataset.len(),
            partition.n_samples(),
        ));
    }
    Ok(())
}

/// Train and evaluate one fold, isolating errors and panics.
fn run_fold<D, T, V>(
    dataset: &D,
    fold: &Fold,
    trainer: &T,
    evaluator: &V,
    timeout: Option<Duration>,
) -> std::result::Result<FoldRecord, FoldFailure>
where
    D: Dataset,
    T: Trainer<D> + ?Sized,
    V: Evaluator<T::Model, D>,
{
    let train_set = dataset.subset(&fold.train);
    let test_set = dataset.subset(&fold.test);

    let start = Instant::now();
    let model = guarded(|| trainer.train(&train_set))
        .map_err(|message| FoldFailure::new(fold.index, FailureStage::Train, message))?;
    let train_time = start.elapsed();

    let start = Instant::now();
    let metrics = guarded(|| evaluator.evaluate(&model, &test_set))
        .map_err(|message| FoldFailure::new(fold.index, FailureStage::Evaluate, message))?;
    let eval_time = start.elapsed();

    if let Some(limit) = timeout {
        let elapsed = train_time + eval_time;
        if elapsed > limit {
            return Err(FoldFailure::new(
                fold.index,
                FailureStage::Timeout,
                format!(
                    "took {:.3}s, limit {:.3}s",
                    elapsed.as_secs_f64(),
                    limit.as_secs_f64()
                ),
            ));
        }
    }

    log::debug!(
        "fold {}: train {:.3}s, evaluate {:.3}s ({} train / {} test)",
        fold.index,
        train_time.as_secs_f64(),
        eval_time.as_secs_f64(),
        fold.train.len(),
        fold.test.len()
    );

    Ok(FoldRecord {
        fold_index: fold.index,
        train_size: fold.train.len(),
        test_size: fold.test.len(),
        train_time,
        eval_time,
        metrics,
    })
}

/// Call `f`, turning both its error and a panic into a message.
fn guarded<R, E: Display>(
    f: impl FnOnce() -> std::result::Result<R, E>,
) -> std::result::Result<R, String> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

fn finish(
    outcomes: Vec<std::result::Result<FoldRecord, FoldFailure>>,
    partition: &Partition,
    started: Instant,
) -> Result<RunResult> {
    let mut per_fold = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(record) => per_fold.push(record),
            Err(failure) => {
                log::warn!("{failure}");
                failures.push(failure);
            }
        }
    }
    per_fold.sort_by_key(|r| r.fold_index);
    failures.sort_by_key(|f| f.fold_index);

    if per_fold.is_empty() {
        return Err(ValidarError::RunFailure { failures });
    }

    let aggregated = aggregate_indexed(per_fold.iter().map(|r| (r.fold_index, &r.metrics)))?;
    let total_time = started.elapsed();
    log::info!(
        "completed {}/{} folds in {:.3}s",
        per_fold.len(),
        partition.k(),
        total_time.as_secs_f64()
    );

    Ok(RunResult {
        per_fold,
        aggregated,
        total_time,
        failures,
        partition_warnings: partition.warnings.clone(),
        n_folds: partition.k(),
    })
}

/// Run k-fold cross-validation of one model.
///
/// Folds run sequentially; `labels` is required when `options.mode` is
/// stratified.
///
/// # Example
///
/// ```
/// use validar::config::PartitionOptions;
/// use validar::model_selection::run_kfold;
/// use validar::stats::FoldMetrics;
///
/// let data: Vec<f64> = (0..10).map(f64::from).collect();
/// let train = |_: &Vec<f64>| -> Result<(), String> { Ok(()) };
/// let evaluate = |_: &(), test: &Vec<f64>| -> Result<FoldMetrics, String> {
///     Ok(FoldMetrics::named([("n", test.len() as f64)]))
/// };
///
/// let result = run_kfold(&data, None::<&[u8]>, &train, &evaluate, &PartitionOptions::new(5))
///     .expect("valid run");
/// let n = result.aggregated.get("n").expect("reported");
/// assert_eq!(n.mean, 2.0);
/// ```
pub fn run_kfold<D, L, T, V>(
    dataset: &D,
    labels: Option<&[L]>,
    trainer: &T,
    evaluator: &V,
    options: &PartitionOptions,
) -> Result<RunResult>
where
    D: Dataset,
    L: Ord + Debug,
    T: Trainer<D> + ?Sized,
    V: Evaluator<T::Model, D>,
{
    let config = ValidationConfig {
        partition: options.clone(),
        ..ValidationConfig::default()
    };
    CrossValidator::new(config).run(dataset, labels, trainer, evaluator)
}

/// Cross-validate and compare several models on shared folds.
///
/// See [`CrossValidator::compare`].
pub fn compare_models<D, L, M, E, T, V>(
    dataset: &D,
    labels: Option<&[L]>,
    models: &[ModelSpec<'_, D, M, E, T>],
    evaluator: &V,
    config: &ValidationConfig,
) -> Result<ModelComparison>
where
    D: Dataset,
    L: Ord + Debug,
    E: Display,
    T: Trainer<D, Model = M, Error = E> + ?Sized,
    V: Evaluator<M, D>,
{
    CrossValidator::new(config.clone()).compare(dataset, labels, models, evaluator)
}

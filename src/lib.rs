//! Validar: k-fold cross-validation and statistical model comparison in pure Rust.
//!
//! Validar partitions a dataset into folds (randomly or stratified by
//! label), runs caller-supplied train and evaluate functions on every fold,
//! aggregates the per-fold metrics, and compares candidate models with
//! Welch's t-test, confidence intervals and Cohen's d before recommending
//! the best one.
//!
//! # Quick Start
//!
//! ```
//! use validar::prelude::*;
//!
//! // 60 samples of a two-class problem
//! let labels: Vec<u8> = (0..60).map(|i| u8::from(i % 3 == 0)).collect();
//! let data: Vec<f64> = (0..60).map(f64::from).collect();
//!
//! let strong = |_: &Vec<f64>| -> Result<f64, String> { Ok(0.92) };
//! let weak = |_: &Vec<f64>| -> Result<f64, String> { Ok(0.64) };
//! let evaluate = |skill: &f64, test: &Vec<f64>| -> Result<FoldMetrics, String> {
//!     let jitter = test.iter().sum::<f64>() % 7.0 / 100.0;
//!     Ok(FoldMetrics::named([("accuracy", skill - jitter)]))
//! };
//!
//! let config = ValidationConfig::new(5).with_mode(PartitionMode::Stratified);
//! let models = [ModelSpec::new("strong", &strong), ModelSpec::new("weak", &weak)];
//! let comparison = compare_models(&data, Some(&labels[..]), &models, &evaluate, &config)
//!     .expect("valid comparison");
//!
//! assert_eq!(comparison.best(), Some("strong"));
//! let run = comparison.run("strong").expect("model was run");
//! assert_eq!(run.result.per_fold.len(), 5);
//! ```
//!
//! # Modules
//!
//! - [`model_selection`]: Fold partitioning, holdout splits and the cross-validation orchestrator
//! - [`dataset`]: The `Dataset` capability and subset extraction
//! - [`stats`]: Fold aggregation and hypothesis testing
//! - [`selection`]: Significance-aware ranking of candidate models
//! - [`config`]: Run configuration
//! - [`error`]: Error types

pub mod config;
pub mod dataset;
pub mod error;
pub mod model_selection;
pub mod prelude;
pub mod selection;
pub mod stats;

pub use error::{Result, ValidarError};

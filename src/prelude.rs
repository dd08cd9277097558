//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use validar::prelude::*;
//! ```

pub use crate::config::{PartitionMode, PartitionOptions, ValidationConfig};
pub use crate::dataset::{Columns, Dataset};
pub use crate::model_selection::{
    compare_models, partition, run_kfold, CrossValidator, FoldFailure, KFold, ModelSpec,
    RunResult, StratifiedKFold, SyncModelSpec,
};
pub use crate::selection::{select_best, BestModel, RankingOptions};
pub use crate::stats::{aggregate, compare, compare_many, ComparisonReport, FoldMetrics};

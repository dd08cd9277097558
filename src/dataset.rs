//! Dataset abstraction and subset extraction.
//!
//! The cross-validation engine never looks inside samples. It needs the
//! number of samples and a way to build the sub-collection for a set of
//! indices; [`Dataset`] is exactly that capability. Row-oriented record
//! lists (`Vec<T>`), parallel arrays (tuples of datasets) and field-to-array
//! mappings ([`Columns`]) all implement it.
//!
//! # Example
//!
//! ```
//! use validar::dataset::{extract_subset, Columns, Dataset};
//!
//! let features = vec![[0.0, 1.0], [2.0, 3.0], [4.0, 5.0]];
//! let labels = vec![0, 1, 0];
//! let data = (features, labels);
//!
//! let subset = extract_subset(&data, &[2, 0]).expect("indices are in range");
//! assert_eq!(subset.len(), 2);
//! assert_eq!(subset.1, vec![0, 0]);
//!
//! let columns = Columns::new()
//!     .with_column("x", vec![1.0, 2.0, 3.0])
//!     .expect("first column")
//!     .with_column("y", vec![0.5, 0.6, 0.7])
//!     .expect("same length");
//! let picked = extract_subset(&columns, &[1]).expect("in range");
//! assert_eq!(picked.column("y"), Some(&[0.6][..]));
//! ```

use crate::error::{Result, ValidarError};
use std::collections::BTreeMap;

/// A collection of samples that can be subset by index.
///
/// `subset` receives indices already checked against `len`, in the order the
/// sub-collection must keep.
pub trait Dataset {
    /// Number of samples.
    fn len(&self) -> usize;

    /// Build the sub-collection holding `indices`, in order.
    fn subset(&self, indices: &[usize]) -> Self
    where
        Self: Sized;

    /// Returns true when the dataset holds no samples.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that every component agrees with `len`.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` when parallel components differ in length.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Extract the samples at `indices`, checking bounds first.
pub fn extract_subset<D: Dataset>(dataset: &D, indices: &[usize]) -> Result<D> {
    dataset.validate()?;
    let len = dataset.len();
    if let Some(&index) = indices.iter().find(|&&i| i >= len) {
        return Err(ValidarError::IndexOutOfBounds { index, len });
    }
    Ok(dataset.subset(indices))
}

impl<T: Clone> Dataset for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn subset(&self, indices: &[usize]) -> Self {
        indices.iter().map(|&i| self[i].clone()).collect()
    }
}

// Parallel arrays: `len` is the first component's, `validate` holds the rest
// to it.
impl<A: Dataset, B: Dataset> Dataset for (A, B) {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn subset(&self, indices: &[usize]) -> Self {
        (self.0.subset(indices), self.1.subset(indices))
    }

    fn validate(&self) -> Result<()> {
        check_aligned(&self.0, &self.1)?;
        self.0.validate()?;
        self.1.validate()
    }
}

impl<A: Dataset, B: Dataset, C: Dataset> Dataset for (A, B, C) {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn subset(&self, indices: &[usize]) -> Self {
        (
            self.0.subset(indices),
            self.1.subset(indices),
            self.2.subset(indices),
        )
    }

    fn validate(&self) -> Result<()> {
        check_aligned(&self.0, &self.1)?;
        check_aligned(&self.0, &self.2)?;
        self.0.validate()?;
        self.1.validate()?;
        self.2.validate()
    }
}

/// Verify that two parallel arrays hold the same number of samples.
pub fn check_aligned<A: Dataset, B: Dataset>(first: &A, second: &B) -> Result<()> {
    if first.len() != second.len() {
        return Err(ValidarError::dimension_mismatch(
            "parallel arrays",
            first.len(),
            second.len(),
        ));
    }
    Ok(())
}

/// Field-to-array mapping: named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Columns {
    columns: BTreeMap<String, Vec<f64>>,
    n_rows: usize,
}

impl Columns {
    /// Create an empty column set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column. All columns must have the same length.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.insert(name, values)?;
        Ok(self)
    }

    /// Insert or replace a column.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        let replacing_only = self.columns.len() == 1 && self.columns.contains_key(&name);
        if !self.columns.is_empty() && !replacing_only && values.len() != self.n_rows {
            return Err(ValidarError::dimension_mismatch(
                &format!("column '{name}'"),
                self.n_rows,
                values.len(),
            ));
        }
        self.n_rows = values.len();
        self.columns.insert(name, values);
        Ok(())
    }

    /// Borrow a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Column names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Number of columns.
    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }
}

impl Dataset for Columns {
    fn len(&self) -> usize {
        self.n_rows
    }

    fn subset(&self, indices: &[usize]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|(name, values)| (name.clone(), indices.iter().map(|&i| values[i]).collect()))
            .collect();
        Self {
            columns,
            n_rows: indices.len(),
        }
    }
}

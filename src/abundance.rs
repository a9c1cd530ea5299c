//! Quantitative input of QEA: a sample x compound abundance table
//! and the class label of each sample
//!
//! Imagine the following table of 3 samples and 4 compounds
//!
//! | Sample |  Glucose | Pyruvate | Lactate | Citrate |
//! |:------ | --------:| --------:| -------:| -------:|
//! | **s1** |      1.1 |      1.2 |     1.3 |     1.4 |
//! | **s2** |      2.1 |      2.2 |     2.3 |     2.4 |
//! | **s3** |      3.1 |      3.2 |     3.3 |     3.4 |
//!
//! ```
//! use psea::AbundanceTable;
//!
//! let data = vec![1.1, 1.2, 1.3, 1.4, 2.1, 2.2, 2.3, 2.4, 3.1, 3.2, 3.3, 3.4];
//! let columns = vec!["Glucose", "Pyruvate", "Lactate", "Citrate"];
//! let table = AbundanceTable::new(columns, 3, data).unwrap();
//!
//! assert_eq!(table.dim(), (3, 4));
//! let lactate: Vec<f64> = table.column(2).copied().collect();
//! assert_eq!(lactate, vec![1.3, 2.3, 3.3]);
//! ```
use std::collections::BTreeMap;

use nalgebra::DMatrix;

use crate::stats::f64_from_usize;
use crate::{PseaError, PseaResult};

/// A dense, row-major table of abundances with named columns
///
/// Rows are samples, columns are compounds as named by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct AbundanceTable {
    samples: usize,
    columns: Vec<String>,
    data: Vec<f64>,
}

impl AbundanceTable {
    /// Creates a new table from row-major `data`
    ///
    /// # Errors
    ///
    /// [`PseaError::InvalidInput`] if `data` does not contain exactly
    /// `samples * columns.len()` values
    pub fn new<S: Into<String>>(columns: Vec<S>, samples: usize, data: Vec<f64>) -> PseaResult<Self> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if samples * columns.len() != data.len() {
            return Err(PseaError::InvalidInput(format!(
                "{} values do not form a table of {} samples and {} compounds",
                data.len(),
                samples,
                columns.len()
            )));
        }
        Ok(Self {
            samples,
            columns,
            data,
        })
    }

    /// Returns a Tuple with number of samples and number of compounds
    pub fn dim(&self) -> (usize, usize) {
        (self.samples, self.columns.len())
    }

    /// The column names, in table order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns `true` if the table does not contain any values
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterates the values of one sample
    pub fn row(&self, idx: usize) -> std::slice::Iter<'_, f64> {
        let width = self.columns.len();
        self.data[idx * width..(idx + 1) * width].iter()
    }

    /// Iterates the values of one compound across all samples
    pub fn column(&self, idx: usize) -> Column<'_> {
        let step = self.columns.len();
        Column {
            data: &self.data,
            pos: if idx < step { idx } else { self.data.len() },
            step,
        }
    }

    /// Builds a `samples x indices.len()` matrix of the selected columns
    pub(crate) fn select(&self, indices: &[usize]) -> DMatrix<f64> {
        let width = self.columns.len();
        DMatrix::from_fn(self.samples, indices.len(), |row, col| {
            self.data[row * width + indices[col]]
        })
    }
}

/// An iterator of the values of a single column of an [`AbundanceTable`]
pub struct Column<'a> {
    data: &'a [f64],
    pos: usize,
    step: usize,
}

impl<'a> Iterator for Column<'a> {
    type Item = &'a f64;
    fn next(&mut self) -> Option<Self::Item> {
        let value = self.data.get(self.pos)?;
        self.pos += self.step;
        Some(value)
    }
}

/// The phenotype of every sample
#[derive(Debug, Clone, PartialEq)]
pub enum ClassLabels {
    /// Discrete groups, e.g. `case` and `control`
    Categorical(Vec<String>),
    /// A continuous phenotype, e.g. age
    Continuous(Vec<f64>),
}

impl ClassLabels {
    /// Creates categorical labels
    pub fn categorical<S: AsRef<str>>(labels: &[S]) -> Self {
        ClassLabels::Categorical(labels.iter().map(|l| l.as_ref().to_string()).collect())
    }

    /// The number of labelled samples
    pub fn len(&self) -> usize {
        match self {
            ClassLabels::Categorical(l) => l.len(),
            ClassLabels::Continuous(l) => l.len(),
        }
    }

    /// Returns `true` if no sample is labelled
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The distinct levels of categorical labels, sorted
    ///
    /// Continuous labels don't have levels and return an empty list.
    pub fn levels(&self) -> Vec<&str> {
        match self {
            ClassLabels::Categorical(labels) => {
                let mut levels: Vec<&str> = labels.iter().map(String::as_str).collect();
                levels.sort_unstable();
                levels.dedup();
                levels
            }
            ClassLabels::Continuous(_) => Vec::new(),
        }
    }

    /// The numeric code of every sample
    ///
    /// Categorical labels are coded as `1..=k` in the sorted order of
    /// their levels, continuous labels are returned as they are.
    ///
    /// # Examples
    ///
    /// ```
    /// use psea::ClassLabels;
    ///
    /// let labels = ClassLabels::categorical(&["control", "case", "control"]);
    /// assert_eq!(labels.codes(), vec![2.0, 1.0, 2.0]);
    /// ```
    pub fn codes(&self) -> Vec<f64> {
        match self {
            ClassLabels::Categorical(labels) => {
                let levels: BTreeMap<&str, f64> = self
                    .levels()
                    .into_iter()
                    .enumerate()
                    .map(|(idx, level)| (level, f64_from_usize(idx + 1)))
                    .collect();
                labels
                    .iter()
                    .map(|l| levels.get(l.as_str()).copied().unwrap_or(0.0))
                    .collect()
            }
            ClassLabels::Continuous(values) => values.clone(),
        }
    }

    /// The group index (`0..k`) of every sample and the number of groups `k`
    ///
    /// Returns `None` for continuous labels.
    pub(crate) fn groups(&self) -> Option<(Vec<usize>, usize)> {
        let ClassLabels::Categorical(labels) = self else {
            return None;
        };
        let levels = self.levels();
        let index = labels
            .iter()
            .map(|l| levels.binary_search(&l.as_str()).unwrap_or(0))
            .collect();
        Some((index, levels.len()))
    }
}

//! Labeled two-dimensional numeric tables.
//!
//! A [`Frame`] is an ordered table of `f64` values with typed row and column labels, the common
//! currency of every operation in this crate: hourly curve tables, regionalisation weight tables
//! and all result tables are frames with different label types.
use crate::id::NodeID;
use crate::id::ProductKey;
use anyhow::{Context, Result, anyhow, ensure};
use indexmap::IndexSet;
use std::fmt::Display;
use std::hash::Hash;

/// A trait alias for frame label types
pub trait Label: Clone + Eq + Hash {}
impl<T> Label for T where T: Clone + Eq + Hash {}

/// An hour-of-year row label (0..8759 for a non-leap reference year)
pub type Hour = u32;

/// Hourly curves with hours in the index and product keys in the columns
pub type CurveTable = Frame<Hour, ProductKey>;

/// A regionalisation table with nodes in the index and product keys in the columns
pub type WeightTable = Frame<NodeID, ProductKey>;

/// Residual power per node, with hours in the index and nodes in the columns
pub type NodeCurves = Frame<Hour, NodeID>;

/// Stacked per-node sector profiles, addressable by `(node, hour)`
pub type StackedProfiles = Frame<(NodeID, Hour), ProductKey>;

/// An ordered two-dimensional table of `f64` values with labelled rows and columns.
///
/// Values are stored densely in row-major order. Row and column labels are unique and keep their
/// insertion order.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame<R: Label, C: Label> {
    index: IndexSet<R>,
    columns: IndexSet<C>,
    values: Vec<f64>,
}

impl<R: Label, C: Label> Frame<R, C> {
    /// Create a frame from row labels, column labels and row-major values.
    ///
    /// # Arguments
    ///
    /// * `index` - Row labels, in order
    /// * `columns` - Column labels, in order
    /// * `values` - Row-major values; must contain exactly `index.len() * columns.len()` entries
    ///
    /// # Returns
    ///
    /// The new frame, or an error if labels are duplicated or the value count does not match.
    pub fn new(
        index: impl IntoIterator<Item = R>,
        columns: impl IntoIterator<Item = C>,
        values: Vec<f64>,
    ) -> Result<Self> {
        let mut n_rows = 0;
        let index: IndexSet<R> = index
            .into_iter()
            .inspect(|_| {
                n_rows += 1;
            })
            .collect();
        ensure!(index.len() == n_rows, "Duplicate row label in frame index");

        let mut n_cols = 0;
        let columns: IndexSet<C> = columns
            .into_iter()
            .inspect(|_| {
                n_cols += 1;
            })
            .collect();
        ensure!(columns.len() == n_cols, "Duplicate column label in frame");

        ensure!(
            values.len() == index.len() * columns.len(),
            "Expected {} values for a {} x {} frame, got {}",
            index.len() * columns.len(),
            index.len(),
            columns.len(),
            values.len()
        );

        Ok(Self {
            index,
            columns,
            values,
        })
    }

    /// Create a frame of the given shape filled with zeros. Duplicate labels are collapsed.
    pub fn zeros(index: impl IntoIterator<Item = R>, columns: impl IntoIterator<Item = C>) -> Self {
        let index: IndexSet<R> = index.into_iter().collect();
        let columns: IndexSet<C> = columns.into_iter().collect();
        let values = vec![0.0; index.len() * columns.len()];
        Self {
            index,
            columns,
            values,
        }
    }

    /// The row labels, in order
    pub fn index(&self) -> &IndexSet<R> {
        &self.index
    }

    /// The column labels, in order
    pub fn columns(&self) -> &IndexSet<C> {
        &self.columns
    }

    /// The number of rows
    pub fn nrows(&self) -> usize {
        self.index.len()
    }

    /// The number of columns
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    /// The value at the given row and column positions.
    ///
    /// # Panics
    ///
    /// Panics if either position is out of range.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(col < self.columns.len(), "Column position out of range");
        self.values[row * self.columns.len() + col]
    }

    /// Set the value at the given row and column positions.
    ///
    /// # Panics
    ///
    /// Panics if either position is out of range.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(col < self.columns.len(), "Column position out of range");
        self.values[row * self.columns.len() + col] = value;
    }

    /// One row of values, in column order.
    ///
    /// # Panics
    ///
    /// Panics if the row position is out of range.
    pub fn row(&self, row: usize) -> &[f64] {
        let ncols = self.columns.len();
        &self.values[row * ncols..(row + 1) * ncols]
    }

    /// Look up a value by row and column label. Returns `None` if either label is unknown.
    pub fn value_at(&self, row: &R, col: &C) -> Option<f64> {
        let i = self.index.get_index_of(row)?;
        let j = self.columns.get_index_of(col)?;
        Some(self.get(i, j))
    }

    /// Iterate over column labels along with the sum of each column's values
    pub fn column_sums(&self) -> impl Iterator<Item = (&C, f64)> {
        self.columns.iter().enumerate().map(move |(j, key)| {
            let sum: f64 = (0..self.index.len()).map(|i| self.get(i, j)).sum();
            (key, sum)
        })
    }

    /// Create a new frame containing only the given columns, in the given order.
    ///
    /// Requesting an unknown column label is an error.
    pub fn select_columns(&self, keys: &[C]) -> Result<Self>
    where
        C: Display,
    {
        let positions = keys
            .iter()
            .map(|key| {
                self.columns
                    .get_index_of(key)
                    .ok_or_else(|| anyhow!("Unknown column: {key}"))
            })
            .collect::<Result<Vec<_>>>()?;

        let values = (0..self.nrows())
            .flat_map(|i| positions.iter().map(move |&j| self.get(i, j)))
            .collect();
        Self::new(self.index.iter().cloned(), keys.iter().cloned(), values)
    }

    /// Create a new frame containing only the given rows, in the given order.
    ///
    /// Requesting an unknown row label is an error.
    pub fn select_rows(&self, labels: &[R]) -> Result<Self>
    where
        R: Display,
    {
        let positions = labels
            .iter()
            .map(|label| {
                self.index
                    .get_index_of(label)
                    .ok_or_else(|| anyhow!("Unknown row: {label}"))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut values = Vec::with_capacity(positions.len() * self.ncols());
        for &i in &positions {
            values.extend_from_slice(self.row(i));
        }
        Self::new(labels.iter().cloned(), self.columns.iter().cloned(), values)
    }

    /// Multiply each column by the matching factor.
    ///
    /// # Arguments
    ///
    /// * `factors` - One factor per column, in column order
    pub fn scale_columns(&self, factors: &[f64]) -> Result<Self> {
        ensure!(
            factors.len() == self.ncols(),
            "Expected {} scale factors, got {}",
            self.ncols(),
            factors.len()
        );

        let values = self
            .values
            .chunks_exact(self.ncols().max(1))
            .flat_map(|row| row.iter().zip(factors).map(|(value, factor)| value * factor))
            .collect();
        Self::new(
            self.index.iter().cloned(),
            self.columns.iter().cloned(),
            values,
        )
    }

    /// The matrix product of this frame with the transpose of `rhs`, aligned on column labels.
    ///
    /// Each result cell is the sum over shared column keys of `self[row, key] * rhs[other, key]`.
    /// Alignment is by key rather than position, so `rhs` columns that this frame does not carry
    /// simply do not participate; every column of this frame must however be present in `rhs`.
    ///
    /// # Returns
    ///
    /// A frame with this frame's index as rows and the index of `rhs` as columns.
    pub fn dot_transpose<R2: Label>(&self, rhs: &Frame<R2, C>) -> Result<Frame<R, R2>>
    where
        C: Display,
    {
        let positions = self
            .columns
            .iter()
            .map(|key| {
                rhs.columns
                    .get_index_of(key)
                    .ok_or_else(|| anyhow!("Missing key in right-hand frame: {key}"))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut values = Vec::with_capacity(self.nrows() * rhs.nrows());
        for i in 0..self.nrows() {
            let row = self.row(i);
            for j in 0..rhs.nrows() {
                let other = rhs.row(j);
                values.push(
                    row.iter()
                        .zip(&positions)
                        .map(|(value, &p)| value * other[p])
                        .sum(),
                );
            }
        }
        Frame::new(self.index.iter().cloned(), rhs.index.iter().cloned(), values)
    }
}

impl<C: Label> Frame<(NodeID, Hour), C> {
    /// Extract the sub-frame for one node from a stacked per-node result.
    ///
    /// # Returns
    ///
    /// A frame with the node's hours as rows, or an error if the node has no rows.
    pub fn select_node(&self, node: &NodeID) -> Result<Frame<Hour, C>> {
        let rows: Vec<_> = self
            .index
            .iter()
            .enumerate()
            .filter(|(_, (n, _))| n == node)
            .map(|(i, (_, hour))| (i, *hour))
            .collect();
        ensure!(!rows.is_empty(), "Unknown node: {node}");

        let mut values = Vec::with_capacity(rows.len() * self.ncols());
        for (i, _) in &rows {
            values.extend_from_slice(self.row(*i));
        }
        Frame::new(
            rows.iter().map(|(_, hour)| *hour),
            self.columns.iter().cloned(),
            values,
        )
        .context("Stacked frame has duplicate hours for node")
    }
}

//! Row-major 2-D grid storage.

use rayon::prelude::*;
use thiserror::Error;

/// Errors raised when constructing or combining grids.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("Grid data length {len} does not match shape {rows}x{cols}")]
    LengthMismatch { rows: usize, cols: usize, len: usize },
    #[error("Row {row} has {len} columns, expected {expected}")]
    RaggedRow { row: usize, len: usize, expected: usize },
    #[error("Field '{name}' has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        name: String,
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("Grid is empty")]
    Empty,
    #[error("Downsampling step must be at least 1")]
    ZeroStep,
}

/// A dense 2-D array stored in row-major order.
///
/// Row index runs along latitude, column index along longitude.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

/// A physical field where `None` marks a cell with no measurement.
pub type Field = Grid<Option<f64>>;

impl<T> Grid<T> {
    /// Wraps row-major `data` as a `rows` x `cols` grid.
    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> Result<Self, GridError> {
        if data.len() != rows * cols {
            return Err(GridError::LengthMismatch { rows, cols, len: data.len() });
        }
        Ok(Self { rows, cols, data })
    }

    /// Builds a grid from nested rows, rejecting ragged input.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, GridError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(GridError::RaggedRow { row: i, len: row.len(), expected: n_cols });
            }
            data.extend(row);
        }
        Ok(Self { rows: n_rows, cols: n_cols, data })
    }

    /// Number of rows (latitude direction).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (longitude direction).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat index of `(row, col)`.
    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.rows && col < self.cols);
        row * self.cols + col
    }

    /// Returns the cell at `(row, col)`, or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// Cells in row-major order.
    pub fn values(&self) -> &[T] {
        &self.data
    }

    /// Iterates over cells in row-major order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Applies `f` to every cell, keeping the shape.
    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> Grid<U> {
        Grid {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Iterates over `(row, col)` for every `stride`-th row and column,
    /// starting at the origin.
    pub fn strided_coords(&self, stride: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        let stride = stride.max(1);
        let cols = self.cols;
        (0..self.rows)
            .step_by(stride)
            .flat_map(move |r| (0..cols).step_by(stride).map(move |c| (r, c)))
    }
}

impl<T: Sync> Grid<T> {
    /// Parallel `map` that also passes the flat index of each cell.
    pub fn par_map_indexed<U, F>(&self, f: F) -> Grid<U>
    where
        U: Send,
        F: Fn(usize, &T) -> U + Sync + Send,
    {
        Grid {
            rows: self.rows,
            cols: self.cols,
            data: self.data.par_iter().enumerate().map(|(i, v)| f(i, v)).collect(),
        }
    }
}

impl<T: Clone> Grid<T> {
    /// A grid with every cell set to `value`.
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self { rows, cols, data: vec![value; rows * cols] }
    }

    /// Keeps every `step`-th row and column.
    pub fn downsample(&self, step: usize) -> Result<Self, GridError> {
        if step == 0 {
            return Err(GridError::ZeroStep);
        }
        let rows = self.rows.div_ceil(step);
        let cols = self.cols.div_ceil(step);
        let data = self
            .strided_coords(step)
            .map(|(r, c)| self.data[r * self.cols + c].clone())
            .collect();
        Ok(Self { rows, cols, data })
    }

    /// Reverses row order (flip up/down).
    pub fn flip_rows(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for r in (0..self.rows).rev() {
            data.extend_from_slice(&self.data[r * self.cols..(r + 1) * self.cols]);
        }
        Self { rows: self.rows, cols: self.cols, data }
    }
}

impl Grid<Option<f64>> {
    /// Present (non-missing, finite) values.
    pub fn present(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().filter_map(|v| v.filter(|x| x.is_finite()))
    }

    /// Number of cells holding a finite value.
    pub fn present_count(&self) -> usize {
        self.present().count()
    }
}

//! Dense row-major matrix used by every stage of the pipeline.

use crate::error::{PhashError, Result};
use std::ops::Index;

/// A `rows x cols` matrix stored row-major in a single buffer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T> Matrix<T> {
    /// Wrap a row-major buffer. The buffer length must equal `rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(PhashError::dimension(format!(
                "matrix must be non-empty, got {}x{}",
                rows, cols
            )));
        }
        if data.len() != rows * cols {
            return Err(PhashError::InvalidInputLength {
                expected: rows * cols,
                actual: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Build a matrix cell by cell.
    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> T,
    {
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Self::new(rows, cols, data)
    }

    /// Build a matrix from nested rows, rejecting ragged input.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(height * width);
        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(PhashError::dimension(format!(
                    "row {} has {} entries, expected {}",
                    idx,
                    row.len(),
                    width
                )));
            }
            data.extend(row);
        }
        Self::new(height, width, data)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// Borrow row `r`.
    ///
    /// Panics if `r` is out of bounds, like slice indexing.
    pub fn row(&self, r: usize) -> &[T] {
        let start = r * self.cols;
        &self.data[start..start + self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> {
        self.data.chunks(self.cols)
    }

    /// Row-major view of every cell.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Apply `f` to every cell, keeping the shape.
    pub fn map<U, F>(&self, f: F) -> Matrix<U>
    where
        F: FnMut(&T) -> U,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }
}

impl<T: Clone> Matrix<T> {
    pub fn filled(rows: usize, cols: usize, value: T) -> Result<Self> {
        Self::new(rows, cols, vec![value; rows * cols])
    }

    /// Copy column `c` out of the matrix.
    pub fn column(&self, c: usize) -> Vec<T> {
        self.iter_rows().map(|row| row[c].clone()).collect()
    }

    /// Copy the `rows x cols` block anchored at the top-left corner.
    pub fn top_left(&self, rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 || rows > self.rows || cols > self.cols {
            return Err(PhashError::dimension(format!(
                "cannot take a {}x{} block from a {}x{} matrix",
                rows, cols, self.rows, self.cols
            )));
        }
        let data = self
            .iter_rows()
            .take(rows)
            .flat_map(|row| row[..cols].iter().cloned())
            .collect();
        Self::new(rows, cols, data)
    }

    pub fn to_rows(&self) -> Vec<Vec<T>> {
        self.iter_rows().map(<[T]>::to_vec).collect()
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(
            row < self.rows && col < self.cols,
            "index ({}, {}) out of bounds for {}x{} matrix",
            row,
            col,
            self.rows,
            self.cols
        );
        &self.data[row * self.cols + col]
    }
}

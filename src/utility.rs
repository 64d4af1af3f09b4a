//! Dense cardinal utility matrices.

use crate::error::{InputError, Result};
use crate::validate;
use rand::Rng;

// ============================================================================
// UtilityMatrix
// ============================================================================

/// A dense `rows x cols` matrix of cardinal utilities.
///
/// Row `i` holds agent `i`'s utility for each potential partner; a higher value
/// means more preferred. Storage is a single flat buffer indexed `row * cols + col`.
///
/// One-sided (roommate) problems use a square matrix whose diagonal is the agent's
/// value for staying unmatched; two-sided problems use one `m x n` matrix per side.
///
/// Values are guaranteed finite after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct UtilityMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl UtilityMatrix {
    /// Wraps a flat row-major buffer.
    ///
    /// # Errors
    /// Returns an error if a dimension is zero, `rows * cols` overflows `usize`,
    /// `data.len() != rows * cols`, or any value is NaN or infinite.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        validate::utilities(rows, cols, &data)?;
        Ok(Self { rows, cols, data })
    }

    /// Wraps a flat buffer of `n * n` values as a square matrix.
    ///
    /// # Errors
    /// Same as [`UtilityMatrix::new`].
    pub fn square(n: usize, data: Vec<f64>) -> Result<Self> {
        Self::new(n, n, data)
    }

    /// Builds a matrix from nested rows.
    ///
    /// # Errors
    /// Returns an error if rows differ in length, the matrix is empty, or any value
    /// is non-finite.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(validate::cell_count(rows.len(), cols)?);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(InputError::Ragged {
                    row: i,
                    expected: cols,
                    got: row.len(),
                }
                .into());
            }
            data.extend_from_slice(row);
        }
        Self::new(rows.len(), cols, data)
    }

    /// Samples utilities uniformly from `[0, 1)`.
    ///
    /// # Panics
    /// Panics if `rows` or `cols` is zero, or if `rows * cols` overflows `usize`.
    pub fn random<R: Rng>(rng: &mut R, rows: usize, cols: usize) -> Self {
        assert!(rows > 0 && cols > 0, "utility matrix must be non-empty");
        let Some(len) = rows.checked_mul(cols) else {
            panic!("{rows} x {cols} utility matrix overflows usize");
        };
        let data = (0..len).map(|_| rng.random::<f64>()).collect();
        Self { rows, cols, data }
    }

    /// Number of agents (rows).
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of potential partners (columns).
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns whether the matrix is square.
    #[inline]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Returns the utility agent `row` assigns to partner `col`.
    #[inline(always)]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        debug_assert!(row < self.rows && col < self.cols);
        self.data[row * self.cols + col]
    }

    /// Returns agent `row`'s utilities as a slice of length `cols`.
    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Returns the flat row-major buffer.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Returns the transpose (`cols x rows`).
    ///
    /// Handy when one side's utilities are stored column-per-agent.
    pub fn transpose(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for c in 0..self.cols {
            for r in 0..self.rows {
                data.push(self.get(r, c));
            }
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

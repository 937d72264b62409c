//! Dense 2D matrix value type and shape-checked algebra.
//!
//! # Design choices
//! - All entries are `f64`. Finiteness is validated at the construction and
//!   cell-edit boundaries; arithmetic results are not re-validated.
//! - Every operation returns a new matrix. The only in-place path is the
//!   bounds-checked [`Matrix::set`] cell accessor, kept for collaborators
//!   that edit configuration matrices between ticks.
//! - Determinant and inverse use recursive Laplace expansion and the
//!   classical adjugate. Factorial-time, which is acceptable at the fixed
//!   2x2 and 6x6 sizes the tracker uses; larger sizes should switch to LU.
//! - The `0x0` empty matrix is a distinguished value (`det = 1`, inverse is
//!   itself). Shapes with exactly one zero side do not exist.

use crate::error::MatrixError;
use approx::{AbsDiffEq, RelativeEq};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense row-major matrix of `f64` values.
///
/// Equality (`PartialEq`) is strict and elementwise; matrices of different
/// shapes compare unequal. Tolerance-based comparison goes through the
/// [`approx`] traits implemented below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

impl Matrix {
    /// The canonical `0x0` empty matrix.
    pub fn empty() -> Matrix {
        Matrix {
            rows: 0,
            cols: 0,
            data: Vec::new(),
        }
    }

    /// Build a matrix from rows, validating that the grid is rectangular and
    /// every entry is finite.
    ///
    /// A single empty row yields the canonical [`Matrix::empty`] value.
    ///
    /// # Errors
    /// [`MatrixError::Shape`] for an empty or ragged grid, or a grid with
    /// zero columns and more than one row; [`MatrixError::NonFinite`] for a
    /// NaN or infinite entry.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Matrix, MatrixError> {
        if rows.is_empty() {
            return Err(MatrixError::Shape(
                "input must contain at least one row".into(),
            ));
        }

        let cols = rows[0].as_ref().len();
        for (r, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(MatrixError::Shape(format!(
                    "row {} has {} entries, expected {}",
                    r,
                    row.len(),
                    cols
                )));
            }
            for (c, value) in row.iter().enumerate() {
                if !value.is_finite() {
                    return Err(MatrixError::NonFinite { row: r, col: c });
                }
            }
        }

        if cols == 0 {
            if rows.len() == 1 {
                return Ok(Matrix::empty());
            }
            return Err(MatrixError::Shape(
                "a grid with zero columns must be the 0x0 empty matrix".into(),
            ));
        }

        let data = rows.iter().flat_map(|row| row.as_ref().iter().copied()).collect();
        Ok(Matrix {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Matrix filled with `value`.
    ///
    /// `(0, 0)` yields [`Matrix::empty`].
    ///
    /// # Panics
    /// If exactly one of `rows`/`cols` is zero, or `value` is not finite.
    pub fn full(rows: usize, cols: usize, value: f64) -> Matrix {
        if rows == 0 && cols == 0 {
            return Matrix::empty();
        }
        assert!(
            rows > 0 && cols > 0,
            "matrices of shape 0xc or rx0 do not exist"
        );
        assert!(value.is_finite(), "fill value must be finite");
        Matrix::filled(rows, cols, value)
    }

    /// Matrix of zeros. See [`Matrix::full`] for the degenerate-shape rules.
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix::full(rows, cols, 0.0)
    }

    /// Matrix of ones. See [`Matrix::full`] for the degenerate-shape rules.
    pub fn ones(rows: usize, cols: usize) -> Matrix {
        Matrix::full(rows, cols, 1.0)
    }

    /// The `n x n` identity matrix; `n = 0` yields [`Matrix::empty`].
    pub fn identity(n: usize) -> Matrix {
        if n == 0 {
            return Matrix::empty();
        }
        let mut m = Matrix::filled(n, n, 0.0);
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        m
    }

    /// Internal unchecked fill; callers guarantee the shape is valid.
    fn filled(rows: usize, cols: usize, value: f64) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }
}

// ---------------------------------------------------------------------------
// Shape and cell access
// ---------------------------------------------------------------------------

impl Matrix {
    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
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

    /// True for the `0x0` empty matrix.
    pub fn is_empty(&self) -> bool {
        self.rows == 0 && self.cols == 0
    }

    /// Read one cell.
    ///
    /// # Errors
    /// [`MatrixError::IndexOutOfRange`] outside the matrix bounds.
    pub fn get(&self, row: usize, col: usize) -> Result<f64, MatrixError> {
        self.check_index(row, col)?;
        Ok(self.data[row * self.cols + col])
    }

    /// Write one cell in place.
    ///
    /// This is the single escape hatch from the value semantics of the
    /// algebra above, kept for externally driven configuration edits.
    ///
    /// # Errors
    /// [`MatrixError::IndexOutOfRange`] outside the matrix bounds;
    /// [`MatrixError::NonFinite`] for a NaN or infinite value.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<(), MatrixError> {
        self.check_index(row, col)?;
        if !value.is_finite() {
            return Err(MatrixError::NonFinite { row, col });
        }
        self.data[row * self.cols + col] = value;
        Ok(())
    }

    fn check_index(&self, row: usize, col: usize) -> Result<(), MatrixError> {
        if row >= self.rows || col >= self.cols {
            return Err(MatrixError::IndexOutOfRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Algebra
// ---------------------------------------------------------------------------

impl Matrix {
    /// Transpose. Involutive: `a.transpose().transpose() == a`.
    pub fn transpose(&self) -> Matrix {
        let mut out = Matrix {
            rows: self.cols,
            cols: self.rows,
            data: vec![0.0; self.data.len()],
        };
        for r in 0..self.rows {
            for c in 0..self.cols {
                out.data[c * out.cols + r] = self.data[r * self.cols + c];
            }
        }
        out
    }

    /// Elementwise sum. Requires identical shapes.
    pub fn add(&self, rhs: &Matrix) -> Result<Matrix, MatrixError> {
        self.zip(rhs, |a, b| a + b)
    }

    /// Elementwise difference. Requires identical shapes.
    pub fn sub(&self, rhs: &Matrix) -> Result<Matrix, MatrixError> {
        self.zip(rhs, |a, b| a - b)
    }

    fn zip(&self, rhs: &Matrix, op: impl Fn(f64, f64) -> f64) -> Result<Matrix, MatrixError> {
        if self.shape() != rhs.shape() {
            return Err(MatrixError::DimensionMismatch {
                lhs: self.shape(),
                rhs: rhs.shape(),
            });
        }
        if self.is_empty() {
            return Ok(Matrix::empty());
        }
        let data = self
            .data
            .iter()
            .zip(&rhs.data)
            .map(|(a, b)| op(*a, *b))
            .collect();
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    /// Multiply every entry by a scalar.
    pub fn scale(&self, k: f64) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|v| v * k).collect(),
        }
    }

    /// Matrix product. Requires `self.cols == rhs.rows`.
    pub fn matmul(&self, rhs: &Matrix) -> Result<Matrix, MatrixError> {
        if self.cols != rhs.rows {
            return Err(MatrixError::DimensionMismatch {
                lhs: self.shape(),
                rhs: rhs.shape(),
            });
        }
        if self.is_empty() && rhs.is_empty() {
            return Ok(Matrix::empty());
        }
        let mut out = Matrix::filled(self.rows, rhs.cols, 0.0);
        for r in 0..self.rows {
            for c in 0..rhs.cols {
                let mut acc = 0.0;
                for i in 0..self.cols {
                    acc += self.data[r * self.cols + i] * rhs.data[i * rhs.cols + c];
                }
                out.data[r * rhs.cols + c] = acc;
            }
        }
        Ok(out)
    }

    /// Determinant by recursive Laplace expansion along the first row.
    ///
    /// Closed-form base cases: `0x0 -> 1` (the algebraic convention that
    /// keeps degenerate covariances well-defined), `1x1 -> a00`,
    /// `2x2 -> ad - bc`.
    ///
    /// # Errors
    /// [`MatrixError::NonSquare`] for a non-square matrix.
    pub fn det(&self) -> Result<f64, MatrixError> {
        if !self.is_square() {
            return Err(MatrixError::NonSquare {
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(self.det_unchecked())
    }

    fn det_unchecked(&self) -> f64 {
        match self.rows {
            0 => 1.0,
            1 => self.data[0],
            2 => self.data[0] * self.data[3] - self.data[1] * self.data[2],
            _ => {
                let mut sum = 0.0;
                for c in 0..self.cols {
                    let sign = if c % 2 == 0 { 1.0 } else { -1.0 };
                    sum += sign * self.data[c] * self.minor(0, c).det_unchecked();
                }
                sum
            }
        }
    }

    /// Inverse by the classical adjugate: cofactor of every cell, written
    /// transposed, scaled by `1/det`.
    ///
    /// The `0x0` matrix is its own inverse.
    ///
    /// # Errors
    /// [`MatrixError::NonSquare`] for a non-square matrix;
    /// [`MatrixError::Singular`] when the determinant is exactly zero.
    pub fn try_inverse(&self) -> Result<Matrix, MatrixError> {
        if !self.is_square() {
            return Err(MatrixError::NonSquare {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.rows == 0 {
            return Ok(Matrix::empty());
        }

        let det = self.det_unchecked();
        if det == 0.0 {
            return Err(MatrixError::Singular);
        }
        if self.rows == 1 {
            return Ok(Matrix::filled(1, 1, 1.0 / det));
        }

        let mut adjugate = Matrix::filled(self.rows, self.cols, 0.0);
        for r in 0..self.rows {
            for c in 0..self.cols {
                let sign = if (r + c) % 2 == 0 { 1.0 } else { -1.0 };
                adjugate.data[c * self.cols + r] = sign * self.minor(r, c).det_unchecked();
            }
        }
        Ok(adjugate.scale(1.0 / det))
    }

    /// Submatrix with `row` and `col` deleted.
    fn minor(&self, row: usize, col: usize) -> Matrix {
        let mut data = Vec::with_capacity((self.rows - 1) * (self.cols - 1));
        for r in 0..self.rows {
            if r == row {
                continue;
            }
            for c in 0..self.cols {
                if c == col {
                    continue;
                }
                data.push(self.data[r * self.cols + c]);
            }
        }
        Matrix {
            rows: self.rows - 1,
            cols: self.cols - 1,
            data,
        }
    }
}

// ---------------------------------------------------------------------------
// Tolerance-based comparison
// ---------------------------------------------------------------------------

impl AbsDiffEq for Matrix {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| f64::abs_diff_eq(a, b, epsilon))
    }
}

impl RelativeEq for Matrix {
    fn default_max_relative() -> f64 {
        f64::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| f64::relative_eq(a, b, epsilon, max_relative))
    }
}

// ---------------------------------------------------------------------------
// Diagnostics rendering
// ---------------------------------------------------------------------------

/// Fixed-width rendering: one line per row, values right-aligned to the
/// widest stringified value in their column, rows wrapped as
/// `[[ a , b ],` / ` [ c , d ]]`. The empty matrix renders `[[]]`.
impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("[[]]");
        }

        let rendered: Vec<String> = self.data.iter().map(|v| v.to_string()).collect();
        let mut widths = vec![0usize; self.cols];
        for r in 0..self.rows {
            for c in 0..self.cols {
                widths[c] = widths[c].max(rendered[r * self.cols + c].len());
            }
        }

        for r in 0..self.rows {
            f.write_str(if r == 0 { "[[ " } else { " [ " })?;
            for c in 0..self.cols {
                write!(f, "{:>1$}", rendered[r * self.cols + c], widths[c])?;
                f.write_str(if c == self.cols - 1 { " ]" } else { " , " })?;
            }
            f.write_str(if r == self.rows - 1 { "]" } else { ",\n" })?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Error kinds raised by matrix construction and algebra.

use thiserror::Error;

/// Errors that can occur while building or operating on a [`Matrix`].
///
/// All variants are raised synchronously by the operation that detects the
/// problem; nothing is recovered inside this crate.
///
/// [`Matrix`]: crate::Matrix
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatrixError {
    /// Construction input was ragged, empty, or otherwise not a rectangular
    /// grid.
    #[error("invalid matrix shape: {0}")]
    Shape(String),

    /// An entry was NaN or infinite.
    #[error("entry ({row}, {col}) is not a finite number")]
    NonFinite { row: usize, col: usize },

    /// Operand shapes are incompatible for the requested operation.
    #[error("dimension mismatch: {lhs:?} vs {rhs:?}")]
    DimensionMismatch {
        lhs: (usize, usize),
        rhs: (usize, usize),
    },

    /// Determinant or inverse requested for a non-square matrix.
    #[error("matrix is not square ({rows}x{cols})")]
    NonSquare { rows: usize, cols: usize },

    /// Inverse requested for a matrix with zero determinant.
    #[error("matrix is singular")]
    Singular,

    /// Cell access outside the matrix bounds.
    #[error("index ({row}, {col}) out of bounds for {rows}x{cols} matrix")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

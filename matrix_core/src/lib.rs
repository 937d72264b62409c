//! `matrix_core` - dense small-matrix algebra for the tracking filter.
//!
//! # Module layout
//! - [`matrix`] - the [`Matrix`] value type: construction, shape-checked
//!   algebra, exact determinant/inverse, diagnostics rendering
//! - [`error`]  - the [`MatrixError`] failure kinds
//!
//! The crate is deliberately self-contained: the closed-form determinant
//! base cases and the Laplace/adjugate algorithms are part of its contract,
//! so no external linear-algebra backend is involved.

pub mod error;
pub mod matrix;

pub use error::MatrixError;
pub use matrix::Matrix;

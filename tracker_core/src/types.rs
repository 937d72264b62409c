//! Fundamental types shared across the tracker surface.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque per-track identifier.
///
/// Issued by the caller and never generated here; a stable integer handle so
/// tracks can be referenced across process boundaries and logs.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// One position observation for one track, as supplied by the per-tick
/// sensor loop.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub id: TrackId,
    /// Observed x position.
    pub x: f64,
    /// Observed y position.
    pub y: f64,
}

/// Per-track output of one tick: the position estimate plus the two diagonal
/// position variances. Velocity and acceleration estimates (and every
/// off-diagonal covariance term) stay internal to the filter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackEstimate {
    pub id: TrackId,
    /// Estimated x position.
    pub x: f64,
    /// Estimated y position.
    pub y: f64,
    /// Variance of the x position estimate.
    pub var_x: f64,
    /// Variance of the y position estimate.
    pub var_y: f64,
}

//! Failure kinds surfaced to the control loop.

use crate::types::TrackId;
use matrix_core::MatrixError;
use thiserror::Error;

/// Errors raised by the tracker.
///
/// Inside a tick these are reported per track (see
/// [`TickOutput::failures`]); tick-level configuration problems abort the
/// call before any track is touched.
///
/// [`TickOutput::failures`]: crate::tracker::TickOutput
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackerError {
    /// The measurement references an id with no active track slot.
    #[error("no active track for {0}")]
    UnknownTrack(TrackId),

    /// A sampled configuration value is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Matrix algebra failed, most commonly a singular innovation
    /// covariance.
    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

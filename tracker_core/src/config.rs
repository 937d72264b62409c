//! Externally editable filter configuration.
//!
//! The owning [`KalmanTracker`] exposes this struct as a public field. The
//! control loop edits it between ticks, either by assigning whole matrices
//! or through [`Matrix::set`] cell edits; the tracker samples the values at
//! the start of each call and never observes a mid-call edit.
//!
//! [`KalmanTracker`]: crate::tracker::KalmanTracker
//! [`Matrix::set`]: matrix_core::Matrix::set

use crate::error::TrackerError;
use matrix_core::Matrix;

/// Configuration sampled by the tracker on every call.
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    /// Multiplier applied to the base tick length when deriving the
    /// effective sensor interval. Must be a positive real.
    pub sensor_interval_multiplier: f64,
    /// Measurement noise covariance R (2x2).
    pub measurement_noise: Matrix,
    /// State a newly started track is cloned from (6x1).
    pub initial_state: Matrix,
    /// Covariance a newly started track is cloned from (6x6).
    pub initial_covariance: Matrix,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            sensor_interval_multiplier: 1.0,
            // 10-unit measurement noise std dev on each axis.
            measurement_noise: Matrix::identity(2).scale(100.0),
            initial_state: Matrix::zeros(6, 1),
            // Near-uninformative prior: the first measurement dominates.
            initial_covariance: Matrix::identity(6).scale(9999.0),
        }
    }
}

impl TrackerConfig {
    /// Check the multiplier and every matrix shape.
    pub fn validate(&self) -> Result<(), TrackerError> {
        if !self.sensor_interval_multiplier.is_finite() || self.sensor_interval_multiplier <= 0.0 {
            return Err(TrackerError::Config(format!(
                "sensor interval multiplier must be a positive real, got {}",
                self.sensor_interval_multiplier
            )));
        }
        if self.measurement_noise.shape() != (2, 2) {
            return Err(TrackerError::Config(format!(
                "measurement noise must be 2x2, got {:?}",
                self.measurement_noise.shape()
            )));
        }
        if self.initial_state.shape() != (6, 1) {
            return Err(TrackerError::Config(format!(
                "initial state must be 6x1, got {:?}",
                self.initial_state.shape()
            )));
        }
        if self.initial_covariance.shape() != (6, 6) {
            return Err(TrackerError::Config(format!(
                "initial covariance must be 6x6, got {:?}",
                self.initial_covariance.shape()
            )));
        }
        Ok(())
    }
}

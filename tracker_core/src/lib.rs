//! `tracker_core` - multi-target linear Kalman filtering over `matrix_core`.
//!
//! # Module layout
//! - [`types`]   - fundamental types (ids, measurements, estimates)
//! - [`config`]  - externally editable filter configuration
//! - [`kf`]      - predict / update steps for the constant-acceleration model
//! - [`tracker`] - per-track state store and the per-tick entry point
//! - [`error`]   - failure kinds surfaced to the control loop

pub mod config;
pub mod error;
pub mod kf;
pub mod tracker;
pub mod types;

pub use config::TrackerConfig;
pub use error::TrackerError;
pub use tracker::{KalmanTracker, TickOutput, TrackFailure, TransitionSink};
pub use types::{Measurement, TrackEstimate, TrackId};

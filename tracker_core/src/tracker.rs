//! Per-track state store and the per-tick predict/update entry point.
//!
//! # Processing steps per tick
//! 1. Re-sample the sensor-interval multiplier; rebuild F and Fᵀ. A changed
//!    F is pushed to the attached display sink.
//! 2. Re-sample the measurement noise R.
//! 3. For each measurement, in input order: one predict+update cycle against
//!    that id's stored state, committed on success.
//! 4. Collect estimates and per-track failures, both in input order.
//!
//! Failures are isolated per track: an unknown id or a singular innovation
//! covariance skips that measurement (logged at warn level) and leaves the
//! stored state untouched, while the rest of the batch proceeds.

use crate::{
    config::TrackerConfig,
    error::TrackerError,
    kf,
    types::{Measurement, TrackEstimate, TrackId},
};
use matrix_core::Matrix;
use std::collections::HashMap;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Display sink
// ---------------------------------------------------------------------------

/// Receives the state-transition matrix whenever the tracker republishes it.
///
/// One-way and display-facing: nothing published here flows back into the
/// filter. Any `FnMut(&Matrix)` closure qualifies.
pub trait TransitionSink {
    fn publish(&mut self, transition: &Matrix);
}

impl<F: FnMut(&Matrix)> TransitionSink for F {
    fn publish(&mut self, transition: &Matrix) {
        self(transition)
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Stored filter state for one track.
#[derive(Clone, Debug)]
struct TrackState {
    state: Matrix,
    cov: Matrix,
}

/// A measurement skipped during one tick, with the reason.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackFailure {
    pub id: TrackId,
    pub error: TrackerError,
}

/// Outputs of one tick.
#[derive(Clone, Debug, Default)]
pub struct TickOutput {
    /// Successful estimates, in measurement order.
    pub estimates: Vec<TrackEstimate>,
    /// Skipped measurements, in measurement order.
    pub failures: Vec<TrackFailure>,
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// Multi-target linear Kalman tracker.
///
/// Owns every track's state vector and covariance, keyed by caller-issued
/// [`TrackId`]s; the lifecycle calls and [`update_and_predict`] are the only
/// writers. Fully synchronous: exclusive access is enforced through
/// `&mut self`, so no locking is involved.
///
/// [`update_and_predict`]: KalmanTracker::update_and_predict
pub struct KalmanTracker {
    /// Externally editable configuration, sampled at the start of each call.
    pub config: TrackerConfig,
    base_dt: f64,
    tracks: HashMap<TrackId, TrackState>,
    transition: Matrix,
    transition_t: Matrix,
    observation: Matrix,
    observation_t: Matrix,
    control: Matrix,
    identity: Matrix,
    sink: Option<Box<dyn TransitionSink>>,
}

impl KalmanTracker {
    /// Create a tracker with a fixed base tick length.
    ///
    /// # Errors
    /// [`TrackerError::Config`] when `base_dt` is not a positive real or the
    /// configuration fails [`TrackerConfig::validate`].
    pub fn new(base_dt: f64, config: TrackerConfig) -> Result<Self, TrackerError> {
        if !base_dt.is_finite() || base_dt <= 0.0 {
            return Err(TrackerError::Config(format!(
                "base_dt must be a positive real, got {base_dt}"
            )));
        }
        config.validate()?;

        let transition = kf::transition_matrix(config.sensor_interval_multiplier * base_dt)?;
        let transition_t = transition.transpose();
        let observation = kf::position_observation()?;
        let observation_t = observation.transpose();

        Ok(Self {
            config,
            base_dt,
            tracks: HashMap::new(),
            transition,
            transition_t,
            observation,
            observation_t,
            control: Matrix::zeros(6, 1),
            identity: Matrix::identity(6),
            sink: None,
        })
    }

    /// Begin (or re-arm) tracking for each id, cloning the current initial
    /// state and covariance into a fresh slot.
    ///
    /// Starting an id that is already tracked discards its state and starts
    /// over from the configured initial values.
    pub fn start_tracking(&mut self, ids: &[TrackId]) -> Result<(), TrackerError> {
        let initial = self.sample_initial()?;
        for &id in ids {
            if self.tracks.insert(id, initial.clone()).is_some() {
                debug!(%id, "track re-initialized");
            }
        }
        Ok(())
    }

    /// Drop each id's slot. Unknown ids are a no-op.
    pub fn stop_tracking(&mut self, ids: &[TrackId]) {
        for id in ids {
            self.tracks.remove(id);
        }
    }

    /// Run one predict+update cycle per measurement, in input order.
    ///
    /// Configuration is sampled once at the start of the call: edits made
    /// between calls take effect here, edits made during a call are not
    /// observed until the next one.
    ///
    /// # Errors
    /// [`TrackerError::Config`] when a sampled configuration value is
    /// unusable; per-measurement problems are reported through
    /// [`TickOutput::failures`] instead and do not abort the batch.
    pub fn update_and_predict(
        &mut self,
        measurements: &[Measurement],
    ) -> Result<TickOutput, TrackerError> {
        self.resample_transition()?;
        let noise = self.sample_noise()?;

        let mut output = TickOutput {
            estimates: Vec::with_capacity(measurements.len()),
            failures: Vec::new(),
        };
        for measurement in measurements {
            match self.step(measurement, &noise) {
                Ok(estimate) => output.estimates.push(estimate),
                Err(error) => {
                    warn!(id = %measurement.id, %error, "skipping measurement this tick");
                    output.failures.push(TrackFailure {
                        id: measurement.id,
                        error,
                    });
                }
            }
        }
        Ok(output)
    }

    /// Attach the display sink; the current F is published immediately so
    /// the display never starts stale.
    pub fn set_transition_sink(&mut self, sink: impl TransitionSink + 'static) {
        let mut sink = Box::new(sink);
        sink.publish(&self.transition);
        self.sink = Some(sink);
    }

    /// The state-transition matrix currently in effect.
    pub fn transition(&self) -> &Matrix {
        &self.transition
    }

    pub fn is_tracked(&self, id: TrackId) -> bool {
        self.tracks.contains_key(&id)
    }

    /// Number of active tracks.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Base tick length fixed at construction.
    pub fn base_dt(&self) -> f64 {
        self.base_dt
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    /// Recompute F from the sampled multiplier; republish when it changed.
    /// The comparison is strict: any numeric drift counts as a change.
    fn resample_transition(&mut self) -> Result<(), TrackerError> {
        let multiplier = self.config.sensor_interval_multiplier;
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(TrackerError::Config(format!(
                "sensor interval multiplier must be a positive real, got {multiplier}"
            )));
        }

        let transition = kf::transition_matrix(multiplier * self.base_dt)?;
        if transition != self.transition {
            self.transition_t = transition.transpose();
            self.transition = transition;
            if let Some(sink) = self.sink.as_mut() {
                sink.publish(&self.transition);
            }
        }
        Ok(())
    }

    fn sample_noise(&self) -> Result<Matrix, TrackerError> {
        let noise = &self.config.measurement_noise;
        if noise.shape() != (2, 2) {
            return Err(TrackerError::Config(format!(
                "measurement noise must be 2x2, got {:?}",
                noise.shape()
            )));
        }
        Ok(noise.clone())
    }

    fn sample_initial(&self) -> Result<TrackState, TrackerError> {
        let state = &self.config.initial_state;
        if state.shape() != (6, 1) {
            return Err(TrackerError::Config(format!(
                "initial state must be 6x1, got {:?}",
                state.shape()
            )));
        }
        let cov = &self.config.initial_covariance;
        if cov.shape() != (6, 6) {
            return Err(TrackerError::Config(format!(
                "initial covariance must be 6x6, got {:?}",
                cov.shape()
            )));
        }
        Ok(TrackState {
            state: state.clone(),
            cov: cov.clone(),
        })
    }

    /// One predict+update cycle for one measurement. The posterior is only
    /// committed when every step succeeds.
    fn step(
        &mut self,
        measurement: &Measurement,
        noise: &Matrix,
    ) -> Result<TrackEstimate, TrackerError> {
        let slot = self
            .tracks
            .get(&measurement.id)
            .ok_or(TrackerError::UnknownTrack(measurement.id))?;

        let (state, cov) = kf::predict(
            &slot.state,
            &slot.cov,
            &self.transition,
            &self.transition_t,
            &self.control,
        )?;
        let z = Matrix::from_rows(&[[measurement.x], [measurement.y]])?;
        let updated = kf::update(
            &state,
            &cov,
            &z,
            &self.observation,
            &self.observation_t,
            noise,
            &self.identity,
        )?;

        let estimate = TrackEstimate {
            id: measurement.id,
            x: updated.state.get(0, 0)?,
            y: updated.state.get(1, 0)?,
            var_x: updated.cov.get(0, 0)?,
            var_y: updated.cov.get(1, 1)?,
        };
        self.tracks.insert(
            measurement.id,
            TrackState {
                state: updated.state,
                cov: updated.cov,
            },
        );
        Ok(estimate)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use matrix_core::MatrixError;
    use std::cell::RefCell;
    use std::rc::Rc;

    const BASE_DT: f64 = 1.0 / 60.0;

    fn tracker() -> KalmanTracker {
        KalmanTracker::new(BASE_DT, TrackerConfig::default()).unwrap()
    }

    fn meas(id: u64, x: f64, y: f64) -> Measurement {
        Measurement {
            id: TrackId(id),
            x,
            y,
        }
    }

    #[test]
    fn lifecycle_start_and_stop() {
        let mut t = tracker();
        t.start_tracking(&[TrackId(1), TrackId(2)]).unwrap();
        assert_eq!(t.track_count(), 2);
        assert!(t.is_tracked(TrackId(1)));

        t.stop_tracking(&[TrackId(1)]);
        assert_eq!(t.track_count(), 1);
        assert!(!t.is_tracked(TrackId(1)));

        // Unknown ids are a no-op.
        t.stop_tracking(&[TrackId(42)]);
        assert_eq!(t.track_count(), 1);
    }

    #[test]
    fn invalid_base_dt_rejected() {
        assert!(matches!(
            KalmanTracker::new(0.0, TrackerConfig::default()),
            Err(TrackerError::Config(_))
        ));
        assert!(matches!(
            KalmanTracker::new(f64::NAN, TrackerConfig::default()),
            Err(TrackerError::Config(_))
        ));
    }

    #[test]
    fn unknown_id_is_reported_not_resurrected() {
        let mut t = tracker();
        let out = t.update_and_predict(&[meas(9, 1.0, 1.0)]).unwrap();
        assert!(out.estimates.is_empty());
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].id, TrackId(9));
        assert_eq!(out.failures[0].error, TrackerError::UnknownTrack(TrackId(9)));
        assert!(!t.is_tracked(TrackId(9)));
    }

    #[test]
    fn failures_do_not_block_the_rest_of_the_batch() {
        let mut t = tracker();
        t.start_tracking(&[TrackId(1), TrackId(3)]).unwrap();

        let out = t
            .update_and_predict(&[meas(1, 5.0, 5.0), meas(2, 0.0, 0.0), meas(3, -5.0, -5.0)])
            .unwrap();

        let ids: Vec<TrackId> = out.estimates.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![TrackId(1), TrackId(3)]);
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].id, TrackId(2));
    }

    #[test]
    fn singular_innovation_skips_the_track_and_keeps_going() {
        let config = TrackerConfig {
            measurement_noise: Matrix::zeros(2, 2),
            initial_covariance: Matrix::zeros(6, 6),
            ..Default::default()
        };
        let mut t = KalmanTracker::new(BASE_DT, config).unwrap();
        t.start_tracking(&[TrackId(1), TrackId(2)]).unwrap();

        let out = t
            .update_and_predict(&[meas(1, 1.0, 1.0), meas(2, 2.0, 2.0)])
            .unwrap();
        assert!(out.estimates.is_empty());
        assert_eq!(out.failures.len(), 2);
        for failure in &out.failures {
            assert_eq!(failure.error, TrackerError::Matrix(MatrixError::Singular));
        }
        // Both tracks survive with their stored state untouched.
        assert!(t.is_tracked(TrackId(1)));
        assert!(t.is_tracked(TrackId(2)));
    }

    #[test]
    fn restart_discards_accumulated_state() {
        let mut t = tracker();
        t.start_tracking(&[TrackId(1)]).unwrap();

        let first = t.update_and_predict(&[meas(1, 5.0, 5.0)]).unwrap().estimates[0];
        t.update_and_predict(&[meas(1, 5.0, 5.0)]).unwrap();

        // Re-arm: the next tick behaves exactly like a first tick again.
        t.start_tracking(&[TrackId(1)]).unwrap();
        let rearmed = t.update_and_predict(&[meas(1, 5.0, 5.0)]).unwrap().estimates[0];

        assert_abs_diff_eq!(rearmed.x, first.x, epsilon = 1e-12);
        assert_abs_diff_eq!(rearmed.var_x, first.var_x, epsilon = 1e-9);
    }

    #[test]
    fn repeated_measurements_in_one_batch_thread_the_state() {
        let mut t = tracker();
        t.start_tracking(&[TrackId(1)]).unwrap();

        let out = t
            .update_and_predict(&[meas(1, 5.0, 5.0), meas(1, 5.0, 5.0)])
            .unwrap();
        assert_eq!(out.estimates.len(), 2);
        // The second cycle starts from the first one's posterior.
        assert!(out.estimates[1].var_x < out.estimates[0].var_x);
    }

    #[test]
    fn transition_republished_only_on_change() {
        let published: Rc<RefCell<Vec<Matrix>>> = Rc::new(RefCell::new(Vec::new()));
        let handle = Rc::clone(&published);

        let mut t = tracker();
        t.start_tracking(&[TrackId(1)]).unwrap();
        t.set_transition_sink(move |f: &Matrix| handle.borrow_mut().push(f.clone()));
        assert_eq!(published.borrow().len(), 1, "sink primed on attach");

        // Unchanged multiplier: no republication.
        t.update_and_predict(&[meas(1, 0.0, 0.0)]).unwrap();
        assert_eq!(published.borrow().len(), 1);

        // Changed multiplier: F is rebuilt and pushed once.
        t.config.sensor_interval_multiplier = 10.0;
        t.update_and_predict(&[meas(1, 0.0, 0.0)]).unwrap();
        assert_eq!(published.borrow().len(), 2);
        let velocity_term = published.borrow()[1].get(0, 2).unwrap();
        assert_abs_diff_eq!(velocity_term, 10.0 * BASE_DT, epsilon = 1e-15);

        // And again unchanged.
        t.update_and_predict(&[meas(1, 0.0, 0.0)]).unwrap();
        assert_eq!(published.borrow().len(), 2);
    }

    #[test]
    fn bad_multiplier_fails_the_whole_tick() {
        let mut t = tracker();
        t.start_tracking(&[TrackId(1)]).unwrap();
        t.config.sensor_interval_multiplier = -1.0;
        assert!(matches!(
            t.update_and_predict(&[meas(1, 0.0, 0.0)]),
            Err(TrackerError::Config(_))
        ));
    }

    #[test]
    fn reshaped_noise_matrix_fails_the_whole_tick() {
        let mut t = tracker();
        t.start_tracking(&[TrackId(1)]).unwrap();
        t.config.measurement_noise = Matrix::identity(3);
        assert!(matches!(
            t.update_and_predict(&[meas(1, 0.0, 0.0)]),
            Err(TrackerError::Config(_))
        ));
    }

    #[test]
    fn non_finite_measurement_is_a_per_track_failure() {
        let mut t = tracker();
        t.start_tracking(&[TrackId(1), TrackId(2)]).unwrap();
        let out = t
            .update_and_predict(&[meas(1, f64::NAN, 0.0), meas(2, 1.0, 1.0)])
            .unwrap();
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].id, TrackId(1));
        assert_eq!(out.estimates.len(), 1);
    }
}

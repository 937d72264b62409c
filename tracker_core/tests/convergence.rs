//! End-to-end filter behavior through the public tracker surface.

use matrix_core::Matrix;
use tracker_core::{KalmanTracker, Measurement, TrackerConfig, TrackerError, TrackId};

const BASE_DT: f64 = 1.0 / 60.0;

fn meas(id: u64, x: f64, y: f64) -> Measurement {
    Measurement {
        id: TrackId(id),
        x,
        y,
    }
}

/// With a near-uninformative prior and modest measurement noise, the first
/// update lands almost on the measurement.
#[test]
fn vague_prior_trusts_the_measurement() {
    let config = TrackerConfig {
        sensor_interval_multiplier: 10.0,
        ..Default::default()
    };
    let mut tracker = KalmanTracker::new(BASE_DT, config).unwrap();
    tracker.start_tracking(&[TrackId(1)]).unwrap();

    let out = tracker.update_and_predict(&[meas(1, 5.0, 5.0)]).unwrap();
    let est = out.estimates[0];
    assert!((est.x - 5.0).abs() < 1.0, "x = {}", est.x);
    assert!((est.y - 5.0).abs() < 1.0, "y = {}", est.y);
    // The posterior position variance collapses towards the noise floor.
    assert!(est.var_x < 9999.0);
    assert!(est.var_y < 9999.0);
}

/// With measurement noise vastly above the prior covariance, the estimate
/// stays at the prior instead of jumping to the measurement.
#[test]
fn distrusted_measurement_barely_moves_the_prior() {
    let config = TrackerConfig {
        sensor_interval_multiplier: 10.0,
        measurement_noise: Matrix::identity(2).scale(1e9),
        ..Default::default()
    };
    let mut tracker = KalmanTracker::new(BASE_DT, config).unwrap();
    tracker.start_tracking(&[TrackId(1)]).unwrap();

    let out = tracker.update_and_predict(&[meas(1, 5.0, 5.0)]).unwrap();
    let est = out.estimates[0];
    assert!(est.x.abs() < 1.0, "x = {}", est.x);
    assert!(est.y.abs() < 1.0, "y = {}", est.y);
}

/// A steady measurement stream pulls the estimate onto the target and keeps
/// it there.
#[test]
fn steady_stream_converges_on_the_target() {
    let config = TrackerConfig {
        sensor_interval_multiplier: 10.0,
        ..Default::default()
    };
    let mut tracker = KalmanTracker::new(BASE_DT, config).unwrap();
    tracker.start_tracking(&[TrackId(1)]).unwrap();

    let mut last = None;
    for _ in 0..30 {
        let out = tracker.update_and_predict(&[meas(1, 5.0, 5.0)]).unwrap();
        assert!(out.failures.is_empty());
        last = Some(out.estimates[0]);
    }
    let est = last.unwrap();
    assert!((est.x - 5.0).abs() < 0.5, "x = {}", est.x);
    assert!((est.y - 5.0).abs() < 0.5, "y = {}", est.y);
}

/// Stopping a track makes later measurements for it explicit failures; the
/// state is gone, not resurrected.
#[test]
fn stopped_track_fails_explicitly() {
    let mut tracker = KalmanTracker::new(BASE_DT, TrackerConfig::default()).unwrap();
    tracker.start_tracking(&[TrackId(1)]).unwrap();
    tracker.update_and_predict(&[meas(1, 5.0, 5.0)]).unwrap();

    tracker.stop_tracking(&[TrackId(1)]);
    let out = tracker.update_and_predict(&[meas(1, 5.0, 5.0)]).unwrap();
    assert!(out.estimates.is_empty());
    assert_eq!(out.failures[0].error, TrackerError::UnknownTrack(TrackId(1)));
    assert!(!tracker.is_tracked(TrackId(1)));
}

/// Noise edits between ticks latch at the next call: after the first update
/// the gain can be throttled to near zero by inflating R in place.
#[test]
fn noise_edits_latch_on_the_next_tick() {
    let config = TrackerConfig {
        sensor_interval_multiplier: 10.0,
        ..Default::default()
    };
    let mut tracker = KalmanTracker::new(BASE_DT, config).unwrap();
    tracker.start_tracking(&[TrackId(1)]).unwrap();

    let first = tracker.update_and_predict(&[meas(1, 5.0, 5.0)]).unwrap().estimates[0];
    assert!((first.x - 5.0).abs() < 1.0);

    // In-place cell edits through the bounds-checked accessor.
    tracker.config.measurement_noise.set(0, 0, 1e9).unwrap();
    tracker.config.measurement_noise.set(1, 1, 1e9).unwrap();

    let second = tracker.update_and_predict(&[meas(1, 100.0, 100.0)]).unwrap().estimates[0];
    assert!(
        (second.x - first.x).abs() < 1.0,
        "estimate jumped to the distrusted measurement: {} -> {}",
        first.x,
        second.x
    );
    assert!((second.x - 100.0).abs() > 50.0);
}

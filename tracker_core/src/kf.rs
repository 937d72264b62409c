//! Kalman filter: predict and update steps.
//!
//! # Design choices
//! - Linear KF with a constant-acceleration (CA) motion model; all math is
//!   `f64` through [`matrix_core`].
//! - The steps are free functions over borrowed state so the tracker can
//!   thread one track's `(x, P)` through a cycle without copies.
//! - No process-noise term: the prediction covariance is exactly
//!   `F·P·Fᵀ`, and the filter relies on the measurement stream to keep the
//!   gain alive.
//!
//! ## State vector
//! x = [px, py, vx, vy, ax, ay]ᵀ  (6-dimensional)
//!
//! ## CA transition model
//! px += vx·dt + ax·dt²/2, vx += ax·dt (same for y), accelerations carry
//! over unchanged.

use matrix_core::{Matrix, MatrixError};

/// Build the 6x6 state transition matrix F for timestep `dt`.
pub fn transition_matrix(dt: f64) -> Result<Matrix, MatrixError> {
    let half_dt2 = dt * dt / 2.0;
    Matrix::from_rows(&[
        [1.0, 0.0, dt, 0.0, half_dt2, 0.0],
        [0.0, 1.0, 0.0, dt, 0.0, half_dt2],
        [0.0, 0.0, 1.0, 0.0, dt, 0.0],
        [0.0, 0.0, 0.0, 1.0, 0.0, dt],
        [0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
    ])
}

/// Build the fixed 2x6 observation matrix H selecting position from state.
pub fn position_observation() -> Result<Matrix, MatrixError> {
    Matrix::from_rows(&[
        [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
    ])
}

/// Result of a KF update step, exposed for diagnostics.
#[derive(Clone, Debug)]
pub struct KfUpdate {
    pub state: Matrix,
    pub cov: Matrix,
    /// Innovation y = z − H·x
    pub innovation: Matrix,
    /// Innovation covariance S = H·P·Hᵀ + R
    pub innovation_cov: Matrix,
    /// Kalman gain K
    pub gain: Matrix,
}

/// Predict state and covariance forward one tick:
/// `x′ = F·x + U`, `P′ = F·(P·Fᵀ)`.
pub fn predict(
    state: &Matrix,
    cov: &Matrix,
    transition: &Matrix,
    transition_t: &Matrix,
    control: &Matrix,
) -> Result<(Matrix, Matrix), MatrixError> {
    let state = transition.matmul(state)?.add(control)?;
    let cov = transition.matmul(&cov.matmul(transition_t)?)?;
    Ok((state, cov))
}

/// Correct a predicted `(x′, P′)` with the observation `z`.
///
/// # Errors
/// Propagates [`MatrixError::Singular`] when the innovation covariance
/// cannot be inverted; the caller decides how to isolate the failure.
pub fn update(
    state: &Matrix,
    cov: &Matrix,
    z: &Matrix,
    observation: &Matrix,
    observation_t: &Matrix,
    noise: &Matrix,
    identity: &Matrix,
) -> Result<KfUpdate, MatrixError> {
    // Innovation: y = z − H·x
    let innovation = z.sub(&observation.matmul(state)?)?;

    // Innovation covariance: S = H·P·Hᵀ + R
    let innovation_cov = observation
        .matmul(&cov.matmul(observation_t)?)?
        .add(noise)?;

    // Kalman gain: K = P·Hᵀ·S⁻¹
    let gain = cov.matmul(&observation_t.matmul(&innovation_cov.try_inverse()?)?)?;

    // Posterior: x″ = x′ + K·y,  P″ = (I − K·H)·P′
    let new_state = state.add(&gain.matmul(&innovation)?)?;
    let new_cov = identity.sub(&gain.matmul(observation)?)?.matmul(cov)?;

    Ok(KfUpdate {
        state: new_state,
        cov: new_cov,
        innovation,
        innovation_cov,
        gain,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

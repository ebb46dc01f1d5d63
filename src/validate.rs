//! Input validation for the probability entry points.
//!
//! The engine follows a validate-then-sentinel policy: every public entry
//! point runs these checks before any numerical work, and on failure logs the
//! rejection once and returns NaN instead of aborting. That keeps a bad input
//! inside a batch or simulation loop from taking the whole run down.

use ndarray::{ArrayView1, ArrayView2};
use thiserror::Error;

use crate::lattice::MAX_DIM;
use crate::linalg;

/// Why a parameter set was rejected. Each variant is a distinct,
/// user-reportable condition, not a crash.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("covariance matrix is not symmetric")]
    NotSymmetric,

    #[error(
        "dimension mismatch: b has length {b_len}, Sigma is {sigma_rows}x{sigma_cols}, mu has length {mu_len}"
    )]
    DimensionMismatch {
        b_len: usize,
        sigma_rows: usize,
        sigma_cols: usize,
        mu_len: usize,
    },

    #[error("input contains a missing or non-finite value")]
    NonFinite,

    #[error("covariance matrix is not positive definite")]
    NotPositiveDefinite,

    #[error("dimension {0} is outside the supported range 1..=32")]
    UnsupportedDimension(usize),

    #[error("the trivariate entry point requires dimension 3, got {0}")]
    NotTrivariate(usize),
}

/// True iff `m` is square and symmetric up to `max|m| * sqrt(machine eps)`.
pub fn is_symmetric(m: &ArrayView2<f64>) -> bool {
    let n = m.nrows();
    if n != m.ncols() {
        return false;
    }
    let scale = m.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()));
    let tol = scale * f64::EPSILON.sqrt();
    for i in 0..n {
        for j in 0..i {
            if (m[[i, j]] - m[[j, i]]).abs() > tol {
                return false;
            }
        }
    }
    true
}

/// True iff `m` is symmetric and numerically positive definite.
///
/// The probe factors `m + ridge*I` with the same relative ridge the
/// quadrature engine applies, so rank-deficient but PSD limits (a perfectly
/// correlated pair, the all-ones matrix) pass here exactly when the engine
/// can handle them.
pub fn is_positive_definite(m: &ArrayView2<f64>) -> bool {
    if !is_symmetric(m) {
        return false;
    }
    let n = m.nrows();
    let scale = (0..n).fold(0.0_f64, |acc, i| acc.max(m[[i, i]].abs()));
    let mut ridged = m.to_owned();
    for i in 0..n {
        ridged[[i, i]] += 1e-12 * scale;
    }
    linalg::llt_succeeds(&ridged.view())
}

/// Checks `b`, `Sigma`, `mu` for the general MVN entry point.
pub fn validate_cdf_params(
    b: &ArrayView1<f64>,
    sigma: &ArrayView2<f64>,
    mu: Option<&ArrayView1<f64>>,
) -> Result<(), ParamError> {
    if !is_symmetric(sigma) {
        return Err(ParamError::NotSymmetric);
    }
    let q = b.len();
    let mu_len = mu.map_or(q, |m| m.len());
    if sigma.nrows() != q || mu_len != q {
        return Err(ParamError::DimensionMismatch {
            b_len: q,
            sigma_rows: sigma.nrows(),
            sigma_cols: sigma.ncols(),
            mu_len,
        });
    }
    if q == 0 || q > MAX_DIM {
        return Err(ParamError::UnsupportedDimension(q));
    }
    let finite = b.iter().all(|v| v.is_finite())
        && sigma.iter().all(|v| v.is_finite())
        && mu.map_or(true, |m| m.iter().all(|v| v.is_finite()));
    if !finite {
        return Err(ParamError::NonFinite);
    }
    if !is_positive_definite(sigma) {
        return Err(ParamError::NotPositiveDefinite);
    }
    Ok(())
}

/// Checks for the trivariate entry point: dimension must be exactly 3.
pub fn validate_tvn_params(
    b: &ArrayView1<f64>,
    sigma: &ArrayView2<f64>,
    mu: Option<&ArrayView1<f64>>,
) -> Result<(), ParamError> {
    if b.len() != 3 {
        return Err(ParamError::NotTrivariate(b.len()));
    }
    validate_cdf_params(b, sigma, mu)
}

//! Trivariate normal rectangle probability by Plackett's identity.
//!
//! The probability is written as an anchor term, the largest correlation
//! handled exactly through the bivariate CDF, plus two single integrals that
//! carry the remaining correlations in from zero (Genz's TVTL formulation).
//! Both correlations are scaled simultaneously along the path; moving them in
//! one at a time can leave the positive-definite region even when the
//! endpoints are valid.

use ndarray::{ArrayView1, ArrayView2};
use std::f64::consts::PI;

use crate::bivariate::bivariate_normal_cdf;
use crate::probability::normal_cdf;
use crate::validate::{self, ParamError};

/// Bounds beyond this many standard deviations are clipped; the CDF is flat
/// to well below double precision out there.
const BOUND_CLIP: f64 = 10.0;

const SIMPSON_INTERVALS: usize = 256;

/// `P(X1 < b1, X2 < b2, X3 < b3)` for `X ~ N(mu, Sigma)` with `Sigma` 3x3.
///
/// Deterministic closed-form path: no lattice, no RNG, accuracy near full
/// double precision. Returns NaN after logging one diagnostic if the inputs
/// fail validation.
pub fn cdf_tvn(b: ArrayView1<f64>, sigma: ArrayView2<f64>, mu: Option<ArrayView1<f64>>) -> f64 {
    match tvn_impl(&b, &sigma, mu.as_ref()) {
        Ok(p) => p,
        Err(err) => {
            log::error!("trivariate normal probability rejected: {err}");
            f64::NAN
        }
    }
}

fn tvn_impl(
    b: &ArrayView1<f64>,
    sigma: &ArrayView2<f64>,
    mu: Option<&ArrayView1<f64>>,
) -> Result<f64, ParamError> {
    validate::validate_tvn_params(b, sigma, mu)?;

    let sd: Vec<f64> = (0..3).map(|i| sigma[[i, i]].sqrt()).collect();
    let mut h = [0.0_f64; 3];
    for i in 0..3 {
        let center = mu.map_or(0.0, |m| m[i]);
        h[i] = ((b[i] - center) / sd[i]).clamp(-BOUND_CLIP, BOUND_CLIP);
    }
    let r21 = sigma[[1, 0]] / (sd[1] * sd[0]);
    let r31 = sigma[[2, 0]] / (sd[2] * sd[0]);
    let r32 = sigma[[2, 1]] / (sd[2] * sd[1]);

    Ok(tvn_standardized(h, r21, r31, r32))
}

/// Standardized trivariate probability. Permutes the variables so the largest
/// correlation in magnitude lands in the closed bivariate term, which keeps
/// the two path integrals short and well conditioned.
fn tvn_standardized(h: [f64; 3], r21: f64, r31: f64, r32: f64) -> f64 {
    let (h, r21, r31, r32) = if r21.abs() >= r31.abs() && r21.abs() >= r32.abs() {
        ([h[2], h[0], h[1]], r31, r32, r21)
    } else if r31.abs() >= r32.abs() {
        ([h[1], h[0], h[2]], r21, r32, r31)
    } else {
        (h, r21, r31, r32)
    };

    let p1 = normal_cdf(h[0]) * bivariate_normal_cdf(h[1], h[2], r32);

    let a21 = r21.asin();
    let a31 = r31.asin();

    let mut path = 0.0;
    if a21 != 0.0 {
        path += simpson(
            |theta| tvn_integrand(theta, a21, a31, h[0], h[1], h[2], r32),
            0.0,
            a21,
        );
    }
    if a31 != 0.0 {
        path += simpson(
            |theta| tvn_integrand(theta, a31, a21, h[0], h[2], h[1], r32),
            0.0,
            a31,
        );
    }

    (p1 + path / (2.0 * PI)).clamp(0.0, 1.0)
}

/// Plackett path derivative for one leg, after the `rho = sin(theta)`
/// substitution has cancelled the `1/sqrt(1 - rho^2)` density factor.
///
/// `a_this` is the angle for the correlation being integrated (between the
/// pivot and `hj`), `a_other` the angle for the companion correlation
/// (pivot and `hk`), which is scaled along the same path fraction.
fn tvn_integrand(
    theta: f64,
    a_this: f64,
    a_other: f64,
    h1: f64,
    hj: f64,
    hk: f64,
    r32: f64,
) -> f64 {
    let rho = theta.sin();
    let cos_sq = 1.0 - rho * rho;
    if cos_sq < 1e-14 {
        return 0.0;
    }
    let rho_other = (a_other * theta / a_this).sin();

    // Determinant of the 3x3 correlation matrix at this point of the path;
    // non-positive values only occur at a singular endpoint.
    let delta = 1.0 - rho * rho - rho_other * rho_other - r32 * r32
        + 2.0 * rho * rho_other * r32;
    if delta <= 1e-14 {
        return 0.0;
    }

    let num = hk * cos_sq - h1 * (rho_other - rho * r32) - hj * (r32 - rho * rho_other);
    let den = (cos_sq * delta).sqrt();
    let expo = -(h1 * h1 + hj * hj - 2.0 * h1 * hj * rho) / (2.0 * cos_sq);
    if expo < -100.0 {
        return 0.0;
    }
    expo.exp() * normal_cdf(num / den)
}

/// Composite Simpson rule. `hi < lo` yields the correctly signed integral
/// through the negative step.
fn simpson<F: Fn(f64) -> f64>(f: F, lo: f64, hi: f64) -> f64 {
    if lo == hi {
        return 0.0;
    }
    let n = SIMPSON_INTERVALS;
    let step = (hi - lo) / n as f64;
    let mut sum = f(lo) + f(hi);
    for i in 1..n {
        let x = lo + step * i as f64;
        sum += if i % 2 == 1 { 4.0 * f(x) } else { 2.0 * f(x) };
    }
    sum * step / 3.0
}

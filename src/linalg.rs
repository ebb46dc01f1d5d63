//! Small dense linear-algebra helpers shared by the probability engines.

use faer::linalg::solvers::Llt as FaerLlt;
use faer::{Mat, Side};
use ndarray::{Array2, ArrayView2};

/// Lower-triangular Cholesky factor of a symmetric positive-definite matrix.
///
/// Failure (a non-positive or non-finite pivot) is reported as `None` rather
/// than a panic, so callers can translate it into their own error taxonomy.
pub fn cholesky_lower(m: &ArrayView2<f64>) -> Option<Array2<f64>> {
    let n = m.nrows();
    debug_assert_eq!(n, m.ncols());
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut s = m[[i, j]];
            for k in 0..j {
                s -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if !(s > 0.0) || !s.is_finite() {
                    return None;
                }
                l[[i, j]] = s.sqrt();
            } else {
                l[[i, j]] = s / l[[j, j]];
            }
        }
    }
    Some(l)
}

/// Positive-definiteness probe through faer's LLT factorization; an `Err`
/// from the solver simply means "not numerically SPD".
pub fn llt_succeeds(m: &ArrayView2<f64>) -> bool {
    let n = m.nrows();
    if n != m.ncols() {
        return false;
    }
    let fm = Mat::from_fn(n, n, |i, j| m[[i, j]]);
    FaerLlt::new(fm.as_ref(), Side::Lower).is_ok()
}

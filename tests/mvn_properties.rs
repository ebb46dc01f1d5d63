//! Distributional identities for the lattice-rule MVN engine, checked against
//! closed forms. Tolerances sit well above the requested 3e-4 confidence
//! half-width so the seeded runs stay comfortably inside them.

use approx::assert_abs_diff_eq;
use mvncdf::{cdf_mvn_with_error, cdf_mvn_with_rng, normal_cdf, MvnOptions};
use ndarray::{array, Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn equicorrelated(q: usize, rho: f64) -> Array2<f64> {
    Array2::from_shape_fn((q, q), |(i, j)| if i == j { 1.0 } else { rho })
}

#[test]
fn independent_coordinates_factorize() {
    let b = array![0.0, -1.0, -2.0, 3.0];
    let sigma = Array2::<f64>::eye(4);
    let expected: f64 = b.iter().map(|&v| normal_cdf(v)).product();
    let mut rng = StdRng::seed_from_u64(42);
    let p = cdf_mvn_with_rng(b.view(), sigma.view(), None, &MvnOptions::default(), &mut rng);
    assert_abs_diff_eq!(p, expected, epsilon = 1e-3);
}

#[test]
fn block_diagonal_splits_into_factors() {
    // A correlated 2x2 block and an independent third coordinate.
    let rho = 0.5;
    let sigma = array![[1.0, rho, 0.0], [rho, 1.0, 0.0], [0.0, 0.0, 1.0]];
    let b = array![0.5, 0.8, 0.4];
    let expected = mvncdf::bivariate_normal_cdf(0.5, 0.8, rho) * normal_cdf(0.4);
    let mut rng = StdRng::seed_from_u64(7);
    let p = cdf_mvn_with_rng(b.view(), sigma.view(), None, &MvnOptions::default(), &mut rng);
    assert_abs_diff_eq!(p, expected, epsilon = 1e-3);
}

#[test]
fn equicorrelated_half_orthant_is_one_over_q_plus_one() {
    // For rho = 1/2 and b = 0 the orthant probability is exactly 1/(q+1).
    for (q, seed) in [(5usize, 1u64), (9, 2), (12, 3), (15, 4)] {
        let b = Array1::<f64>::zeros(q);
        let sigma = equicorrelated(q, 0.5);
        let mut rng = StdRng::seed_from_u64(seed);
        let p = cdf_mvn_with_rng(b.view(), sigma.view(), None, &MvnOptions::default(), &mut rng);
        assert_abs_diff_eq!(p, 1.0 / (q as f64 + 1.0), epsilon = 1.5e-3);
    }
}

#[test]
fn perfectly_correlated_limit_is_min_bound() {
    // The all-ones matrix concentrates mass on the diagonal x1 = ... = xq.
    let b = array![0.9, -0.4, 1.6, 0.2];
    let sigma = Array2::<f64>::ones((4, 4));
    let mut rng = StdRng::seed_from_u64(13);
    let p = cdf_mvn_with_rng(b.view(), sigma.view(), None, &MvnOptions::default(), &mut rng);
    assert_abs_diff_eq!(p, normal_cdf(-0.4), epsilon = 1e-3);
}

#[test]
fn trivariate_orthant_arcsine_formula() {
    let b = Array1::<f64>::zeros(3);
    let (r21, r31, r32): (f64, f64, f64) = (0.3, -0.2, 0.45);
    let sigma = array![[1.0, r21, r31], [r21, 1.0, r32], [r31, r32, 1.0]];
    let expected = 0.125
        + (r21.asin() + r31.asin() + r32.asin()) / (4.0 * std::f64::consts::PI);
    let mut rng = StdRng::seed_from_u64(21);
    let p = cdf_mvn_with_rng(b.view(), sigma.view(), None, &MvnOptions::default(), &mut rng);
    assert_abs_diff_eq!(p, expected, epsilon = 1e-3);
}

#[test]
fn monotone_in_each_upper_bound() {
    // Raising any single component of b, the others held fixed, cannot
    // shrink the probability.
    let sigma = array![[1.0, 0.6, 0.3], [0.6, 1.0, 0.4], [0.3, 0.4, 1.0]];
    let opts = MvnOptions::default();
    let base = array![0.1, -0.2, 0.5];
    for axis in 0..3 {
        let mut prev = 0.0;
        for bump in [-1.0, -0.3, 0.4, 1.2] {
            let mut b = base.clone();
            b[axis] += bump;
            let mut rng = StdRng::seed_from_u64(31);
            let p = cdf_mvn_with_rng(b.view(), sigma.view(), None, &opts, &mut rng);
            // Slack covers the independent Monte Carlo errors of the two runs.
            assert!(
                p > prev - 1e-3,
                "axis {axis}: probability fell from {prev} to {p}"
            );
            prev = p;
        }
    }
}

#[test]
fn seeded_runs_are_bit_identical() {
    let sigma = array![[1.0, 0.6, 0.3], [0.6, 1.0, 0.4], [0.3, 0.4, 1.0]];
    let b = array![0.5, 0.0, -0.5];
    let opts = MvnOptions::default();

    let mut rng = StdRng::seed_from_u64(555);
    let p1 = cdf_mvn_with_rng(b.view(), sigma.view(), None, &opts, &mut rng);
    let mut rng = StdRng::seed_from_u64(555);
    let p2 = cdf_mvn_with_rng(b.view(), sigma.view(), None, &opts, &mut rng);
    assert_eq!(p1.to_bits(), p2.to_bits());
}

#[test]
fn error_bound_meets_requested_eps() {
    let sigma = equicorrelated(8, 0.4);
    let b = Array1::<f64>::zeros(8);
    let opts = MvnOptions::default();
    let mut rng = StdRng::seed_from_u64(77);
    let (p, err) = cdf_mvn_with_error(b.view(), sigma.view(), None, &opts, &mut rng);
    assert!((0.0..=1.0).contains(&p));
    assert!(err < opts.eps, "reported error {err} above eps {}", opts.eps);
}

#[test]
fn loose_eps_converges_on_first_pass() {
    // With a generous target the smallest rule already satisfies it.
    let sigma = equicorrelated(4, 0.3);
    let b = Array1::<f64>::zeros(4);
    let opts = MvnOptions {
        eps: 1e-2,
        ..MvnOptions::default()
    };
    let mut rng = StdRng::seed_from_u64(3);
    let (p, err) = cdf_mvn_with_error(b.view(), sigma.view(), None, &opts, &mut rng);
    assert!(err < 1e-2);
    assert!((0.0..=1.0).contains(&p));
}

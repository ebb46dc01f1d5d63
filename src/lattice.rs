//! Randomized Korobov lattice rule for the transformed MVN integrand.
//!
//! The orthant probability is reduced (Genz 1992) to an integral over the
//! unit cube of dimension q-1 by a sequence of conditional univariate normal
//! CDF evaluations through the Cholesky factor of the correlation matrix.
//! That integral is estimated with a rank-1 lattice `{j*z/p mod 1}` under
//! independent random shifts; the shifts make the estimate unbiased and give
//! an honest variance, while the lattice supplies the fast deterministic
//! convergence. Baker's folding transform `w = |2t - 1|` periodizes the
//! integrand; without it the rule degrades to plain-Monte-Carlo rates.

use ndarray::Array2;
use rand::Rng;

use crate::probability::{normal_cdf, normal_quantile};

/// Largest supported dimension; bounded by the generator table.
pub const MAX_DIM: usize = 32;

/// Lattice sizes, escalated in order by the adaptive driver.
pub const PRIMES: [u32; 8] = [157, 313, 619, 1249, 2503, 5003, 10007, 20011];

/// Quantile arguments are clamped this far away from 0 and 1.
const TAIL_CLAMP: f64 = 1e-15;

/// Korobov multipliers `h`, rows indexed by `q - 1` for `q = 2..=32`, columns
/// by the entry of [`PRIMES`]. The generator vector for a rule is
/// `z[k] = h^(k+1) mod p`. The table is a compatibility constant: it selects
/// which deterministic lattice gets sampled, so it must not be edited.
const GENERATORS: [[u32; 8]; 31] = [
    [45, 4, 241, 526, 84, 893, 5358, 4556],
    [111, 119, 360, 705, 1954, 3163, 5869, 7307],
    [32, 48, 149, 477, 809, 1371, 5461, 4556],
    [77, 251, 535, 667, 2418, 2363, 5347, 7050],
    [119, 158, 576, 436, 1458, 1576, 3827, 14039],
    [38, 271, 360, 152, 416, 3939, 5869, 16187],
    [79, 253, 241, 152, 508, 1576, 9742, 8613],
    [119, 311, 286, 152, 948, 4596, 2245, 10940],
    [119, 311, 217, 25, 1486, 1371, 9061, 8097],
    [119, 275, 286, 25, 511, 2312, 7454, 15102],
    [112, 110, 286, 25, 511, 2312, 7041, 8362],
    [119, 271, 286, 25, 566, 2671, 7041, 16644],
    [119, 253, 217, 25, 566, 2671, 7041, 10528],
    [119, 275, 217, 25, 566, 2671, 7041, 10528],
    [119, 253, 360, 312, 566, 3778, 9061, 10528],
    [22, 253, 360, 25, 2340, 3062, 7041, 10435],
    [22, 253, 360, 771, 2417, 1553, 9061, 14273],
    [119, 177, 360, 771, 2090, 877, 9061, 9943],
    [119, 253, 360, 771, 1049, 877, 9061, 9943],
    [79, 275, 17, 771, 968, 877, 6853, 9943],
    [22, 275, 286, 312, 566, 877, 6853, 9943],
    [22, 275, 286, 312, 1049, 102, 1383, 9943],
    [22, 253, 286, 312, 416, 2312, 1383, 14273],
    [153, 253, 286, 312, 416, 2312, 1383, 14273],
    [111, 275, 286, 312, 787, 2312, 1383, 4128],
    [112, 275, 286, 144, 787, 1194, 1383, 4128],
    [22, 275, 269, 312, 787, 2312, 1383, 4128],
    [22, 141, 286, 144, 787, 2312, 1383, 4128],
    [22, 253, 17, 312, 787, 2312, 1383, 4128],
    [140, 253, 17, 144, 416, 2312, 7163, 8097],
    [140, 253, 597, 144, 1499, 626, 1383, 9129],
];

/// Generator vector `z[k] = h^(k+1) mod p` for dimension `q` (2..=32) and the
/// given prime index.
pub(crate) fn generator_vector(q: usize, prime_idx: usize) -> Vec<u64> {
    debug_assert!((2..=MAX_DIM).contains(&q));
    let p = PRIMES[prime_idx] as u64;
    let h = GENERATORS[q - 2][prime_idx] as u64;
    let mut z = Vec::with_capacity(q - 1);
    let mut g = 1u64;
    for _ in 0..q - 1 {
        g = g * h % p;
        z.push(g);
    }
    z
}

/// One fixed-size pass of the randomized lattice rule.
///
/// For `n` random shifts over a `p`-point lattice with generator `z`,
/// estimates `P(X < b)` for `X ~ N(0, R)` where `c` is the row-normalized
/// Cholesky factor of `R` (unit diagonal after rescaling) and `b` has been
/// divided by the original Cholesky diagonal.
///
/// Returns `(intval, varsum)`: the running mean over shifts and the Welford
/// variance accumulator. Cannot fail on valid input; the estimate is always
/// finite and `varsum` non-negative.
pub(crate) fn qmc_eval<R: Rng + ?Sized>(
    n: usize,
    p: u32,
    z: &[u64],
    b: &[f64],
    c: &Array2<f64>,
    rng: &mut R,
) -> (f64, f64) {
    let q = b.len();
    debug_assert!(n >= 2);
    debug_assert_eq!(z.len(), q - 1);
    debug_assert_eq!(c.nrows(), q);

    let pf = f64::from(p);
    let step: Vec<f64> = z.iter().map(|&zi| zi as f64 / pf).collect();
    let e1 = normal_cdf(b[0]);

    let mut intval = 0.0;
    let mut varsum = 0.0;
    let mut acc = vec![0.0_f64; q - 1];
    let mut y = vec![0.0_f64; q - 1];

    for k in 1..=n {
        let rr: Vec<f64> = (0..q - 1).map(|_| rng.random::<f64>()).collect();
        acc.fill(0.0);
        let mut latsum = 0.0;

        for j in 1..=p {
            // Advance the fractional lattice point incrementally; both the
            // accumulator and the shifted value stay in [0, 1).
            for (a, s) in acc.iter_mut().zip(&step) {
                *a += *s;
                if *a >= 1.0 {
                    *a -= 1.0;
                }
            }

            let mut f = e1;
            let mut prev = e1;
            for i in 1..q {
                let mut t = acc[i - 1] + rr[i - 1];
                if t >= 1.0 {
                    t -= 1.0;
                }
                let w = (2.0 * t - 1.0).abs();

                // Inverse Rosenblatt step, scaled by the previous conditional
                // probability. Work in whichever tail keeps the quantile
                // argument away from 1.
                let u = (w * prev).clamp(TAIL_CLAMP, 1.0 - TAIL_CLAMP);
                y[i - 1] = if u <= 0.5 {
                    normal_quantile(u)
                } else {
                    -normal_quantile(1.0 - u)
                };

                let mut dot = 0.0;
                for (cij, yj) in c.row(i).iter().take(i).zip(&y[..i]) {
                    dot += cij * yj;
                }
                let e = normal_cdf(b[i] - dot);
                prev = e;
                f *= e;
            }
            latsum += (f - latsum) / f64::from(j);
        }

        let kf = k as f64;
        let delta = latsum - intval;
        intval += delta / kf;
        varsum += delta * delta * (kf - 1.0) / kf;
    }

    (intval, varsum)
}

//! Bivariate normal rectangle probability.
//!
//! Drezner & Wesolowsky (1989) with Genz's double-precision modifications and
//! his special handling of |rho| close to 1 (the `BVND` algorithm distributed
//! with tvpack). Gauss–Legendre rules of 6, 12, or 20 points are selected by
//! the magnitude of the correlation.

use crate::probability::normal_cdf;

// Gauss-Legendre points and weights as (weight, abscissa) pairs; each entry is
// evaluated at 1-x and 1+x.
const QUAD_6: [(f64, f64); 3] = [
    (0.171_324_492_379_170_5, -0.932_469_514_203_152_2),
    (0.360_761_573_048_138_4, -0.661_209_386_466_264_7),
    (0.467_913_934_572_690_4, -0.238_619_186_083_197_0),
];

const QUAD_12: [(f64, f64); 6] = [
    (0.047_175_336_386_511_77, -0.981_560_634_246_719_1),
    (0.106_939_325_995_318_3, -0.904_117_256_370_475_0),
    (0.160_078_328_543_346_4, -0.769_902_674_194_305_0),
    (0.203_167_426_723_065_9, -0.587_317_954_286_617_1),
    (0.233_492_536_538_354_7, -0.367_831_498_998_180_2),
    (0.249_147_045_813_402_9, -0.125_233_408_511_469_2),
];

const QUAD_20: [(f64, f64); 10] = [
    (0.017_614_007_139_152_12, -0.993_128_599_185_094_9),
    (0.040_601_429_800_386_94, -0.963_971_927_277_913_8),
    (0.062_672_048_334_109_06, -0.912_234_428_251_325_9),
    (0.083_276_741_576_704_75, -0.839_116_971_822_218_8),
    (0.101_930_119_817_240_4, -0.746_331_906_460_150_8),
    (0.118_194_531_961_518_4, -0.636_053_680_726_515_0),
    (0.131_688_638_449_176_6, -0.510_867_001_950_827_1),
    (0.142_096_109_318_382_1, -0.373_706_088_715_419_6),
    (0.149_172_986_472_603_7, -0.227_785_851_141_645_1),
    (0.152_753_387_130_725_9, -0.076_526_521_133_497_33),
];

fn select_quadrature(rho_abs: f64) -> &'static [(f64, f64)] {
    if rho_abs < 0.3 {
        &QUAD_6[..]
    } else if rho_abs < 0.75 {
        &QUAD_12[..]
    } else {
        &QUAD_20[..]
    }
}

/// `P(X < a, Y < b)` for standard bivariate normals with correlation `rho`.
///
/// `rho` must lie in `[-1, 1]`. Accuracy is about 1e-14 for `|rho| <= 0.925`
/// and better than 1e-10 beyond.
pub fn bivariate_normal_cdf(a: f64, b: f64, rho: f64) -> f64 {
    debug_assert!(rho.abs() <= 1.0, "rho must be in [-1,1]: {rho}");
    // The Genz formulation computes the upper orthant P(X > h, Y > k);
    // the lower rectangle follows by reflection.
    bvnd_upper(-a, -b, rho)
}

/// `P(X > dh, Y > dk)` for standard bivariate normals with correlation `r`.
fn bvnd_upper(dh: f64, dk: f64, r: f64) -> f64 {
    const FRAC_1_2PI: f64 = 0.159_154_943_091_895_35;
    const SQRT_2PI: f64 = 2.506_628_274_631_001;

    let h = dh;
    let mut k = dk;
    let hk = h * k;
    let quad = select_quadrature(r.abs());
    let mut bvn = 0.0;

    if r.abs() <= 0.925 {
        if r.abs() > 0.0 {
            let hs = (h * h + k * k) / 2.0;
            let asr = 0.5 * r.asin();
            for (w, x) in quad {
                for is in [-1.0, 1.0] {
                    let sn = (asr * (is * x + 1.0)).sin();
                    bvn += w * ((sn * hk - hs) / (1.0 - sn * sn)).exp();
                }
            }
            bvn *= asr * FRAC_1_2PI;
        }
        bvn += normal_cdf(-h) * normal_cdf(-k);
        return bvn;
    }

    // |r| > 0.925: expansion around the singular limit.
    if r < 0.0 {
        k = -k;
    }
    if r.abs() < 1.0 {
        let hk = if r < 0.0 { -hk } else { hk };
        let a_s = (1.0 - r) * (1.0 + r);
        let mut a = a_s.sqrt();
        let b_s = (h - k) * (h - k);
        let c = (4.0 - hk) / 8.0;
        let d = (12.0 - hk) / 16.0;
        let asr = -0.5 * (b_s / a_s + hk);
        if asr > -100.0 {
            bvn = a
                * asr.exp()
                * (1.0 - c * (b_s - a_s) * (1.0 - d * b_s / 5.0) / 3.0 + c * d * a_s * a_s / 5.0);
        }
        if -hk < 100.0 {
            let bb = b_s.sqrt();
            bvn -= (-0.5 * hk).exp()
                * SQRT_2PI
                * normal_cdf(-bb / a)
                * bb
                * (1.0 - c * b_s * (1.0 - d * b_s / 5.0) / 3.0);
        }
        a /= 2.0;
        for (w, x) in quad {
            for is in [-1.0, 1.0] {
                let x = a * (is * x + 1.0);
                let x_s = x * x;
                let r_s = (1.0 - x_s).sqrt();
                let asr = -0.5 * (b_s / x_s + hk);
                if asr > -100.0 {
                    bvn += a
                        * w
                        * asr.exp()
                        * ((-hk * (1.0 - r_s) / (2.0 * (1.0 + r_s))).exp() / r_s
                            - (1.0 + c * x_s * (1.0 + d * x_s)));
                }
            }
        }
        bvn *= -FRAC_1_2PI;
    }
    if r > 0.0 {
        bvn + normal_cdf(-h.max(k))
    } else {
        // k was negated above, so Phi(k) - Phi(h) is Phi(-h0) + Phi(-k0) - 1.
        // Clamping at zero (instead of the conditional add in some tvpack
        // copies) keeps the value symmetric in (h, k) and continuous with the
        // rho = -1 limit.
        -bvn + (normal_cdf(k) - normal_cdf(h)).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probability::normal_cdf;
    use approx::assert_abs_diff_eq;

    #[test]
    fn independence_factorizes() {
        for (a, b) in [(0.0, 0.0), (0.5, -1.2), (2.0, 1.0), (-2.5, -0.3)] {
            assert_abs_diff_eq!(
                bivariate_normal_cdf(a, b, 0.0),
                normal_cdf(a) * normal_cdf(b),
                epsilon = 1e-14
            );
        }
    }

    #[test]
    fn zero_bounds_arcsine_formula() {
        // P(X<0, Y<0) = 1/4 + asin(rho)/(2 pi)
        for rho in [-0.95f64, -0.5, -0.1, 0.0, 0.3, 0.7, 0.925, 0.99] {
            let expected = 0.25 + rho.asin() / (2.0 * std::f64::consts::PI);
            assert_abs_diff_eq!(bivariate_normal_cdf(0.0, 0.0, rho), expected, epsilon = 1e-10);
        }
    }

    #[test]
    fn symmetric_in_arguments() {
        for rho in [-0.9, -0.4, 0.2, 0.8, 0.95] {
            for (a, b) in [(0.3, -0.7), (1.5, 0.2), (-1.1, -2.0)] {
                assert_abs_diff_eq!(
                    bivariate_normal_cdf(a, b, rho),
                    bivariate_normal_cdf(b, a, rho),
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn perfect_correlation_limits() {
        for (a, b) in [(0.4, 1.1), (-0.5, 0.5), (1.7, -2.0)] {
            assert_abs_diff_eq!(
                bivariate_normal_cdf(a, b, 1.0),
                normal_cdf(a.min(b)),
                epsilon = 1e-12
            );
            let expected = (normal_cdf(a) + normal_cdf(b) - 1.0).max(0.0);
            assert_abs_diff_eq!(bivariate_normal_cdf(a, b, -1.0), expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn marginal_consistency() {
        // P(X < a, Y < 8) ~ Phi(a) since Phi(8) ~ 1.
        for rho in [-0.8, 0.0, 0.6] {
            for a in [-1.0, 0.0, 1.3] {
                assert_abs_diff_eq!(
                    bivariate_normal_cdf(a, 8.0, rho),
                    normal_cdf(a),
                    epsilon = 1e-9
                );
            }
        }
    }
}

//! Multivariate normal rectangle and orthant probabilities.
//!
//! The core engine reduces `P(X < b)` for `X ~ N(mu, Sigma)` to an integral
//! over the unit cube (Genz 1992) and estimates it with a randomized Korobov
//! lattice rule under an adaptive work schedule, returning an estimate with a
//! 99.7%-confidence error bound. Dimensions up to 32 are supported. Special
//! cases get faster deterministic paths: the univariate and bivariate CDFs in
//! closed form, and a trivariate routine built on Plackett's identity.
//!
//! Invalid inputs never panic: every public entry point validates first, logs
//! one diagnostic through the `log` facade, and returns NaN.
//!
//! ```
//! use ndarray::array;
//!
//! let b = array![0.0, 0.0];
//! let sigma = array![[1.0, 0.5], [0.5, 1.0]];
//! let p = mvncdf::cdf_mvn(b.view(), sigma.view(), None);
//! assert!((p - 1.0 / 3.0).abs() < 1e-3);
//! ```

pub mod bivariate;
pub mod lattice;
pub mod linalg;
pub mod mvn;
pub mod probability;
pub mod tvn;
pub mod validate;

pub use bivariate::bivariate_normal_cdf;
pub use lattice::{MAX_DIM, PRIMES};
pub use mvn::{cdf_mvn, cdf_mvn_with_error, cdf_mvn_with_rng, MvnOptions};
pub use probability::{normal_cdf, normal_pdf, normal_quantile};
pub use tvn::cdf_tvn;
pub use validate::{
    is_positive_definite, is_symmetric, validate_cdf_params, validate_tvn_params, ParamError,
};

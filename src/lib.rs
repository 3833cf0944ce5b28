//! The `ndarray-prox` crate provides a collection of proximal operators
//! for `ndarray` arrays, i.e. solvers for
//! ```math
//! \mathrm{prox}_{f,\rho}(x_0) = \mathrm{arg}\!\min_x f(x) + \frac{\rho}{2} \|x - x_0\|_2^2
//! ```
//! for a fixed menu of functions $`f`$:
//! - non-negativity, the $`\ell_1`$ norm and squared error (closed form)
//! - the nuclear norm (singular value thresholding)
//! - Laplacian smoothing and linear least squares (linear solves)
//! - Poisson regression and arbitrary smooth functions (BFGS)
//! - total variation (split Bregman)
//! - an adapter for external sum-of-functions optimizers
//!
//! Every operator is available both as a plain function taking
//! `(x0, rho, ...)` and as a configuration struct implementing
//! [`Prox`](prox/trait.Prox.html), which binds `(rho, ...)` once so that an
//! outer splitting method (e.g. ADMM) can apply it repeatedly.
//!
//! The operators are building blocks only. Composing them, monitoring the
//! outer iteration and storing iterates is left to the caller.

#![cfg_attr(all(rustc_nightly, test), feature(test))]
#[cfg(all(rustc_nightly, test))]
extern crate test;

#[cfg(test)]
extern crate intel_mkl_src;

pub mod error;
pub mod linop;
pub mod prox;
pub mod smooth;
pub mod tv;

pub use error::{ProxError, Result};

//! Quasi-Newton Minimization of Smooth Objectives
//!
//! Used by the proximal operators whose function $`f`$ has no closed-form
//! proximal map but a known gradient, e.g. the Poisson negative
//! log-likelihood. Minimizing
//! ```math
//! f(x) + \frac{\rho}{2} \|x - x_0\|_2^2
//! ```
//! is well conditioned for large $`\rho`$, which is why a plain dense
//! BFGS with a backtracking line search is sufficient here.

mod bfgs;
pub use bfgs::*;
mod line_search;
pub use line_search::*;

use ndarray::ArrayView;

/// Do nothing function for optional user callback (returns false)
#[allow(clippy::needless_pass_by_value)]
pub fn nop<T, D>(_x: ArrayView<T, D>, _itr: usize) -> bool {
    false
}

//! Proximal Operators
//!
//! Each operator evaluates
//! ```math
//! \mathrm{prox}_{f,\rho}(x_0) = \mathrm{arg}\!\min_x f(x) + \frac{\rho}{2} \|x - x_0\|_2^2
//! ```
//! for one choice of $`f`$. Larger $`\rho`$ keeps the result closer to
//! $`x_0`$; operators with an explicit penalty weight $`\gamma`$ scale their
//! threshold or tolerance by $`\gamma / \rho`$.
//!
//! | operator | $`f(x)`$ | method |
//! |----------|----------|--------|
//! | [`nonneg`] | indicator of $`x \geq 0`$ | projection |
//! | [`sparse`] | $`\gamma \|x\|_1`$ | soft thresholding |
//! | [`squared_error`] | $`\frac12 \|x - x_{obs}\|_2^2`$ | closed form |
//! | [`nucnorm`] | $`\gamma \|X\|_*`$ | singular value thresholding |
//! | [`smooth`] | $`\frac{\gamma}{2} x^T \Delta x`$ | tridiagonal solve |
//! | [`linsys`] | $`\frac12 \|Ax - b\|_2^2`$ | dense solve |
//! | [`bfgs`] | any smooth $`f`$ | BFGS |
//! | [`poissreg`] | Poisson negative log-likelihood | BFGS |
//! | [`tvd`] | $`\gamma \, \mathrm{TV}(x)`$ | [`TvDenoiser`](../tv/trait.TvDenoiser.html) |
//! | [`sfo`] | sum of minibatch functions | [`SumOfFunctions`] |
//!
//! Every operator also has a configuration struct implementing [`Prox`]
//! that binds $`\rho`$ and the remaining parameters up front, so an outer
//! splitting method only has to supply $`x_0`$ on each iteration.

use ndarray::prelude::*;

use crate::error::Result;

mod elementwise;
pub use elementwise::*;

mod nucnorm;
pub use nucnorm::*;

mod laplacian;
pub use laplacian::*;

mod linsys;
pub use linsys::*;

mod quasi_newton;
pub use quasi_newton::*;

mod tvd;
pub use tvd::*;

mod sfo;
pub use sfo::*;

/// A proximal operator with $`\rho`$ and all other parameters bound
///
/// Implementations are pure: applying the same operator to the same
/// `x0` twice gives the same result, and `x0` is never modified.
pub trait Prox<A, D: Dimension> {
    fn apply(&self, x0: ArrayView<A, D>) -> Result<Array<A, D>>;
}

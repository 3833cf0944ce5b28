use ndarray::prelude::*;
use ndarray::NdFloat;

use super::Prox;
use crate::error::Result;
use crate::linop::Tridiagonal;

/// Proximal operator of a smoothness penalty enforced via the discrete Laplacian
///
/// Solves the banded system
/// ```math
/// \gamma L x = \rho x_0, \qquad
/// L = \begin{bmatrix}
/// 2 + \rho/\gamma & -1 & & \\
/// -1 & 2 + \rho/\gamma & \ddots & \\
/// & \ddots & \ddots & -1 \\
/// & & -1 & 2 + \rho/\gamma
/// \end{bmatrix}
/// ```
/// directly in $`O(n)`$ with [`Tridiagonal::solve`](../linop/struct.Tridiagonal.html#method.solve).
/// Larger $`\gamma`$ smooths more.
///
/// Errors
/// ------
/// [`ProxError::Singular`](../error/enum.ProxError.html#variant.Singular)
/// if elimination meets a zero pivot, which only happens for degenerate
/// parameters such as $`\gamma \to 0`$.
pub fn smooth<A: NdFloat>(x0: ArrayView1<A>, rho: A, gamma: A) -> Result<Array1<A>> {
    let lap = Tridiagonal::laplacian(x0.len(), rho / gamma).scaled(gamma);
    lap.solve(&(&x0 * rho))
}

/// [`smooth`](fn.smooth.html) with `rho` and `gamma` bound
///
/// The banded operator depends on the length of `x0`, so it is rebuilt on
/// each application.
#[derive(Debug, Clone, Copy)]
pub struct Smooth<A> {
    pub rho: A,
    pub gamma: A,
}

impl<A> Smooth<A> {
    pub fn new(rho: A, gamma: A) -> Self {
        Smooth { rho, gamma }
    }
}

impl<A: NdFloat> Prox<A, Ix1> for Smooth<A> {
    fn apply(&self, x0: ArrayView1<A>) -> Result<Array1<A>> {
        smooth(x0, self.rho, self.gamma)
    }
}

//! Closed-form elementwise operators

use ndarray::prelude::*;
use ndarray::NdFloat;

use super::Prox;
use crate::error::{ProxError, Result};

/// Proximal operator of the indicator of the non-negative orthant
///
/// Projects each element onto $`[0, \infty)`$. `rho` is accepted for a
/// uniform calling convention and ignored, since an indicator has no scale.
/// NaN entries are passed through.
pub fn nonneg<A, D>(x0: ArrayView<A, D>, _rho: A) -> Array<A, D>
where
    A: NdFloat,
    D: Dimension,
{
    x0.mapv(|v| if v < A::zero() { A::zero() } else { v })
}

/// Proximal operator of $`\gamma \|x\|_1`$ (soft thresholding)
///
/// With $`\lambda = \gamma / \rho`$:
/// ```math
/// x_i = \begin{cases}
/// x_{0,i} - \lambda & x_{0,i} \geq \lambda \\
/// x_{0,i} + \lambda & x_{0,i} \leq -\lambda \\
/// 0 & \text{otherwise}
/// \end{cases}
/// ```
pub fn sparse<A, D>(x0: ArrayView<A, D>, rho: A, gamma: A) -> Array<A, D>
where
    A: NdFloat,
    D: Dimension,
{
    let lambda = gamma / rho;
    x0.mapv(|v| {
        if v >= lambda {
            v - lambda
        } else if v <= -lambda {
            v + lambda
        } else {
            A::zero()
        }
    })
}

/// Proximal operator of $`\frac12 \|x - x_{obs}\|_2^2`$
///
/// The precision weighted average
/// ```math
/// x = \frac{x_0 + x_{obs} / \rho}{1 + 1/\rho} = \frac{\rho x_0 + x_{obs}}{\rho + 1}
/// ```
/// which tends to `x_obs` as $`\rho \to 0`$ and to `x0` as $`\rho \to \infty`$.
pub fn squared_error<A, D>(
    x0: ArrayView<A, D>,
    rho: A,
    x_obs: ArrayView<A, D>,
) -> Result<Array<A, D>>
where
    A: NdFloat,
    D: Dimension,
{
    if x0.shape() != x_obs.shape() {
        return Err(ProxError::shape("squared_error", x0.shape(), x_obs.shape()));
    }
    Ok((&x0 * rho + &x_obs) / (rho + A::one()))
}

/// [`nonneg`](fn.nonneg.html) with `rho` bound
#[derive(Debug, Clone, Copy)]
pub struct NonNeg<A> {
    pub rho: A,
}

impl<A> NonNeg<A> {
    pub fn new(rho: A) -> Self {
        NonNeg { rho }
    }
}

impl<A: NdFloat, D: Dimension> Prox<A, D> for NonNeg<A> {
    fn apply(&self, x0: ArrayView<A, D>) -> Result<Array<A, D>> {
        Ok(nonneg(x0, self.rho))
    }
}

/// [`sparse`](fn.sparse.html) with `rho` and `gamma` bound
#[derive(Debug, Clone, Copy)]
pub struct Sparse<A> {
    pub rho: A,
    pub gamma: A,
}

impl<A> Sparse<A> {
    pub fn new(rho: A, gamma: A) -> Self {
        Sparse { rho, gamma }
    }
}

impl<A: NdFloat, D: Dimension> Prox<A, D> for Sparse<A> {
    fn apply(&self, x0: ArrayView<A, D>) -> Result<Array<A, D>> {
        Ok(sparse(x0, self.rho, self.gamma))
    }
}

/// [`squared_error`](fn.squared_error.html) with `rho` and the observation bound
#[derive(Debug, Clone)]
pub struct SquaredError<A, D: Dimension> {
    pub rho: A,
    pub x_obs: Array<A, D>,
}

impl<A, D: Dimension> SquaredError<A, D> {
    pub fn new(rho: A, x_obs: Array<A, D>) -> Self {
        SquaredError { rho, x_obs }
    }
}

impl<A: NdFloat, D: Dimension> Prox<A, D> for SquaredError<A, D> {
    fn apply(&self, x0: ArrayView<A, D>) -> Result<Array<A, D>> {
        squared_error(x0, self.rho, self.x_obs.view())
    }
}

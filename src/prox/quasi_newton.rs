#![allow(non_snake_case)]

use ndarray::prelude::*;
use ndarray::NdFloat;
use std::fmt;

use super::Prox;
use crate::error::{ProxError, Result};
use crate::smooth::{self, nop, BfgsOptions};

/// Proximal operator of an arbitrary smooth function with known gradient
///
/// Minimizes the augmented objective
/// ```math
/// g(x) = f(x) + \frac{\rho}{2} \|x - x_0\|_2^2, \qquad
/// \nabla g(x) = \nabla f(x) + \rho (x - x_0)
/// ```
/// with [`smooth::bfgs`](../smooth/fn.bfgs.html) started from $`x_0`$, using
/// the default [`BfgsOptions`](../smooth/struct.BfgsOptions.html).
///
/// The best iterate is returned even if BFGS stops before reaching its
/// gradient tolerance; that case is logged as a warning. Run
/// [`smooth::bfgs`](../smooth/fn.bfgs.html) directly to inspect the outcome.
pub fn bfgs<A: NdFloat>(
    x0: ArrayView1<A>,
    rho: A,
    f: impl Fn(ArrayView1<A>) -> A,
    fgrad: impl Fn(ArrayView1<A>) -> Array1<A>,
) -> Array1<A> {
    bfgs_with(x0, rho, f, fgrad, &BfgsOptions::default())
}

/// [`bfgs`](fn.bfgs.html) with explicit solver options
pub fn bfgs_with<A: NdFloat>(
    x0: ArrayView1<A>,
    rho: A,
    f: impl Fn(ArrayView1<A>) -> A,
    fgrad: impl Fn(ArrayView1<A>) -> Array1<A>,
    options: &BfgsOptions<A>,
) -> Array1<A> {
    let half_rho = rho * A::from(0.5).unwrap();
    let outcome = smooth::bfgs(
        |x| {
            let d = &x - &x0;
            f(x) + half_rho * d.dot(&d)
        },
        |x| fgrad(x) + (&x - &x0) * rho,
        x0,
        options,
        nop,
    );
    if !outcome.converged() {
        log::warn!(
            "bfgs prox: {} after {} iterations (|g|_inf = {:e}), returning best iterate",
            outcome.termination,
            outcome.iterations,
            outcome.gradient_norm
        );
    }
    outcome.x
}

/// [`bfgs`](fn.bfgs.html) with `rho`, the objective and its gradient bound
pub struct Bfgs<A, F, G> {
    pub rho: A,
    pub options: BfgsOptions<A>,
    f: F,
    fgrad: G,
}

impl<A, F, G> Bfgs<A, F, G>
where
    A: NdFloat,
    F: Fn(ArrayView1<A>) -> A,
    G: Fn(ArrayView1<A>) -> Array1<A>,
{
    pub fn new(rho: A, f: F, fgrad: G) -> Self {
        Bfgs {
            rho,
            options: BfgsOptions::default(),
            f,
            fgrad,
        }
    }

    pub fn with_options(mut self, options: BfgsOptions<A>) -> Self {
        self.options = options;
        self
    }
}

impl<A: fmt::Debug, F, G> fmt::Debug for Bfgs<A, F, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bfgs")
            .field("rho", &self.rho)
            .field("options", &self.options)
            .finish()
    }
}

impl<A, F, G> Prox<A, Ix1> for Bfgs<A, F, G>
where
    A: NdFloat,
    F: Fn(ArrayView1<A>) -> A,
    G: Fn(ArrayView1<A>) -> Array1<A>,
{
    fn apply(&self, x0: ArrayView1<A>) -> Result<Array1<A>> {
        Ok(bfgs_with(x0, self.rho, &self.f, &self.fgrad, &self.options))
    }
}

fn check_design(X: &ArrayView2<'_, impl Sized>, y_len: usize, x0_len: usize) -> Result<()> {
    if X.nrows() != y_len {
        return Err(ProxError::shape("poissreg", &[X.nrows()], &[y_len]));
    }
    if X.ncols() != x0_len {
        return Err(ProxError::shape("poissreg", &[X.ncols()], &[x0_len]));
    }
    Ok(())
}

// y enters the likelihood only through X^T y
fn poisson_prox<A: NdFloat>(
    x0: ArrayView1<A>,
    rho: A,
    X: ArrayView2<A>,
    Xty: ArrayView1<A>,
    options: &BfgsOptions<A>,
) -> Array1<A> {
    let n = A::from(X.nrows()).unwrap();
    bfgs_with(
        x0,
        rho,
        |w| (X.dot(&w).mapv(A::exp).sum() - Xty.dot(&w)) / n,
        |w| (X.t().dot(&X.dot(&w).mapv(A::exp)) - &Xty) / n,
        options,
    )
}

/// Proximal operator of the Poisson negative log-likelihood
///
/// For a design matrix $`X \in \mathbb{R}^{n \times k}`$ and counts
/// $`y \in \mathbb{R}^n`$ the (mean) loss and its gradient are
/// ```math
/// f(w) = \frac1n \sum_i \left( e^{(Xw)_i} - y_i (Xw)_i \right), \qquad
/// \nabla f(w) = \frac1n \left( X^T e^{Xw} - X^T y \right)
/// ```
/// and the proximal point is found with [`bfgs`](fn.bfgs.html).
///
/// The exponential is not guarded. Trial points where it overflows fail the
/// line search and BFGS backs away from them. If it already overflows at
/// `x0`, BFGS stops before its first step and `x0` is returned unchanged,
/// with a warning, like any other early stop.
///
/// Errors
/// ------
/// [`ProxError::ShapeMismatch`](../error/enum.ProxError.html#variant.ShapeMismatch)
/// if `X` does not have `y.len()` rows and `x0.len()` columns.
pub fn poissreg<A: NdFloat>(
    x0: ArrayView1<A>,
    rho: A,
    X: ArrayView2<A>,
    y: ArrayView1<A>,
) -> Result<Array1<A>> {
    poissreg_with(x0, rho, X, y, &BfgsOptions::default())
}

/// [`poissreg`](fn.poissreg.html) with explicit solver options
pub fn poissreg_with<A: NdFloat>(
    x0: ArrayView1<A>,
    rho: A,
    X: ArrayView2<A>,
    y: ArrayView1<A>,
    options: &BfgsOptions<A>,
) -> Result<Array1<A>> {
    check_design(&X, y.len(), x0.len())?;
    let Xty = X.t().dot(&y);
    Ok(poisson_prox(x0, rho, X, Xty.view(), options))
}

/// [`poissreg`](fn.poissreg.html) with `rho` and the data bound
#[derive(Debug, Clone)]
pub struct PoissReg<A> {
    pub rho: A,
    pub options: BfgsOptions<A>,
    X: Array2<A>,
    Xty: Array1<A>,
}

impl<A: NdFloat> PoissReg<A> {
    pub fn new(rho: A, X: Array2<A>, y: ArrayView1<A>) -> Result<Self> {
        check_design(&X.view(), y.len(), X.ncols())?;
        let Xty = X.t().dot(&y);
        Ok(PoissReg {
            rho,
            options: BfgsOptions::default(),
            X,
            Xty,
        })
    }

    pub fn with_options(mut self, options: BfgsOptions<A>) -> Self {
        self.options = options;
        self
    }
}

impl<A: NdFloat> Prox<A, Ix1> for PoissReg<A> {
    fn apply(&self, x0: ArrayView1<A>) -> Result<Array1<A>> {
        if x0.len() != self.X.ncols() {
            return Err(ProxError::shape("poissreg", &[self.X.ncols()], &[x0.len()]));
        }
        Ok(poisson_prox(
            x0,
            self.rho,
            self.X.view(),
            self.Xty.view(),
            &self.options,
        ))
    }
}

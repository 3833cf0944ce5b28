#![allow(non_snake_case)]

use ndarray::prelude::*;
use ndarray::{NdFloat, OwnedRepr};
use ndarray_linalg::lapack::Lapack;
use ndarray_linalg::solve::{Factorize, LUFactorized, Solve};
use ndarray_linalg::Scalar;
use std::fmt;

use super::Prox;
use crate::error::{ProxError, Result};

fn check_system(
    op: &'static str,
    x0_len: usize,
    P: &ArrayView2<'_, impl Sized>,
    q_len: usize,
) -> Result<()> {
    if P.dim() != (q_len, q_len) {
        return Err(ProxError::shape(op, &[q_len, q_len], P.shape()));
    }
    if x0_len != q_len {
        return Err(ProxError::shape(op, &[q_len], &[x0_len]));
    }
    Ok(())
}

/// Proximal operator of the least squares fit $`\frac12 \|Ax - b\|_2^2`$
///
/// Expanding the objective as $`\frac12 x^TPx - q^Tx + \mathrm{const}`$ with
/// $`P = A^TA`$ and $`q = A^Tb`$, the proximal point solves
/// ```math
/// (\rho I + P) x = \rho x_0 + q
/// ```
/// As $`\rho \to \infty`$ the result tends to $`x_0`$, as $`\rho \to 0`$ to
/// the least squares solution $`Px = q`$.
///
/// Errors
/// ------
/// - [`ProxError::ShapeMismatch`](../error/enum.ProxError.html#variant.ShapeMismatch)
///   unless `P` is square with side `q.len() == x0.len()`
/// - [`ProxError::Linalg`](../error/enum.ProxError.html#variant.Linalg)
///   if $`\rho I + P`$ is singular
pub fn linsys<A>(
    x0: ArrayView1<A>,
    rho: A,
    P: ArrayView2<A>,
    q: ArrayView1<A>,
) -> Result<Array1<A>>
where
    A: NdFloat + Scalar + Lapack,
{
    check_system("linsys", x0.len(), &P, q.len())?;
    let lhs = &P + &(Array2::eye(q.len()) * rho);
    let rhs = &x0 * rho + &q;
    Ok(lhs.solve_into(rhs)?)
}

/// [`linsys`](fn.linsys.html) with `rho`, `P` and `q` bound
///
/// Since $`\rho`$ is fixed, $`\rho I + P`$ is LU factorized once on
/// construction and every application is a pair of triangular solves.
pub struct LinSys<A: Clone> {
    pub rho: A,
    q: Array1<A>,
    lu: LUFactorized<OwnedRepr<A>>,
}

impl<A> LinSys<A>
where
    A: NdFloat + Scalar + Lapack,
{
    pub fn new(rho: A, P: ArrayView2<A>, q: Array1<A>) -> Result<Self> {
        check_system("LinSys", q.len(), &P, q.len())?;
        let lhs = &P + &(Array2::eye(q.len()) * rho);
        let lu = lhs.factorize()?;
        Ok(LinSys { rho, q, lu })
    }

    /// Build from the raw problem data, forming $`P = A^TA`$ and $`q = A^Tb`$.
    pub fn from_least_squares(rho: A, A: ArrayView2<A>, b: ArrayView1<A>) -> Result<Self> {
        if A.nrows() != b.len() {
            return Err(ProxError::shape("LinSys", &[A.nrows()], &[b.len()]));
        }
        let P = A.t().dot(&A);
        let q = A.t().dot(&b);
        Self::new(rho, P.view(), q)
    }

    pub fn q(&self) -> ArrayView1<A> {
        self.q.view()
    }
}

// the LU factors are not worth printing
impl<A: fmt::Debug + Clone> fmt::Debug for LinSys<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinSys")
            .field("rho", &self.rho)
            .field("q", &self.q)
            .finish()
    }
}

impl<A> Prox<A, Ix1> for LinSys<A>
where
    A: NdFloat + Scalar + Lapack,
{
    fn apply(&self, x0: ArrayView1<A>) -> Result<Array1<A>> {
        if x0.len() != self.q.len() {
            return Err(ProxError::shape("LinSys", &[self.q.len()], &[x0.len()]));
        }
        let rhs = &x0 * self.rho + &self.q;
        Ok(self.lu.solve_into(rhs)?)
    }
}

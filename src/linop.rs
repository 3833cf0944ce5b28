//! Banded Linear Operators
//! building upon ndarray_linalg::operator

use ndarray::prelude::*;
use ndarray::{Data, DataMut, DataOwned, NdFloat};
pub use ndarray_linalg::operator::LinearOperator;
use ndarray_linalg::Scalar;

use crate::error::{ProxError, Result};

/// Square tridiagonal matrix stored by its three bands
///
/// ```math
/// T = \begin{bmatrix}
/// d_0 & u_0 &        &         \\
/// l_0 & d_1 & \ddots &         \\
///     & \ddots & \ddots & u_{n-2} \\
///     &        & l_{n-2} & d_{n-1}
/// \end{bmatrix}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Tridiagonal<A> {
    lower: Array1<A>,
    diag: Array1<A>,
    upper: Array1<A>,
}

impl<A: NdFloat> Tridiagonal<A> {
    /// Build from explicit bands. The off-diagonals must be one shorter
    /// than the diagonal.
    pub fn new(lower: Array1<A>, diag: Array1<A>, upper: Array1<A>) -> Result<Self> {
        let off = diag.len().saturating_sub(1);
        for band in [&lower, &upper].iter() {
            if band.len() != off {
                return Err(ProxError::shape("tridiagonal", &[off], &[band.len()]));
            }
        }
        Ok(Tridiagonal { lower, diag, upper })
    }

    /// Toeplitz tridiagonal matrix with constant bands.
    pub fn from_bands(n: usize, lower: A, diag: A, upper: A) -> Self {
        let off = n.saturating_sub(1);
        Tridiagonal {
            lower: Array1::from_elem(off, lower),
            diag: Array1::from_elem(n, diag),
            upper: Array1::from_elem(off, upper),
        }
    }

    /// Discrete Laplacian with its diagonal shifted, i.e. `2 + shift` on the
    /// diagonal and `-1` on both off-diagonals.
    pub fn laplacian(n: usize, shift: A) -> Self {
        let two = A::one() + A::one();
        Self::from_bands(n, -A::one(), two + shift, -A::one())
    }

    /// Number of rows (and columns).
    pub fn len(&self) -> usize {
        self.diag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diag.is_empty()
    }

    pub fn diag(&self) -> ArrayView1<A> {
        self.diag.view()
    }

    /// Multiply every band by `a`.
    pub fn scaled(mut self, a: A) -> Self {
        self.lower *= a;
        self.diag *= a;
        self.upper *= a;
        self
    }

    /// Out-of-place product `T x`.
    pub fn dot<S>(&self, x: &ArrayBase<S, Ix1>) -> Array1<A>
    where
        S: Data<Elem = A>,
    {
        let n = self.len();
        let mut y = &self.diag * x;
        for i in 1..n {
            y[i] = y[i] + self.lower[i - 1] * x[i - 1];
            y[i - 1] = y[i - 1] + self.upper[i - 1] * x[i];
        }
        y
    }

    /// Direct solve of `T x = b` by tridiagonal Gaussian elimination
    /// (the Thomas algorithm), without pivoting.
    ///
    /// Stable for diagonally dominant systems such as the shifted
    /// Laplacian. A zero pivot is reported as [`ProxError::Singular`].
    pub fn solve<S>(&self, b: &ArrayBase<S, Ix1>) -> Result<Array1<A>>
    where
        S: Data<Elem = A>,
    {
        let n = self.len();
        if b.len() != n {
            return Err(ProxError::shape("tridiagonal solve", &[n], &[b.len()]));
        }
        if n == 0 {
            return Ok(Array1::zeros(0));
        }

        // forward sweep, c holds the modified super-diagonal
        let mut c = Array1::<A>::zeros(n);
        let mut x = Array1::<A>::zeros(n);
        let mut pivot = self.diag[0];
        for i in 0..n {
            if i > 0 {
                pivot = self.diag[i] - self.lower[i - 1] * c[i - 1];
            }
            if pivot == A::zero() || !pivot.is_finite() {
                return Err(ProxError::Singular { pivot: i });
            }
            if i + 1 < n {
                c[i] = self.upper[i] / pivot;
            }
            let carry = if i > 0 {
                self.lower[i - 1] * x[i - 1]
            } else {
                A::zero()
            };
            x[i] = (b[i] - carry) / pivot;
        }

        // back substitution
        for i in (0..n - 1).rev() {
            x[i] = x[i] - c[i] * x[i + 1];
        }
        Ok(x)
    }
}

impl<A> LinearOperator for Tridiagonal<A>
where
    A: NdFloat + Scalar,
{
    type Elem = A;

    /// Apply operator out-place
    fn apply<S>(&self, a: &ArrayBase<S, Ix1>) -> Array1<S::Elem>
    where
        S: Data<Elem = Self::Elem>,
    {
        self.dot(a)
    }

    /// Apply operator in-place
    fn apply_mut<S>(&self, a: &mut ArrayBase<S, Ix1>)
    where
        S: DataMut<Elem = Self::Elem>,
    {
        let y = self.dot(a);
        a.assign(&y);
    }

    /// Apply operator with move
    fn apply_into<S>(&self, mut a: ArrayBase<S, Ix1>) -> ArrayBase<S, Ix1>
    where
        S: DataOwned<Elem = Self::Elem> + DataMut,
    {
        self.apply_mut(&mut a);
        a
    }
}

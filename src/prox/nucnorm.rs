use ndarray::prelude::*;
use ndarray::NdFloat;
use ndarray_linalg::lapack::Lapack;
use ndarray_linalg::svd::SVD;
use ndarray_linalg::Scalar;

use super::Prox;
use crate::error::{ProxError, Result};

/// Proximal operator of the nuclear norm $`\gamma \|X\|_* = \gamma \sum_i \sigma_i(X)`$
///
/// Singular value thresholding: with the thin SVD $`X_0 = U \Sigma V^T`$
/// and $`\lambda = \gamma / \rho`$,
/// ```math
/// X = U \, \mathrm{diag}\left(\max(\sigma_i - \lambda, 0)\right) V^T
/// ```
/// The singular vectors are kept and only the spectrum shrinks, which
/// drives the result towards low rank.
///
/// Errors
/// ------
/// LAPACK failures (e.g. the SVD not converging) are returned as
/// [`ProxError::Linalg`](../error/enum.ProxError.html#variant.Linalg).
pub fn nucnorm<A>(x0: ArrayView2<A>, rho: A, gamma: A) -> Result<Array2<A>>
where
    A: NdFloat + Scalar<Real = A> + Lapack,
{
    let (m, n) = x0.dim();
    let k = m.min(n);
    if k == 0 {
        return Ok(x0.to_owned());
    }

    let (u, sigma, vt) = x0.svd(true, true)?;
    let (u, vt) = match (u, vt) {
        (Some(u), Some(vt)) => (u, vt),
        _ => return Err(ProxError::Decomposition("svd without singular vectors")),
    };

    let lambda = gamma / rho;
    let sigma = sigma.mapv(|s| if s > lambda { s - lambda } else { A::zero() });
    log::trace!(
        "nucnorm: {} of {} singular values survive threshold {}",
        sigma.iter().filter(|&&s| s > A::zero()).count(),
        k,
        lambda
    );

    // U[:, :k] diag(sigma) V^T[:k, :]
    let us = &u.slice(s![.., ..k]) * &sigma;
    Ok(us.dot(&vt.slice(s![..k, ..])))
}

/// [`nucnorm`](fn.nucnorm.html) with `rho` and `gamma` bound
#[derive(Debug, Clone, Copy)]
pub struct NucNorm<A> {
    pub rho: A,
    pub gamma: A,
}

impl<A> NucNorm<A> {
    pub fn new(rho: A, gamma: A) -> Self {
        NucNorm { rho, gamma }
    }
}

impl<A> Prox<A, Ix2> for NucNorm<A>
where
    A: NdFloat + Scalar<Real = A> + Lapack,
{
    fn apply(&self, x0: ArrayView2<A>) -> Result<Array2<A>> {
        nucnorm(x0, self.rho, self.gamma)
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray_rand::rand_distr::Normal;
    use ndarray_rand::RandomExt;

    fn singular_values(X: &Array2<f64>) -> Array1<f64> {
        X.svd(false, false).unwrap().1
    }

    #[test]
    fn nucnorm_diagonal() {
        let X0 = array![[5., 0., 0.], [0., 2., 0.], [0., 0., 0.5]];
        let X = nucnorm(X0.view(), 1., 1.).unwrap();
        assert_abs_diff_eq!(
            X,
            array![[4., 0., 0.], [0., 1., 0.], [0., 0., 0.]],
            epsilon = 1e-12
        );
    }

    #[test]
    fn nucnorm_shrinks_spectrum() {
        let X0 = Array::random((8, 5), Normal::new(0., 2.).unwrap());
        let (rho, gamma) = (2., 3.);
        let X = nucnorm(X0.view(), rho, gamma).unwrap();
        assert_eq!(X.dim(), (8, 5));

        let s0 = singular_values(&X0);
        let s = singular_values(&X);
        let lambda = gamma / rho;
        for (&s0_i, &s_i) in s0.iter().zip(s.iter()) {
            assert_abs_diff_eq!(s_i, (s0_i - lambda).max(0.), epsilon = 1e-10);
        }
        assert!(s.sum() <= s0.sum());
    }

    #[test]
    fn nucnorm_keeps_singular_vectors() {
        // rank one input, shrinking keeps the direction
        let u = array![1., 2., 2.] / 3.;
        let v = array![0.6, 0.8];
        let X0 = u.view().insert_axis(Axis(1)).dot(&v.view().insert_axis(Axis(0))) * 10.;
        let X = nucnorm(X0.view(), 1., 4.).unwrap();
        assert_abs_diff_eq!(X, &X0 * 0.6, epsilon = 1e-12);
    }

    #[test]
    fn nucnorm_large_threshold_is_zero() {
        let X0 = Array::random((4, 6), Normal::new(0., 1.).unwrap());
        let s_max = singular_values(&X0)[0];
        let X = NucNorm::new(1., s_max + 1.).apply(X0.view()).unwrap();
        assert_abs_diff_eq!(X, Array2::zeros((4, 6)), epsilon = 1e-12);
    }

    #[test]
    fn nucnorm_f32_wide() {
        let X0 = array![[3f32, 0., 0., 0.], [0., -1., 0., 0.]];
        let X = nucnorm(X0.view(), 2., 1.).unwrap();
        assert_abs_diff_eq!(X, array![[2.5f32, 0., 0., 0.], [0., -0.5, 0., 0.]], epsilon = 1e-6);
    }

    #[cfg(rustc_nightly)]
    #[bench]
    fn bench_nucnorm_64(b: &mut test::Bencher) {
        let X0 = Array::random((64, 64), Normal::new(0., 1.).unwrap());
        b.iter(|| nucnorm(X0.view(), 1., 1.).unwrap());
    }
}

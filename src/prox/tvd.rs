use ndarray::prelude::*;
use ndarray::NdFloat;

use super::Prox;
use crate::error::{ProxError, Result};
use crate::tv::{SplitBregman, TvDenoiser};
use std::fmt;

/// Proximal operator of the total variation penalty $`\gamma \, \mathrm{TV}(x)`$
///
/// Delegates to a [`TvDenoiser`](../tv/trait.TvDenoiser.html) with weight
/// $`\rho / \gamma`$, so a larger $`\gamma`$ denoises more strongly.
///
/// Errors
/// ------
/// Whatever the backend returns, and
/// [`ProxError::ShapeMismatch`](../error/enum.ProxError.html#variant.ShapeMismatch)
/// if it hands back an image of a different shape.
pub fn tvd<A: NdFloat>(
    x0: ArrayView2<A>,
    rho: A,
    gamma: A,
    denoiser: &dyn TvDenoiser<A>,
) -> Result<Array2<A>> {
    let out = denoiser.denoise(x0, rho / gamma)?;
    if out.dim() != x0.dim() {
        return Err(ProxError::shape("tvd", x0.shape(), out.shape()));
    }
    Ok(out)
}

/// [`tvd`](fn.tvd.html) with `rho`, `gamma` and the denoising backend bound
///
/// Applies to images and to 1-D signals, which are denoised as a single
/// row image.
pub struct Tvd<A> {
    pub rho: A,
    pub gamma: A,
    backend: Box<dyn TvDenoiser<A>>,
}

impl<A: NdFloat> Tvd<A> {
    /// A backend must be supplied, `None` is rejected with
    /// [`ProxError::BackendUnavailable`](../error/enum.ProxError.html#variant.BackendUnavailable)
    /// here rather than on first use.
    pub fn new(rho: A, gamma: A, backend: Option<Box<dyn TvDenoiser<A>>>) -> Result<Self> {
        let backend = backend.ok_or(ProxError::BackendUnavailable("total variation denoiser"))?;
        Ok(Tvd {
            rho,
            gamma,
            backend,
        })
    }

    /// Use the built-in [`SplitBregman`](../tv/struct.SplitBregman.html)
    /// backend with default settings.
    pub fn split_bregman(rho: A, gamma: A) -> Self {
        Tvd {
            rho,
            gamma,
            backend: Box::new(SplitBregman::default()),
        }
    }
}

impl<A: fmt::Debug> fmt::Debug for Tvd<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tvd")
            .field("rho", &self.rho)
            .field("gamma", &self.gamma)
            .finish()
    }
}

impl<A: NdFloat> Prox<A, Ix2> for Tvd<A> {
    fn apply(&self, x0: ArrayView2<A>) -> Result<Array2<A>> {
        tvd(x0, self.rho, self.gamma, self.backend.as_ref())
    }
}

impl<A: NdFloat> Prox<A, Ix1> for Tvd<A> {
    fn apply(&self, x0: ArrayView1<A>) -> Result<Array1<A>> {
        let row = tvd(
            x0.insert_axis(Axis(0)),
            self.rho,
            self.gamma,
            self.backend.as_ref(),
        )?;
        Ok(row.index_axis_move(Axis(0), 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn scale_by_weight(image: ArrayView2<f64>, weight: f64) -> Result<Array2<f64>> {
        Ok(image.mapv(|v| v * weight))
    }

    fn transpose(image: ArrayView2<f64>, _weight: f64) -> Result<Array2<f64>> {
        Ok(image.t().to_owned())
    }

    #[test]
    fn tvd_missing_backend() {
        match Tvd::<f64>::new(1., 1., None) {
            Err(ProxError::BackendUnavailable(_)) => {}
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("constructed without a backend"),
        }
    }

    #[test]
    fn tvd_weight_is_rho_over_gamma() {
        let x0 = array![[1., 2.], [3., 4.]];
        let x = tvd(x0.view(), 3., 2., &scale_by_weight).unwrap();
        assert_eq!(x, &x0 * 1.5);

        let op = Tvd::<f64>::new(3., 2., Some(Box::new(scale_by_weight))).unwrap();
        assert_eq!(format!("{:?}", op), "Tvd { rho: 3.0, gamma: 2.0 }");
        assert_eq!(op.apply(x0.view()).unwrap(), &x0 * 1.5);
        // 1-D input goes through the backend as one row
        let x1 = array![1., -2., 4.];
        assert_eq!(op.apply(x1.view()).unwrap(), &x1 * 1.5);
    }

    #[test]
    fn tvd_backend_shape_checked() {
        let x0 = Array2::<f64>::zeros((2, 3));
        assert!(matches!(
            tvd(x0.view(), 1., 1., &transpose),
            Err(ProxError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn tvd_constant_image() {
        let op = Tvd::<f64>::split_bregman(1., 0.5);
        let image = Array2::from_elem((6, 4), -1.25);
        assert_abs_diff_eq!(op.apply(image.view()).unwrap(), image, epsilon = 1e-12);
        let signal = Array1::from_elem(9, 0.5);
        assert_abs_diff_eq!(op.apply(signal.view()).unwrap(), signal, epsilon = 1e-12);
    }

    #[test]
    fn tvd_flattens_signal() {
        let x0 = array![0., 0.1, -0.1, 0.05, 1., 0.9, 1.1, 0.95];
        let tv = |x: &Array1<f64>| {
            x.windows(2)
                .into_iter()
                .map(|w| (w[1] - w[0]).abs())
                .sum::<f64>()
        };
        let x = Tvd::<f64>::split_bregman(1., 1.).apply(x0.view()).unwrap();
        assert_eq!(x.len(), x0.len());
        assert!(tv(&x) < tv(&x0));
    }
}

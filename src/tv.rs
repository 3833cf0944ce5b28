//! Total Variation Denoising
//!
//! The [`tvd`](../prox/fn.tvd.html) operator does not solve the total
//! variation problem itself, it hands the work to a [`TvDenoiser`]. Any
//! backend can be plugged in, [`SplitBregman`] is provided.

use ndarray::prelude::*;
use ndarray::NdFloat;

use crate::error::Result;

/// Capability that solves the total variation denoising problem
/// ```math
/// \mathrm{arg}\!\min_u \; \|\nabla u\|_1 + \frac{\lambda}{2} \|u - f\|_2^2
/// ```
/// for an image $`f`$ and weight $`\lambda`$. Larger weights stay closer to
/// the input.
pub trait TvDenoiser<A>: Send + Sync {
    fn denoise(&self, image: ArrayView2<A>, weight: A) -> Result<Array2<A>>;
}

impl<A, F> TvDenoiser<A> for F
where
    F: Fn(ArrayView2<A>, A) -> Result<Array2<A>> + Send + Sync,
{
    fn denoise(&self, image: ArrayView2<A>, weight: A) -> Result<Array2<A>> {
        self(image, weight)
    }
}

/// Split Bregman total variation denoising
///
/// Solves the total variation problem by splitting the image derivatives
/// into auxiliary fields $`d = \nabla u`$ and enforcing the split with
/// Bregman variables $`b`$ [\[GO09\]](#references). Each iteration is one
/// Gauss-Seidel sweep over the image:
///
/// ```math
/// \begin{aligned}
/// u &\leftarrow \frac{\lambda}{\mu + 4\lambda}\left(\textstyle\sum_{\mathcal N} u
///     + \nabla^T(b - d)\right) + \frac{\mu}{\mu + 4\lambda} f \\
/// d &\leftarrow \mathrm{shrink}\left(\nabla u + b, 1/\lambda\right) \\
/// b &\leftarrow b + \nabla u - d
/// \end{aligned}
/// ```
/// where $`\mu`$ is the denoising weight and $`\lambda = 2\mu`$. The image is
/// extended by a one pixel reflected border and forward differences are used.
///
/// Parameters
/// ----------
/// - __max_iter:__  maximum number of sweeps (default: 100)
/// - __eps:__       stop once the root mean square change of a sweep falls
///                   below this value (default: 1e-3)
/// - __isotropic:__ shrink the gradient magnitude jointly (default) or each
///                   derivative separately
///
/// References
/// ----------
/// \[GO09\]: [ Goldstein T, Osher S,
///             "The Split Bregman Method for L1-Regularized Problems",
///             SIAM Journal on Imaging Sciences 2(2), 323-343 (2009)
///           ](https://doi.org/10.1137/080725891)
#[derive(Debug, Clone)]
pub struct SplitBregman<A> {
    pub max_iter: usize,
    pub eps: A,
    pub isotropic: bool,
}

impl<A: NdFloat> Default for SplitBregman<A> {
    fn default() -> Self {
        SplitBregman {
            max_iter: 100,
            eps: A::from(1e-3).unwrap(),
            isotropic: true,
        }
    }
}

fn shrink<A: NdFloat>(v: A, thresh: A) -> A {
    if v > thresh {
        v - thresh
    } else if v < -thresh {
        v + thresh
    } else {
        A::zero()
    }
}

impl<A: NdFloat> TvDenoiser<A> for SplitBregman<A> {
    fn denoise(&self, image: ArrayView2<A>, weight: A) -> Result<Array2<A>> {
        let (rows, cols) = image.dim();
        if rows == 0 || cols == 0 {
            return Ok(image.to_owned());
        }

        // padded working arrays, the image lives in rows/cols 1..=n
        let shape = (rows + 2, cols + 2);
        let mut u = Array2::<A>::zeros(shape);
        let mut dx = Array2::<A>::zeros(shape);
        let mut dy = Array2::<A>::zeros(shape);
        let mut bx = Array2::<A>::zeros(shape);
        let mut by = Array2::<A>::zeros(shape);

        u.slice_mut(s![1..rows + 1, 1..cols + 1]).assign(&image);
        u.slice_mut(s![0, 1..cols + 1])
            .assign(&image.row(usize::min(1, rows - 1)));
        u.slice_mut(s![rows + 1, 1..cols + 1])
            .assign(&image.row(rows.saturating_sub(2)));
        u.slice_mut(s![1..rows + 1, 0])
            .assign(&image.column(usize::min(1, cols - 1)));
        u.slice_mut(s![1..rows + 1, cols + 1])
            .assign(&image.column(cols.saturating_sub(2)));

        let lam = weight + weight;
        let four = A::from(4.).unwrap();
        let norm = weight + four * lam;
        let thresh = A::one() / lam;
        let total = A::from(rows * cols).unwrap();

        let mut rmse = A::infinity();
        let mut iter = 0;
        while iter < self.max_iter && rmse > self.eps {
            let mut sq = A::zero();
            for r in 1..=rows {
                for c in 1..=cols {
                    let uprev = u[[r, c]];
                    let ux = u[[r, c + 1]] - uprev;
                    let uy = u[[r + 1, c]] - uprev;

                    let neighbours = u[[r + 1, c]] + u[[r - 1, c]] + u[[r, c + 1]] + u[[r, c - 1]];
                    let split = dx[[r, c - 1]] - dx[[r, c]] + dy[[r - 1, c]] - dy[[r, c]];
                    let bregman = -bx[[r, c - 1]] + bx[[r, c]] - by[[r - 1, c]] + by[[r, c]];
                    let unew =
                        (lam * (neighbours + split + bregman) + weight * image[[r - 1, c - 1]])
                            / norm;
                    u[[r, c]] = unew;
                    sq += (unew - uprev) * (unew - uprev);

                    let tx = ux + bx[[r, c]];
                    let ty = uy + by[[r, c]];
                    let (dxx, dyy) = if self.isotropic {
                        let mag = (tx * tx + ty * ty).sqrt();
                        if mag > thresh {
                            let scale = (mag - thresh) / mag;
                            (tx * scale, ty * scale)
                        } else {
                            (A::zero(), A::zero())
                        }
                    } else {
                        (shrink(tx, thresh), shrink(ty, thresh))
                    };
                    dx[[r, c]] = dxx;
                    dy[[r, c]] = dyy;
                    bx[[r, c]] += ux - dxx;
                    by[[r, c]] += uy - dyy;
                }
            }
            rmse = (sq / total).sqrt();
            iter += 1;
            log::trace!("split bregman sweep {}: rmse = {:e}", iter, rmse);
        }
        log::debug!(
            "split bregman: {} sweeps on {}x{} image, final rmse = {:e}",
            iter,
            rows,
            cols,
            rmse
        );

        Ok(u.slice(s![1..rows + 1, 1..cols + 1]).to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn total_variation(u: &Array2<f64>) -> f64 {
        let (rows, cols) = u.dim();
        let mut tv = 0.;
        for r in 0..rows {
            for c in 0..cols {
                if c + 1 < cols {
                    tv += (u[[r, c + 1]] - u[[r, c]]).abs();
                }
                if r + 1 < rows {
                    tv += (u[[r + 1, c]] - u[[r, c]]).abs();
                }
            }
        }
        tv
    }

    fn noisy_step() -> (Array2<f64>, Array2<f64>) {
        let clean = Array2::from_shape_fn((12, 12), |(_r, c)| if c < 6 { 0. } else { 1. });
        // deterministic pseudo noise
        let noise = Array2::from_shape_fn((12, 12), |(r, c)| {
            0.2 * (((r * 7 + c * 13) % 11) as f64 / 10. - 0.5)
        });
        let noisy = &clean + &noise;
        (clean, noisy)
    }

    #[test]
    fn constant_image_is_fixed() {
        let image = Array2::from_elem((5, 7), 3.5);
        let out = SplitBregman::default().denoise(image.view(), 0.1).unwrap();
        assert_abs_diff_eq!(out, image, epsilon = 1e-12);
    }

    #[test]
    fn isotropic_reduces_total_variation() {
        let (clean, noisy) = noisy_step();
        let out = SplitBregman::default().denoise(noisy.view(), 2.).unwrap();
        assert_eq!(out.dim(), noisy.dim());
        assert!(total_variation(&out) < total_variation(&noisy));
        // the edge survives
        let left = out.slice(s![.., ..6]).sum() / 72.;
        let right = out.slice(s![.., 6..]).sum() / 72.;
        assert!(right - left > 0.5, "{} {}", left, right);
        assert_abs_diff_eq!(out.sum(), clean.sum(), epsilon = 144. * 0.1);
    }

    #[test]
    fn anisotropic_reduces_total_variation() {
        let (_clean, noisy) = noisy_step();
        let denoiser = SplitBregman {
            isotropic: false,
            ..SplitBregman::default()
        };
        let out = denoiser.denoise(noisy.view(), 2.).unwrap();
        assert!(total_variation(&out) < total_variation(&noisy));
    }

    #[test]
    fn larger_weight_stays_closer() {
        let (_clean, noisy) = noisy_step();
        let dist = |weight: f64| {
            let out = SplitBregman::default().denoise(noisy.view(), weight).unwrap();
            (&out - &noisy).mapv(|v| v * v).sum().sqrt()
        };
        assert!(dist(1e3) < dist(0.5));
    }

    #[test]
    fn single_row_and_empty() {
        let row = array![[0., 0.1, -0.1, 1., 0.9, 1.1]];
        let out = SplitBregman::default().denoise(row.view(), 1.).unwrap();
        assert_eq!(out.dim(), (1, 6));
        assert!(total_variation(&out) < total_variation(&row));

        let empty = Array2::<f64>::zeros((0, 4));
        let out = SplitBregman::default().denoise(empty.view(), 1.).unwrap();
        assert_eq!(out.dim(), (0, 4));
    }

    fn halve(image: ArrayView2<f32>, _weight: f32) -> Result<Array2<f32>> {
        Ok(image.mapv(|v| v / 2.))
    }

    #[test]
    fn function_backend() {
        let out = halve.denoise(array![[2f32, 4.]].view(), 1.).unwrap();
        assert_eq!(out, array![[1f32, 2.]]);
    }
}

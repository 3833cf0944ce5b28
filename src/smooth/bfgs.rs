#![allow(non_snake_case)]

use super::line_search::{backtracking_armijo, ArmijoParams};
use ndarray::prelude::*;
use ndarray::NdFloat;
use std::fmt;

/// Tunables for [`bfgs`](fn.bfgs.html)
#[derive(Debug, Clone)]
pub struct BfgsOptions<A> {
    /// Stop once $`\|\nabla f(x)\|_\infty`$ drops to this value (default: 1e-5).
    pub gtol: A,
    /// Iteration limit, `200 * x0.len()` when `None` (default).
    pub maxiter: Option<usize>,
    pub armijo: ArmijoParams<A>,
}

impl<A: NdFloat> Default for BfgsOptions<A> {
    fn default() -> Self {
        BfgsOptions {
            gtol: A::from(1e-5).unwrap(),
            maxiter: None,
            armijo: ArmijoParams::default(),
        }
    }
}

/// Why the minimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Gradient norm fell below `gtol`.
    GradientNorm,
    /// Reached the iteration limit.
    MaxIterations,
    /// No step satisfied the sufficient decrease condition.
    LineSearchFailed,
    /// The objective or its gradient became non-finite.
    NumericalError,
    /// The user callback asked to stop.
    Callback,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::GradientNorm => write!(f, "gradient norm below tolerance"),
            TerminationReason::MaxIterations => write!(f, "maximum iterations reached"),
            TerminationReason::LineSearchFailed => write!(f, "line search failed"),
            TerminationReason::NumericalError => write!(f, "non-finite objective or gradient"),
            TerminationReason::Callback => write!(f, "stopped by callback"),
        }
    }
}

/// Result of a [`bfgs`](fn.bfgs.html) run
#[derive(Debug, Clone)]
pub struct BfgsOutcome<A> {
    /// Last accepted iterate, the best point found since every step decreases $`f`$.
    pub x: Array1<A>,
    pub value: A,
    pub gradient_norm: A,
    pub iterations: usize,
    pub func_evals: usize,
    pub termination: TerminationReason,
}

impl<A> BfgsOutcome<A> {
    /// Whether the gradient tolerance was met.
    pub fn converged(&self) -> bool {
        self.termination == TerminationReason::GradientNorm
    }
}

// NaN entries propagate, `Float::max` would drop them
fn inf_norm<A: NdFloat>(g: &Array1<A>) -> A {
    g.iter().fold(A::zero(), |acc, &v| {
        if acc.is_nan() || v.is_nan() {
            A::nan()
        } else {
            acc.max(v.abs())
        }
    })
}

fn outer<A: NdFloat>(a: &Array1<A>, b: &Array1<A>) -> Array2<A> {
    a.view()
        .insert_axis(Axis(1))
        .dot(&b.view().insert_axis(Axis(0)))
}

// -H g, or steepest descent with H reset to the identity once H has lost
// positive definiteness (rounding, or a non-finite update)
fn descent_direction<A: NdFloat>(H: &mut Array2<A>, g: &Array1<A>) -> (Array1<A>, A) {
    let dir = -H.dot(g);
    let slope = g.dot(&dir);
    if slope < A::zero() {
        return (dir, slope);
    }
    *H = Array2::eye(g.len());
    let dir = -g.to_owned();
    let slope = g.dot(&dir);
    (dir, slope)
}

/// Broyden Fletcher Goldfarb Shanno (BFGS) quasi-Newton minimization
///
/// Minimizes a smooth, unconstrained objective $`f`$ with a known gradient,
/// keeping a dense approximation $`H_k`$ of the inverse Hessian.
/// See also [Wikipedia](https://en.wikipedia.org/wiki/BFGS_method).
///
/// Algorithm
/// ---------
/// ```math
/// \begin{aligned}
/// d_k &= -H_k \nabla f(x_k) \\
/// x_{k+1} &= x_k + \alpha_k d_k \quad \text{(backtracking Armijo)} \\
/// s_k &= x_{k+1} - x_k, \quad y_k = \nabla f(x_{k+1}) - \nabla f(x_k) \\
/// \rho_k &= 1/y_k^Ts_k \\
/// H_{k+1} &= (I - \rho_k s_k y_k^T)H_k(I - \rho_k y_k s_k^T) + \rho_k s_k s_k^T
/// \end{aligned}
/// ```
/// with $`H_0 = I`$. The update is skipped whenever $`y_k^Ts_k \leq 0`$, and
/// $`H_k`$ is reset to the identity if $`d_k`$ stops being a descent direction.
///
/// Parameters
/// ----------
/// - __func:__      objective function
/// - __fgrad:__     gradient of `func`
/// - __x0:__        initial guess
/// - __options:__   tolerance, iteration limit and line search parameters
/// - __callback:__  user-defined function to be evaluated with two arguments (x,iter).
///                   It is evaluated at (x0,0) and then after each iteration.
///                   If it returns True, the function terminates early.
///
/// The solver never fails: whatever stopped it is reported in
/// [`BfgsOutcome::termination`](struct.BfgsOutcome.html#structfield.termination)
/// and the best iterate is returned.
pub fn bfgs<A: NdFloat>(
    func: impl Fn(ArrayView1<A>) -> A,
    fgrad: impl Fn(ArrayView1<A>) -> Array1<A>,
    x0: ArrayView1<A>,
    options: &BfgsOptions<A>,
    mut callback: impl FnMut(ArrayView1<A>, usize) -> bool,
) -> BfgsOutcome<A> {
    let n = x0.len();
    let maxiter = options.maxiter.unwrap_or(200 * n);

    let mut x = x0.to_owned();
    let mut fx = func(x.view());
    let mut g = fgrad(x.view());
    let mut gnorm = inf_norm(&g);
    let mut H = Array2::<A>::eye(n);
    let mut func_evals = 1;
    let mut iterations = 0;

    let termination = if callback(x.view(), 0) {
        TerminationReason::Callback
    } else {
        loop {
            if !(fx.is_finite() && gnorm.is_finite()) {
                break TerminationReason::NumericalError;
            }
            if gnorm <= options.gtol {
                break TerminationReason::GradientNorm;
            }
            if iterations >= maxiter {
                break TerminationReason::MaxIterations;
            }
            iterations += 1;

            let (dir, slope) = descent_direction(&mut H, &g);

            let step = match backtracking_armijo(
                &func,
                x.view(),
                dir.view(),
                fx,
                slope,
                &options.armijo,
            ) {
                Some(step) => step,
                None => break TerminationReason::LineSearchFailed,
            };
            func_evals += step.evals;

            let s = dir * step.alpha;
            x += &s;
            fx = step.value;
            let g_new = fgrad(x.view());
            let y = &g_new - &g;
            g = g_new;
            gnorm = inf_norm(&g);

            let ys = y.dot(&s);
            if ys > A::zero() {
                // H + (ys + y'Hy)/ys^2 ss' - (Hy s' + s y'H)/ys
                let Hy = H.dot(&y);
                let yHy = y.dot(&Hy);
                let ss = outer(&s, &s) * ((ys + yHy) / (ys * ys));
                let cross = (outer(&Hy, &s) + outer(&s, &Hy)) / ys;
                H = H + ss - cross;
            }
            log::trace!(
                "bfgs iter {}: f = {:e}, |g|_inf = {:e}, alpha = {:e}",
                iterations,
                fx,
                gnorm,
                step.alpha
            );

            if callback(x.view(), iterations) {
                break TerminationReason::Callback;
            }
        }
    };

    log::debug!(
        "bfgs: {} after {} iterations ({} evaluations), f = {:e}, |g|_inf = {:e}",
        termination,
        iterations,
        func_evals,
        fx,
        gnorm
    );
    BfgsOutcome {
        x,
        value: fx,
        gradient_norm: gnorm,
        iterations,
        func_evals,
        termination,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smooth::nop;
    use approx::assert_abs_diff_eq;

    #[test]
    fn bfgs_simple_regression() {
        let A = array![[10., 0.], [0., 20.]];
        let y = array![50., 100.];
        let x0 = array![19., 44.];
        let res = bfgs(
            |x| 0.5 * (A.dot(&x) - &y).mapv(|r| r * r).sum(),
            |x| A.t().dot(&(A.dot(&x) - &y)),
            x0.view(),
            &BfgsOptions::default(),
            nop,
        );
        assert!(res.converged(), "{}", res.termination);
        assert_abs_diff_eq!(res.x, array![5., 5.], epsilon = 1e-6);
        assert!(res.gradient_norm <= 1e-5);
        // x0 is untouched
        assert_eq!(x0, array![19., 44.]);
    }

    #[test]
    fn bfgs_rosenbrock() {
        let func =
            |x: ArrayView1<f64>| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2);
        let grad = |x: ArrayView1<f64>| {
            array![
                -2.0 * (1.0 - x[0]) - 400.0 * x[0] * (x[1] - x[0].powi(2)),
                200.0 * (x[1] - x[0].powi(2))
            ]
        };
        let x0 = array![-1.2, 1.0];
        let res = bfgs(func, grad, x0.view(), &BfgsOptions::default(), nop);
        println!("{:?}", res);
        assert_abs_diff_eq!(res.x, array![1., 1.], epsilon = 1e-3);
    }

    #[test]
    fn bfgs_iteration_limit() {
        let func =
            |x: ArrayView1<f64>| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2);
        let grad = |x: ArrayView1<f64>| {
            array![
                -2.0 * (1.0 - x[0]) - 400.0 * x[0] * (x[1] - x[0].powi(2)),
                200.0 * (x[1] - x[0].powi(2))
            ]
        };
        let options = BfgsOptions {
            maxiter: Some(2),
            ..BfgsOptions::default()
        };
        let x0 = array![-1.2, 1.0];
        let res = bfgs(func, grad, x0.view(), &options, nop);
        assert_eq!(res.termination, TerminationReason::MaxIterations);
        assert_eq!(res.iterations, 2);
        assert!(!res.converged());
        assert!(res.value < func(x0.view()));
    }

    #[test]
    fn bfgs_bad_gradient_fails_line_search() {
        // gradient with the wrong sign, every step goes uphill
        let x0 = array![3.0f64];
        let res = bfgs(
            |x| x[0] * x[0],
            |x| array![-2.0 * x[0]],
            x0.view(),
            &BfgsOptions::default(),
            nop,
        );
        assert_eq!(res.termination, TerminationReason::LineSearchFailed);
        assert_eq!(res.x, x0);
    }

    #[test]
    fn bfgs_callback_stops() {
        let mut calls = Vec::new();
        let res = bfgs(
            |x| x.dot(&x),
            |x| &x * 2.0,
            array![1.0f32, -2.0].view(),
            &BfgsOptions::default(),
            |_x, iter| {
                calls.push(iter);
                iter == 1
            },
        );
        assert_eq!(res.termination, TerminationReason::Callback);
        assert_eq!(calls, vec![0, 1]);
    }

    #[test]
    fn bfgs_nan_gradient_is_numerical_error() {
        let x0 = array![0.0, 1.0];
        let res = bfgs(
            |x| x.dot(&x),
            |_x| array![f64::NAN, 0.0],
            x0.view(),
            &BfgsOptions::default(),
            nop,
        );
        assert_eq!(res.termination, TerminationReason::NumericalError);
        assert!(!res.converged());
        assert!(res.gradient_norm.is_nan());
        assert_eq!(res.iterations, 0);
        assert_eq!(res.x, x0);
    }

    #[test]
    fn descent_direction_resets_indefinite_hessian() {
        let g = array![1.0, -2.0];
        let mut H = array![[-1.0, 0.0], [0.0, 0.1]];
        let (dir, slope) = descent_direction(&mut H, &g);
        assert_eq!(H, Array2::eye(2));
        assert_eq!(dir, array![-1.0, 2.0]);
        assert_eq!(slope, -5.0);

        // a positive definite H is kept
        let mut H = array![[2.0, 0.0], [0.0, 1.0]];
        let (dir, slope) = descent_direction(&mut H, &g);
        assert_eq!(H, array![[2.0, 0.0], [0.0, 1.0]]);
        assert_eq!(dir, array![-2.0, 2.0]);
        assert_eq!(slope, -6.0);
    }

    #[test]
    fn bfgs_nonconvex_start() {
        // negative curvature at x0, the first updates are skipped
        let func = |x: ArrayView1<f64>| x[0].powi(4) - 2.0 * x[0].powi(2) + x[1] * x[1];
        let grad = |x: ArrayView1<f64>| array![4.0 * x[0].powi(3) - 4.0 * x[0], 2.0 * x[1]];
        let x0 = array![0.1, 1.0];
        let res = bfgs(func, grad, x0.view(), &BfgsOptions::default(), nop);
        assert!(res.converged(), "{}", res.termination);
        assert_abs_diff_eq!(res.x, array![1.0, 0.0], epsilon = 1e-4);
    }

    #[test]
    fn inf_norm_keeps_nan() {
        assert!(inf_norm(&array![1.0, f64::NAN, 3.0]).is_nan());
        assert!(inf_norm(&array![f64::NAN, 0.0]).is_nan());
        assert_eq!(inf_norm(&array![-4.0, 2.0]), 4.0);
    }

    #[test]
    fn bfgs_start_at_minimum() {
        let res = bfgs(
            |x| x.dot(&x),
            |x| &x * 2.0,
            array![0.0, 0.0].view(),
            &BfgsOptions::default(),
            nop,
        );
        assert!(res.converged());
        assert_eq!(res.iterations, 0);
        assert_eq!(res.func_evals, 1);
    }
}

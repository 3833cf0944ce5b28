use ndarray::prelude::*;
use ndarray::NdFloat;

/// Parameters for the backtracking Armijo line search.
#[derive(Debug, Clone)]
pub struct ArmijoParams<A> {
    /// Sufficient decrease parameter (default: 1e-4).
    pub c: A,
    /// Backtracking factor (default: 0.5).
    pub shrink: A,
    /// Initial step size (default: 1.0).
    pub alpha_init: A,
    /// Smallest step tried before giving up (default: machine epsilon).
    pub alpha_min: A,
}

impl<A: NdFloat> Default for ArmijoParams<A> {
    fn default() -> Self {
        ArmijoParams {
            c: A::from(1e-4).unwrap(),
            shrink: A::from(0.5).unwrap(),
            alpha_init: A::one(),
            alpha_min: A::epsilon(),
        }
    }
}

/// Accepted step of a line search.
#[derive(Debug, Clone)]
pub struct LineSearchStep<A> {
    pub alpha: A,
    /// Objective at `x + alpha * dir`
    pub value: A,
    /// Number of objective evaluations used
    pub evals: usize,
}

/// Backtracking line search satisfying the Armijo (sufficient decrease) condition
///
/// Searches for the largest `alpha = alpha_init * shrink^k` with
/// ```math
/// f(x + \alpha d) \leq f(x) + c \alpha \nabla f(x)^T d
/// ```
/// where `slope` $`= \nabla f(x)^T d`$ must be negative.
/// Non-finite trial values never satisfy the condition, so the search
/// backs away from regions where the objective overflows.
///
/// Returns `None` if `dir` is not a descent direction or `alpha` drops
/// below `alpha_min`.
pub fn backtracking_armijo<A: NdFloat>(
    func: impl Fn(ArrayView1<A>) -> A,
    x: ArrayView1<A>,
    dir: ArrayView1<A>,
    fx: A,
    slope: A,
    params: &ArmijoParams<A>,
) -> Option<LineSearchStep<A>> {
    if !(slope < A::zero()) {
        return None;
    }

    let mut alpha = params.alpha_init;
    let mut evals = 0;
    while alpha >= params.alpha_min {
        let trial = &dir * alpha + &x;
        let value = func(trial.view());
        evals += 1;
        if value <= fx + params.c * alpha * slope {
            return Some(LineSearchStep {
                alpha,
                value,
                evals,
            });
        }
        alpha = alpha * params.shrink;
    }
    None
}

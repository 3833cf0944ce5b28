use ndarray::prelude::*;

use crate::error::Result;

/// Number of optimizer steps [`Sfo`](struct.Sfo.html) takes unless told otherwise.
pub const DEFAULT_SFO_STEPS: usize = 50;

/// Capability of an external Sum-of-Functions optimizer (SFO) [\[SPG14\]](#references)
///
/// SFO minimizes objectives that split into a sum over minibatches. To be
/// used as a proximal operator it must support an extra quadratic term
/// pulling towards a previous consensus point. The optimizer owns all of its
/// state; [`sfo`](fn.sfo.html) only touches it through these methods.
///
/// References
/// ----------
/// \[SPG14\]: [ Sohl-Dickstein J, Poole B, Ganguli S,
///              "Fast large-scale optimization by unifying stochastic
///              gradient and quasi-Newton methods",
///              ICML (2014) ](http://arxiv.org/abs/1311.2115)
pub trait SumOfFunctions<A, D: Dimension> {
    /// Overwrite the current parameters with `theta` and the weight of the
    /// proximal term with `weight`.
    fn set_theta(&mut self, theta: ArrayView<A, D>, weight: A);

    /// Flatten parameters in their original shape to the optimizer's internal
    /// vector layout. Must not change any state.
    fn theta_original_to_flat(&self, theta: ArrayView<A, D>) -> Array1<A>;

    /// Overwrite the previous consensus point the proximal term pulls towards.
    fn set_theta_admm_prev(&mut self, theta_flat: Array1<A>);

    /// Take `num_steps` optimization steps from the current parameters and
    /// return the resulting flat parameter vector.
    fn optimize(&mut self, num_steps: usize) -> Result<Array1<A>>;
}

/// Proximal operator of a sum of minibatch functions, delegated to an external optimizer
///
/// Moves the optimizer to `x0` with proximal weight `rho`, records `x0` as
/// the previous consensus point and runs `num_steps` optimizer steps.
///
/// Unlike the other operators this one has side effects: the current
/// parameters, the proximal weight and the previous consensus point of
/// `optimizer` are overwritten, and `optimize` advances whatever internal
/// state the optimizer keeps. Reusing one optimizer across outer iterations
/// is the intended use, so that its curvature estimates carry over.
pub fn sfo<A, D, O>(
    x0: ArrayView<A, D>,
    rho: A,
    optimizer: &mut O,
    num_steps: usize,
) -> Result<Array1<A>>
where
    D: Dimension,
    O: SumOfFunctions<A, D> + ?Sized,
{
    optimizer.set_theta(x0.view(), rho);
    let prev = optimizer.theta_original_to_flat(x0);
    optimizer.set_theta_admm_prev(prev);
    log::trace!("sfo: running {} steps", num_steps);
    optimizer.optimize(num_steps)
}

/// [`sfo`](fn.sfo.html) with `rho`, the step budget and the optimizer bound
///
/// Holds the optimizer mutably for its whole lifetime, so no other
/// evaluation can interleave with it.
pub struct Sfo<'a, A, O: ?Sized> {
    pub rho: A,
    pub num_steps: usize,
    optimizer: &'a mut O,
}

impl<'a, A, O: ?Sized> Sfo<'a, A, O> {
    pub fn new(rho: A, optimizer: &'a mut O) -> Self {
        Self::with_steps(rho, optimizer, DEFAULT_SFO_STEPS)
    }

    pub fn with_steps(rho: A, optimizer: &'a mut O, num_steps: usize) -> Self {
        Sfo {
            rho,
            num_steps,
            optimizer,
        }
    }

    pub fn optimizer(&self) -> &O {
        &*self.optimizer
    }

    pub fn apply<D>(&mut self, x0: ArrayView<A, D>) -> Result<Array1<A>>
    where
        A: Copy,
        D: Dimension,
        O: SumOfFunctions<A, D>,
    {
        sfo(x0, self.rho, &mut *self.optimizer, self.num_steps)
    }
}

use crate::error::Result;

/// A first-order system `dx/dt = f(t, x)` over a flat state vector.
pub trait DynamicalSystem {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field.
    /// t: current time
    /// x: current state
    /// out: buffer receiving dx/dt
    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) -> Result<()>;
}

/// A trait for solvers that can step a system forward (or backward).
pub trait Steppable {
    /// Performs one step of size dt.
    /// t: current time (updated after step)
    /// state: current state (updated after step)
    /// dt: step size, negative for backward integration
    fn step(
        &mut self,
        system: &impl DynamicalSystem,
        t: &mut f64,
        state: &mut [f64],
        dt: f64,
    ) -> Result<()>;
}

//! Contribution providers for the time derivative of the state vector.
//!
//! A [`Dynamics`] declares the coordinates subsets it reads and the ones it
//! writes. [`DynamicsSystem`] gathers the read slices out of the flat vector
//! and sums every contribution into the derivative of the written subsets,
//! so any number of providers may write the same subset.

mod central_body_gravity;
mod position_derivative;
mod system;
mod thruster;

use std::fmt;
use std::sync::Arc;

use nalgebra::DVector;

use crate::coordinates::CoordinatesSubset;
use crate::error::Result;
use crate::frame::Frame;

pub use central_body_gravity::CentralBodyGravity;
pub use position_derivative::PositionDerivative;
pub use system::DynamicsSystem;
pub use thruster::Thruster;

pub trait Dynamics: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn is_defined(&self) -> bool {
        true
    }

    /// Subsets whose values are handed to [`Dynamics::compute_contribution`],
    /// concatenated in this order.
    fn read_coordinates_subsets(&self) -> Vec<Arc<dyn CoordinatesSubset>>;

    /// Subsets receiving the contribution, concatenated in this order.
    fn write_coordinates_subsets(&self) -> Vec<Arc<dyn CoordinatesSubset>>;

    /// Time derivative contribution sized to the total write width.
    fn compute_contribution(
        &self,
        instant: f64,
        x: &DVector<f64>,
        frame: &Arc<Frame>,
    ) -> Result<DVector<f64>>;
}

/// Total size of the subsets written by `dynamics`.
pub fn write_size(dynamics: &dyn Dynamics) -> usize {
    dynamics
        .write_coordinates_subsets()
        .iter()
        .map(|subset| subset.size())
        .sum()
}

/// Identity of a shared dynamics instance.
pub fn is_same(lhs: &Arc<dyn Dynamics>, rhs: &Arc<dyn Dynamics>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(lhs), Arc::as_ptr(rhs))
}

impl fmt::Display for dyn Dynamics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |subsets: Vec<Arc<dyn CoordinatesSubset>>| {
            subsets
                .iter()
                .map(|subset| subset.name().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(
            f,
            "{} (reads [{}], writes [{}])",
            self.name(),
            names(self.read_coordinates_subsets()),
            names(self.write_coordinates_subsets())
        )
    }
}

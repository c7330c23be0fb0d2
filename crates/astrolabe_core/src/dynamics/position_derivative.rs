use std::sync::Arc;

use nalgebra::DVector;

use super::Dynamics;
use crate::coordinates::{CartesianPosition, CartesianVelocity, CoordinatesSubset};
use crate::error::Result;
use crate::frame::Frame;

/// Kinematic relation `dr/dt = v`.
#[derive(Debug, Clone, Default)]
pub struct PositionDerivative;

impl PositionDerivative {
    pub fn new() -> Self {
        Self
    }
}

impl Dynamics for PositionDerivative {
    fn name(&self) -> &str {
        "Position Derivative"
    }

    fn read_coordinates_subsets(&self) -> Vec<Arc<dyn CoordinatesSubset>> {
        vec![CartesianVelocity::default_subset()]
    }

    fn write_coordinates_subsets(&self) -> Vec<Arc<dyn CoordinatesSubset>> {
        vec![CartesianPosition::default_subset()]
    }

    fn compute_contribution(
        &self,
        _instant: f64,
        x: &DVector<f64>,
        _frame: &Arc<Frame>,
    ) -> Result<DVector<f64>> {
        Ok(x.clone())
    }
}

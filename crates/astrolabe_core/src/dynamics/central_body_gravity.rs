use std::sync::Arc;

use nalgebra::{DVector, Vector3};

use super::Dynamics;
use crate::constants::EARTH_GRAVITATIONAL_PARAMETER;
use crate::coordinates::{CartesianPosition, CartesianVelocity, CoordinatesSubset};
use crate::error::{Error, Result};
use crate::frame::Frame;

/// Point-mass gravity of a central body sitting at the frame origin.
#[derive(Debug, Clone)]
pub struct CentralBodyGravity {
    name: String,
    gravitational_parameter: f64,
}

impl CentralBodyGravity {
    /// `gravitational_parameter` in m³/s².
    pub fn new(name: impl Into<String>, gravitational_parameter: f64) -> Self {
        Self {
            name: name.into(),
            gravitational_parameter,
        }
    }

    pub fn earth() -> Self {
        Self::new("Central Body Gravity [Earth]", EARTH_GRAVITATIONAL_PARAMETER)
    }

    pub fn gravitational_parameter(&self) -> f64 {
        self.gravitational_parameter
    }
}

impl Dynamics for CentralBodyGravity {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_defined(&self) -> bool {
        self.gravitational_parameter.is_finite() && self.gravitational_parameter > 0.0
    }

    fn read_coordinates_subsets(&self) -> Vec<Arc<dyn CoordinatesSubset>> {
        vec![CartesianPosition::default_subset()]
    }

    fn write_coordinates_subsets(&self) -> Vec<Arc<dyn CoordinatesSubset>> {
        vec![CartesianVelocity::default_subset()]
    }

    fn compute_contribution(
        &self,
        _instant: f64,
        x: &DVector<f64>,
        _frame: &Arc<Frame>,
    ) -> Result<DVector<f64>> {
        let position = Vector3::new(x[0], x[1], x[2]);
        let radius = position.norm();
        if radius == 0.0 {
            return Err(Error::Runtime(format!(
                "[{}] evaluated at the central body origin.",
                self.name
            )));
        }

        let acceleration = -self.gravitational_parameter / radius.powi(3) * position;
        Ok(DVector::from_column_slice(acceleration.as_slice()))
    }
}

use std::sync::Arc;

use nalgebra::{DVector, Vector3};

use super::Dynamics;
use crate::coordinates::{CartesianPosition, CartesianVelocity, CoordinatesSubset, ScalarSubset};
use crate::error::{Error, Result};
use crate::flight::SatelliteSystem;
use crate::frame::Frame;
use crate::guidance_law::GuidanceLaw;

/// Constant-thrust engine steered by a guidance law.
///
/// Reads position, velocity and mass. Writes the thrust acceleration into
/// the velocity derivative and the propellant flow into the mass derivative.
#[derive(Debug, Clone)]
pub struct Thruster {
    name: String,
    satellite_system: SatelliteSystem,
    guidance_law: Arc<dyn GuidanceLaw>,
}

impl Thruster {
    pub fn new(satellite_system: SatelliteSystem, guidance_law: Arc<dyn GuidanceLaw>) -> Self {
        Self {
            name: format!("Thruster [{}]", guidance_law.name()),
            satellite_system,
            guidance_law,
        }
    }

    pub fn satellite_system(&self) -> &SatelliteSystem {
        &self.satellite_system
    }

    pub fn guidance_law(&self) -> &Arc<dyn GuidanceLaw> {
        &self.guidance_law
    }
}

impl Dynamics for Thruster {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_defined(&self) -> bool {
        self.satellite_system.propulsion.validate().is_ok()
    }

    fn read_coordinates_subsets(&self) -> Vec<Arc<dyn CoordinatesSubset>> {
        vec![
            CartesianPosition::default_subset(),
            CartesianVelocity::default_subset(),
            ScalarSubset::mass(),
        ]
    }

    fn write_coordinates_subsets(&self) -> Vec<Arc<dyn CoordinatesSubset>> {
        vec![CartesianVelocity::default_subset(), ScalarSubset::mass()]
    }

    fn compute_contribution(
        &self,
        instant: f64,
        x: &DVector<f64>,
        frame: &Arc<Frame>,
    ) -> Result<DVector<f64>> {
        let position = Vector3::new(x[0], x[1], x[2]);
        let velocity = Vector3::new(x[3], x[4], x[5]);
        let mass = x[6];

        if mass <= self.satellite_system.dry_mass {
            return Err(Error::Runtime("Out of fuel.".to_string()));
        }

        let propulsion = &self.satellite_system.propulsion;
        let acceleration = self
            .guidance_law
            .calculate_thrust_acceleration_at(
                instant,
                &position,
                &velocity,
                propulsion.acceleration(mass),
                frame,
            )
            .map_err(|err| Error::collaborator(format!("[{}]", self.name), err))?;

        Ok(DVector::from_vec(vec![
            acceleration.x,
            acceleration.y,
            acceleration.z,
            -propulsion.mass_flow_rate(),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight::PropulsionSystem;
    use crate::guidance_law::ConstantThrust;

    fn thruster() -> Thruster {
        let propulsion = PropulsionSystem::new(1.0, 1500.0).unwrap();
        let satellite = SatelliteSystem::new(100.0, propulsion).unwrap();
        Thruster::new(satellite, Arc::new(ConstantThrust::intrack()))
    }

    #[test]
    fn contribution_is_thrust_over_mass_and_mass_flow() {
        let x = DVector::from_vec(vec![7.0e6, 0.0, 0.0, 0.0, 7.5e3, 0.0, 200.0]);
        let contribution = thruster()
            .compute_contribution(0.0, &x, &Frame::gcrf())
            .unwrap();

        assert_eq!(contribution.len(), 4);
        assert!(contribution[0].abs() < 1e-15);
        assert!((contribution[1] - 1.0 / 200.0).abs() < 1e-15);
        assert!((contribution[3] + 1.0 / (1500.0 * 9.80665)).abs() < 1e-18);
    }

    #[test]
    fn dry_spacecraft_is_out_of_fuel() {
        let x = DVector::from_vec(vec![7.0e6, 0.0, 0.0, 0.0, 7.5e3, 0.0, 100.0]);
        let err = thruster()
            .compute_contribution(0.0, &x, &Frame::gcrf())
            .expect_err("mass equals dry mass");
        assert!(matches!(err, Error::Runtime(ref message) if message == "Out of fuel."));
    }
}

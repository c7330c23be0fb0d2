//! Spacecraft properties consumed by thrust-producing dynamics.

use serde::{Deserialize, Serialize};

use crate::constants::STANDARD_GRAVITY;
use crate::error::{Error, Result};

/// Constant-thrust engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropulsionSystem {
    /// Thrust [N].
    pub thrust: f64,
    /// Specific impulse [s].
    pub specific_impulse: f64,
}

impl PropulsionSystem {
    pub fn new(thrust: f64, specific_impulse: f64) -> Result<Self> {
        let propulsion = Self {
            thrust,
            specific_impulse,
        };
        propulsion.validate()?;
        Ok(propulsion)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.thrust.is_finite() || self.thrust <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "Thrust must be positive, got {}.",
                self.thrust
            )));
        }
        if !self.specific_impulse.is_finite() || self.specific_impulse <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "Specific impulse must be positive, got {}.",
                self.specific_impulse
            )));
        }
        Ok(())
    }

    /// Propellant mass flow rate `F / (Isp g0)` [kg/s].
    pub fn mass_flow_rate(&self) -> f64 {
        self.thrust / (self.specific_impulse * STANDARD_GRAVITY)
    }

    /// Thrust acceleration magnitude at `mass` [m/s²].
    pub fn acceleration(&self, mass: f64) -> f64 {
        self.thrust / mass
    }
}

/// Spacecraft bus: dry mass plus its engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SatelliteSystem {
    /// Mass without propellant [kg].
    pub dry_mass: f64,
    pub propulsion: PropulsionSystem,
}

impl SatelliteSystem {
    pub fn new(dry_mass: f64, propulsion: PropulsionSystem) -> Result<Self> {
        if !dry_mass.is_finite() || dry_mass <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "Dry mass must be positive, got {dry_mass}."
            )));
        }
        propulsion.validate()?;
        Ok(Self {
            dry_mass,
            propulsion,
        })
    }
}

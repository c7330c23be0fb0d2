//! Thrust direction laws.
//!
//! Guidance algorithms are external collaborators; [`ConstantThrust`] is the
//! one law the core ships, fixed either in inertial axes or in the local
//! velocity-normal-conormal (VNC) axes of the orbit.

use std::fmt;

use anyhow::{bail, Result};
use nalgebra::{Matrix3, Unit, Vector3};
use serde::{Deserialize, Serialize};

use crate::frame::Frame;

pub trait GuidanceLaw: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Thrust acceleration vector, resolved in `frame`, for a thrust
    /// acceleration magnitude of `thrust_acceleration`.
    fn calculate_thrust_acceleration_at(
        &self,
        instant: f64,
        position: &Vector3<f64>,
        velocity: &Vector3<f64>,
        thrust_acceleration: f64,
        frame: &Frame,
    ) -> Result<Vector3<f64>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThrustAxes {
    Inertial,
    /// x along velocity, y along orbital angular momentum, z completes.
    Vnc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantThrust {
    direction: Unit<Vector3<f64>>,
    axes: ThrustAxes,
}

impl ConstantThrust {
    pub fn new(direction: Vector3<f64>, axes: ThrustAxes) -> Result<Self> {
        let Some(direction) = Unit::try_new(direction, f64::EPSILON) else {
            bail!("Thrust direction must be a non-zero vector.");
        };
        Ok(Self { direction, axes })
    }

    /// Thrust along the velocity vector.
    pub fn intrack() -> Self {
        Self {
            direction: Vector3::x_axis(),
            axes: ThrustAxes::Vnc,
        }
    }

    pub fn inertial(direction: Vector3<f64>) -> Result<Self> {
        Self::new(direction, ThrustAxes::Inertial)
    }

    pub fn direction(&self) -> &Unit<Vector3<f64>> {
        &self.direction
    }

    pub fn axes(&self) -> ThrustAxes {
        self.axes
    }
}

fn vnc_rotation(position: &Vector3<f64>, velocity: &Vector3<f64>) -> Result<Matrix3<f64>> {
    let momentum = position.cross(velocity);
    let (Some(v), Some(n)) = (
        Unit::try_new(*velocity, f64::EPSILON),
        Unit::try_new(momentum, f64::EPSILON),
    ) else {
        bail!("VNC axes are undefined for a rectilinear or zero-velocity state.");
    };
    let c = v.into_inner().cross(&n.into_inner());
    Ok(Matrix3::from_columns(&[v.into_inner(), n.into_inner(), c]))
}

impl GuidanceLaw for ConstantThrust {
    fn name(&self) -> &str {
        "Constant Thrust"
    }

    fn calculate_thrust_acceleration_at(
        &self,
        _instant: f64,
        position: &Vector3<f64>,
        velocity: &Vector3<f64>,
        thrust_acceleration: f64,
        _frame: &Frame,
    ) -> Result<Vector3<f64>> {
        let direction = match self.axes {
            ThrustAxes::Inertial => self.direction.into_inner(),
            ThrustAxes::Vnc => vnc_rotation(position, velocity)? * self.direction.into_inner(),
        };
        Ok(thrust_acceleration * direction)
    }
}

//! Fixtures shared by the unit tests.

use std::f64::consts::TAU;
use std::sync::Arc;

use nalgebra::{DVector, Rotation3, Vector3};

use crate::constants::EARTH_GRAVITATIONAL_PARAMETER;
use crate::coordinates::{CartesianPosition, CartesianVelocity, CoordinatesBroker, ScalarSubset};
use crate::dynamics::{CentralBodyGravity, Dynamics, PositionDerivative};
use crate::frame::{Frame, Transform, TransformProvider};
use crate::state::State;

struct Spin {
    rate: f64,
}

impl TransformProvider for Spin {
    fn transform_to_parent(&self, instant: f64) -> anyhow::Result<Transform> {
        Ok(Transform::new(
            Rotation3::from_axis_angle(&Vector3::z_axis(), self.rate * instant),
            Vector3::zeros(),
            Vector3::zeros(),
            Vector3::new(0.0, 0.0, self.rate),
        ))
    }
}

struct Offset {
    translation: Vector3<f64>,
}

impl TransformProvider for Offset {
    fn transform_to_parent(&self, _instant: f64) -> anyhow::Result<Transform> {
        Ok(Transform::new(
            Rotation3::identity(),
            self.translation,
            Vector3::zeros(),
            Vector3::zeros(),
        ))
    }
}

/// Frame spinning about the GCRF z axis at `rate` [rad/s].
pub fn rotating_frame(rate: f64) -> Arc<Frame> {
    Frame::child(format!("Rotating [{rate}]"), Frame::gcrf(), Arc::new(Spin { rate }))
}

/// GCRF-aligned frame whose origin sits at `translation` in GCRF.
pub fn translated_frame(translation: Vector3<f64>) -> Arc<Frame> {
    Frame::child("Translated", Frame::gcrf(), Arc::new(Offset { translation }))
}

/// Position, velocity and mass.
pub fn mass_broker() -> Arc<CoordinatesBroker> {
    Arc::new(CoordinatesBroker::new([
        CartesianPosition::default_subset(),
        CartesianVelocity::default_subset(),
        ScalarSubset::mass(),
    ]))
}

/// Near-circular low Earth orbit at the x axis, moving along y.
pub fn leo_state() -> State {
    State::from_position_velocity(
        0.0,
        Vector3::new(7.0e6, 0.0, 0.0),
        Vector3::new(0.0, 7546.05329, 0.0),
        Frame::gcrf(),
    )
}

pub fn leo_state_with_mass(mass: f64) -> State {
    let coordinates = DVector::from_vec(vec![7.0e6, 0.0, 0.0, 0.0, 7546.05329, 0.0, mass]);
    State::new(0.0, coordinates, Frame::gcrf(), mass_broker()).expect("consistent fixture")
}

pub fn two_body() -> Vec<Arc<dyn Dynamics>> {
    vec![
        Arc::new(PositionDerivative::new()),
        Arc::new(CentralBodyGravity::earth()),
    ]
}

/// Two-body specific orbital energy [J/kg].
pub fn specific_energy(state: &State) -> f64 {
    let r = state.position().expect("position").norm();
    let v = state.velocity().expect("velocity").norm();
    0.5 * v * v - EARTH_GRAVITATIONAL_PARAMETER / r
}

/// Two-body orbital period [s].
pub fn orbital_period(state: &State) -> f64 {
    let semi_major_axis = -EARTH_GRAVITATIONAL_PARAMETER / (2.0 * specific_energy(state));
    TAU * (semi_major_axis.powi(3) / EARTH_GRAVITATIONAL_PARAMETER).sqrt()
}

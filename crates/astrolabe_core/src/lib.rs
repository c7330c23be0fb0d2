//! The `astrolabe_core` crate is the propagation engine behind Astrolabe
//! mission planning.
//!
//! Key components:
//! - **Coordinates**: `CoordinatesSubset` slices laid out in a flat vector by a `CoordinatesBroker`.
//! - **Dynamics**: pluggable force models (`PositionDerivative`, `CentralBodyGravity`, `Thruster`)
//!   summed into one ODE by `DynamicsSystem`.
//! - **Solvers**: fixed and embedded Runge-Kutta steppers driven by `NumericalSolver`.
//! - **Event conditions**: stopping criteria refined to a precise instant by `RootSolver`.
//! - **Segments and sequences**: propagation legs and repeatable chains of legs.
pub mod constants;
pub mod coordinates;
pub mod dynamics;
pub mod error;
pub mod event_condition;
pub mod flight;
pub mod frame;
pub mod guidance_law;
pub mod numerical_solver;
pub mod root_solver;
pub mod segment;
pub mod sequence;
pub mod solvers;
pub mod state;
pub mod traits;

#[cfg(test)]
mod test_utils;

pub use error::{Error, Result};

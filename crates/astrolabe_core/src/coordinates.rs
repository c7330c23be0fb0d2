//! Coordinates subsets and the broker that lays them out in a flat vector.
//!
//! A propagated state is a single `DVector<f64>`. Each physical quantity
//! (position, velocity, mass, ...) is a [`CoordinatesSubset`] occupying a
//! contiguous slice of that vector; the [`CoordinatesBroker`] assigns the
//! offsets. Dynamics and guidance laws only ever address coordinates through
//! subsets, so they never need to know each other's layout.

mod broker;
mod cartesian;
mod subset;

pub use broker::CoordinatesBroker;
pub use cartesian::{CartesianPosition, CartesianVelocity};
pub use subset::{CoordinatesSubset, ScalarSubset};

use std::sync::{Arc, LazyLock};

use nalgebra::{DVector, Vector3};

use super::{CoordinatesBroker, CoordinatesSubset};
use crate::error::{Error, Result};
use crate::frame::Frame;

/// Cartesian position [m].
#[derive(Debug, Clone, PartialEq)]
pub struct CartesianPosition {
    name: String,
}

/// Cartesian velocity [m/s].
///
/// Changing frame requires the matching position (transport velocity of a
/// rotating frame), so the velocity subset knows which position subset it
/// pairs with.
#[derive(Debug, Clone)]
pub struct CartesianVelocity {
    name: String,
    position: Arc<dyn CoordinatesSubset>,
}

static POSITION: LazyLock<Arc<dyn CoordinatesSubset>> =
    LazyLock::new(|| Arc::new(CartesianPosition::new("CARTESIAN_POSITION")));

static VELOCITY: LazyLock<Arc<dyn CoordinatesSubset>> = LazyLock::new(|| {
    Arc::new(CartesianVelocity::paired(
        "CARTESIAN_VELOCITY",
        CartesianPosition::default_subset(),
    ))
});

impl CartesianPosition {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn default_subset() -> Arc<dyn CoordinatesSubset> {
        Arc::clone(&POSITION)
    }
}

impl CartesianVelocity {
    /// `position` must be a three-component subset.
    pub fn new(name: impl Into<String>, position: Arc<dyn CoordinatesSubset>) -> Result<Self> {
        if position.size() != 3 {
            return Err(Error::InvalidArgument(format!(
                "Velocity must pair with a 3-component position, [{}] has {}.",
                position.name(),
                position.size()
            )));
        }
        Ok(Self::paired(name, position))
    }

    fn paired(name: impl Into<String>, position: Arc<dyn CoordinatesSubset>) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }

    pub fn default_subset() -> Arc<dyn CoordinatesSubset> {
        Arc::clone(&VELOCITY)
    }

    pub fn position(&self) -> &Arc<dyn CoordinatesSubset> {
        &self.position
    }
}

fn vector3(values: &[f64]) -> Vector3<f64> {
    Vector3::new(values[0], values[1], values[2])
}

impl CoordinatesSubset for CartesianPosition {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> usize {
        3
    }

    fn in_frame(
        &self,
        instant: f64,
        coordinates: &DVector<f64>,
        from: &Frame,
        to: &Frame,
        broker: &CoordinatesBroker,
    ) -> Result<DVector<f64>> {
        let position = vector3(broker.subset_slice(coordinates, &self.name, 3)?);
        let position = from.transform_position(instant, &position, to)?;
        Ok(DVector::from_column_slice(position.as_slice()))
    }
}

impl CoordinatesSubset for CartesianVelocity {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> usize {
        3
    }

    fn in_frame(
        &self,
        instant: f64,
        coordinates: &DVector<f64>,
        from: &Frame,
        to: &Frame,
        broker: &CoordinatesBroker,
    ) -> Result<DVector<f64>> {
        let position = vector3(broker.subset_slice(
            coordinates,
            self.position.name(),
            self.position.size(),
        )?);
        let velocity = vector3(broker.subset_slice(coordinates, &self.name, 3)?);
        let (_, velocity) = from.transform_position_velocity(instant, &position, &velocity, to)?;
        Ok(DVector::from_column_slice(velocity.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinates::ScalarSubset;
    use crate::test_utils::rotating_frame;

    #[test]
    fn default_subsets_are_shared_instances() {
        assert!(Arc::ptr_eq(
            &CartesianPosition::default_subset(),
            &CartesianPosition::default_subset()
        ));
        assert_eq!(CartesianVelocity::default_subset().size(), 3);
    }

    #[test]
    fn velocity_transform_uses_paired_position() {
        let rate = 2e-3;
        let rotating = rotating_frame(rate);
        let broker = CoordinatesBroker::new([
            CartesianPosition::default_subset(),
            CartesianVelocity::default_subset(),
            ScalarSubset::mass(),
        ]);
        let x = DVector::from_vec(vec![0.0, 500.0, 0.0, 0.0, 0.0, 0.0, 10.0]);

        let velocity = CartesianVelocity::default_subset()
            .in_frame(0.0, &x, &rotating, &Frame::gcrf(), &broker)
            .expect("velocity transform");
        // ω × r with ω = rate ẑ and r = 500 ŷ.
        assert!((velocity[0] + rate * 500.0).abs() < 1e-12);
        assert!(velocity[1].abs() < 1e-12);

        let position = CartesianPosition::default_subset()
            .in_frame(0.0, &x, &rotating, &Frame::gcrf(), &broker)
            .expect("position transform");
        assert!((position[1] - 500.0).abs() < 1e-12);
    }

    #[test]
    fn velocity_pairs_only_with_cartesian_positions() {
        let velocity = CartesianVelocity::new("VELOCITY", CartesianPosition::default_subset())
            .expect("three-component position");
        assert_eq!(velocity.position().size(), 3);

        let err = CartesianVelocity::new("VELOCITY", ScalarSubset::mass())
            .expect_err("scalar position");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}

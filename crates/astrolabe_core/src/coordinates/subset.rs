use std::fmt;
use std::sync::{Arc, LazyLock};

use nalgebra::DVector;

use super::CoordinatesBroker;
use crate::error::{Error, Result};
use crate::frame::Frame;

/// A named, fixed-size slice of a flat coordinates vector.
///
/// Identity is the `(name, size)` pair. The default combination rules are
/// those of a frame-invariant quantity: component-wise addition and
/// subtraction, identity frame transform. Frame-dependent subsets override
/// [`CoordinatesSubset::in_frame`]; by the time `add`/`subtract` run, both
/// operands are already resolved in `frame`.
pub trait CoordinatesSubset: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn size(&self) -> usize;

    fn add(
        &self,
        _instant: f64,
        coordinates: &DVector<f64>,
        other_coordinates: &DVector<f64>,
        _frame: &Frame,
        broker: &CoordinatesBroker,
    ) -> Result<DVector<f64>> {
        let lhs = broker.subset_slice(coordinates, self.name(), self.size())?;
        let rhs = broker.subset_slice(other_coordinates, self.name(), self.size())?;
        Ok(DVector::from_iterator(
            lhs.len(),
            lhs.iter().zip(rhs).map(|(a, b)| a + b),
        ))
    }

    fn subtract(
        &self,
        _instant: f64,
        coordinates: &DVector<f64>,
        other_coordinates: &DVector<f64>,
        _frame: &Frame,
        broker: &CoordinatesBroker,
    ) -> Result<DVector<f64>> {
        let lhs = broker.subset_slice(coordinates, self.name(), self.size())?;
        let rhs = broker.subset_slice(other_coordinates, self.name(), self.size())?;
        Ok(DVector::from_iterator(
            lhs.len(),
            lhs.iter().zip(rhs).map(|(a, b)| a - b),
        ))
    }

    /// Value of this subset, read from `coordinates` resolved in `from`,
    /// expressed in `to`.
    fn in_frame(
        &self,
        _instant: f64,
        coordinates: &DVector<f64>,
        _from: &Frame,
        _to: &Frame,
        broker: &CoordinatesBroker,
    ) -> Result<DVector<f64>> {
        let values = broker.subset_slice(coordinates, self.name(), self.size())?;
        Ok(DVector::from_column_slice(values))
    }
}

impl PartialEq for dyn CoordinatesSubset {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name() && self.size() == other.size()
    }
}

/// Frame-invariant real-valued quantity (mass, area, coefficients, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarSubset {
    name: String,
    size: usize,
}

static MASS: LazyLock<Arc<dyn CoordinatesSubset>> =
    LazyLock::new(|| Arc::new(ScalarSubset::named("MASS", 1)));
static SURFACE_AREA: LazyLock<Arc<dyn CoordinatesSubset>> =
    LazyLock::new(|| Arc::new(ScalarSubset::named("SURFACE_AREA", 1)));
static DRAG_COEFFICIENT: LazyLock<Arc<dyn CoordinatesSubset>> =
    LazyLock::new(|| Arc::new(ScalarSubset::named("DRAG_COEFFICIENT", 1)));

impl ScalarSubset {
    pub fn new(name: impl Into<String>, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidArgument(
                "Coordinates subset size must be at least 1.".to_string(),
            ));
        }
        Ok(Self::named(name, size))
    }

    fn named(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    pub fn mass() -> Arc<dyn CoordinatesSubset> {
        Arc::clone(&MASS)
    }

    pub fn surface_area() -> Arc<dyn CoordinatesSubset> {
        Arc::clone(&SURFACE_AREA)
    }

    pub fn drag_coefficient() -> Arc<dyn CoordinatesSubset> {
        Arc::clone(&DRAG_COEFFICIENT)
    }
}

impl CoordinatesSubset for ScalarSubset {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> usize {
        self.size
    }
}

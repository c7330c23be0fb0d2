use std::collections::HashMap;
use std::ops::Range;
use std::sync::{Arc, LazyLock};

use nalgebra::DVector;

use super::{CartesianPosition, CartesianVelocity, CoordinatesSubset};
use crate::error::{Error, Result};

/// Registry assigning each coordinates subset a stable offset in the flat
/// coordinates vector.
///
/// Registration order is layout order. Registering a subset that is already
/// present is a no-op. Once a broker is shared behind an `Arc` it can no
/// longer be mutated, which freezes the layout for every state using it.
#[derive(Debug, Clone, Default)]
pub struct CoordinatesBroker {
    subsets: Vec<Arc<dyn CoordinatesSubset>>,
    offsets: HashMap<(String, usize), usize>,
    number_of_coordinates: usize,
}

static POSITION_VELOCITY: LazyLock<Arc<CoordinatesBroker>> = LazyLock::new(|| {
    Arc::new(CoordinatesBroker::new([
        CartesianPosition::default_subset(),
        CartesianVelocity::default_subset(),
    ]))
});

impl CoordinatesBroker {
    pub fn new(subsets: impl IntoIterator<Item = Arc<dyn CoordinatesSubset>>) -> Self {
        let mut broker = Self::default();
        for subset in subsets {
            broker.add_subset(subset);
        }
        broker
    }

    /// Shared broker holding the default Cartesian position and velocity.
    pub fn position_velocity() -> Arc<Self> {
        Arc::clone(&POSITION_VELOCITY)
    }

    /// Registers `subset` and returns its offset.
    pub fn add_subset(&mut self, subset: Arc<dyn CoordinatesSubset>) -> usize {
        let key = (subset.name().to_string(), subset.size());
        if let Some(&offset) = self.offsets.get(&key) {
            return offset;
        }

        let offset = self.number_of_coordinates;
        self.number_of_coordinates += subset.size();
        self.offsets.insert(key, offset);
        self.subsets.push(subset);
        offset
    }

    pub fn number_of_coordinates(&self) -> usize {
        self.number_of_coordinates
    }

    pub fn number_of_subsets(&self) -> usize {
        self.subsets.len()
    }

    pub fn subsets(&self) -> &[Arc<dyn CoordinatesSubset>] {
        &self.subsets
    }

    pub fn has_subset(&self, subset: &dyn CoordinatesSubset) -> bool {
        self.offsets
            .contains_key(&(subset.name().to_string(), subset.size()))
    }

    pub fn offset_of(&self, subset: &dyn CoordinatesSubset) -> Result<usize> {
        self.subset_range(subset.name(), subset.size())
            .map(|range| range.start)
    }

    /// Index range covered by the subset identified by `(name, size)`.
    pub fn subset_range(&self, name: &str, size: usize) -> Result<Range<usize>> {
        self.offsets
            .get(&(name.to_string(), size))
            .map(|&offset| offset..offset + size)
            .ok_or_else(|| Error::UndefinedCoordinates {
                name: name.to_string(),
                size,
            })
    }

    /// Slice of `coordinates` covered by the subset identified by `(name, size)`.
    pub fn subset_slice<'a>(
        &self,
        coordinates: &'a DVector<f64>,
        name: &str,
        size: usize,
    ) -> Result<&'a [f64]> {
        self.check_length(coordinates.len())?;
        let range = self.subset_range(name, size)?;
        Ok(&coordinates.as_slice()[range])
    }

    pub fn extract_coordinate(
        &self,
        coordinates: &DVector<f64>,
        subset: &dyn CoordinatesSubset,
    ) -> Result<DVector<f64>> {
        let values = self.subset_slice(coordinates, subset.name(), subset.size())?;
        Ok(DVector::from_column_slice(values))
    }

    /// Concatenation of the requested subsets, in the requested order.
    pub fn extract_coordinates(
        &self,
        coordinates: &DVector<f64>,
        subsets: &[Arc<dyn CoordinatesSubset>],
    ) -> Result<DVector<f64>> {
        let mut values = Vec::with_capacity(subsets.iter().map(|s| s.size()).sum());
        for subset in subsets {
            values.extend_from_slice(self.subset_slice(
                coordinates,
                subset.name(),
                subset.size(),
            )?);
        }
        Ok(DVector::from_vec(values))
    }

    pub(crate) fn check_length(&self, length: usize) -> Result<()> {
        if length != self.number_of_coordinates {
            return Err(Error::InvalidArgument(format!(
                "Coordinates vector has {} entries, the coordinates broker expects {}.",
                length, self.number_of_coordinates
            )));
        }
        Ok(())
    }
}

impl PartialEq for CoordinatesBroker {
    fn eq(&self, other: &Self) -> bool {
        self.subsets == other.subsets
    }
}

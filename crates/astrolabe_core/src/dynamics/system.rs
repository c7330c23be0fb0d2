use std::ops::Range;
use std::sync::Arc;

use nalgebra::DVector;

use super::Dynamics;
use crate::coordinates::{CoordinatesBroker, CoordinatesSubset};
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::traits::DynamicalSystem;

struct Entry {
    dynamics: Arc<dyn Dynamics>,
    read: Vec<Range<usize>>,
    write: Vec<Range<usize>>,
    read_size: usize,
    write_size: usize,
}

/// Flat derivative function assembled from a list of dynamics over one
/// broker layout.
///
/// Index ranges are resolved once at construction; evaluation only gathers,
/// calls and scatter-adds.
pub struct DynamicsSystem {
    entries: Vec<Entry>,
    dimension: usize,
    frame: Arc<Frame>,
}

fn ranges(
    broker: &CoordinatesBroker,
    subsets: &[Arc<dyn CoordinatesSubset>],
) -> Result<Vec<Range<usize>>> {
    subsets
        .iter()
        .map(|subset| broker.subset_range(subset.name(), subset.size()))
        .collect()
}

impl DynamicsSystem {
    pub fn new(
        dynamics: &[Arc<dyn Dynamics>],
        broker: &CoordinatesBroker,
        frame: Arc<Frame>,
    ) -> Result<Self> {
        let mut entries = Vec::with_capacity(dynamics.len());
        for dynamics in dynamics {
            if !dynamics.is_defined() {
                return Err(Error::UndefinedArgument(format!(
                    "Dynamics [{}] is undefined.",
                    dynamics.name()
                )));
            }
            let read = ranges(broker, &dynamics.read_coordinates_subsets())?;
            let write = ranges(broker, &dynamics.write_coordinates_subsets())?;
            entries.push(Entry {
                dynamics: Arc::clone(dynamics),
                read_size: read.iter().map(|range| range.len()).sum(),
                write_size: write.iter().map(|range| range.len()).sum(),
                read,
                write,
            });
        }

        Ok(Self {
            entries,
            dimension: broker.number_of_coordinates(),
            frame,
        })
    }

    pub fn frame(&self) -> &Arc<Frame> {
        &self.frame
    }
}

impl DynamicalSystem for DynamicsSystem {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) -> Result<()> {
        out.fill(0.0);

        for entry in &self.entries {
            let mut read = Vec::with_capacity(entry.read_size);
            for range in &entry.read {
                read.extend_from_slice(&x[range.clone()]);
            }

            let contribution =
                entry
                    .dynamics
                    .compute_contribution(t, &DVector::from_vec(read), &self.frame)?;
            if contribution.len() != entry.write_size {
                return Err(Error::InvalidArgument(format!(
                    "Dynamics [{}] returned {} values for a write width of {}.",
                    entry.dynamics.name(),
                    contribution.len(),
                    entry.write_size
                )));
            }

            let mut values = contribution.iter();
            for range in &entry.write {
                for (slot, value) in out[range.clone()].iter_mut().zip(&mut values) {
                    *slot += value;
                }
            }
        }

        Ok(())
    }
}

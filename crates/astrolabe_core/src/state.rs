//! Immutable state snapshots.

use std::fmt;
use std::sync::Arc;

use nalgebra::{DVector, Vector3};

use crate::coordinates::{CartesianPosition, CartesianVelocity, CoordinatesBroker, CoordinatesSubset};
use crate::error::{Error, Result};
use crate::frame::Frame;

/// Instant, flat coordinates, frame and broker of a propagated body.
///
/// The frame and the broker are shared. Every transform or arithmetic
/// operation produces a new `State`.
#[derive(Debug, Clone)]
pub struct State {
    instant: f64,
    coordinates: DVector<f64>,
    frame: Arc<Frame>,
    broker: Arc<CoordinatesBroker>,
}

impl State {
    pub fn new(
        instant: f64,
        coordinates: DVector<f64>,
        frame: Arc<Frame>,
        broker: Arc<CoordinatesBroker>,
    ) -> Result<Self> {
        broker.check_length(coordinates.len())?;
        Ok(Self {
            instant,
            coordinates,
            frame,
            broker,
        })
    }

    /// State over the shared position/velocity broker.
    pub fn from_position_velocity(
        instant: f64,
        position: Vector3<f64>,
        velocity: Vector3<f64>,
        frame: Arc<Frame>,
    ) -> Self {
        let coordinates = DVector::from_iterator(6, position.iter().chain(velocity.iter()).copied());
        Self {
            instant,
            coordinates,
            frame,
            broker: CoordinatesBroker::position_velocity(),
        }
    }

    /// Same frame and broker, new instant and coordinates.
    pub(crate) fn with_coordinates(&self, instant: f64, coordinates: DVector<f64>) -> Self {
        debug_assert_eq!(coordinates.len(), self.coordinates.len());
        Self {
            instant,
            coordinates,
            frame: Arc::clone(&self.frame),
            broker: Arc::clone(&self.broker),
        }
    }

    pub fn instant(&self) -> f64 {
        self.instant
    }

    pub fn coordinates(&self) -> &DVector<f64> {
        &self.coordinates
    }

    pub fn frame(&self) -> &Arc<Frame> {
        &self.frame
    }

    pub fn broker(&self) -> &Arc<CoordinatesBroker> {
        &self.broker
    }

    pub fn size(&self) -> usize {
        self.coordinates.len()
    }

    pub fn has_subset(&self, subset: &dyn CoordinatesSubset) -> bool {
        self.broker.has_subset(subset)
    }

    pub fn extract_coordinate(&self, subset: &dyn CoordinatesSubset) -> Result<DVector<f64>> {
        self.broker.extract_coordinate(&self.coordinates, subset)
    }

    pub fn extract_coordinates(
        &self,
        subsets: &[Arc<dyn CoordinatesSubset>],
    ) -> Result<DVector<f64>> {
        self.broker.extract_coordinates(&self.coordinates, subsets)
    }

    pub fn position(&self) -> Result<Vector3<f64>> {
        let values = self.extract_coordinate(&*CartesianPosition::default_subset())?;
        Ok(Vector3::new(values[0], values[1], values[2]))
    }

    pub fn velocity(&self) -> Result<Vector3<f64>> {
        let values = self.extract_coordinate(&*CartesianVelocity::default_subset())?;
        Ok(Vector3::new(values[0], values[1], values[2]))
    }

    /// This state expressed in `frame`, subset by subset.
    pub fn in_frame(&self, frame: &Arc<Frame>) -> Result<State> {
        if *self.frame == **frame {
            return Ok(self.clone());
        }

        let mut coordinates = DVector::zeros(self.coordinates.len());
        for subset in self.broker.subsets() {
            let range = self.broker.subset_range(subset.name(), subset.size())?;
            let values = subset.in_frame(
                self.instant,
                &self.coordinates,
                &self.frame,
                frame,
                &self.broker,
            )?;
            coordinates.rows_mut(range.start, range.len()).copy_from(&values);
        }

        Ok(Self {
            instant: self.instant,
            coordinates,
            frame: Arc::clone(frame),
            broker: Arc::clone(&self.broker),
        })
    }

    /// Subset-wise sum, resolved in this state's frame.
    pub fn add(&self, other: &State) -> Result<State> {
        self.combine(other, |subset, lhs, rhs, frame, broker, instant| {
            subset.add(instant, lhs, rhs, frame, broker)
        })
    }

    /// Subset-wise difference, resolved in this state's frame.
    pub fn subtract(&self, other: &State) -> Result<State> {
        self.combine(other, |subset, lhs, rhs, frame, broker, instant| {
            subset.subtract(instant, lhs, rhs, frame, broker)
        })
    }

    fn combine<F>(&self, other: &State, operation: F) -> Result<State>
    where
        F: Fn(
            &dyn CoordinatesSubset,
            &DVector<f64>,
            &DVector<f64>,
            &Frame,
            &CoordinatesBroker,
            f64,
        ) -> Result<DVector<f64>>,
    {
        if *self.broker != *other.broker {
            return Err(Error::InvalidArgument(
                "Cannot combine states with different coordinates brokers.".to_string(),
            ));
        }
        if self.instant != other.instant {
            return Err(Error::InvalidArgument(
                "Cannot combine states at different instants.".to_string(),
            ));
        }

        let other = other.in_frame(&self.frame)?;
        let mut coordinates = DVector::zeros(self.coordinates.len());
        for subset in self.broker.subsets() {
            let range = self.broker.subset_range(subset.name(), subset.size())?;
            let values = operation(
                subset.as_ref(),
                &self.coordinates,
                &other.coordinates,
                self.frame.as_ref(),
                self.broker.as_ref(),
                self.instant,
            )?;
            coordinates.rows_mut(range.start, range.len()).copy_from(&values);
        }

        Ok(self.with_coordinates(self.instant, coordinates))
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        if self.instant != other.instant || *self.broker != *other.broker {
            return false;
        }
        match other.in_frame(&self.frame) {
            Ok(other) => self.coordinates == other.coordinates,
            Err(_) => false,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State @ {:.6} s [{}]", self.instant, self.frame)?;
        for subset in self.broker.subsets() {
            if let Ok(values) = self.extract_coordinate(subset.as_ref()) {
                let values: Vec<String> = values.iter().map(|v| format!("{v:.6}")).collect();
                write!(f, " {}=({})", subset.name(), values.join(", "))?;
            }
        }
        Ok(())
    }
}

//! Reference frames at the boundary of the propagation core.
//!
//! The mathematics of specific frames (precession, nutation, Earth rotation)
//! lives outside this crate. Frames here form a tree: each non-root frame
//! carries a [`TransformProvider`] producing its transform to its parent at a
//! given instant, and conversions walk both frames up to their common ancestor.

use std::fmt;
use std::sync::{Arc, LazyLock};

use nalgebra::{Rotation3, Vector3};

use crate::error::{Error, Result};

/// Rigid, possibly rotating, transform from a child frame to its parent.
///
/// `p_parent = R p_child + t`
/// `v_parent = R v_child + v_t + ω × (R p_child)`, with `ω` in parent axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub angular_velocity: Vector3<f64>,
}

impl Transform {
    pub fn new(
        rotation: Rotation3<f64>,
        translation: Vector3<f64>,
        velocity: Vector3<f64>,
        angular_velocity: Vector3<f64>,
    ) -> Self {
        Self {
            rotation,
            translation,
            velocity,
            angular_velocity,
        }
    }

    pub fn identity() -> Self {
        Self::new(
            Rotation3::identity(),
            Vector3::zeros(),
            Vector3::zeros(),
            Vector3::zeros(),
        )
    }

    pub fn apply_to_position(&self, position: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * position + self.translation
    }

    pub fn apply_to_velocity(&self, position: &Vector3<f64>, velocity: &Vector3<f64>) -> Vector3<f64> {
        let rotated = self.rotation * position;
        self.rotation * velocity + self.velocity + self.angular_velocity.cross(&rotated)
    }

    pub fn invert_position(&self, position: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.inverse() * (position - self.translation)
    }

    pub fn invert_velocity(&self, position: &Vector3<f64>, velocity: &Vector3<f64>) -> Vector3<f64> {
        let relative = position - self.translation;
        self.rotation.inverse() * (velocity - self.velocity - self.angular_velocity.cross(&relative))
    }
}

/// Source of the transform from a frame to its parent.
pub trait TransformProvider: Send + Sync {
    fn transform_to_parent(&self, instant: f64) -> anyhow::Result<Transform>;
}

struct Parent {
    frame: Arc<Frame>,
    provider: Arc<dyn TransformProvider>,
}

/// A named reference frame.
pub struct Frame {
    name: String,
    parent: Option<Parent>,
}

static GCRF: LazyLock<Arc<Frame>> = LazyLock::new(|| Frame::root("GCRF"));

impl Frame {
    pub fn root(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parent: None,
        })
    }

    pub fn child(
        name: impl Into<String>,
        parent: Arc<Frame>,
        provider: Arc<dyn TransformProvider>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parent: Some(Parent {
                frame: parent,
                provider,
            }),
        })
    }

    /// Shared inertial root frame.
    pub fn gcrf() -> Arc<Self> {
        Arc::clone(&GCRF)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<Frame>> {
        self.parent.as_ref().map(|parent| &parent.frame)
    }

    pub fn transform_position(
        &self,
        instant: f64,
        position: &Vector3<f64>,
        to: &Frame,
    ) -> Result<Vector3<f64>> {
        if std::ptr::eq(self, to) {
            return Ok(*position);
        }
        let (up, down) = self.path_to(to)?;

        let mut position = *position;
        for frame in up {
            let transform = frame.parent_transform(instant)?;
            position = transform.apply_to_position(&position);
        }
        for frame in down.into_iter().rev() {
            let transform = frame.parent_transform(instant)?;
            position = transform.invert_position(&position);
        }
        Ok(position)
    }

    pub fn transform_position_velocity(
        &self,
        instant: f64,
        position: &Vector3<f64>,
        velocity: &Vector3<f64>,
        to: &Frame,
    ) -> Result<(Vector3<f64>, Vector3<f64>)> {
        if std::ptr::eq(self, to) {
            return Ok((*position, *velocity));
        }
        let (up, down) = self.path_to(to)?;

        let (mut position, mut velocity) = (*position, *velocity);
        for frame in up {
            let transform = frame.parent_transform(instant)?;
            velocity = transform.apply_to_velocity(&position, &velocity);
            position = transform.apply_to_position(&position);
        }
        for frame in down.into_iter().rev() {
            let transform = frame.parent_transform(instant)?;
            velocity = transform.invert_velocity(&position, &velocity);
            position = transform.invert_position(&position);
        }
        Ok((position, velocity))
    }

    fn parent_transform(&self, instant: f64) -> Result<Transform> {
        let parent = self.parent.as_ref().ok_or_else(|| {
            Error::Runtime(format!("Frame [{}] has no parent.", self.name))
        })?;
        parent.provider.transform_to_parent(instant).map_err(|err| {
            Error::collaborator(
                format!(
                    "Cannot transform [{}] to [{}]",
                    self.name, parent.frame.name
                ),
                err,
            )
        })
    }

    fn lineage(&self) -> Vec<&Frame> {
        let mut lineage = vec![self];
        let mut current = self;
        while let Some(parent) = &current.parent {
            current = &parent.frame;
            lineage.push(current);
        }
        lineage
    }

    /// Frames to climb from `self` and to descend into `to`, both excluding
    /// the common ancestor. Ancestors are matched by identity, not by name.
    fn path_to<'a>(&'a self, to: &'a Frame) -> Result<(Vec<&'a Frame>, Vec<&'a Frame>)> {
        let up = self.lineage();
        let down = to.lineage();

        for (i, frame) in up.iter().enumerate() {
            if let Some(j) = down.iter().position(|other| std::ptr::eq(*other, *frame)) {
                return Ok((up[..i].to_vec(), down[..j].to_vec()));
            }
        }

        Err(Error::InvalidArgument(format!(
            "Frames [{}] and [{}] do not share a common ancestor.",
            self.name, to.name
        )))
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("name", &self.name)
            .field("parent", &self.parent().map(|parent| parent.name()))
            .finish()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

//! Stopping conditions for a propagation leg.
//!
//! Conditions are stateless: they turn a [`State`] into a scalar residual
//! (evaluator output minus target) and decide, from the residuals of two
//! consecutive samples, whether the condition holds. Targets relative to the
//! start of a leg are fixed with [`EventCondition::resolve`] before
//! integration starts.

mod angular;
mod criterion;
mod logical;
mod real;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::state::State;

pub use angular::AngularCondition;
pub use criterion::Criterion;
pub use logical::{LogicalCondition, LogicalType};
pub use real::RealCondition;

/// Scalar function of a state.
pub type Evaluator = Arc<dyn Fn(&State) -> f64 + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetType {
    Absolute,
    /// Offset from the evaluator value at the start of the leg.
    Relative,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub value: f64,
    pub target_type: TargetType,
}

impl Target {
    pub fn absolute(value: f64) -> Self {
        Self {
            value,
            target_type: TargetType::Absolute,
        }
    }

    pub fn relative(value: f64) -> Self {
        Self {
            value,
            target_type: TargetType::Relative,
        }
    }

    /// Absolute target for a leg whose evaluator starts at `reference_value`.
    pub fn resolved(&self, reference_value: f64) -> Self {
        match self.target_type {
            TargetType::Absolute => *self,
            TargetType::Relative => Self::absolute(self.value + reference_value),
        }
    }
}

pub trait EventCondition: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Residual driven to zero by event refinement, or `None` when the
    /// condition has no scalar form (logical combinations).
    fn evaluate(&self, state: &State) -> Option<f64>;

    fn is_satisfied(&self, current: &State, previous: &State) -> bool;

    /// Copy of this condition with relative targets fixed against `reference`.
    fn resolve(&self, reference: &State) -> Arc<dyn EventCondition>;
}

impl fmt::Display for dyn EventCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

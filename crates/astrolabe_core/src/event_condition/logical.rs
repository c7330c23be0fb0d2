use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::EventCondition;
use crate::state::State;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalType {
    /// Every member condition holds.
    And,
    /// At least one member condition holds.
    Or,
}

/// Conjunction or disjunction of conditions.
///
/// Has no scalar residual, so events are refined on the boolean outcome
/// alone.
#[derive(Debug, Clone)]
pub struct LogicalCondition {
    name: String,
    logical_type: LogicalType,
    conditions: Vec<Arc<dyn EventCondition>>,
}

impl LogicalCondition {
    pub fn new(
        name: impl Into<String>,
        logical_type: LogicalType,
        conditions: Vec<Arc<dyn EventCondition>>,
    ) -> Self {
        Self {
            name: name.into(),
            logical_type,
            conditions,
        }
    }

    pub fn conjunctive(conditions: Vec<Arc<dyn EventCondition>>) -> Self {
        Self::new("Conjunctive Condition", LogicalType::And, conditions)
    }

    pub fn disjunctive(conditions: Vec<Arc<dyn EventCondition>>) -> Self {
        Self::new("Disjunctive Condition", LogicalType::Or, conditions)
    }

    pub fn logical_type(&self) -> LogicalType {
        self.logical_type
    }

    pub fn conditions(&self) -> &[Arc<dyn EventCondition>] {
        &self.conditions
    }
}

impl EventCondition for LogicalCondition {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, _state: &State) -> Option<f64> {
        None
    }

    fn is_satisfied(&self, current: &State, previous: &State) -> bool {
        let mut outcomes = self
            .conditions
            .iter()
            .map(|condition| condition.is_satisfied(current, previous));
        match self.logical_type {
            LogicalType::And => outcomes.all(|satisfied| satisfied),
            LogicalType::Or => outcomes.any(|satisfied| satisfied),
        }
    }

    fn resolve(&self, reference: &State) -> Arc<dyn EventCondition> {
        Arc::new(Self {
            name: self.name.clone(),
            logical_type: self.logical_type,
            conditions: self
                .conditions
                .iter()
                .map(|condition| condition.resolve(reference))
                .collect(),
        })
    }
}

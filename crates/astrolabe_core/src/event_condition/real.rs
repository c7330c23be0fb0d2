use std::fmt;
use std::sync::Arc;

use super::{Criterion, EventCondition, Evaluator, Target};
use crate::state::State;

/// Condition on a real-valued function of the state.
#[derive(Clone)]
pub struct RealCondition {
    name: String,
    criterion: Criterion,
    evaluator: Evaluator,
    target: Target,
}

impl RealCondition {
    pub fn new(
        name: impl Into<String>,
        criterion: Criterion,
        evaluator: impl Fn(&State) -> f64 + Send + Sync + 'static,
        target: Target,
    ) -> Self {
        Self {
            name: name.into(),
            criterion,
            evaluator: Arc::new(evaluator),
            target,
        }
    }

    /// Holds once the state instant reaches `instant`.
    pub fn instant_condition(criterion: Criterion, instant: f64) -> Self {
        Self::new(
            "Instant Condition",
            criterion,
            State::instant,
            Target::absolute(instant),
        )
    }

    /// Holds once `duration` seconds have elapsed since the start of the leg.
    pub fn duration_condition(criterion: Criterion, duration: f64) -> Self {
        Self::new(
            "Duration Condition",
            criterion,
            State::instant,
            Target::relative(duration),
        )
    }

    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Evaluator output minus target value. An unresolved relative target
    /// is read as an absolute one.
    pub fn residual(&self, state: &State) -> f64 {
        (self.evaluator)(state) - self.target.value
    }
}

impl EventCondition for RealCondition {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, state: &State) -> Option<f64> {
        Some(self.residual(state))
    }

    fn is_satisfied(&self, current: &State, previous: &State) -> bool {
        self.criterion
            .is_satisfied(self.residual(current), self.residual(previous))
    }

    fn resolve(&self, reference: &State) -> Arc<dyn EventCondition> {
        Arc::new(Self {
            target: self.target.resolved((self.evaluator)(reference)),
            ..self.clone()
        })
    }
}

impl fmt::Debug for RealCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealCondition")
            .field("name", &self.name)
            .field("criterion", &self.criterion)
            .field("target", &self.target)
            .finish()
    }
}

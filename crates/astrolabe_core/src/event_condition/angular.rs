use std::f64::consts::{PI, TAU};
use std::fmt;
use std::sync::Arc;

use super::{Criterion, EventCondition, Evaluator, Target};
use crate::state::State;

/// Condition on an angle [rad], compared modulo a full turn.
#[derive(Clone)]
pub struct AngularCondition {
    name: String,
    criterion: Criterion,
    evaluator: Evaluator,
    target: Target,
}

/// Wraps `angle` into (-π, π].
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

impl AngularCondition {
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

    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Signed angular distance past the target, in (-π, π].
    pub fn residual(&self, state: &State) -> f64 {
        wrap_angle((self.evaluator)(state) - self.target.value)
    }
}

impl EventCondition for AngularCondition {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, state: &State) -> Option<f64> {
        Some(self.residual(state))
    }

    /// The residual jumps by a full turn half way around from the target;
    /// that jump is not a crossing.
    fn is_satisfied(&self, current: &State, previous: &State) -> bool {
        let current = self.residual(current);
        let previous = self.residual(previous);
        if self.criterion.is_crossing() && (current - previous).abs() >= PI {
            return false;
        }
        self.criterion.is_satisfied(current, previous)
    }

    fn resolve(&self, reference: &State) -> Arc<dyn EventCondition> {
        Arc::new(Self {
            target: self.target.resolved((self.evaluator)(reference)),
            ..self.clone()
        })
    }
}

impl fmt::Debug for AngularCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AngularCondition")
            .field("name", &self.name)
            .field("criterion", &self.criterion)
            .field("target", &self.target)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::leo_state;

    /// Angle equal to the state instant, so tests can dial angles through time.
    fn angle_condition(criterion: Criterion, target: f64) -> AngularCondition {
        AngularCondition::new("Angle", criterion, State::instant, Target::absolute(target))
    }

    fn at(angle: f64) -> State {
        let state = leo_state();
        state.with_coordinates(angle, state.coordinates().clone())
    }

    #[test]
    fn wrapping_stays_in_half_open_interval() {
        assert!((wrap_angle(PI + 0.5) - (0.5 - PI)).abs() < 1e-12);
        assert!((wrap_angle(-PI) - PI).abs() < 1e-12);
        assert!((wrap_angle(TAU + 0.25) - 0.25).abs() < 1e-12);
        assert!((wrap_angle(-0.25) + 0.25).abs() < 1e-12);
    }

    #[test]
    fn crossing_through_zero_is_detected_across_the_wrap() {
        let condition = angle_condition(Criterion::PositiveCrossing, 0.0);
        assert!(condition.is_satisfied(&at(0.1), &at(TAU - 0.1)));
    }

    #[test]
    fn antipodal_jump_is_not_a_crossing() {
        let condition = angle_condition(Criterion::AnyCrossing, 0.0);
        assert!(!condition.is_satisfied(&at(PI + 0.1), &at(PI - 0.1)));
        assert!(condition.is_satisfied(&at(0.05), &at(-0.05)));
    }
}

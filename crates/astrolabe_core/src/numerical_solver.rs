//! Integration of a state under a set of dynamics.
//!
//! [`NumericalSolver`] is a plain settings value; every integration call
//! builds its own stepper and scratch buffers, so one solver can be shared
//! between threads and calls.

use std::fmt;
use std::sync::Arc;

use log::{debug, trace};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::dynamics::{Dynamics, DynamicsSystem};
use crate::error::{Error, Result};
use crate::event_condition::EventCondition;
use crate::root_solver::{RootSolver, Sample};
use crate::solvers::{
    EmbeddedRungeKutta, Rk4, CASH_KARP_54, DORMAND_PRINCE_5, TSITOURAS_5,
};
use crate::state::State;
use crate::traits::Steppable;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogType {
    NoLog,
    /// Accepted steps at debug level.
    LogConstant,
    /// Accepted steps at debug level, rejected steps at trace level.
    LogAdaptive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepperType {
    /// Fixed step.
    RungeKutta4,
    RungeKuttaCashKarp54,
    RungeKuttaDopri5,
    Tsitouras5,
}

impl StepperType {
    pub fn is_adaptive(self) -> bool {
        !matches!(self, StepperType::RungeKutta4)
    }

    fn build(self, dim: usize) -> Stepper {
        match self {
            StepperType::RungeKutta4 => Stepper::Fixed(Rk4::new(dim)),
            StepperType::RungeKuttaCashKarp54 => {
                Stepper::Embedded(EmbeddedRungeKutta::new(&CASH_KARP_54, dim))
            }
            StepperType::RungeKuttaDopri5 => {
                Stepper::Embedded(EmbeddedRungeKutta::new(&DORMAND_PRINCE_5, dim))
            }
            StepperType::Tsitouras5 => {
                Stepper::Embedded(EmbeddedRungeKutta::new(&TSITOURAS_5, dim))
            }
        }
    }
}

enum Stepper {
    Fixed(Rk4),
    Embedded(EmbeddedRungeKutta),
}

impl Stepper {
    fn step(
        &mut self,
        system: &DynamicsSystem,
        t: &mut f64,
        state: &mut [f64],
        dt: f64,
    ) -> Result<()> {
        match self {
            Stepper::Fixed(s) => s.step(system, t, state, dt),
            Stepper::Embedded(s) => s.step(system, t, state, dt),
        }
    }
}

/// Integration settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericalSolver {
    pub log_type: LogType,
    pub stepper_type: StepperType,
    /// Fixed step, or initial step of adaptive steppers [s].
    pub time_step: f64,
    pub relative_tolerance: f64,
    pub absolute_tolerance: f64,
    pub root_solver: RootSolver,
}

impl Default for NumericalSolver {
    fn default() -> Self {
        Self {
            log_type: LogType::NoLog,
            stepper_type: StepperType::RungeKuttaDopri5,
            time_step: 5.0,
            relative_tolerance: 1e-12,
            absolute_tolerance: 1e-12,
            root_solver: RootSolver::default(),
        }
    }
}

/// Outcome of [`NumericalSolver::integrate_to_condition`].
#[derive(Debug, Clone)]
pub struct ConditionSolution {
    /// Initial state, every accepted step, and the refined event state when
    /// the condition was met.
    pub states: Vec<State>,
    pub condition_is_satisfied: bool,
    pub iteration_count: usize,
    pub root_solver_has_converged: bool,
}

impl NumericalSolver {
    pub fn new(
        log_type: LogType,
        stepper_type: StepperType,
        time_step: f64,
        relative_tolerance: f64,
        absolute_tolerance: f64,
        root_solver: RootSolver,
    ) -> Self {
        Self {
            log_type,
            stepper_type,
            time_step,
            relative_tolerance,
            absolute_tolerance,
            root_solver,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "Time step must be positive, got {}.",
                self.time_step
            )));
        }
        for (name, tolerance) in [
            ("Relative tolerance", self.relative_tolerance),
            ("Absolute tolerance", self.absolute_tolerance),
        ] {
            if !tolerance.is_finite() || tolerance <= 0.0 {
                return Err(Error::InvalidConfiguration(format!(
                    "{name} must be positive, got {tolerance}."
                )));
            }
        }
        self.root_solver.validate()
    }

    pub fn is_defined(&self) -> bool {
        self.validate().is_ok()
    }

    /// Integrates `state` to `end_instant`, forward or backward.
    ///
    /// Returns the initial state followed by every accepted step; the last
    /// state lies exactly at `end_instant`.
    pub fn integrate_time(
        &self,
        state: &State,
        end_instant: f64,
        dynamics: &[Arc<dyn Dynamics>],
    ) -> Result<Vec<State>> {
        self.validate()?;
        let system = DynamicsSystem::new(dynamics, state.broker(), Arc::clone(state.frame()))?;
        let mut propagator = Propagator::new(self, &system, state);

        let mut states = vec![state.clone()];
        while propagator.t != end_instant {
            propagator.advance(end_instant)?;
            states.push(propagator.state());
        }
        Ok(states)
    }

    /// Integrates `state` through `instants`, landing exactly on each.
    ///
    /// Instants must move monotonically away from the state instant, else
    /// [`Error::WrongOrder`].
    pub fn integrate_times(
        &self,
        state: &State,
        instants: &[f64],
        dynamics: &[Arc<dyn Dynamics>],
    ) -> Result<Vec<State>> {
        self.validate()?;
        let system = DynamicsSystem::new(dynamics, state.broker(), Arc::clone(state.frame()))?;
        let mut propagator = Propagator::new(self, &system, state);

        let mut direction = 0.0;
        let mut states = Vec::with_capacity(instants.len());
        for &instant in instants {
            let delta = instant - propagator.t;
            if delta != 0.0 {
                if direction != 0.0 && delta.signum() != direction {
                    return Err(Error::WrongOrder("Instants".to_string()));
                }
                direction = delta.signum();
            }
            while propagator.t != instant {
                propagator.advance(instant)?;
            }
            states.push(propagator.state());
        }
        Ok(states)
    }

    /// Integrates `state` until `condition` holds or `end_instant` is
    /// reached.
    ///
    /// The condition is checked between every pair of consecutive accepted
    /// steps. Once a step satisfies it, the event instant is refined with
    /// [`NumericalSolver::root_solver`] and the refined state closes the
    /// returned list. A condition already satisfied by `state` returns
    /// `state` alone.
    pub fn integrate_to_condition(
        &self,
        state: &State,
        end_instant: f64,
        condition: &dyn EventCondition,
        dynamics: &[Arc<dyn Dynamics>],
    ) -> Result<ConditionSolution> {
        self.validate()?;
        let system = DynamicsSystem::new(dynamics, state.broker(), Arc::clone(state.frame()))?;

        if condition.is_satisfied(state, state) {
            return Ok(ConditionSolution {
                states: vec![state.clone()],
                condition_is_satisfied: true,
                iteration_count: 0,
                root_solver_has_converged: true,
            });
        }

        let mut propagator = Propagator::new(self, &system, state);
        let mut states = vec![state.clone()];
        let mut previous = state.clone();

        while propagator.t != end_instant {
            propagator.advance(end_instant)?;
            let current = propagator.state();

            if !condition.is_satisfied(&current, &previous) {
                states.push(current.clone());
                previous = current;
                continue;
            }

            let before = Sample {
                instant: previous.instant(),
                satisfied: false,
                residual: condition.evaluate(&previous),
            };
            let after = Sample {
                instant: current.instant(),
                satisfied: true,
                residual: condition.evaluate(&current),
            };
            let solution = self.root_solver.solve(
                |instant| {
                    let trial = propagator.advance_to(&previous, instant)?;
                    Ok(Sample {
                        instant,
                        satisfied: condition.is_satisfied(&trial, &previous),
                        residual: condition.evaluate(&trial),
                    })
                },
                before,
                after,
            )?;

            debug!(
                "[{}] satisfied at {:.9} s after {} root solver iteration(s).",
                condition.name(),
                solution.root,
                solution.iteration_count
            );

            let event = if solution.root == current.instant() {
                current
            } else {
                propagator.advance_to(&previous, solution.root)?
            };
            states.push(event);

            return Ok(ConditionSolution {
                states,
                condition_is_satisfied: true,
                iteration_count: solution.iteration_count,
                root_solver_has_converged: solution.has_converged,
            });
        }

        Ok(ConditionSolution {
            states,
            condition_is_satisfied: false,
            iteration_count: 0,
            root_solver_has_converged: true,
        })
    }
}

impl fmt::Display for NumericalSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} (time step {} s, relative tolerance {:e}, absolute tolerance {:e})",
            self.stepper_type, self.time_step, self.relative_tolerance, self.absolute_tolerance
        )
    }
}

/// Scaled max-norm of a local error estimate.
fn error_norm(error: &[f64], start: &[f64], end: &[f64], rtol: f64, atol: f64) -> f64 {
    error
        .iter()
        .zip(start.iter().zip(end))
        .map(|(e, (y0, y1))| e.abs() / (atol + rtol * y0.abs().max(y1.abs())))
        .fold(0.0, f64::max)
}

/// Smallest step distinguishable from `t`.
fn minimum_step(t: f64) -> f64 {
    16.0 * f64::EPSILON * t.abs().max(1.0)
}

/// Mutable integration context of one call.
struct Propagator<'a> {
    solver: &'a NumericalSolver,
    system: &'a DynamicsSystem,
    template: &'a State,
    stepper: Stepper,
    t: f64,
    x: Vec<f64>,
    trial: Vec<f64>,
    /// Magnitude of the next step.
    step: f64,
}

impl<'a> Propagator<'a> {
    fn new(solver: &'a NumericalSolver, system: &'a DynamicsSystem, state: &'a State) -> Self {
        let x = state.coordinates().as_slice().to_vec();
        Self {
            solver,
            system,
            template: state,
            stepper: solver.stepper_type.build(x.len()),
            t: state.instant(),
            trial: vec![0.0; x.len()],
            x,
            step: solver.time_step,
        }
    }

    fn state(&self) -> State {
        self.template
            .with_coordinates(self.t, DVector::from_column_slice(&self.x))
    }

    /// Takes one accepted step towards `limit` without passing it.
    fn advance(&mut self, limit: f64) -> Result<()> {
        let direction = (limit - self.t).signum();

        loop {
            let remaining = (limit - self.t).abs();
            let clamped = self.step >= remaining;
            let h = direction * if clamped { remaining } else { self.step };

            self.trial.copy_from_slice(&self.x);
            let mut t = self.t;

            match &mut self.stepper {
                Stepper::Fixed(stepper) => {
                    stepper.step(self.system, &mut t, &mut self.trial, h)?;
                }
                Stepper::Embedded(stepper) => {
                    stepper.step(self.system, &mut t, &mut self.trial, h)?;
                    let error = error_norm(
                        stepper.error(),
                        &self.x,
                        &self.trial,
                        self.solver.relative_tolerance,
                        self.solver.absolute_tolerance,
                    );
                    if !error.is_finite() {
                        return Err(Error::Runtime(format!(
                            "Non-finite error estimate at {} s.",
                            self.t
                        )));
                    }

                    let exponent = stepper.error_exponent();
                    if error > 1.0 {
                        self.step = h.abs() * (SAFETY * error.powf(-exponent)).max(MIN_FACTOR);
                        if self.solver.log_type == LogType::LogAdaptive {
                            trace!(
                                "Rejected step of {:.6} s at {:.6} s (error {:.3}).",
                                h,
                                self.t,
                                error
                            );
                        }
                        if self.step < minimum_step(self.t) {
                            return Err(Error::Runtime(format!(
                                "Step size collapsed to {:e} s at {} s.",
                                self.step, self.t
                            )));
                        }
                        continue;
                    }

                    let factor = if error == 0.0 {
                        MAX_FACTOR
                    } else {
                        (SAFETY * error.powf(-exponent)).clamp(MIN_FACTOR, MAX_FACTOR)
                    };
                    let next = h.abs() * factor;
                    self.step = if clamped { self.step.max(next) } else { next };
                }
            }

            if self.trial.iter().any(|value| !value.is_finite()) {
                return Err(Error::Runtime(format!(
                    "Integration produced a non-finite state at {} s.",
                    t
                )));
            }

            self.t = if clamped { limit } else { t };
            std::mem::swap(&mut self.x, &mut self.trial);

            if self.solver.log_type != LogType::NoLog {
                debug!("Accepted step of {:.6} s, now at {:.6} s.", h, self.t);
            }
            return Ok(());
        }
    }

    /// State at `instant` reached by a single step from `from`.
    fn advance_to(&mut self, from: &State, instant: f64) -> Result<State> {
        let mut x = from.coordinates().as_slice().to_vec();
        let mut t = from.instant();
        let dt = instant - t;
        self.stepper.step(self.system, &mut t, &mut x, dt)?;
        Ok(from.with_coordinates(instant, DVector::from_vec(x)))
    }
}

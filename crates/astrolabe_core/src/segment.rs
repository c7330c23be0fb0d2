//! Single propagation legs.
//!
//! A [`Segment`] integrates a state under its dynamics until its event
//! condition holds or its duration budget runs out. The resulting
//! [`SegmentSolution`] keeps the integrated states together with the dynamics
//! that produced them, so derived quantities (masses, delta-v, per-dynamics
//! contributions, intermediate states) can be recomputed afterwards.

use std::fmt;
use std::sync::Arc;

use log::{debug, info};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SEGMENT_DURATION, STANDARD_GRAVITY};
use crate::coordinates::{CartesianVelocity, CoordinatesSubset, ScalarSubset};
use crate::dynamics::{self, Dynamics, Thruster};
use crate::error::{Error, Result};
use crate::event_condition::EventCondition;
use crate::frame::Frame;
use crate::numerical_solver::NumericalSolver;
use crate::state::State;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentType {
    Coast,
    Maneuver,
}

#[derive(Debug, Clone)]
pub struct Segment {
    name: String,
    segment_type: SegmentType,
    event_condition: Arc<dyn EventCondition>,
    dynamics: Vec<Arc<dyn Dynamics>>,
    numerical_solver: NumericalSolver,
}

impl Segment {
    fn build(
        name: String,
        segment_type: SegmentType,
        event_condition: Arc<dyn EventCondition>,
        dynamics: Vec<Arc<dyn Dynamics>>,
        numerical_solver: NumericalSolver,
    ) -> Result<Self> {
        if dynamics.is_empty() {
            return Err(Error::UndefinedArgument("Dynamics is undefined.".to_string()));
        }
        numerical_solver.validate()?;

        Ok(Self {
            name,
            segment_type,
            event_condition,
            dynamics,
            numerical_solver,
        })
    }

    /// Leg propagated under `dynamics` alone.
    pub fn coast(
        name: impl Into<String>,
        event_condition: Arc<dyn EventCondition>,
        dynamics: Vec<Arc<dyn Dynamics>>,
        numerical_solver: NumericalSolver,
    ) -> Result<Self> {
        Self::build(
            name.into(),
            SegmentType::Coast,
            event_condition,
            dynamics,
            numerical_solver,
        )
    }

    /// Leg propagated under `dynamics` plus `thruster`.
    pub fn maneuver(
        name: impl Into<String>,
        event_condition: Arc<dyn EventCondition>,
        thruster: Arc<Thruster>,
        dynamics: Vec<Arc<dyn Dynamics>>,
        numerical_solver: NumericalSolver,
    ) -> Result<Self> {
        if dynamics.is_empty() {
            return Err(Error::UndefinedArgument("Dynamics is undefined.".to_string()));
        }
        let mut dynamics = dynamics;
        dynamics.push(thruster);

        Self::build(
            name.into(),
            SegmentType::Maneuver,
            event_condition,
            dynamics,
            numerical_solver,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn segment_type(&self) -> SegmentType {
        self.segment_type
    }

    pub fn event_condition(&self) -> &Arc<dyn EventCondition> {
        &self.event_condition
    }

    pub fn dynamics(&self) -> &[Arc<dyn Dynamics>] {
        &self.dynamics
    }

    pub fn numerical_solver(&self) -> &NumericalSolver {
        &self.numerical_solver
    }

    /// Solves with the default 30 day budget.
    pub fn solve(&self, state: &State) -> Result<SegmentSolution> {
        self.solve_with_duration(state, DEFAULT_SEGMENT_DURATION)
    }

    pub fn solve_with_duration(
        &self,
        state: &State,
        maximum_propagation_duration: f64,
    ) -> Result<SegmentSolution> {
        if !maximum_propagation_duration.is_finite() || maximum_propagation_duration < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "Maximum propagation duration must be finite and non-negative, got {maximum_propagation_duration}."
            )));
        }

        let condition = self.event_condition.resolve(state);
        info!(
            "Solving segment [{}] from {} s for at most {} s.",
            self.name,
            state.instant(),
            maximum_propagation_duration
        );

        let solution = self.numerical_solver.integrate_to_condition(
            state,
            state.instant() + maximum_propagation_duration,
            condition.as_ref(),
            &self.dynamics,
        )?;

        debug!(
            "Segment [{}] stopped after {} state(s), condition satisfied: {}.",
            self.name,
            solution.states.len(),
            solution.condition_is_satisfied
        );

        Ok(SegmentSolution {
            name: self.name.clone(),
            dynamics: self.dynamics.clone(),
            states: solution.states,
            condition_is_satisfied: solution.condition_is_satisfied,
            segment_type: self.segment_type,
        })
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Segment [{}] ({:?})", self.name, self.segment_type)?;
        writeln!(f, "  Event condition: {}", self.event_condition)?;
        writeln!(f, "  Numerical solver: {}", self.numerical_solver)?;
        write!(f, "  Dynamics:")?;
        for dynamics in &self.dynamics {
            write!(f, "\n    {dynamics}")?;
        }
        Ok(())
    }
}

/// States and metadata of one solved segment.
#[derive(Debug, Clone)]
pub struct SegmentSolution {
    pub name: String,
    pub dynamics: Vec<Arc<dyn Dynamics>>,
    pub states: Vec<State>,
    pub condition_is_satisfied: bool,
    pub segment_type: SegmentType,
}

impl SegmentSolution {
    pub fn new(
        name: impl Into<String>,
        dynamics: Vec<Arc<dyn Dynamics>>,
        states: Vec<State>,
        condition_is_satisfied: bool,
        segment_type: SegmentType,
    ) -> Self {
        Self {
            name: name.into(),
            dynamics,
            states,
            condition_is_satisfied,
            segment_type,
        }
    }

    fn first_state(&self) -> Result<&State> {
        self.states
            .first()
            .ok_or_else(|| Error::Runtime(format!("Segment solution [{}] has no states.", self.name)))
    }

    fn last_state(&self) -> Result<&State> {
        self.states
            .last()
            .ok_or_else(|| Error::Runtime(format!("Segment solution [{}] has no states.", self.name)))
    }

    pub fn start_instant(&self) -> Result<f64> {
        Ok(self.first_state()?.instant())
    }

    pub fn end_instant(&self) -> Result<f64> {
        Ok(self.last_state()?.instant())
    }

    pub fn propagation_duration(&self) -> Result<f64> {
        Ok(self.end_instant()? - self.start_instant()?)
    }

    pub fn initial_mass(&self) -> Result<f64> {
        Ok(self.first_state()?.extract_coordinate(&*ScalarSubset::mass())?[0])
    }

    pub fn final_mass(&self) -> Result<f64> {
        Ok(self.last_state()?.extract_coordinate(&*ScalarSubset::mass())?[0])
    }

    /// Propellant consumed [kg]; zero for a solution without states.
    pub fn compute_delta_mass(&self) -> Result<f64> {
        if self.states.is_empty() {
            return Ok(0.0);
        }
        Ok(self.initial_mass()? - self.final_mass()?)
    }

    /// Ideal rocket equation `g0 Isp ln(m0 / mf)` [m/s]; zero for a solution
    /// without states or without mass change.
    pub fn compute_delta_v(&self, specific_impulse: f64) -> Result<f64> {
        if self.states.is_empty() {
            return Ok(0.0);
        }
        delta_v(specific_impulse, self.initial_mass()?, self.final_mass()?)
    }

    /// States at `instants`, re-propagated from the closest preceding stored
    /// state under this solution's dynamics.
    ///
    /// Instants must be strictly increasing and lie within the stored span.
    pub fn calculate_states_at(
        &self,
        instants: &[f64],
        numerical_solver: &NumericalSolver,
    ) -> Result<Vec<State>> {
        let (start, end) = (self.start_instant()?, self.end_instant()?);
        check_instants(instants, start, end)?;

        let mut states = Vec::with_capacity(instants.len());
        let mut remaining = instants;
        while let Some(&instant) = remaining.first() {
            let anchor = self
                .states
                .partition_point(|state| state.instant() <= instant)
                .saturating_sub(1);
            let next = self.states.get(anchor + 1).map(State::instant);
            let count = remaining
                .iter()
                .take_while(|&&t| next.map_or(true, |next| t < next))
                .count();

            states.extend(numerical_solver.integrate_times(
                &self.states[anchor],
                &remaining[..count],
                &self.dynamics,
            )?);
            remaining = &remaining[count..];
        }

        Ok(states)
    }

    fn find_dynamics(&self, dynamics: &Arc<dyn Dynamics>) -> Result<()> {
        if self
            .dynamics
            .iter()
            .any(|candidate| dynamics::is_same(candidate, dynamics))
        {
            Ok(())
        } else {
            Err(Error::UndefinedArgument(
                "Provided dynamics is not part of the segment dynamics.".to_string(),
            ))
        }
    }

    /// Contribution of `dynamics` at every stored state, resolved in
    /// `frame`: one row per state, one column per written coordinate.
    ///
    /// `subsets` restricts the columns to some of the dynamics' write
    /// subsets, in the requested order; `None` keeps all of them.
    pub fn get_dynamics_contribution(
        &self,
        dynamics: &Arc<dyn Dynamics>,
        frame: &Arc<Frame>,
        subsets: Option<&[Arc<dyn CoordinatesSubset>]>,
    ) -> Result<DMatrix<f64>> {
        self.find_dynamics(dynamics)?;

        let write_subsets = dynamics.write_coordinates_subsets();
        let requested = subsets.unwrap_or(&write_subsets);

        let mut columns = Vec::new();
        for subset in requested {
            let mut offset = 0;
            let mut found = false;
            for written in &write_subsets {
                if **written == **subset {
                    columns.extend(offset..offset + written.size());
                    found = true;
                    break;
                }
                offset += written.size();
            }
            if !found {
                return Err(Error::UndefinedArgument(
                    "Provided coordinates subset is not part of the dynamics write coordinates subsets."
                        .to_string(),
                ));
            }
        }

        let read_subsets = dynamics.read_coordinates_subsets();
        let mut values = Vec::with_capacity(self.states.len() * columns.len());
        for state in &self.states {
            let state = state.in_frame(frame)?;
            let x = state.extract_coordinates(&read_subsets)?;
            let contribution = dynamics.compute_contribution(state.instant(), &x, frame)?;
            values.extend(columns.iter().map(|&column| contribution[column]));
        }

        Ok(DMatrix::from_row_slice(
            self.states.len(),
            columns.len(),
            &values,
        ))
    }

    /// Velocity-derivative columns of [`Self::get_dynamics_contribution`].
    pub fn get_dynamics_acceleration_contribution(
        &self,
        dynamics: &Arc<dyn Dynamics>,
        frame: &Arc<Frame>,
    ) -> Result<DMatrix<f64>> {
        self.get_dynamics_contribution(
            dynamics,
            frame,
            Some(&[CartesianVelocity::default_subset()][..]),
        )
    }

    /// Full contribution of every dynamics, in the order of
    /// [`SegmentSolution::dynamics`].
    pub fn get_all_dynamics_contributions(
        &self,
        frame: &Arc<Frame>,
    ) -> Result<Vec<(Arc<dyn Dynamics>, DMatrix<f64>)>> {
        self.dynamics
            .iter()
            .map(|dynamics| {
                let contribution = self.get_dynamics_contribution(dynamics, frame, None)?;
                Ok((Arc::clone(dynamics), contribution))
            })
            .collect()
    }
}

/// Validates instants requested from a solution spanning `[start, end]`.
pub(crate) fn check_instants(instants: &[f64], start: f64, end: f64) -> Result<()> {
    if instants.windows(2).any(|pair| pair[1] <= pair[0]) {
        return Err(Error::WrongOrder("Instants".to_string()));
    }
    for &instant in instants {
        if instant < start || instant > end {
            return Err(Error::OutOfRange {
                what: "Instant".to_string(),
                value: instant,
                lower: start,
                upper: end,
            });
        }
    }
    Ok(())
}

pub(crate) fn delta_v(specific_impulse: f64, initial_mass: f64, final_mass: f64) -> Result<f64> {
    if initial_mass == final_mass {
        return Ok(0.0);
    }
    if initial_mass <= 0.0 || final_mass <= 0.0 {
        return Err(Error::Runtime(format!(
            "Cannot compute delta-v between masses {initial_mass} kg and {final_mass} kg."
        )));
    }
    Ok(STANDARD_GRAVITY * specific_impulse * (initial_mass / final_mass).ln())
}

impl fmt::Display for SegmentSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Segment solution [{}] ({:?})", self.name, self.segment_type)?;
        match (self.start_instant(), self.end_instant()) {
            (Ok(start), Ok(end)) => {
                writeln!(f, "  Start instant: {start:.6} s")?;
                writeln!(f, "  End instant: {end:.6} s")?;
                writeln!(f, "  Propagation duration: {:.6} s", end - start)?;
            }
            _ => writeln!(f, "  No states")?,
        }
        writeln!(f, "  Number of states: {}", self.states.len())?;
        write!(f, "  Condition is satisfied: {}", self.condition_is_satisfied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::coordinates::CartesianPosition;
    use crate::dynamics::CentralBodyGravity;
    use crate::event_condition::{Criterion, RealCondition};
    use crate::flight::{PropulsionSystem, SatelliteSystem};
    use crate::guidance_law::ConstantThrust;
    use crate::test_utils::{leo_state, leo_state_with_mass, mass_broker, two_body};

    fn fifteen_minutes() -> Arc<dyn EventCondition> {
        Arc::new(RealCondition::instant_condition(Criterion::AnyCrossing, 900.0))
    }

    fn coast_segment() -> Segment {
        Segment::coast("Coast", fifteen_minutes(), two_body(), NumericalSolver::default()).unwrap()
    }

    fn thruster() -> Arc<Thruster> {
        let propulsion = PropulsionSystem::new(1.0, 1500.0).unwrap();
        let satellite = SatelliteSystem::new(100.0, propulsion).unwrap();
        Arc::new(Thruster::new(satellite, Arc::new(ConstantThrust::intrack())))
    }

    fn mass_solution(masses: &[f64]) -> SegmentSolution {
        let states = masses
            .iter()
            .enumerate()
            .map(|(i, &mass)| {
                let coordinates = leo_state_with_mass(mass).coordinates().clone();
                State::new(i as f64, coordinates, Frame::gcrf(), mass_broker()).unwrap()
            })
            .collect();
        SegmentSolution::new("Masses", two_body(), states, true, SegmentType::Maneuver)
    }

    fn empty_solution() -> SegmentSolution {
        SegmentSolution::new("Empty", two_body(), vec![], true, SegmentType::Coast)
    }

    #[test]
    fn construction_validates_eagerly() {
        let err = Segment::coast("Coast", fifteen_minutes(), vec![], NumericalSolver::default())
            .expect_err("no dynamics");
        assert!(matches!(err, Error::UndefinedArgument(_)));

        let undefined_solver = NumericalSolver {
            time_step: f64::NAN,
            ..NumericalSolver::default()
        };
        let err = Segment::coast("Coast", fifteen_minutes(), two_body(), undefined_solver)
            .expect_err("invalid solver");
        assert!(matches!(err, Error::InvalidConfiguration(_)));

        let err = Segment::maneuver(
            "Burn",
            fifteen_minutes(),
            thruster(),
            vec![],
            NumericalSolver::default(),
        )
        .expect_err("no base dynamics");
        assert!(matches!(err, Error::UndefinedArgument(_)));
    }

    #[test]
    fn accessors_return_construction_values() {
        let condition = fifteen_minutes();
        let dynamics = two_body();
        let segment =
            Segment::coast("Coast", Arc::clone(&condition), dynamics.clone(), NumericalSolver::default())
                .unwrap();

        assert_eq!(segment.name(), "Coast");
        assert_eq!(segment.segment_type(), SegmentType::Coast);
        assert!(Arc::ptr_eq(segment.event_condition(), &condition));
        assert_eq!(segment.dynamics().len(), 2);
        assert!(dynamics::is_same(&segment.dynamics()[0], &dynamics[0]));
        assert_eq!(segment.numerical_solver(), &NumericalSolver::default());

        let burn = Segment::maneuver(
            "Burn",
            fifteen_minutes(),
            thruster(),
            two_body(),
            NumericalSolver::default(),
        )
        .unwrap();
        assert_eq!(burn.segment_type(), SegmentType::Maneuver);
        assert_eq!(burn.dynamics().len(), 3);
        assert!(format!("{burn}").contains("Thruster"));
    }

    #[test]
    fn coast_stops_at_the_event() {
        let solution = coast_segment().solve(&leo_state()).unwrap();

        assert!(solution.condition_is_satisfied);
        assert_eq!(solution.name, "Coast");
        assert_eq!(solution.start_instant().unwrap(), 0.0);
        assert!((solution.end_instant().unwrap() - 900.0).abs() < 1e-7);
        assert!(format!("{solution}").contains("Condition is satisfied: true"));
    }

    #[test]
    fn short_budget_leaves_condition_unsatisfied() {
        let solution = coast_segment()
            .solve_with_duration(&leo_state(), 60.0)
            .unwrap();

        assert!(!solution.condition_is_satisfied);
        assert_eq!(solution.end_instant().unwrap(), 60.0);
        assert!(coast_segment().solve_with_duration(&leo_state(), f64::NAN).is_err());
    }

    #[test]
    fn maneuver_burns_propellant_at_the_engine_flow_rate() {
        let burn = Segment::maneuver(
            "Burn",
            fifteen_minutes(),
            thruster(),
            two_body(),
            NumericalSolver::default(),
        )
        .unwrap();
        let solution = burn.solve(&leo_state_with_mass(200.0)).unwrap();

        let flow_rate = 1.0 / (1500.0 * STANDARD_GRAVITY);
        let duration = solution.propagation_duration().unwrap();
        assert!(solution.condition_is_satisfied);
        assert!((solution.compute_delta_mass().unwrap() - flow_rate * duration).abs() < 1e-9);

        let expected = STANDARD_GRAVITY * 1500.0 * (200.0 / solution.final_mass().unwrap()).ln();
        assert!((solution.compute_delta_v(1500.0).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn coasting_without_mass_subset_is_fine_until_mass_is_asked() {
        let solution = coast_segment()
            .solve_with_duration(&leo_state(), 10.0)
            .unwrap();
        assert!(matches!(
            solution.initial_mass(),
            Err(Error::UndefinedCoordinates { .. })
        ));
    }

    #[test]
    fn mass_budget_follows_rocket_equation() {
        let solution = mass_solution(&[200.0, 190.0, 180.0]);

        assert_eq!(solution.initial_mass().unwrap(), 200.0);
        assert_eq!(solution.final_mass().unwrap(), 180.0);
        assert_eq!(solution.compute_delta_mass().unwrap(), 20.0);
        assert!((solution.compute_delta_v(1500.0).unwrap() - 1549.850551313734).abs() < 1e-9);

        assert_eq!(mass_solution(&[200.0, 200.0]).compute_delta_v(1500.0).unwrap(), 0.0);
    }

    #[test]
    fn empty_solution_has_no_instants_and_no_mass_change() {
        let solution = empty_solution();

        assert!(matches!(solution.start_instant(), Err(Error::Runtime(_))));
        assert!(matches!(solution.end_instant(), Err(Error::Runtime(_))));
        assert!(matches!(solution.initial_mass(), Err(Error::Runtime(_))));
        assert!(matches!(solution.final_mass(), Err(Error::Runtime(_))));
        assert!(matches!(solution.propagation_duration(), Err(Error::Runtime(_))));
        assert_eq!(solution.compute_delta_mass().unwrap(), 0.0);
        assert_eq!(solution.compute_delta_v(1500.0).unwrap(), 0.0);
        assert!(matches!(
            solution.calculate_states_at(&[0.0], &NumericalSolver::default()),
            Err(Error::Runtime(_))
        ));
    }

    #[test]
    fn calculate_states_at_validates_instants() {
        let solution = coast_segment().solve(&leo_state()).unwrap();
        let solver = NumericalSolver::default();

        assert!(solution.calculate_states_at(&[], &solver).unwrap().is_empty());
        assert!(matches!(
            solution.calculate_states_at(&[100.0, 50.0], &solver),
            Err(Error::WrongOrder(_))
        ));
        assert!(matches!(
            solution.calculate_states_at(&[50.0, 50.0], &solver),
            Err(Error::WrongOrder(_))
        ));
        assert!(matches!(
            solution.calculate_states_at(&[100.0, 1800.0], &solver),
            Err(Error::OutOfRange { .. })
        ));
    }

    #[test]
    fn calculate_states_at_matches_direct_propagation() {
        let solution = coast_segment().solve(&leo_state()).unwrap();
        let solver = NumericalSolver::default();
        let end = solution.end_instant().unwrap();
        let instants = [0.0, 12.5, 300.0, 301.0, 642.25, end];

        let states = solution.calculate_states_at(&instants, &solver).unwrap();
        let reference = solver
            .integrate_times(&leo_state(), &instants, &two_body())
            .unwrap();

        assert_eq!(states.len(), instants.len());
        for ((state, expected), instant) in states.iter().zip(&reference).zip(instants) {
            assert_eq!(state.instant(), instant);
            assert!((state.coordinates() - expected.coordinates()).norm() < 1e-3);
        }
        assert_eq!(states.last().unwrap(), solution.states.last().unwrap());
    }

    #[test]
    fn explicit_write_subsets_match_default_contribution() {
        let solution = coast_segment().solve_with_duration(&leo_state(), 60.0).unwrap();
        let gravity = Arc::clone(&solution.dynamics[1]);
        let frame = Frame::gcrf();

        let default = solution
            .get_dynamics_contribution(&gravity, &frame, None)
            .unwrap();
        let explicit = solution
            .get_dynamics_contribution(
                &gravity,
                &frame,
                Some(gravity.write_coordinates_subsets().as_slice()),
            )
            .unwrap();

        assert_eq!(default, explicit);
        assert_eq!(default.nrows(), solution.states.len());
        assert_eq!(default.ncols(), 3);
    }

    #[test]
    fn contribution_requests_are_checked() {
        let solution = coast_segment().solve_with_duration(&leo_state(), 60.0).unwrap();
        let frame = Frame::gcrf();
        let gravity = Arc::clone(&solution.dynamics[1]);

        let err = solution
            .get_dynamics_contribution(
                &gravity,
                &frame,
                Some(&[CartesianPosition::default_subset()][..]),
            )
            .expect_err("gravity does not write position");
        assert!(matches!(err, Error::UndefinedArgument(_)));
        assert_eq!(
            err.to_string(),
            "Provided coordinates subset is not part of the dynamics write coordinates subsets."
        );

        let foreign: Arc<dyn Dynamics> = Arc::new(CentralBodyGravity::earth());
        let err = solution
            .get_dynamics_contribution(&foreign, &frame, None)
            .expect_err("not one of the segment dynamics");
        assert!(matches!(err, Error::UndefinedArgument(_)));
        assert_eq!(
            err.to_string(),
            "Provided dynamics is not part of the segment dynamics."
        );

        let position_derivative = Arc::clone(&solution.dynamics[0]);
        let err = solution
            .get_dynamics_contribution(
                &position_derivative,
                &frame,
                Some(&[ScalarSubset::drag_coefficient()][..]),
            )
            .expect_err("drag coefficient is not written");
        assert!(matches!(err, Error::UndefinedArgument(_)));
    }

    #[test]
    fn acceleration_contribution_needs_a_velocity_writer() {
        let solution = coast_segment().solve_with_duration(&leo_state(), 60.0).unwrap();
        let frame = Frame::gcrf();

        let gravity = solution
            .get_dynamics_acceleration_contribution(&solution.dynamics[1], &frame)
            .unwrap();
        assert_eq!(gravity.ncols(), 3);
        let first = gravity.row(0);
        let expected = -crate::constants::EARTH_GRAVITATIONAL_PARAMETER / 7.0e6_f64.powi(2);
        assert!((first[0] - expected).abs() < 1e-12);

        let position_derivative = Arc::clone(&solution.dynamics[0]);
        assert!(solution
            .get_dynamics_acceleration_contribution(&position_derivative, &frame)
            .is_err());
    }

    #[test]
    fn all_contributions_follow_dynamics_order() {
        let solution = coast_segment().solve_with_duration(&leo_state(), 60.0).unwrap();
        let contributions = solution
            .get_all_dynamics_contributions(&Frame::gcrf())
            .unwrap();

        assert_eq!(contributions.len(), solution.dynamics.len());
        for ((dynamics, matrix), expected) in contributions.iter().zip(&solution.dynamics) {
            assert!(dynamics::is_same(dynamics, expected));
            assert_eq!(matrix.nrows(), solution.states.len());
        }

        // Position derivative reproduces the stored velocities.
        let (_, velocities) = &contributions[0];
        let last = solution.states.last().unwrap();
        let row = velocities.row(velocities.nrows() - 1);
        let stored = last.velocity().unwrap();
        for axis in 0..3 {
            assert_eq!(row[axis], stored[axis]);
        }
    }
}

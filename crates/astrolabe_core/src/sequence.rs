//! Ordered, repeatable chains of segments under a global duration budget.

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn, Level, LevelFilter};

use crate::constants::DEFAULT_SEGMENT_DURATION;
use crate::dynamics::{Dynamics, Thruster};
use crate::error::{Error, Result};
use crate::event_condition::EventCondition;
use crate::numerical_solver::NumericalSolver;
use crate::segment::{self, Segment, SegmentSolution};
use crate::state::State;

/// Highest accepted [`Sequence::verbosity`].
pub const MAXIMUM_VERBOSITY: u8 = 5;

#[derive(Debug, Clone)]
pub struct Sequence {
    segments: Vec<Segment>,
    numerical_solver: NumericalSolver,
    dynamics: Vec<Arc<dyn Dynamics>>,
    maximum_propagation_duration: f64,
    verbosity: u8,
}

impl Default for Sequence {
    fn default() -> Self {
        Self {
            segments: Vec::new(),
            numerical_solver: NumericalSolver::default(),
            dynamics: Vec::new(),
            maximum_propagation_duration: DEFAULT_SEGMENT_DURATION,
            verbosity: 0,
        }
    }
}

impl Sequence {
    /// `numerical_solver` and `dynamics` are only used by
    /// [`Sequence::add_coast_segment`] and [`Sequence::add_maneuver_segment`];
    /// segments added directly keep their own.
    pub fn new(
        segments: Vec<Segment>,
        numerical_solver: NumericalSolver,
        dynamics: Vec<Arc<dyn Dynamics>>,
        maximum_propagation_duration: f64,
        verbosity: u8,
    ) -> Result<Self> {
        if verbosity > MAXIMUM_VERBOSITY {
            return Err(Error::InvalidArgument(format!(
                "Verbosity must be between 0 and {MAXIMUM_VERBOSITY}, got {verbosity}."
            )));
        }
        if !maximum_propagation_duration.is_finite() || maximum_propagation_duration <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "Maximum propagation duration must be positive, got {maximum_propagation_duration}."
            )));
        }
        numerical_solver.validate()?;

        Ok(Self {
            segments,
            numerical_solver,
            dynamics,
            maximum_propagation_duration,
            verbosity,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn numerical_solver(&self) -> &NumericalSolver {
        &self.numerical_solver
    }

    pub fn dynamics(&self) -> &[Arc<dyn Dynamics>] {
        &self.dynamics
    }

    pub fn maximum_propagation_duration(&self) -> f64 {
        self.maximum_propagation_duration
    }

    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Most detailed level this sequence logs at.
    pub fn level_filter(&self) -> LevelFilter {
        match self.verbosity {
            0 => LevelFilter::Off,
            1 => LevelFilter::Error,
            2 => LevelFilter::Warn,
            3 => LevelFilter::Info,
            4 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    fn logs(&self, level: Level) -> bool {
        level <= self.level_filter()
    }

    pub fn add_segment(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn add_segments(&mut self, segments: impl IntoIterator<Item = Segment>) {
        self.segments.extend(segments);
    }

    /// Appends a coast under the sequence dynamics and solver.
    pub fn add_coast_segment(&mut self, event_condition: Arc<dyn EventCondition>) -> Result<()> {
        let segment = Segment::coast(
            "Coast",
            event_condition,
            self.dynamics.clone(),
            self.numerical_solver,
        )?;
        self.segments.push(segment);
        Ok(())
    }

    /// Appends a burn of `thruster` on top of the sequence dynamics.
    pub fn add_maneuver_segment(
        &mut self,
        event_condition: Arc<dyn EventCondition>,
        thruster: Arc<Thruster>,
    ) -> Result<()> {
        let segment = Segment::maneuver(
            "Maneuver",
            event_condition,
            thruster,
            self.dynamics.clone(),
            self.numerical_solver,
        )?;
        self.segments.push(segment);
        Ok(())
    }

    /// Runs the segment list `repetition_count` times, chaining each segment
    /// from the previous one's final state.
    ///
    /// Every segment is budgeted with what remains of
    /// [`Sequence::maximum_propagation_duration`]. The run stops early, with
    /// `execution_is_complete == false`, at the first segment whose condition
    /// is not met.
    pub fn solve(&self, state: &State, repetition_count: usize) -> Result<SequenceSolution> {
        if repetition_count == 0 {
            return Err(Error::InvalidArgument(
                "Repetition count must be greater than zero.".to_string(),
            ));
        }

        let mut segment_solutions = Vec::new();
        let mut seed = state.clone();
        let mut elapsed = 0.0;

        for repetition in 0..repetition_count {
            if self.logs(Level::Debug) {
                debug!("Repetition {} of {}.", repetition + 1, repetition_count);
            }

            for segment in &self.segments {
                let remaining = self.maximum_propagation_duration - elapsed;
                if remaining <= 0.0 {
                    if self.logs(Level::Warn) {
                        warn!("Sequence duration budget exhausted before segment [{}].", segment.name());
                    }
                    return Ok(SequenceSolution::new(segment_solutions, false));
                }

                let solution = segment.solve_with_duration(&seed, remaining)?;
                let (complete, end) = self.record(&solution)?;
                elapsed += end.instant() - seed.instant();
                seed = end;
                segment_solutions.push(solution);

                if !complete {
                    return Ok(SequenceSolution::new(segment_solutions, false));
                }
            }
        }

        if self.logs(Level::Info) {
            info!("Sequence solved in {} segment(s).", segment_solutions.len());
        }
        Ok(SequenceSolution::new(segment_solutions, true))
    }

    /// [`Sequence::solve_to_condition_with_duration`] with each leg bounded
    /// only by the sequence budget.
    pub fn solve_to_condition(
        &self,
        state: &State,
        event_condition: &dyn EventCondition,
    ) -> Result<SequenceSolution> {
        self.solve_to_condition_with_duration(state, event_condition, self.maximum_propagation_duration)
    }

    /// Repeats the segment list until `event_condition` holds at the end of
    /// a segment.
    ///
    /// The condition is resolved against `state` and checked after every
    /// segment, between that segment's seed and final states. Each segment
    /// is budgeted with the smaller of `maximum_segment_duration` and what
    /// remains of the sequence budget.
    pub fn solve_to_condition_with_duration(
        &self,
        state: &State,
        event_condition: &dyn EventCondition,
        maximum_segment_duration: f64,
    ) -> Result<SequenceSolution> {
        if !maximum_segment_duration.is_finite() || maximum_segment_duration <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "Maximum segment duration must be positive, got {maximum_segment_duration}."
            )));
        }

        let condition = event_condition.resolve(state);
        let mut segment_solutions = Vec::new();
        if self.segments.is_empty() {
            if self.logs(Level::Warn) {
                warn!("Sequence has no segments to solve [{}] with.", condition.name());
            }
            return Ok(SequenceSolution::new(segment_solutions, false));
        }

        let mut seed = state.clone();
        let mut elapsed = 0.0;
        let mut stalled = 0;
        for segment in self.segments.iter().cycle() {
            let remaining = self.maximum_propagation_duration - elapsed;
            if remaining <= 0.0 {
                if self.logs(Level::Warn) {
                    warn!("Sequence duration budget exhausted before [{}] was met.", condition.name());
                }
                break;
            }

            let solution =
                segment.solve_with_duration(&seed, maximum_segment_duration.min(remaining))?;
            let (complete, end) = self.record(&solution)?;
            let satisfied = condition.is_satisfied(&end, &seed);
            let duration = end.instant() - seed.instant();
            elapsed += duration;
            seed = end;
            segment_solutions.push(solution);

            if satisfied {
                if self.logs(Level::Info) {
                    info!(
                        "[{}] met after {} segment(s).",
                        condition.name(),
                        segment_solutions.len()
                    );
                }
                return Ok(SequenceSolution::new(segment_solutions, true));
            }
            if !complete {
                break;
            }

            // A full pass without progress would repeat forever.
            stalled = if duration == 0.0 { stalled + 1 } else { 0 };
            if stalled == self.segments.len() {
                if self.logs(Level::Warn) {
                    warn!("Sequence makes no progress towards [{}].", condition.name());
                }
                break;
            }
        }

        Ok(SequenceSolution::new(segment_solutions, false))
    }

    /// Logs a solved segment, returning whether its condition was met and
    /// its final state.
    fn record(&self, solution: &SegmentSolution) -> Result<(bool, State)> {
        let end = solution
            .states
            .last()
            .cloned()
            .ok_or_else(|| Error::Runtime(format!("Segment [{}] returned no states.", solution.name)))?;

        if solution.condition_is_satisfied {
            if self.logs(Level::Info) {
                info!("Segment [{}] ended at {} s.", solution.name, end.instant());
            }
        } else if self.logs(Level::Warn) {
            warn!(
                "Segment [{}] did not meet its condition before {} s.",
                solution.name,
                end.instant()
            );
        }
        Ok((solution.condition_is_satisfied, end))
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sequence")?;
        writeln!(f, "  Maximum propagation duration: {} s", self.maximum_propagation_duration)?;
        writeln!(f, "  Verbosity: {}", self.verbosity)?;
        writeln!(f, "  Numerical solver: {}", self.numerical_solver)?;
        write!(f, "  Segments: {}", self.segments.len())?;
        for segment in &self.segments {
            write!(f, "\n    {} ({:?})", segment.name(), segment.segment_type())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SequenceSolution {
    pub segment_solutions: Vec<SegmentSolution>,
    pub execution_is_complete: bool,
}

impl SequenceSolution {
    pub fn new(segment_solutions: Vec<SegmentSolution>, execution_is_complete: bool) -> Self {
        Self {
            segment_solutions,
            execution_is_complete,
        }
    }

    fn non_empty(&self) -> impl Iterator<Item = &SegmentSolution> {
        self.segment_solutions
            .iter()
            .filter(|solution| !solution.states.is_empty())
    }

    fn first(&self) -> Result<&SegmentSolution> {
        self.non_empty()
            .next()
            .ok_or_else(|| Error::Runtime("Sequence solution has no states.".to_string()))
    }

    fn last(&self) -> Result<&SegmentSolution> {
        self.non_empty()
            .last()
            .ok_or_else(|| Error::Runtime("Sequence solution has no states.".to_string()))
    }

    /// States of every segment in order, with the state shared by
    /// consecutive segments kept once.
    pub fn states(&self) -> Result<Vec<State>> {
        let mut states: Vec<State> = Vec::new();
        for solution in self.non_empty() {
            let joint = match (states.last(), solution.states.first()) {
                (Some(last), Some(first)) => last.instant() == first.instant(),
                _ => false,
            };
            let skip = usize::from(joint);
            states.extend(solution.states.iter().skip(skip).cloned());
        }

        if states.is_empty() {
            return Err(Error::Runtime("Sequence solution has no states.".to_string()));
        }
        Ok(states)
    }

    pub fn start_instant(&self) -> Result<f64> {
        self.first()?.start_instant()
    }

    pub fn end_instant(&self) -> Result<f64> {
        self.last()?.end_instant()
    }

    pub fn propagation_duration(&self) -> Result<f64> {
        Ok(self.end_instant()? - self.start_instant()?)
    }

    pub fn initial_mass(&self) -> Result<f64> {
        self.first()?.initial_mass()
    }

    pub fn final_mass(&self) -> Result<f64> {
        self.last()?.final_mass()
    }

    pub fn compute_delta_mass(&self) -> Result<f64> {
        if self.non_empty().next().is_none() {
            return Ok(0.0);
        }
        Ok(self.initial_mass()? - self.final_mass()?)
    }

    pub fn compute_delta_v(&self, specific_impulse: f64) -> Result<f64> {
        if self.non_empty().next().is_none() {
            return Ok(0.0);
        }
        segment::delta_v(specific_impulse, self.initial_mass()?, self.final_mass()?)
    }

    /// States at `instants`, each computed by the segment solution covering
    /// it (the earlier one on a shared boundary).
    ///
    /// Same rules as [`SegmentSolution::calculate_states_at`]: instants must
    /// be strictly increasing and lie within the sequence span.
    pub fn calculate_states_at(
        &self,
        instants: &[f64],
        numerical_solver: &NumericalSolver,
    ) -> Result<Vec<State>> {
        let (start, end) = (self.start_instant()?, self.end_instant()?);
        segment::check_instants(instants, start, end)?;

        let mut states = Vec::with_capacity(instants.len());
        let mut remaining = instants;
        for solution in self.non_empty() {
            if remaining.is_empty() {
                break;
            }
            let solution_end = solution.end_instant()?;
            let count = remaining.iter().take_while(|&&t| t <= solution_end).count();
            if count > 0 {
                states.extend(solution.calculate_states_at(&remaining[..count], numerical_solver)?);
                remaining = &remaining[count..];
            }
        }

        Ok(states)
    }
}

impl fmt::Display for SequenceSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sequence solution")?;
        writeln!(f, "  Execution is complete: {}", self.execution_is_complete)?;
        if let (Ok(start), Ok(end)) = (self.start_instant(), self.end_instant()) {
            writeln!(f, "  Start instant: {start:.6} s")?;
            writeln!(f, "  End instant: {end:.6} s")?;
        }
        write!(f, "  Segment solutions: {}", self.segment_solutions.len())?;
        for solution in &self.segment_solutions {
            write!(
                f,
                "\n    {} ({:?}): {} state(s), condition is satisfied: {}",
                solution.name,
                solution.segment_type,
                solution.states.len(),
                solution.condition_is_satisfied
            )?;
        }
        Ok(())
    }
}

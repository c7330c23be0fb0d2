//! Bracketed refinement of event instants.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ROOT_ITERATIONS, DEFAULT_ROOT_TOLERANCE};
use crate::error::{Error, Result};

/// Settings for locating the instant at which an event condition starts to
/// hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootSolver {
    pub maximum_iteration_count: usize,
    /// Width of the final bracket [s].
    pub tolerance: f64,
}

impl Default for RootSolver {
    fn default() -> Self {
        Self {
            maximum_iteration_count: DEFAULT_ROOT_ITERATIONS,
            tolerance: DEFAULT_ROOT_TOLERANCE,
        }
    }
}

/// One evaluation of the condition during refinement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub instant: f64,
    pub satisfied: bool,
    pub residual: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootSolution {
    /// Earliest instant known to satisfy the condition.
    pub root: f64,
    pub residual: Option<f64>,
    pub iteration_count: usize,
    pub has_converged: bool,
}

impl RootSolver {
    pub fn new(maximum_iteration_count: usize, tolerance: f64) -> Self {
        Self {
            maximum_iteration_count,
            tolerance,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.maximum_iteration_count == 0 {
            return Err(Error::InvalidConfiguration(
                "Root solver needs at least one iteration.".to_string(),
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "Root solver tolerance must be positive, got {}.",
                self.tolerance
            )));
        }
        Ok(())
    }

    /// Shrinks `[before, after]` around the instant where the condition
    /// starts to hold. `before` must not satisfy the condition and `after`
    /// must. Instants may decrease from `before` to `after` (backward
    /// propagation).
    ///
    /// Steps are secant estimates on the residuals, clamped away from the
    /// bracket ends, and fall back to bisection whenever a step failed to
    /// halve the bracket or no residual is available.
    pub fn solve<F>(&self, mut evaluate_at: F, before: Sample, after: Sample) -> Result<RootSolution>
    where
        F: FnMut(f64) -> Result<Sample>,
    {
        let (mut lower, mut upper) = (before, after);
        let mut bisect = false;
        let mut iteration_count = 0;

        let solution = |upper: &Sample, iteration_count, has_converged| RootSolution {
            root: upper.instant,
            residual: upper.residual,
            iteration_count,
            has_converged,
        };

        while iteration_count < self.maximum_iteration_count {
            let width = upper.instant - lower.instant;
            if width.abs() <= self.tolerance {
                return Ok(solution(&upper, iteration_count, true));
            }

            let mut fraction = 0.5;
            if !bisect {
                if let (Some(a), Some(b)) = (lower.residual, upper.residual) {
                    if a.is_finite() && b.is_finite() && a != b {
                        fraction = (a / (a - b)).clamp(0.05, 0.95);
                    }
                }
            }

            let candidate = lower.instant + fraction * width;
            if candidate == lower.instant || candidate == upper.instant {
                // Bracket is down to adjacent floating point values.
                return Ok(solution(&upper, iteration_count, true));
            }

            iteration_count += 1;
            let sample = evaluate_at(candidate)?;
            if sample.satisfied {
                upper = sample;
                if sample.residual == Some(0.0) {
                    return Ok(solution(&upper, iteration_count, true));
                }
            } else {
                lower = sample;
            }

            bisect = (upper.instant - lower.instant).abs() > 0.5 * width.abs();
        }

        let has_converged = (upper.instant - lower.instant).abs() <= self.tolerance;
        Ok(solution(&upper, iteration_count, has_converged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(instant: f64, residual: f64) -> Sample {
        Sample {
            instant,
            satisfied: residual >= 0.0,
            residual: Some(residual),
        }
    }

    #[test]
    fn secant_refinement_converges_to_tolerance() {
        let f = |t: f64| t * t - 2.0;
        let solver = RootSolver::default();

        let solution = solver
            .solve(|t| Ok(sample(t, f(t))), sample(1.0, f(1.0)), sample(2.0, f(2.0)))
            .unwrap();

        assert!(solution.has_converged);
        assert!(solution.root >= 2.0_f64.sqrt());
        assert!((solution.root - 2.0_f64.sqrt()).abs() < 1e-7);
        assert!(solution.iteration_count < 24);
    }

    #[test]
    fn boolean_only_conditions_bisect() {
        let evaluate_at = |t: f64| {
            Ok(Sample {
                instant: t,
                satisfied: t >= 0.3,
                residual: None,
            })
        };
        let before = Sample {
            instant: 0.0,
            satisfied: false,
            residual: None,
        };
        let after = Sample {
            instant: 1.0,
            satisfied: true,
            residual: None,
        };

        let solution = RootSolver::default().solve(evaluate_at, before, after).unwrap();
        assert!(solution.has_converged);
        assert!((solution.root - 0.3).abs() < 1e-7);
        assert!(solution.iteration_count >= 23);
    }

    #[test]
    fn exact_zero_stops_refinement() {
        let f = |t: f64| t - 1.5;
        let solution = RootSolver::default()
            .solve(|t| Ok(sample(t, f(t))), sample(1.0, f(1.0)), sample(2.0, f(2.0)))
            .unwrap();
        assert_eq!(solution.root, 1.5);
        assert_eq!(solution.iteration_count, 1);
        assert_eq!(solution.residual, Some(0.0));
    }

    #[test]
    fn backward_brackets_are_supported() {
        // Condition holds for t <= -4, propagating backward from 0.
        let f = |t: f64| -4.0 - t;
        let solution = RootSolver::default()
            .solve(|t| Ok(sample(t, f(t))), sample(0.0, f(0.0)), sample(-10.0, f(-10.0)))
            .unwrap();
        assert!(solution.has_converged);
        assert!((solution.root + 4.0).abs() < 1e-7);
    }

    #[test]
    fn iteration_cap_reports_non_convergence() {
        let evaluate_at = |t: f64| {
            Ok(Sample {
                instant: t,
                satisfied: t >= 0.3,
                residual: None,
            })
        };
        let before = Sample {
            instant: 0.0,
            satisfied: false,
            residual: None,
        };
        let after = Sample {
            instant: 1.0,
            satisfied: true,
            residual: None,
        };

        let solution = RootSolver::new(3, 1e-7).solve(evaluate_at, before, after).unwrap();
        assert!(!solution.has_converged);
        assert_eq!(solution.iteration_count, 3);
        assert!(solution.root >= 0.3);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert!(RootSolver::new(0, 1e-7).validate().is_err());
        assert!(RootSolver::new(10, f64::NAN).validate().is_err());
        assert!(RootSolver::default().validate().is_ok());
    }
}

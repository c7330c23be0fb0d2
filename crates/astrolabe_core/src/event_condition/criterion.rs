use serde::{Deserialize, Serialize};

/// How the residual of a condition decides satisfaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Criterion {
    StrictlyPositive,
    StrictlyNegative,
    AnyCrossing,
    PositiveCrossing,
    NegativeCrossing,
    /// Always satisfied.
    Ignore,
}

impl Criterion {
    /// `current` and `previous` are residuals of consecutive samples. A
    /// residual of exactly zero counts as reached.
    pub fn is_satisfied(&self, current: f64, previous: f64) -> bool {
        match self {
            Criterion::StrictlyPositive => current > 0.0,
            Criterion::StrictlyNegative => current < 0.0,
            Criterion::PositiveCrossing => previous < 0.0 && current >= 0.0,
            Criterion::NegativeCrossing => previous > 0.0 && current <= 0.0,
            Criterion::AnyCrossing => {
                (previous < 0.0 && current >= 0.0) || (previous > 0.0 && current <= 0.0)
            }
            Criterion::Ignore => true,
        }
    }

    pub fn is_crossing(&self) -> bool {
        matches!(
            self,
            Criterion::AnyCrossing | Criterion::PositiveCrossing | Criterion::NegativeCrossing
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_criteria_only_look_at_current() {
        assert!(Criterion::StrictlyPositive.is_satisfied(1.0, 1.0));
        assert!(!Criterion::StrictlyPositive.is_satisfied(0.0, -1.0));
        assert!(Criterion::StrictlyNegative.is_satisfied(-1e-9, 5.0));
    }

    #[test]
    fn crossings_need_a_sign_change() {
        assert!(Criterion::PositiveCrossing.is_satisfied(0.5, -0.5));
        assert!(!Criterion::PositiveCrossing.is_satisfied(-0.5, 0.5));
        assert!(Criterion::NegativeCrossing.is_satisfied(-0.5, 0.5));
        assert!(Criterion::AnyCrossing.is_satisfied(-0.5, 0.5));
        assert!(Criterion::AnyCrossing.is_satisfied(0.5, -0.5));
        assert!(!Criterion::AnyCrossing.is_satisfied(0.5, 0.25));
    }

    #[test]
    fn exact_zero_counts_as_crossed() {
        assert!(Criterion::PositiveCrossing.is_satisfied(0.0, -1.0));
        assert!(Criterion::NegativeCrossing.is_satisfied(0.0, 1.0));
        assert!(!Criterion::AnyCrossing.is_satisfied(1.0, 0.0));
    }

    #[test]
    fn ignore_is_always_satisfied() {
        assert!(Criterion::Ignore.is_satisfied(f64::NAN, f64::NAN));
        assert!(!Criterion::Ignore.is_crossing());
    }
}

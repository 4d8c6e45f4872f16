//! Iterative concentration capping.

use std::collections::BTreeMap;

use capra_traits::{CapError, CapOutcome, Capper, IntegrityCheck};
use tracing::{info, warn};

use crate::CapState;

/// Absolute tolerance on a group total exceeding the cap amount.
pub const DEFAULT_TOLERANCE: f64 = 1e-3;

/// Absolute tolerance on the mass-conservation check, in amount units.
pub const DEFAULT_CONSERVATION_TOLERANCE: f64 = 5.0;

/// Configuration for the iterative capper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapConfig {
    /// Maximum share of total amount any group may hold, in `(0, 1)`.
    pub cap_fraction: f64,
    /// Absolute tolerance on the per-group cap check.
    pub tolerance: f64,
    /// Absolute tolerance on the conservation check.
    pub conservation_tolerance: f64,
}

impl CapConfig {
    /// Create a configuration with default tolerances.
    #[must_use]
    pub const fn new(cap_fraction: f64) -> Self {
        Self {
            cap_fraction,
            tolerance: DEFAULT_TOLERANCE,
            conservation_tolerance: DEFAULT_CONSERVATION_TOLERANCE,
        }
    }
}

/// Iterative weight-redistribution capper.
///
/// Enforces a maximum share of total amount per group by repeatedly freezing
/// every over-cap group at the cap amount and redistributing the excess
/// proportionally over the entities not yet frozen. See [`CapState`] for the
/// per-iteration procedure and the termination argument.
#[derive(Debug, Clone)]
pub struct IterativeCapper {
    config: CapConfig,
}

impl IterativeCapper {
    /// Create a capper with default tolerances.
    #[must_use]
    pub const fn new(cap_fraction: f64) -> Self {
        Self::with_config(CapConfig::new(cap_fraction))
    }

    /// Create a capper with a custom configuration.
    #[must_use]
    pub const fn with_config(config: CapConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &CapConfig {
        &self.config
    }
}

impl Capper for IterativeCapper {
    fn cap_grouped(
        &self,
        amounts: &BTreeMap<String, f64>,
        groups: &BTreeMap<String, String>,
    ) -> Result<CapOutcome, CapError> {
        let mut state = CapState::new(amounts, groups)?;

        // Below 1 / group count the per-group caps sum to less than the
        // total to be allocated, so no redistribution can satisfy them all.
        let minimum = 1.0 / state.distinct_groups() as f64;
        if self.config.cap_fraction < minimum {
            return Err(CapError::InfeasibleCap {
                cap_fraction: self.config.cap_fraction,
                minimum,
                groups: state.distinct_groups(),
            });
        }

        let initial_total = state.total();
        let cap_amount = self.config.cap_fraction * initial_total;

        while !state.is_settled(cap_amount, self.config.tolerance) {
            state = state.step(cap_amount, self.config.tolerance)?;
        }

        let iterations = state.iterations();
        let capped_total = state.total();
        let integrity = IntegrityCheck {
            initial_total,
            capped_total,
            tolerance: self.config.conservation_tolerance,
        };

        if integrity.passed() {
            info!(iterations, "capping converged");
        } else {
            warn!(
                initial_total,
                capped_total,
                deviation = integrity.deviation(),
                "capped amounts do not conserve the initial total"
            );
        }

        Ok(CapOutcome { amounts: state.into_amounts(), iterations, integrity })
    }
}

/// Pass-through capper that applies no concentration limit.
///
/// Useful for methodologies that weight purely by the selection factor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uncapped;

impl Capper for Uncapped {
    fn cap_grouped(
        &self,
        amounts: &BTreeMap<String, f64>,
        groups: &BTreeMap<String, String>,
    ) -> Result<CapOutcome, CapError> {
        // Validate the input the same way the iterative engine does.
        let state = CapState::new(amounts, groups)?;
        let total = state.total();

        Ok(CapOutcome {
            amounts: state.into_amounts(),
            iterations: 0,
            integrity: IntegrityCheck {
                initial_total: total,
                capped_total: total,
                tolerance: DEFAULT_CONSERVATION_TOLERANCE,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rstest::rstest;

    use super::*;

    fn amounts(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(e, a)| (e.to_string(), *a)).collect()
    }

    #[test]
    fn worked_example_single_iteration() {
        let input = amounts(&[("A", 50.0), ("B", 30.0), ("C", 20.0)]);
        let outcome = IterativeCapper::new(0.4).cap(&input).unwrap();

        assert_relative_eq!(outcome.amounts["A"], 40.0, epsilon = 1e-9);
        assert_relative_eq!(outcome.amounts["B"], 36.0, epsilon = 1e-9);
        assert_relative_eq!(outcome.amounts["C"], 24.0, epsilon = 1e-9);
        assert_eq!(outcome.iterations, 1);
        assert!(outcome.integrity.passed());
    }

    #[test]
    fn noop_when_no_group_over_cap() {
        let input = amounts(&[("A", 25.0), ("B", 25.0), ("C", 25.0), ("D", 25.0)]);
        let outcome = IterativeCapper::new(0.3).cap(&input).unwrap();

        assert_eq!(outcome.iterations, 0);
        for (entity, amount) in &input {
            assert_relative_eq!(outcome.amounts[entity], *amount, epsilon = 1e-12);
        }
    }

    #[test]
    fn infeasible_cap_fraction() {
        let input = amounts(&[("A", 25.0), ("B", 25.0), ("C", 25.0), ("D", 25.0)]);
        let err = IterativeCapper::new(0.2).cap(&input).unwrap_err();

        assert!(matches!(err, CapError::InfeasibleCap { groups: 4, .. }));
    }

    #[test]
    fn feasibility_boundary_is_allowed() {
        // Exactly 1 / group count: every group ends at the cap.
        let input = amounts(&[("A", 25.0), ("B", 25.0), ("C", 25.0), ("D", 25.0)]);
        let outcome = IterativeCapper::new(0.25).cap(&input).unwrap();
        assert_eq!(outcome.iterations, 0);
    }

    #[rstest]
    #[case(0.3)]
    #[case(0.4)]
    #[case(0.5)]
    #[case(0.9)]
    fn conservation_and_cap_respected(#[case] cap_fraction: f64) {
        let input = amounts(&[("A", 60.0), ("B", 25.0), ("C", 10.0), ("D", 5.0)]);
        let capper = IterativeCapper::new(cap_fraction);
        let outcome = capper.cap(&input).unwrap();

        let total: f64 = outcome.amounts.values().sum();
        assert!((total - 100.0).abs() <= DEFAULT_CONSERVATION_TOLERANCE);
        assert!(outcome.integrity.passed());

        let cap_amount = cap_fraction * 100.0;
        for amount in outcome.amounts.values() {
            assert!(*amount <= cap_amount + DEFAULT_TOLERANCE);
        }
    }

    #[test]
    fn issuer_grouping_caps_the_group() {
        let input = amounts(&[("A1", 30.0), ("A2", 30.0), ("B", 40.0)]);
        let groups: BTreeMap<String, String> = [
            ("A1".to_string(), "X".to_string()),
            ("A2".to_string(), "Y".to_string()),
            ("B".to_string(), "Y".to_string()),
        ]
        .into();

        // Y = A2 + B = 70 exceeds the cap; both lines scale down together.
        let outcome = IterativeCapper::new(0.6).cap_grouped(&input, &groups).unwrap();
        let y_total = outcome.amounts["A2"] + outcome.amounts["B"];

        assert_relative_eq!(y_total, 60.0, epsilon = 1e-9);
        assert_relative_eq!(outcome.amounts["A1"], 40.0, epsilon = 1e-9);
        assert!(outcome.integrity.passed());
    }

    #[test]
    fn severe_skew_converges() {
        let input = amounts(&[
            ("A", 1000.0),
            ("B", 500.0),
            ("C", 100.0),
            ("D", 50.0),
            ("E", 25.0),
            ("F", 10.0),
        ]);
        let outcome = IterativeCapper::new(0.2).cap(&input).unwrap();

        let total: f64 = outcome.amounts.values().sum();
        let cap_amount = 0.2 * 1685.0;
        assert!((total - 1685.0).abs() <= DEFAULT_CONSERVATION_TOLERANCE);
        for amount in outcome.amounts.values() {
            assert!(*amount <= cap_amount + DEFAULT_TOLERANCE);
        }
        assert!(outcome.iterations >= 1);
    }

    #[test]
    fn empty_universe_is_an_error() {
        let err = IterativeCapper::new(0.5).cap(&BTreeMap::new()).unwrap_err();
        assert!(matches!(err, CapError::EmptyUniverse));
    }

    #[test]
    fn uncapped_passes_through() {
        let input = amounts(&[("A", 70.0), ("B", 30.0)]);
        let outcome = Uncapped.cap(&input).unwrap();

        assert_eq!(outcome.iterations, 0);
        assert_relative_eq!(outcome.amounts["A"], 70.0, epsilon = 1e-12);
        assert!(outcome.integrity.passed());
    }

    #[test]
    fn outcome_weights_respect_cap_fraction() {
        let input = amounts(&[("A", 50.0), ("B", 30.0), ("C", 20.0)]);
        let outcome = IterativeCapper::new(0.4).cap(&input).unwrap();

        let weights = outcome.weights();
        let sum: f64 = weights.values().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        for weight in weights.values() {
            assert!(*weight <= 0.4 + 1e-6);
        }
    }
}

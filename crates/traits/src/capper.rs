//! Concentration capping trait definitions.

use std::collections::BTreeMap;

/// Errors that can occur during a capping run.
#[derive(Debug, thiserror::Error)]
pub enum CapError {
    /// The cap fraction is below the feasibility floor of `1 / group count`.
    #[error("infeasible cap fraction {cap_fraction}: must be at least {minimum} for {groups} groups")]
    InfeasibleCap {
        /// Configured cap fraction.
        cap_fraction: f64,
        /// Minimum feasible fraction for the given grouping.
        minimum: f64,
        /// Number of distinct groups.
        groups: usize,
    },

    /// No amounts were provided.
    #[error("no amounts to cap")]
    EmptyUniverse,

    /// An amount key has no group assignment.
    #[error("entity {0} has no group assignment")]
    UnknownEntity(String),

    /// An amount is zero or negative.
    #[error("non-positive amount {amount} for entity {entity}")]
    NonPositiveAmount {
        /// Offending entity.
        entity: String,
        /// Offending amount.
        amount: f64,
    },

    /// Every entity is frozen but some group still exceeds the cap.
    ///
    /// This indicates numerical drift in the redistribution loop and is an
    /// internal invariant violation, never a valid terminal state.
    #[error("redistribution pool exhausted after {iterations} iterations with groups still over cap")]
    RedistributionExhausted {
        /// Iterations completed before exhaustion.
        iterations: u32,
    },
}

/// Mass-conservation check for a capping run.
///
/// The sum of capped amounts must match the sum of initial amounts within an
/// absolute tolerance. A violation is reported through this type rather than
/// raised: callers decide whether to keep or discard the result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrityCheck {
    /// Sum of amounts before capping.
    pub initial_total: f64,
    /// Sum of amounts after capping.
    pub capped_total: f64,
    /// Absolute tolerance on the difference.
    pub tolerance: f64,
}

impl IntegrityCheck {
    /// Absolute difference between capped and initial totals.
    #[must_use]
    pub fn deviation(&self) -> f64 {
        (self.capped_total - self.initial_total).abs()
    }

    /// Whether the totals agree within tolerance.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.deviation() <= self.tolerance
    }
}

/// Result of a capping run.
#[derive(Debug, Clone)]
pub struct CapOutcome {
    /// Final capped amounts, keyed by entity.
    pub amounts: BTreeMap<String, f64>,
    /// Number of outer redistribution iterations.
    pub iterations: u32,
    /// Mass-conservation check over the run.
    pub integrity: IntegrityCheck,
}

impl CapOutcome {
    /// Sum of the capped amounts.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.amounts.values().sum()
    }

    /// Capped amounts normalized to weights summing to 1.
    #[must_use]
    pub fn weights(&self) -> BTreeMap<String, f64> {
        let total = self.total();
        self.amounts.iter().map(|(k, v)| (k.clone(), v / total)).collect()
    }
}

/// Trait for enforcing a maximum share of total amount per group.
pub trait Capper: Send + Sync {
    /// Cap grouped amounts so no group exceeds the configured share.
    ///
    /// # Arguments
    /// * `amounts` - Positive amount per entity
    /// * `groups` - Group assignment per entity (e.g. issuer)
    ///
    /// # Returns
    /// The capped amounts with iteration count and conservation check.
    ///
    /// # Errors
    /// Returns `CapError` if the configuration is infeasible or the input is
    /// invalid.
    fn cap_grouped(
        &self,
        amounts: &BTreeMap<String, f64>,
        groups: &BTreeMap<String, String>,
    ) -> Result<CapOutcome, CapError>;

    /// Cap with single-entity grouping: every entity is its own group.
    ///
    /// # Errors
    /// Returns `CapError` if the configuration is infeasible or the input is
    /// invalid.
    fn cap(&self, amounts: &BTreeMap<String, f64>) -> Result<CapOutcome, CapError> {
        let groups: BTreeMap<String, String> =
            amounts.keys().map(|k| (k.clone(), k.clone())).collect();
        self.cap_grouped(amounts, &groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrity_check_passes_within_tolerance() {
        let check =
            IntegrityCheck { initial_total: 1000.0, capped_total: 1003.0, tolerance: 5.0 };
        assert!(check.passed());
        assert!((check.deviation() - 3.0).abs() < 1e-10);
    }

    #[test]
    fn integrity_check_fails_outside_tolerance() {
        let check =
            IntegrityCheck { initial_total: 1000.0, capped_total: 1010.0, tolerance: 5.0 };
        assert!(!check.passed());
    }

    #[test]
    fn outcome_weights_sum_to_one() {
        let mut amounts = BTreeMap::new();
        amounts.insert("A".to_string(), 40.0);
        amounts.insert("B".to_string(), 60.0);
        let outcome = CapOutcome {
            amounts,
            iterations: 0,
            integrity: IntegrityCheck { initial_total: 100.0, capped_total: 100.0, tolerance: 5.0 },
        };

        let weights = outcome.weights();
        let sum: f64 = weights.values().sum();
        assert!((sum - 1.0).abs() < 1e-10);
        assert!((weights["A"] - 0.4).abs() < 1e-10);
    }

    #[test]
    fn error_display() {
        let err = CapError::InfeasibleCap { cap_fraction: 0.2, minimum: 0.25, groups: 4 };
        assert!(err.to_string().contains("0.2"));
        assert!(err.to_string().contains("0.25"));
    }
}

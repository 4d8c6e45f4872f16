//! Capping iteration state.

use std::collections::{BTreeMap, BTreeSet};

use capra_traits::CapError;
use ndarray::Array1;

/// One snapshot of a capping run.
///
/// A snapshot is never mutated: [`CapState::step`] produces the next
/// snapshot, freezing every over-cap group and redistributing its excess
/// over the still-eligible entities. Because frozen entities never re-enter
/// the eligible pool, the pool shrinks monotonically and a run takes at most
/// one iteration per distinct group.
#[derive(Debug, Clone)]
pub struct CapState {
    entities: Vec<String>,
    groups: Vec<String>,
    amounts: Array1<f64>,
    eligible: Vec<bool>,
    iterations: u32,
}

impl CapState {
    /// Build the initial state from per-entity amounts and group assignments.
    ///
    /// # Errors
    /// Returns `CapError::EmptyUniverse` on empty input,
    /// `CapError::NonPositiveAmount` for amounts ≤ 0, and
    /// `CapError::UnknownEntity` when an entity has no group assignment.
    pub fn new(
        amounts: &BTreeMap<String, f64>,
        groups: &BTreeMap<String, String>,
    ) -> Result<Self, CapError> {
        if amounts.is_empty() {
            return Err(CapError::EmptyUniverse);
        }

        let mut entities = Vec::with_capacity(amounts.len());
        let mut entity_groups = Vec::with_capacity(amounts.len());
        let mut values = Vec::with_capacity(amounts.len());

        for (entity, amount) in amounts {
            if *amount <= 0.0 {
                return Err(CapError::NonPositiveAmount {
                    entity: entity.clone(),
                    amount: *amount,
                });
            }
            let group = groups
                .get(entity)
                .ok_or_else(|| CapError::UnknownEntity(entity.clone()))?;

            entities.push(entity.clone());
            entity_groups.push(group.clone());
            values.push(*amount);
        }

        Ok(Self {
            entities,
            groups: entity_groups,
            amounts: Array1::from_vec(values),
            eligible: vec![true; amounts.len()],
            iterations: 0,
        })
    }

    /// Number of completed iterations.
    #[must_use]
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Sum of all amounts.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.amounts.sum()
    }

    /// Number of distinct groups.
    #[must_use]
    pub fn distinct_groups(&self) -> usize {
        self.groups.iter().collect::<BTreeSet<_>>().len()
    }

    /// Summed amount per group, in ascending group order.
    #[must_use]
    pub fn group_totals(&self) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        for (group, amount) in self.groups.iter().zip(self.amounts.iter()) {
            *totals.entry(group.clone()).or_insert(0.0) += amount;
        }
        totals
    }

    /// Whether every group is within `cap_amount + tolerance`.
    #[must_use]
    pub fn is_settled(&self, cap_amount: f64, tolerance: f64) -> bool {
        self.group_totals().values().all(|total| *total <= cap_amount + tolerance)
    }

    /// Run one redistribution iteration, producing the next snapshot.
    ///
    /// Over-cap groups are processed in ascending group order. Each one is
    /// frozen at exactly `cap_amount` and its excess spread multiplicatively
    /// over the entities still eligible; group totals are re-derived after
    /// every redistribution, so a group pushed over the cap by an earlier
    /// group in the same pass is handled within this iteration.
    ///
    /// # Errors
    /// Returns `CapError::RedistributionExhausted` if an excess remains but
    /// no eligible entity is left to receive it.
    pub fn step(&self, cap_amount: f64, tolerance: f64) -> Result<Self, CapError> {
        let mut amounts = self.amounts.clone();
        let mut eligible = self.eligible.clone();

        let group_order: BTreeSet<String> = self.groups.iter().cloned().collect();

        for group in &group_order {
            let members: Vec<usize> = self
                .groups
                .iter()
                .enumerate()
                .filter(|(_, g)| *g == group)
                .map(|(i, _)| i)
                .collect();

            let group_total: f64 = members.iter().map(|&i| amounts[i]).sum();
            if group_total <= cap_amount + tolerance {
                continue;
            }

            let over_amount = group_total - cap_amount;
            let down_factor = cap_amount / group_total;
            for &i in &members {
                eligible[i] = false;
                amounts[i] *= down_factor;
            }

            let eligible_total: f64 =
                amounts.iter().zip(&eligible).filter(|(_, e)| **e).map(|(a, _)| a).sum();
            if eligible_total <= 0.0 {
                return Err(CapError::RedistributionExhausted {
                    iterations: self.iterations + 1,
                });
            }

            let up_factor = (eligible_total + over_amount) / eligible_total;
            for (amount, is_eligible) in amounts.iter_mut().zip(&eligible) {
                if *is_eligible {
                    *amount *= up_factor;
                }
            }
        }

        Ok(Self {
            entities: self.entities.clone(),
            groups: self.groups.clone(),
            amounts,
            eligible,
            iterations: self.iterations + 1,
        })
    }

    /// Consume the state into per-entity amounts.
    #[must_use]
    pub fn into_amounts(self) -> BTreeMap<String, f64> {
        self.entities.into_iter().zip(self.amounts).collect()
    }
}

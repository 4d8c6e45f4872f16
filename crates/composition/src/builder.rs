//! Index composition construction.

use std::collections::{BTreeMap, BTreeSet};

use capra_primitives::{Date, FactorName, MARKET_CAP, date_from_unix_days};
use capra_traits::Capper;
use polars::prelude::*;
use tracing::warn;

use crate::{Composition, CompositionError};

/// Configuration for composition construction.
#[derive(Debug, Clone)]
pub struct CompositionConfig {
    /// Number of constituents selected on each rebalance date.
    pub universe_size: usize,
    /// Optional issuer grouping for the cap (entity id to issuer id).
    /// Entities without a mapping form their own group.
    pub issuer_groups: Option<BTreeMap<String, String>>,
}

impl CompositionConfig {
    /// Create a configuration with single-entity cap grouping.
    #[must_use]
    pub const fn new(universe_size: usize) -> Self {
        Self { universe_size, issuer_groups: None }
    }

    /// Group the cap by issuer.
    #[must_use]
    pub fn with_issuer_groups(mut self, groups: BTreeMap<String, String>) -> Self {
        self.issuer_groups = Some(groups);
        self
    }
}

/// Builds per-factor index compositions on the rebalance dates.
///
/// The market capitalization snapshot selects the constituents and receives
/// the concentration cap; every other factor weights the same constituent
/// set by its own values.
#[derive(Debug, Clone)]
pub struct CompositionBuilder<C> {
    config: CompositionConfig,
    capper: C,
}

impl<C: Capper> CompositionBuilder<C> {
    /// Create a builder.
    #[must_use]
    pub const fn new(config: CompositionConfig, capper: C) -> Self {
        Self { config, capper }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &CompositionConfig {
        &self.config
    }

    /// Build one composition per factor.
    ///
    /// # Arguments
    /// * `snapshots` - Per-factor `| date | entity | value |` frames on the
    ///   reference dates (see [`factor_snapshots`](crate::factor_snapshots))
    /// * `ineligible` - Entities removed before selection (see
    ///   [`ExclusionRules`](crate::ExclusionRules))
    ///
    /// # Errors
    /// Returns `CompositionError::MissingFactor` when the market
    /// capitalization snapshot is absent, and propagates capping errors.
    pub fn build(
        &self,
        snapshots: &BTreeMap<String, DataFrame>,
        ineligible: &BTreeSet<String>,
    ) -> Result<BTreeMap<FactorName, Composition>, CompositionError> {
        let mktcap = snapshots
            .get(MARKET_CAP)
            .ok_or_else(|| CompositionError::MissingFactor(MARKET_CAP.to_string()))?;

        // Constituent selection and capped weights from market cap.
        let mut constituents_by_date: BTreeMap<Date, BTreeSet<String>> = BTreeMap::new();
        let mut mktcap_rows: Vec<(Date, String, f64)> = Vec::new();

        for (date, mut values) in rows_by_date(mktcap)? {
            values.retain(|(entity, _)| !ineligible.contains(entity));
            // Stable sort: entities with equal market cap keep input order.
            values.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
            values.truncate(self.config.universe_size);

            if values.is_empty() {
                warn!(%date, "no eligible constituents, skipping rebalance date");
                continue;
            }

            let amounts: BTreeMap<String, f64> = values.iter().cloned().collect();
            let groups = self.cap_groups(&amounts);
            let outcome = self.capper.cap_grouped(&amounts, &groups)?;
            if !outcome.integrity.passed() {
                warn!(
                    %date,
                    deviation = outcome.integrity.deviation(),
                    "keeping composition despite failed conservation check"
                );
            }

            constituents_by_date
                .insert(date, values.iter().map(|(entity, _)| entity.clone()).collect());
            for (entity, weight) in outcome.weights() {
                mktcap_rows.push((date, entity, weight));
            }
        }

        let mut compositions = BTreeMap::new();
        compositions.insert(
            FactorName::market_cap(),
            Composition::new(FactorName::market_cap(), weight_frame(&mktcap_rows)?)?,
        );

        // Parallel weight vectors for the remaining factors over the same
        // constituent lists; missing values are dropped, not redistributed.
        for (factor, frame) in snapshots {
            if factor == MARKET_CAP {
                continue;
            }

            let mut factor_rows: Vec<(Date, String, f64)> = Vec::new();
            for (date, values) in rows_by_date(frame)? {
                let Some(constituents) = constituents_by_date.get(&date) else {
                    continue;
                };
                let held: Vec<(String, f64)> = values
                    .into_iter()
                    .filter(|(entity, _)| constituents.contains(entity))
                    .collect();

                let total: f64 = held.iter().map(|(_, value)| value).sum();
                if total <= 0.0 {
                    warn!(%date, %factor, "no usable factor values, skipping rebalance date");
                    continue;
                }
                for (entity, value) in held {
                    factor_rows.push((date, entity, value / total));
                }
            }

            let name = FactorName::new(factor.clone());
            compositions
                .insert(name.clone(), Composition::new(name, weight_frame(&factor_rows)?)?);
        }

        Ok(compositions)
    }

    fn cap_groups(&self, amounts: &BTreeMap<String, f64>) -> BTreeMap<String, String> {
        amounts
            .keys()
            .map(|entity| {
                let group = self
                    .config
                    .issuer_groups
                    .as_ref()
                    .and_then(|groups| groups.get(entity))
                    .cloned()
                    .unwrap_or_else(|| entity.clone());
                (entity.clone(), group)
            })
            .collect()
    }
}

/// Split a `| date | entity | value |` frame into per-date rows, preserving
/// row order within each date.
fn rows_by_date(
    frame: &DataFrame,
) -> Result<BTreeMap<Date, Vec<(String, f64)>>, CompositionError> {
    let dates = frame
        .column("date")
        .map_err(|_| CompositionError::MissingColumn("date".to_string()))?;
    let entities = frame
        .column("entity")
        .map_err(|_| CompositionError::MissingColumn("entity".to_string()))?
        .str()
        .map_err(|_| CompositionError::InvalidColumn("entity".to_string()))?;
    let values = frame
        .column("value")
        .map_err(|_| CompositionError::MissingColumn("value".to_string()))?
        .f64()
        .map_err(|_| CompositionError::InvalidColumn("value".to_string()))?;

    let mut by_date: BTreeMap<Date, Vec<(String, f64)>> = BTreeMap::new();
    for idx in 0..frame.height() {
        let AnyValue::Date(days) = dates.get(idx)? else {
            continue;
        };
        let Some(date) = date_from_unix_days(days) else {
            continue;
        };
        let (Some(entity), Some(value)) = (entities.get(idx), values.get(idx)) else {
            continue;
        };
        by_date.entry(date).or_default().push((entity.to_string(), value));
    }
    Ok(by_date)
}

fn weight_frame(rows: &[(Date, String, f64)]) -> Result<DataFrame, CompositionError> {
    Ok(DataFrame::new(vec![
        Column::new("date".into(), rows.iter().map(|(d, _, _)| *d).collect::<Vec<_>>()),
        Column::new(
            "entity".into(),
            rows.iter().map(|(_, e, _)| e.clone()).collect::<Vec<_>>(),
        ),
        Column::new("weight".into(), rows.iter().map(|(_, _, w)| *w).collect::<Vec<_>>()),
    ])?)
}

#[cfg(test)]
mod tests {
    use capra_capping::{IterativeCapper, Uncapped};

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn snapshot(rows: &[(Date, &str, f64)]) -> DataFrame {
        DataFrame::new(vec![
            Column::new("date".into(), rows.iter().map(|(d, _, _)| *d).collect::<Vec<_>>()),
            Column::new("entity".into(), rows.iter().map(|(_, e, _)| *e).collect::<Vec<_>>()),
            Column::new("value".into(), rows.iter().map(|(_, _, v)| *v).collect::<Vec<_>>()),
        ])
        .unwrap()
    }

    fn snapshots() -> BTreeMap<String, DataFrame> {
        let date = d(2021, 3, 19);
        let mut map = BTreeMap::new();
        map.insert(
            MARKET_CAP.to_string(),
            snapshot(&[
                (date, "A", 500.0),
                (date, "B", 300.0),
                (date, "C", 200.0),
                (date, "D", 100.0),
            ]),
        );
        map.insert(
            "esg".to_string(),
            snapshot(&[(date, "A", 0.8), (date, "B", 0.6), (date, "D", 0.9)]),
        );
        map
    }

    #[test]
    fn selects_top_universe_and_caps() {
        let builder =
            CompositionBuilder::new(CompositionConfig::new(3), IterativeCapper::new(0.4));
        let compositions = builder.build(&snapshots(), &BTreeSet::new()).unwrap();

        let weights =
            compositions[&FactorName::market_cap()].weights_on(d(2021, 3, 19)).unwrap();

        // D ranked out; A capped at 40% of the selected pool.
        assert_eq!(weights.len(), 3);
        assert!(!weights.contains_key("D"));
        assert!((weights["A"] - 0.4).abs() < 1e-9);
        let sum: f64 = weights.values().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn exclusions_apply_before_ranking() {
        let builder = CompositionBuilder::new(CompositionConfig::new(3), Uncapped);
        let ineligible: BTreeSet<String> = ["A".to_string()].into();
        let compositions = builder.build(&snapshots(), &ineligible).unwrap();

        let weights =
            compositions[&FactorName::market_cap()].weights_on(d(2021, 3, 19)).unwrap();

        // A excluded, so the top 3 are B, C, D weighted by market cap.
        assert_eq!(weights.len(), 3);
        assert!((weights["B"] - 0.5).abs() < 1e-9);
        assert!((weights["D"] - 100.0 / 600.0).abs() < 1e-9);
    }

    #[test]
    fn other_factors_reuse_the_constituent_list() {
        let builder = CompositionBuilder::new(CompositionConfig::new(3), Uncapped);
        let compositions = builder.build(&snapshots(), &BTreeSet::new()).unwrap();

        let esg = compositions[&FactorName::new("esg")].weights_on(d(2021, 3, 19)).unwrap();

        // D is not a constituent; C has no score and its share is not
        // redistributed to a specific entity but renormalized away.
        assert_eq!(esg.len(), 2);
        assert!((esg["A"] - 0.8 / 1.4).abs() < 1e-9);
        assert!((esg["B"] - 0.6 / 1.4).abs() < 1e-9);
    }

    #[test]
    fn issuer_grouping_caps_combined_lines() {
        let config = CompositionConfig::new(3).with_issuer_groups(
            [
                ("A".to_string(), "GroupA".to_string()),
                ("B".to_string(), "GroupA".to_string()),
            ]
            .into(),
        );
        let builder = CompositionBuilder::new(config, IterativeCapper::new(0.7));
        let compositions = builder.build(&snapshots(), &BTreeSet::new()).unwrap();

        let weights =
            compositions[&FactorName::market_cap()].weights_on(d(2021, 3, 19)).unwrap();

        // A + B share one issuer and are capped together at 70%.
        assert!((weights["A"] + weights["B"] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn missing_market_cap_snapshot_is_an_error() {
        let mut maps = snapshots();
        maps.remove(MARKET_CAP);

        let builder = CompositionBuilder::new(CompositionConfig::new(3), Uncapped);
        let err = builder.build(&maps, &BTreeSet::new()).unwrap_err();
        assert!(matches!(err, CompositionError::MissingFactor(f) if f == MARKET_CAP));
    }

    #[test]
    fn ties_keep_input_row_order() {
        let date = d(2021, 3, 19);
        let mut maps = BTreeMap::new();
        maps.insert(
            MARKET_CAP.to_string(),
            snapshot(&[(date, "B", 100.0), (date, "A", 100.0), (date, "C", 100.0)]),
        );

        let builder = CompositionBuilder::new(CompositionConfig::new(2), Uncapped);
        let compositions = builder.build(&maps, &BTreeSet::new()).unwrap();
        let weights =
            compositions[&FactorName::market_cap()].weights_on(date).unwrap();

        // Stable sort on equal values: the first two input rows survive.
        assert!(weights.contains_key("B"));
        assert!(weights.contains_key("A"));
        assert!(!weights.contains_key("C"));
    }
}

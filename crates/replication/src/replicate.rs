//! Buy-and-hold return replication.

use std::collections::BTreeMap;

use capra_calendar::next_business_day;
use capra_composition::Composition;
use capra_primitives::{CumulativeIndex, Date, FactorName, date_from_unix_days};
use polars::prelude::*;
use tracing::warn;

use crate::ReplicationError;

/// Configuration for return replication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicationConfig {
    /// Last date of the final holding period.
    pub horizon_end: Date,
}

impl ReplicationConfig {
    /// Create a configuration.
    #[must_use]
    pub const fn new(horizon_end: Date) -> Self {
        Self { horizon_end }
    }
}

/// Replicates the buy-and-hold return path of a composition time series.
///
/// Weights are fixed over each holding period, which runs from the first
/// business day after a rebalance date through the next rebalance date
/// inclusive; the final period extends to the configured horizon end.
#[derive(Debug, Clone)]
pub struct ReturnReplicator {
    config: ReplicationConfig,
}

impl ReturnReplicator {
    /// Create a replicator.
    #[must_use]
    pub const fn new(config: ReplicationConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ReplicationConfig {
        &self.config
    }

    /// Chain one composition's holding periods into a cumulative index.
    ///
    /// Each trading day's index return is the weight-summed daily entity
    /// return. A held entity with no return on a day contributes zero while
    /// keeping its weight in the base, treating the missing day as flat;
    /// re-weighting the remaining holdings instead would overstate their
    /// share and is deliberately not done.
    ///
    /// # Arguments
    /// * `composition` - Per-date weights from the composition builder
    /// * `returns` - Long frame `| date | entity | asset_returns |`
    ///
    /// # Errors
    /// Returns `ReplicationError` if the composition is empty, the returns
    /// frame is malformed, or no holding period contains a trading day.
    pub fn replicate(
        &self,
        composition: &Composition,
        returns: &DataFrame,
    ) -> Result<CumulativeIndex, ReplicationError> {
        let weights_by_date = composition.all_weights()?;
        if weights_by_date.is_empty() {
            return Err(ReplicationError::EmptyComposition);
        }
        let returns_by_date = returns_by_date(returns)?;

        let rebalance_dates: Vec<Date> = weights_by_date.keys().copied().collect();

        let mut dates = Vec::new();
        let mut daily_returns = Vec::new();

        for (i, rebalance) in rebalance_dates.iter().enumerate() {
            let start = next_business_day(*rebalance);
            let end = match rebalance_dates.get(i + 1) {
                Some(next) => *next,
                None => self.config.horizon_end,
            };
            if start > end {
                warn!(%rebalance, "holding period is empty, skipping");
                continue;
            }

            let weights = &weights_by_date[rebalance];
            let mut period_days = 0;
            for (day, entity_returns) in returns_by_date.range(start..=end) {
                let index_return: f64 = weights
                    .iter()
                    .map(|(entity, weight)| {
                        entity_returns.get(entity).copied().unwrap_or(0.0) * weight
                    })
                    .sum();
                dates.push(*day);
                daily_returns.push(index_return);
                period_days += 1;
            }

            if period_days == 0 {
                warn!(%rebalance, "no trading days in holding period, skipping");
            }
        }

        if dates.is_empty() {
            return Err(ReplicationError::NoTradingDays);
        }
        Ok(CumulativeIndex::from_daily_returns(dates, &daily_returns))
    }

    /// Replicate every factor's composition into its own series.
    ///
    /// # Errors
    /// Returns the first `ReplicationError` encountered.
    pub fn replicate_all(
        &self,
        compositions: &BTreeMap<FactorName, Composition>,
        returns: &DataFrame,
    ) -> Result<BTreeMap<FactorName, CumulativeIndex>, ReplicationError> {
        let mut series = BTreeMap::new();
        for (factor, composition) in compositions {
            series.insert(factor.clone(), self.replicate(composition, returns)?);
        }
        Ok(series)
    }
}

/// Split a `| date | entity | asset_returns |` frame into per-date return
/// maps. Null returns are dropped, matching the sparse record table.
fn returns_by_date(
    returns: &DataFrame,
) -> Result<BTreeMap<Date, BTreeMap<String, f64>>, ReplicationError> {
    let dates = returns
        .column("date")
        .map_err(|_| ReplicationError::MissingColumn("date".to_string()))?;
    let entities = returns
        .column("entity")
        .map_err(|_| ReplicationError::MissingColumn("entity".to_string()))?
        .str()
        .map_err(|_| ReplicationError::InvalidColumn("entity".to_string()))?;
    let values = returns
        .column("asset_returns")
        .map_err(|_| ReplicationError::MissingColumn("asset_returns".to_string()))?
        .f64()
        .map_err(|_| ReplicationError::InvalidColumn("asset_returns".to_string()))?;

    let mut by_date: BTreeMap<Date, BTreeMap<String, f64>> = BTreeMap::new();
    for idx in 0..returns.height() {
        let AnyValue::Date(days) = dates.get(idx)? else {
            continue;
        };
        let Some(date) = date_from_unix_days(days) else {
            continue;
        };
        let (Some(entity), Some(value)) = (entities.get(idx), values.get(idx)) else {
            continue;
        };
        by_date.entry(date).or_default().insert(entity.to_string(), value);
    }
    Ok(by_date)
}

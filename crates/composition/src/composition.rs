//! Per-factor weight table.

use std::collections::BTreeMap;

use capra_primitives::{Date, FactorName, date_from_unix_days};
use polars::prelude::*;

use crate::CompositionError;

/// Tolerance on the per-date weight sum.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// One factor's index composition: a `| date | entity | weight |` table with
/// per-date weights summing to 1.
///
/// Immutable after construction; the replication stage reads it period by
/// period.
#[derive(Debug, Clone)]
pub struct Composition {
    factor: FactorName,
    frame: DataFrame,
}

impl Composition {
    /// Wrap and validate a weight frame.
    ///
    /// # Errors
    /// Returns `CompositionError` if required columns are missing or any
    /// date's weights do not sum to 1 within tolerance.
    pub fn new(factor: FactorName, frame: DataFrame) -> Result<Self, CompositionError> {
        let composition = Self { factor, frame };
        for (date, weights) in composition.all_weights()? {
            let sum: f64 = weights.values().sum();
            if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
                return Err(CompositionError::UnnormalizedWeights { date, sum });
            }
        }
        Ok(composition)
    }

    /// The factor this composition weights by.
    #[must_use]
    pub const fn factor(&self) -> &FactorName {
        &self.factor
    }

    /// The underlying weight frame.
    #[must_use]
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// The rebalance dates, ascending.
    ///
    /// # Errors
    /// Returns `CompositionError` if the date column is missing.
    pub fn dates(&self) -> Result<Vec<Date>, CompositionError> {
        Ok(self.all_weights()?.into_keys().collect())
    }

    /// The weights fixed on one rebalance date.
    ///
    /// # Errors
    /// Returns `CompositionError` if required columns are missing.
    pub fn weights_on(&self, date: Date) -> Result<BTreeMap<String, f64>, CompositionError> {
        Ok(self.all_weights()?.remove(&date).unwrap_or_default())
    }

    /// All per-date weight maps, keyed by ascending date.
    ///
    /// # Errors
    /// Returns `CompositionError` if required columns are missing.
    pub fn all_weights(&self) -> Result<BTreeMap<Date, BTreeMap<String, f64>>, CompositionError> {
        let dates = self
            .frame
            .column("date")
            .map_err(|_| CompositionError::MissingColumn("date".to_string()))?;
        let entities = self
            .frame
            .column("entity")
            .map_err(|_| CompositionError::MissingColumn("entity".to_string()))?
            .str()
            .map_err(|_| CompositionError::InvalidColumn("entity".to_string()))?;
        let weights = self
            .frame
            .column("weight")
            .map_err(|_| CompositionError::MissingColumn("weight".to_string()))?
            .f64()
            .map_err(|_| CompositionError::InvalidColumn("weight".to_string()))?;

        let mut by_date: BTreeMap<Date, BTreeMap<String, f64>> = BTreeMap::new();
        for idx in 0..self.frame.height() {
            let AnyValue::Date(days) = dates.get(idx)? else {
                continue;
            };
            let Some(date) = date_from_unix_days(days) else {
                continue;
            };
            let (Some(entity), Some(weight)) = (entities.get(idx), weights.get(idx)) else {
                continue;
            };
            by_date.entry(date).or_default().insert(entity.to_string(), weight);
        }
        Ok(by_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn frame(rows: &[(Date, &str, f64)]) -> DataFrame {
        DataFrame::new(vec![
            Column::new("date".into(), rows.iter().map(|(d, _, _)| *d).collect::<Vec<_>>()),
            Column::new("entity".into(), rows.iter().map(|(_, e, _)| *e).collect::<Vec<_>>()),
            Column::new("weight".into(), rows.iter().map(|(_, _, w)| *w).collect::<Vec<_>>()),
        ])
        .unwrap()
    }

    #[test]
    fn valid_composition_round_trips() {
        let composition = Composition::new(
            FactorName::market_cap(),
            frame(&[
                (d(2021, 3, 19), "A", 0.6),
                (d(2021, 3, 19), "B", 0.4),
                (d(2021, 6, 18), "A", 1.0),
            ]),
        )
        .unwrap();

        assert_eq!(composition.dates().unwrap(), vec![d(2021, 3, 19), d(2021, 6, 18)]);
        let weights = composition.weights_on(d(2021, 3, 19)).unwrap();
        assert_eq!(weights.len(), 2);
        assert!((weights["A"] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn unnormalized_weights_are_rejected() {
        let err = Composition::new(
            FactorName::market_cap(),
            frame(&[(d(2021, 3, 19), "A", 0.5), (d(2021, 3, 19), "B", 0.4)]),
        )
        .unwrap_err();

        assert!(matches!(err, CompositionError::UnnormalizedWeights { sum, .. } if sum < 1.0));
    }

    #[test]
    fn unknown_date_has_no_weights() {
        let composition =
            Composition::new(FactorName::market_cap(), frame(&[(d(2021, 3, 19), "A", 1.0)]))
                .unwrap();
        assert!(composition.weights_on(d(1999, 1, 1)).unwrap().is_empty());
    }
}

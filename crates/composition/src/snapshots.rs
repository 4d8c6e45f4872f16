//! Factor snapshots on the reference dates.

use std::collections::{BTreeMap, BTreeSet};

use capra_primitives::{Date, date_from_unix_days};
use polars::prelude::*;

use crate::CompositionError;

/// Build one `| date | entity | value |` frame per factor, restricted to the
/// reference dates.
///
/// Snapshots are sparse: an entity without a value for a factor on a date
/// (not yet listed, delisted, or simply uncovered) has no row.
///
/// # Arguments
/// * `records` - Record table with `date`, `entity` and one column per factor
/// * `dates` - Reference dates to keep
/// * `factors` - Factor column names to extract
///
/// # Errors
/// Returns `CompositionError` if a factor column is missing or not a float
/// column.
pub fn factor_snapshots(
    records: &DataFrame,
    dates: &[Date],
    factors: &[&str],
) -> Result<BTreeMap<String, DataFrame>, CompositionError> {
    let date_col = records
        .column("date")
        .map_err(|_| CompositionError::MissingColumn("date".to_string()))?;
    let entity_col = records
        .column("entity")
        .map_err(|_| CompositionError::MissingColumn("entity".to_string()))?
        .str()
        .map_err(|_| CompositionError::InvalidColumn("entity".to_string()))?;

    let mut factor_cols = Vec::with_capacity(factors.len());
    for &factor in factors {
        let col = records
            .column(factor)
            .map_err(|_| CompositionError::MissingFactor(factor.to_string()))?
            .f64()
            .map_err(|_| CompositionError::InvalidColumn(factor.to_string()))?;
        factor_cols.push((factor, col));
    }

    let keep: BTreeSet<Date> = dates.iter().copied().collect();
    let mut rows: BTreeMap<&str, (Vec<Date>, Vec<String>, Vec<f64>)> = BTreeMap::new();

    for idx in 0..records.height() {
        let AnyValue::Date(days) = date_col.get(idx)? else {
            continue;
        };
        let Some(date) = date_from_unix_days(days) else {
            continue;
        };
        if !keep.contains(&date) {
            continue;
        }
        let Some(entity) = entity_col.get(idx) else {
            continue;
        };

        for &(factor, col) in &factor_cols {
            if let Some(value) = col.get(idx) {
                let (dates, entities, values) = rows.entry(factor).or_default();
                dates.push(date);
                entities.push(entity.to_string());
                values.push(value);
            }
        }
    }

    let mut snapshots = BTreeMap::new();
    for &factor in factors {
        let (dates, entities, values) = rows.remove(factor).unwrap_or_default();
        let frame = DataFrame::new(vec![
            Column::new("date".into(), dates),
            Column::new("entity".into(), entities),
            Column::new("value".into(), values),
        ])?;
        snapshots.insert(factor.to_string(), frame);
    }
    Ok(snapshots)
}

/// Derive per-entity simple daily returns from prices.
///
/// Adds an `asset_returns` column holding `price / previous price - 1` within
/// each entity's own date-ordered history; an entity's first record has no
/// return. The output is sorted by entity then date.
///
/// # Errors
/// Returns `CompositionError` if required columns are missing.
pub fn derive_returns(records: &DataFrame) -> Result<DataFrame, CompositionError> {
    for column in ["date", "entity", "price"] {
        if records.column(column).is_err() {
            return Err(CompositionError::MissingColumn(column.to_string()));
        }
    }

    let with_returns = records
        .clone()
        .lazy()
        .sort(["entity", "date"], SortMultipleOptions::default())
        .with_column(
            (col("price") / col("price").shift(lit(1)).over([col("entity")]) - lit(1.0))
                .alias("asset_returns"),
        )
        .collect()?;

    Ok(with_returns)
}

//! Record table construction.

use std::collections::BTreeSet;

use capra_primitives::EntityRecord;
use polars::prelude::*;

use crate::CompositionError;

/// Build the long-format record table from typed records.
///
/// Produces `| date | entity | price | asset_returns | market_cap |
/// industry_exposure |` plus one column per score factor seen anywhere in
/// the input. Scores an entity does not carry are null, keeping the table
/// sparse the same way the factor snapshots are.
///
/// # Errors
/// Returns `CompositionError` if the frame cannot be assembled.
pub fn record_table(records: &[EntityRecord]) -> Result<DataFrame, CompositionError> {
    let mut score_names: BTreeSet<&str> = BTreeSet::new();
    for record in records {
        score_names.extend(record.score_names());
    }

    let mut columns = vec![
        Column::new("date".into(), records.iter().map(|r| r.date).collect::<Vec<_>>()),
        Column::new(
            "entity".into(),
            records.iter().map(|r| r.entity.as_str()).collect::<Vec<_>>(),
        ),
        Column::new("price".into(), records.iter().map(|r| r.price).collect::<Vec<_>>()),
        Column::new(
            "asset_returns".into(),
            records.iter().map(|r| r.asset_return).collect::<Vec<_>>(),
        ),
        Column::new(
            "market_cap".into(),
            records.iter().map(|r| r.market_cap).collect::<Vec<_>>(),
        ),
        Column::new(
            "industry_exposure".into(),
            records.iter().map(|r| r.industry_exposure.as_deref()).collect::<Vec<_>>(),
        ),
    ];

    for name in score_names {
        columns.push(Column::new(
            name.into(),
            records.iter().map(|r| r.score(name)).collect::<Vec<_>>(),
        ));
    }

    Ok(DataFrame::new(columns)?)
}

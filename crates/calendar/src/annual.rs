//! Annual last-trading-day-in-March rebalance schedule.

use std::collections::BTreeMap;

use capra_primitives::{Date, date_from_unix_days};
use capra_traits::{RebalanceSchedule, ScheduleError};
use chrono::Datelike;
use polars::prelude::*;
use tracing::warn;

/// Rebalance schedule taking each entity's last trading day in March.
///
/// Entities stop trading on different days (mergers, delistings), so the
/// reference date is computed per entity and year, then aggregated across
/// the cross-section. A date backed by fewer than `min_constituents`
/// entities is dropped as unreliable rather than failing the run.
#[derive(Debug, Clone)]
pub struct MarchLastTradingDaySchedule {
    /// Minimum number of entities that must share a reference date.
    pub min_constituents: usize,
}

impl MarchLastTradingDaySchedule {
    /// Create a schedule with the given coverage threshold.
    #[must_use]
    pub const fn new(min_constituents: usize) -> Self {
        Self { min_constituents }
    }
}

impl RebalanceSchedule for MarchLastTradingDaySchedule {
    fn reference_dates(&self, records: &DataFrame) -> Result<Vec<Date>, ScheduleError> {
        let date_col = records
            .column("date")
            .map_err(|_| ScheduleError::MissingColumn("date".to_string()))?;
        let entity_col = records
            .column("entity")
            .map_err(|_| ScheduleError::MissingColumn("entity".to_string()))?
            .str()
            .map_err(|_| ScheduleError::MissingColumn("entity".to_string()))?;

        // Last March trading day per entity and year.
        let mut last_march: BTreeMap<(String, i32), Date> = BTreeMap::new();
        for idx in 0..records.height() {
            let AnyValue::Date(days) = date_col.get(idx)? else {
                continue;
            };
            let Some(date) = date_from_unix_days(days) else {
                continue;
            };
            if date.month() != 3 {
                continue;
            }
            let entity = entity_col.get(idx).unwrap_or("").to_string();

            let entry = last_march.entry((entity, date.year())).or_insert(date);
            if date > *entry {
                *entry = date;
            }
        }

        // Cross-sectional coverage per aggregated date.
        let mut coverage: BTreeMap<Date, usize> = BTreeMap::new();
        for date in last_march.values() {
            *coverage.entry(*date).or_insert(0) += 1;
        }

        let mut dates = Vec::new();
        for (date, constituents) in &coverage {
            if *constituents >= self.min_constituents {
                dates.push(*date);
            } else {
                warn!(%date, constituents, "dropping reference date with thin coverage");
            }
        }

        if dates.is_empty() {
            return Err(ScheduleError::NoCoveredDates {
                min_constituents: self.min_constituents,
            });
        }
        Ok(dates)
    }
}

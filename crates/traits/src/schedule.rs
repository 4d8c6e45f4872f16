//! Rebalance schedule trait definitions.

use chrono::NaiveDate;
use polars::prelude::*;

/// Errors that can occur while computing reference dates.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// A configured month is outside `1..=12`.
    #[error("invalid month: {0} (must be in 1..=12)")]
    InvalidMonth(u32),

    /// The configured year range is empty.
    #[error("empty year range: {start}..={end}")]
    EmptyYearRange {
        /// First year of the range.
        start: i32,
        /// Last year of the range.
        end: i32,
    },

    /// A required column is missing from the record table.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// No reference date survived the coverage threshold.
    #[error("no reference date with at least {min_constituents} constituents")]
    NoCoveredDates {
        /// Configured minimum constituent count.
        min_constituents: usize,
    },

    /// Polars error.
    #[error("data processing error: {0}")]
    Polars(#[from] PolarsError),
}

/// Trait for computing the fixed reference dates of an index methodology.
///
/// Rule-based schedules derive dates purely from their configuration;
/// data-driven schedules read the record table. Both receive the table so a
/// pipeline can swap methodologies without changing its call sites.
pub trait RebalanceSchedule: Send + Sync {
    /// Compute the reference dates, ascending and deduplicated.
    ///
    /// # Arguments
    /// * `records` - Record table with `| date | entity | ... |` columns
    ///
    /// # Errors
    /// Returns `ScheduleError` if the configuration is invalid or required
    /// columns are absent.
    fn reference_dates(&self, records: &DataFrame) -> Result<Vec<NaiveDate>, ScheduleError>;
}

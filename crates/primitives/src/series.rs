//! Cumulative index series.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::Date;

/// Base level assigned to the first valid date of a series.
pub const BASE_LEVEL: f64 = 100.0;

/// A date-indexed cumulative index series.
///
/// Levels are the running product of `(1 + daily return)`, re-based so the
/// first value equals [`BASE_LEVEL`] exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeIndex {
    dates: Vec<Date>,
    levels: Vec<f64>,
}

impl CumulativeIndex {
    /// Build a series by chaining daily returns.
    ///
    /// # Arguments
    /// * `dates` - Trading dates, ascending
    /// * `returns` - One simple daily return per date
    ///
    /// # Returns
    /// The re-based series, or an empty series when no dates are given.
    #[must_use]
    pub fn from_daily_returns(dates: Vec<Date>, returns: &[f64]) -> Self {
        debug_assert_eq!(dates.len(), returns.len());

        if dates.is_empty() {
            return Self { dates, levels: Vec::new() };
        }

        let mut compounded = Vec::with_capacity(returns.len());
        let mut running = 1.0;
        for r in returns {
            running *= 1.0 + r;
            compounded.push(running);
        }

        // Re-base on the first element; the first level is exactly BASE_LEVEL.
        let first = compounded[0];
        let levels = compounded.iter().map(|v| v / first * BASE_LEVEL).collect();

        Self { dates, levels }
    }

    /// Number of dates in the series.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.dates.len()
    }

    /// Check if empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// The dates, ascending.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// The index levels, aligned with [`dates`](Self::dates).
    #[must_use]
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// Level on a specific date.
    #[must_use]
    pub fn get(&self, date: Date) -> Option<f64> {
        self.dates.iter().position(|d| *d == date).map(|i| self.levels[i])
    }

    /// The last level, if any.
    #[must_use]
    pub fn last(&self) -> Option<f64> {
        self.levels.last().copied()
    }

    /// Get the levels as an ndarray.
    #[must_use]
    pub fn to_array(&self) -> Array1<f64> {
        Array1::from_vec(self.levels.clone())
    }

    /// Iterate over `(date, level)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Date, f64)> + '_ {
        self.dates.iter().copied().zip(self.levels.iter().copied())
    }
}

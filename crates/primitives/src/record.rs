//! Per-entity daily record.

use serde::{Deserialize, Serialize};

use crate::{Date, EntityId, FactorName};

/// One entity's attributes on one trading day.
///
/// Records are immutable once loaded; the record table holds at most one
/// record per entity per date. The daily return is absent on an entity's
/// first trading day, and score coverage may be sparse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Entity identifier.
    pub entity: EntityId,
    /// Trading date.
    pub date: Date,
    /// Closing price.
    pub price: f64,
    /// Simple daily return, if available.
    pub asset_return: Option<f64>,
    /// Market capitalization.
    pub market_cap: f64,
    /// Industry exposure code string, if classified.
    pub industry_exposure: Option<String>,
    /// Normalized factor scores keyed by factor name.
    pub scores: Vec<(FactorName, f64)>,
}

impl EntityRecord {
    /// Create a new record.
    #[must_use]
    pub const fn new(
        entity: EntityId,
        date: Date,
        price: f64,
        asset_return: Option<f64>,
        market_cap: f64,
        industry_exposure: Option<String>,
        scores: Vec<(FactorName, f64)>,
    ) -> Self {
        Self { entity, date, price, asset_return, market_cap, industry_exposure, scores }
    }

    /// Get the score for a specific factor by name.
    #[must_use]
    pub fn score(&self, name: &str) -> Option<f64> {
        self.scores.iter().find(|(n, _)| n.as_str() == name).map(|(_, v)| *v)
    }

    /// Returns all score factor names.
    #[must_use]
    pub fn score_names(&self) -> Vec<&str> {
        self.scores.iter().map(|(n, _)| n.as_str()).collect()
    }
}

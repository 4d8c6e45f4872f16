//! Factor naming.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Column name of the market capitalization factor.
pub const MARKET_CAP: &str = "market_cap";

/// Name of a rebalance factor (market cap or a normalized score).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
pub struct FactorName(pub String);

impl FactorName {
    /// Create a new factor name.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// The market capitalization factor, used for constituent selection.
    #[must_use]
    pub fn market_cap() -> Self {
        Self(MARKET_CAP.to_string())
    }

    /// Whether this is the market capitalization factor.
    #[must_use]
    pub fn is_market_cap(&self) -> bool {
        self.0 == MARKET_CAP
    }

    /// Get the factor name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FactorName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FactorName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

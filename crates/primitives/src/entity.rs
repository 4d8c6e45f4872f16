//! Entity identifier definitions.

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Stable identifier for a listed entity (ISIN or permanent security number).
///
/// Unique within a trading date; an entity keeps its identifier across the
/// whole history even when its listing name changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    /// Create a new entity identifier.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

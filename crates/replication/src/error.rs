//! Error types for return replication.

use capra_composition::CompositionError;

/// Errors that can occur while replicating an index return path.
#[derive(Debug, thiserror::Error)]
pub enum ReplicationError {
    /// The composition carries no rebalance date.
    #[error("composition has no rebalance dates")]
    EmptyComposition,

    /// A required column is missing from the returns frame.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// A column has an unexpected type.
    #[error("column {0} is not a float column")]
    InvalidColumn(String),

    /// No holding period intersected the returns frame.
    #[error("no trading days in any holding period")]
    NoTradingDays,

    /// Composition error.
    #[error("composition error: {0}")]
    Composition(#[from] CompositionError),

    /// Polars error.
    #[error("data processing error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

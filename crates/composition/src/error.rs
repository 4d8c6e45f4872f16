//! Error types for composition construction.

use capra_primitives::Date;
use capra_traits::CapError;

/// Errors that can occur while building index compositions.
#[derive(Debug, thiserror::Error)]
pub enum CompositionError {
    /// A required factor is absent from the snapshot set.
    #[error("missing required factor: {0} (constituent selection needs it)")]
    MissingFactor(String),

    /// A required column is missing from a frame.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// A column has an unexpected type.
    #[error("column {0} is not a float column")]
    InvalidColumn(String),

    /// Per-date weights do not sum to 1.
    #[error("weights on {date} sum to {sum}, expected 1")]
    UnnormalizedWeights {
        /// Offending rebalance date.
        date: Date,
        /// Actual weight sum.
        sum: f64,
    },

    /// Capping error.
    #[error("capping error: {0}")]
    Cap(#[from] CapError),

    /// Polars error.
    #[error("data processing error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

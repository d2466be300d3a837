//! Engine error types.

use thiserror::Error;

/// Errors surfaced by the materialization engine.
///
/// The engine performs no local recovery beyond resource release: every
/// failure propagates to the caller as one of these variants. Retry policy
/// for transport failures belongs to the data source, not here.
#[derive(Debug, Error)]
pub enum Error {
    /// The plan descriptor is malformed or inconsistent with the catalog.
    /// Fatal; never retried.
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    /// The data source could not be reached or failed mid-fetch.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// Fetched rows could not be reconstructed into the expected nested
    /// shape. Carries the offending column and row context.
    #[error("mapping failure: missing or malformed column '{column}' ({context})")]
    MappingFailure {
        /// Column that was expected but absent or of the wrong shape.
        column: String,
        /// Where the failure occurred (e.g. "join row 17").
        context: String,
    },

    /// The caller cancelled the query before materialization completed.
    #[error("query cancelled before materialization")]
    Cancelled,
}

impl Error {
    /// Build a mapping failure for a column in a given context.
    pub fn mapping(column: impl Into<String>, context: impl Into<String>) -> Self {
        Error::MappingFailure {
            column: column.into(),
            context: context.into(),
        }
    }
}

impl From<folio_plan::PlanError> for Error {
    fn from(err: folio_plan::PlanError) -> Self {
        Error::InvalidPlan(err.to_string())
    }
}

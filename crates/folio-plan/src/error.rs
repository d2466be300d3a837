//! Plan descriptor errors.

use thiserror::Error;

/// Errors raised while validating a plan descriptor.
///
/// These cover only what the descriptor can check about itself; validation
/// against a concrete schema (unknown relations, unknown fields) happens in
/// the engine, which has the catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    /// The result limit is negative.
    #[error("limit must be non-negative, got {0}")]
    NegativeLimit(i64),

    /// The descriptor names no root entity.
    #[error("plan has no root entity")]
    MissingRoot,
}

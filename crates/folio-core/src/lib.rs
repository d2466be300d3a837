//! Folio Core - catalog, data-source seam, and execution strategies.
//!
//! This crate materializes one recurring query shape (filter → order →
//! limit → fan-out join → nested post-filter) through three interchangeable
//! strategies, all guaranteed to produce the same logical result set.

pub mod cancel;
pub mod catalog;
pub mod equivalence;
pub mod error;
pub mod filter;
pub mod project;
pub mod source;
pub mod strategy;

pub use cancel::CancelToken;
pub use catalog::{
    Cardinality, Catalog, EntityDef, FieldDef, RelationDef, ScalarType, library_catalog,
};
pub use equivalence::equivalent;
pub use error::Error;
pub use filter::FilterEvaluator;
pub use project::{AuthorProjection, BookProjection};
pub use source::{
    EntityRow, FlatRow, JoinKind, JoinQuery, JoinSpec, MemorySource, RelationalSource,
};
pub use strategy::{RootGroup, Strategy};

/// Re-export the plan IR.
pub use folio_plan as plan;

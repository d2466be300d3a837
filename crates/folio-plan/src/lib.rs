//! Folio query-intent IR.
//!
//! This crate defines the language-agnostic description of one recurring
//! query shape: equality filters over a root entity, an ordering key, a
//! result limit, a nested-collection selector, and a post-filter over a
//! derived field of the nested rows. Execution strategies in `folio-core`
//! consume these types; nothing here talks to a data source.

mod error;
mod plan;
mod value;

pub use error::PlanError;
pub use plan::{
    CompareOp, DerivedField, EqFilter, NestedFilter, NestedSelect, OrderDirection, OrderSpec,
    PlanDescriptor, Transform,
};
pub use value::Value;

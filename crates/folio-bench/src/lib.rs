//! Folio benchmark suite.
//!
//! Criterion benchmarks comparing the three materialization strategies on
//! generated library datasets. The interesting measurement is how each
//! strategy's cost scales with total database size versus result size:
//! the canonical query always returns two authors, while the data grows.

pub mod fixtures;
pub mod harness;

pub use fixtures::Scale;
pub use harness::TestContext;

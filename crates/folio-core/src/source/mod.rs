//! The relational data source seam.
//!
//! Strategies talk to a source exclusively through [`RelationalSource`]:
//! a filtered/ordered/limited root fetch, a related-row fetch, and a raw
//! flattened-join execution. Everything behind the trait — wire protocol,
//! pooling, retries — is the source's concern, not the engine's.

mod join;
mod memory;
mod rows;

pub use join::{JoinKind, JoinQuery, JoinSpec, prefix_for};
pub use memory::MemorySource;
pub use rows::{EntityRow, FlatRow, sort_rows};

use folio_plan::{EqFilter, OrderSpec};

use crate::catalog::RelationDef;
use crate::error::Error;

/// A relational data source the engine can fetch from.
///
/// Implementations must release any connection or session they acquire on
/// every exit path, including failures mid-fetch. They must not retry
/// internally; transport failures surface as
/// [`Error::SourceUnavailable`](crate::error::Error::SourceUnavailable).
pub trait RelationalSource {
    /// Fetch root entity rows.
    ///
    /// `filters`, `order`, and `limit` are the pushdown-eligible parts of a
    /// plan; passing none of them is the eager full scan. Ordering must be
    /// stable: ties keep source order.
    fn fetch_roots(
        &self,
        entity: &str,
        filters: &[EqFilter],
        order: Option<&OrderSpec>,
        limit: Option<usize>,
    ) -> Result<Vec<EntityRow>, Error>;

    /// Fetch rows related to the given parent rows.
    ///
    /// Returns `(parent_id, child_row)` pairs. Parent rows (not just ids)
    /// are supplied because to-one relations key on a parent-side field.
    fn fetch_related(
        &self,
        relation: &RelationDef,
        parents: &[EntityRow],
    ) -> Result<Vec<(i64, EntityRow)>, Error>;

    /// Execute a flattened join query, one row per root×child combination.
    fn execute_join(&self, query: &JoinQuery) -> Result<Vec<FlatRow>, Error>;
}

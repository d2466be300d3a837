//! Pushdown strategy: filters, ordering, and limit applied at the source.

use folio_plan::PlanDescriptor;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::catalog::{Cardinality, Catalog};
use crate::error::Error;
use crate::source::{EntityRow, RelationalSource};

use super::{RootGroup, assemble_groups, limit_of};

/// Push the plan's equality filters, ordering key, and limit into the
/// source fetch; only surviving roots and their direct relations cross the
/// boundary.
///
/// The nested post-filter stays client-side on purpose: it compares a
/// derived field the source does not store, and filtering children must
/// not remove a root from the top-N ranking (ranking uses the cached
/// aggregate, an independent field).
pub(super) fn fetch_groups(
    source: &dyn RelationalSource,
    catalog: &Catalog,
    plan: &PlanDescriptor,
    token: &CancelToken,
) -> Result<Vec<RootGroup>, Error> {
    let roots = source.fetch_roots(
        &plan.root,
        &plan.filters,
        Some(&plan.order),
        Some(limit_of(plan)),
    )?;
    token.check()?;

    let mut parent_pairs: Vec<(i64, EntityRow)> = Vec::new();
    for relation in catalog.relations_from(&plan.root) {
        if relation.cardinality == Cardinality::OneToOne && parent_pairs.is_empty() {
            parent_pairs = source.fetch_related(relation, &roots)?;
        }
    }

    let mut child_pairs: Vec<(i64, EntityRow)> = Vec::new();
    if let Some(nested) = &plan.nested {
        let relation = catalog.relation(&plan.root, &nested.relation).ok_or_else(|| {
            Error::InvalidPlan(format!(
                "unknown relation '{}' on entity '{}'",
                nested.relation, plan.root
            ))
        })?;
        child_pairs = source.fetch_related(relation, &roots)?;
    }
    token.check()?;

    debug!(
        roots = roots.len(),
        children = child_pairs.len(),
        "pushdown fetch complete"
    );
    Ok(assemble_groups(roots, parent_pairs, child_pairs))
}

//! Eager materialization: fetch the full object graph, filter in memory.

use folio_plan::PlanDescriptor;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::catalog::{Cardinality, Catalog};
use crate::error::Error;
use crate::filter::FilterEvaluator;
use crate::source::{EntityRow, RelationalSource, sort_rows};

use super::{RootGroup, assemble_groups, limit_of};

/// Fetch every root row plus the full relation closure, then apply the
/// plan's filters, ordering, and limit entirely client-side.
///
/// Transfers and allocates proportionally to total database size
/// regardless of selectivity; the other strategies must match its output
/// while beating its cost.
pub(super) fn fetch_groups(
    source: &dyn RelationalSource,
    catalog: &Catalog,
    plan: &PlanDescriptor,
    token: &CancelToken,
) -> Result<Vec<RootGroup>, Error> {
    let mut roots = source.fetch_roots(&plan.root, &[], None, None)?;

    let nested_relation = plan.nested.as_ref().map(|n| n.relation.as_str());
    let mut parent_pairs: Vec<(i64, EntityRow)> = Vec::new();
    let mut child_pairs: Vec<(i64, EntityRow)> = Vec::new();
    let mut discarded = 0usize;

    // Full closure: every relation of the root, and every to-one relation
    // of each fetched collection row, whether the projection needs it or
    // not. That over-fetch is the defining cost of this strategy.
    for relation in catalog.relations_from(&plan.root) {
        let related = source.fetch_related(relation, &roots)?;
        if relation.is_to_many() {
            let child_rows: Vec<EntityRow> =
                related.iter().map(|(_, row)| row.clone()).collect();
            for child_relation in catalog.relations_from(&relation.to_entity) {
                discarded += source.fetch_related(child_relation, &child_rows)?.len();
            }
            if Some(relation.name.as_str()) == nested_relation {
                child_pairs = related;
            } else {
                discarded += related.len();
            }
        } else if relation.cardinality == Cardinality::OneToOne && parent_pairs.is_empty() {
            parent_pairs = related;
        } else {
            discarded += related.len();
        }
    }
    token.check()?;

    let fetched = roots.len();
    roots.retain(|row| FilterEvaluator::matches_all(&plan.filters, row));
    sort_rows(&mut roots, &plan.order);
    roots.truncate(limit_of(plan));
    debug!(
        fetched,
        kept = roots.len(),
        discarded,
        "eager scan filtered client-side"
    );

    Ok(assemble_groups(roots, parent_pairs, child_pairs))
}

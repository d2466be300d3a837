//! Execution strategies for query materialization.
//!
//! Three interchangeable variants materialize the same plan at different
//! costs: `Eager` fetches the full object graph and does everything
//! client-side, `Pushdown` hands filter/order/limit to the source, and
//! `FlattenedJoin` issues one denormalized join and folds it client-side.
//! The caller picks the variant; there is no runtime strategy inference.

mod eager;
mod flattened;
mod pushdown;

use std::collections::HashMap;

use folio_plan::PlanDescriptor;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::catalog::Catalog;
use crate::error::Error;
use crate::project::{self, AuthorProjection};
use crate::source::{EntityRow, RelationalSource};

/// A materialized root with its resolved relations, before projection.
#[derive(Debug, Clone)]
pub struct RootGroup {
    /// The root entity row.
    pub root: EntityRow,
    /// Row from the root's one-to-one relation (flattened by projection).
    pub parent: Option<EntityRow>,
    /// Rows of the plan's nested collection, in source order.
    pub children: Vec<EntityRow>,
}

/// Execution strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Fetch everything, then filter/order/limit in memory. The
    /// pathological baseline: O(total database size) transfer.
    Eager,
    /// Push filter/order/limit to the source; fetch only surviving roots
    /// and their direct relations.
    Pushdown,
    /// One flattened join, folded client-side by root identity.
    FlattenedJoin,
}

impl Strategy {
    /// Materialize a plan against a data source.
    ///
    /// All strategies produce the same logical result set for the same
    /// plan and dataset; they differ only in rows transferred and objects
    /// materialized.
    pub fn materialize(
        &self,
        source: &dyn RelationalSource,
        catalog: &Catalog,
        plan: &PlanDescriptor,
    ) -> Result<Vec<AuthorProjection>, Error> {
        self.materialize_with_token(source, catalog, plan, &CancelToken::new())
    }

    /// Materialize with a cancellation token.
    ///
    /// Cancellation is checked between fetch and materialization; a
    /// cancelled call surfaces [`Error::Cancelled`], never a truncated
    /// result.
    pub fn materialize_with_token(
        &self,
        source: &dyn RelationalSource,
        catalog: &Catalog,
        plan: &PlanDescriptor,
        token: &CancelToken,
    ) -> Result<Vec<AuthorProjection>, Error> {
        plan.validate()?;
        validate_against_catalog(catalog, plan)?;
        token.check()?;

        let groups = match self {
            Strategy::Eager => eager::fetch_groups(source, catalog, plan, token)?,
            Strategy::Pushdown => pushdown::fetch_groups(source, catalog, plan, token)?,
            Strategy::FlattenedJoin => flattened::fetch_groups(source, catalog, plan, token)?,
        };

        token.check()?;
        let out = project::project_roots(&groups, plan)?;
        debug!(strategy = ?self, roots = out.len(), "materialized plan");
        Ok(out)
    }
}

/// Validate plan fields and relations against the catalog.
fn validate_against_catalog(catalog: &Catalog, plan: &PlanDescriptor) -> Result<(), Error> {
    let root = catalog
        .entity(&plan.root)
        .ok_or_else(|| Error::InvalidPlan(format!("unknown root entity '{}'", plan.root)))?;

    for filter in &plan.filters {
        if root.get_field(&filter.field).is_none() {
            return Err(Error::InvalidPlan(format!(
                "unknown field '{}' on entity '{}'",
                filter.field, plan.root
            )));
        }
    }
    if root.get_field(&plan.order.field).is_none() {
        return Err(Error::InvalidPlan(format!(
            "unknown ordering field '{}' on entity '{}'",
            plan.order.field, plan.root
        )));
    }

    if let Some(nested) = &plan.nested {
        let relation = catalog.relation(&plan.root, &nested.relation).ok_or_else(|| {
            Error::InvalidPlan(format!(
                "unknown relation '{}' on entity '{}'",
                nested.relation, plan.root
            ))
        })?;
        if !relation.is_to_many() {
            return Err(Error::InvalidPlan(format!(
                "nested selector '{}' must reference a collection relation",
                nested.relation
            )));
        }
        if let Some(filter) = &nested.filter {
            let target = catalog.entity(&relation.to_entity).ok_or_else(|| {
                Error::InvalidPlan(format!("unknown target entity '{}'", relation.to_entity))
            })?;
            if target.get_field(&filter.derived.field).is_none() {
                return Err(Error::InvalidPlan(format!(
                    "unknown field '{}' on entity '{}'",
                    filter.derived.field, relation.to_entity
                )));
            }
        }
    }
    Ok(())
}

/// Effective limit of a validated plan.
fn limit_of(plan: &PlanDescriptor) -> usize {
    usize::try_from(plan.limit).unwrap_or(usize::MAX)
}

/// Assemble root groups from fetched relation pairs, preserving root order.
fn assemble_groups(
    roots: Vec<EntityRow>,
    parents: Vec<(i64, EntityRow)>,
    children: Vec<(i64, EntityRow)>,
) -> Vec<RootGroup> {
    let mut parent_by_id: HashMap<i64, EntityRow> = parents.into_iter().collect();
    let mut children_by_id: HashMap<i64, Vec<EntityRow>> = HashMap::new();
    for (parent_id, child) in children {
        children_by_id.entry(parent_id).or_default().push(child);
    }
    roots
        .into_iter()
        .map(|root| RootGroup {
            parent: parent_by_id.remove(&root.id),
            children: children_by_id.remove(&root.id).unwrap_or_default(),
            root,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::library_catalog;
    use folio_plan::NestedSelect;

    #[test]
    fn test_validate_unknown_root() {
        let catalog = library_catalog();
        let plan = PlanDescriptor::new("Wizard");
        let err = validate_against_catalog(&catalog, &plan).unwrap_err();
        assert!(matches!(err, Error::InvalidPlan(_)));
    }

    #[test]
    fn test_validate_unknown_relation() {
        let catalog = library_catalog();
        let plan = PlanDescriptor::new("Author").nested(NestedSelect::new("articles"));
        let err = validate_against_catalog(&catalog, &plan).unwrap_err();
        assert!(matches!(err, Error::InvalidPlan(msg) if msg.contains("articles")));
    }

    #[test]
    fn test_validate_rejects_to_one_nested_selector() {
        let catalog = library_catalog();
        let plan = PlanDescriptor::new("Author").nested(NestedSelect::new("user"));
        let err = validate_against_catalog(&catalog, &plan).unwrap_err();
        assert!(matches!(err, Error::InvalidPlan(msg) if msg.contains("collection")));
    }

    #[test]
    fn test_validate_unknown_filter_field() {
        let catalog = library_catalog();
        let plan = PlanDescriptor::new("Author").filter_eq("height", 3);
        let err = validate_against_catalog(&catalog, &plan).unwrap_err();
        assert!(matches!(err, Error::InvalidPlan(msg) if msg.contains("height")));
    }

    #[test]
    fn test_limit_of_saturates() {
        let plan = PlanDescriptor::new("Author");
        assert_eq!(limit_of(&plan), usize::MAX);
        assert_eq!(limit_of(&plan.clone().take(2)), 2);
    }
}

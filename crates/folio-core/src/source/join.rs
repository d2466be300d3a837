//! Structured join queries for the flattened-join strategy.
//!
//! A `JoinQuery` is the structured form of one denormalized join over the
//! root and its relations. In-memory sources execute it directly; networked
//! sources render it to parameterized SQL with [`JoinQuery::to_sql`]. Either
//! way the result is one flat row per root×child combination with columns
//! named by the `Entity_Field` convention.

use folio_plan::{EqFilter, OrderDirection, OrderSpec, PlanDescriptor, Value};

use crate::catalog::{Catalog, EntityDef, RelationDef};
use crate::error::Error;

/// Join flavor for one edge of the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Row required on both sides; unmatched roots are dropped.
    Inner,
    /// Unmatched roots keep the row with null child columns.
    Left,
}

/// One joined relation within a flattened query.
#[derive(Debug, Clone)]
pub struct JoinSpec {
    /// Relation being joined.
    pub relation: RelationDef,
    /// Target entity definition (drives the column list).
    pub target: EntityDef,
    /// Column prefix for the target's fields (e.g. "Books").
    pub prefix: String,
    /// Column prefix of the entity this join hangs off (e.g. "Author").
    pub parent_prefix: String,
    /// Inner or left join.
    pub kind: JoinKind,
}

/// A structured flattened-join query.
///
/// No limit is carried here on purpose: truncation happens client-side on
/// distinct root groups, never on raw join rows.
#[derive(Debug, Clone)]
pub struct JoinQuery {
    /// Root entity definition.
    pub root: EntityDef,
    /// Column prefix for root fields.
    pub root_prefix: String,
    /// Equality filters over root fields.
    pub filters: Vec<EqFilter>,
    /// Ordering over a root field.
    pub order: Option<OrderSpec>,
    /// Joined relations, in application order.
    pub joins: Vec<JoinSpec>,
}

impl JoinQuery {
    /// Build the join query for a plan against a catalog.
    ///
    /// Joins every one-to-one relation of the root (inner), the plan's
    /// nested collection (left, so roots without children survive), and
    /// each many-to-one relation hanging off the nested entity (left).
    pub fn for_plan(catalog: &Catalog, plan: &PlanDescriptor) -> Result<Self, Error> {
        let root = catalog
            .entity(&plan.root)
            .ok_or_else(|| Error::InvalidPlan(format!("unknown root entity '{}'", plan.root)))?
            .clone();
        let root_prefix = prefix_for(&plan.root);

        let mut joins = Vec::new();
        for relation in catalog.relations_from(&plan.root) {
            if relation.is_to_many() {
                continue;
            }
            let prefix = prefix_for(&relation.name);
            joins.push(Self::spec(catalog, relation, prefix, &root_prefix, JoinKind::Inner)?);
        }

        if let Some(nested) = &plan.nested {
            let relation = catalog.relation(&plan.root, &nested.relation).ok_or_else(|| {
                Error::InvalidPlan(format!(
                    "unknown relation '{}' on entity '{}'",
                    nested.relation, plan.root
                ))
            })?;
            let child_prefix = prefix_for(&relation.name);
            joins.push(Self::spec(
                catalog,
                relation,
                child_prefix.clone(),
                &root_prefix,
                JoinKind::Left,
            )?);

            for child_rel in catalog.relations_from(&relation.to_entity) {
                if child_rel.is_to_many() {
                    continue;
                }
                let prefix = format!("{}_{}", child_prefix, prefix_for(&child_rel.name));
                joins.push(Self::spec(catalog, child_rel, prefix, &child_prefix, JoinKind::Left)?);
            }
        }

        Ok(Self {
            root,
            root_prefix,
            filters: plan.filters.clone(),
            order: Some(plan.order.clone()),
            joins,
        })
    }

    fn spec(
        catalog: &Catalog,
        relation: &RelationDef,
        prefix: String,
        parent_prefix: &str,
        kind: JoinKind,
    ) -> Result<JoinSpec, Error> {
        let target = catalog
            .entity(&relation.to_entity)
            .ok_or_else(|| {
                Error::InvalidPlan(format!("unknown target entity '{}'", relation.to_entity))
            })?
            .clone();
        Ok(JoinSpec {
            relation: relation.clone(),
            target,
            prefix,
            parent_prefix: parent_prefix.to_string(),
            kind,
        })
    }

    /// The join for the plan's nested collection, if one was built.
    pub fn nested_join(&self) -> Option<&JoinSpec> {
        self.joins.iter().find(|j| j.relation.is_to_many())
    }

    /// The one-to-one joins hanging directly off the root.
    pub fn root_to_one_joins(&self) -> impl Iterator<Item = &JoinSpec> {
        self.joins
            .iter()
            .filter(|j| !j.relation.is_to_many() && j.parent_prefix == self.root_prefix)
    }

    /// Render the query as parameterized SQL.
    ///
    /// Returns the query text with `?` placeholders and the parameter
    /// values in order. Column aliases follow the prefix convention so a
    /// generic row mapper can fold the result by shared key columns.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut aliases: Vec<(&str, String)> = vec![(self.root_prefix.as_str(), "t0".to_string())];
        for (i, join) in self.joins.iter().enumerate() {
            aliases.push((join.prefix.as_str(), format!("t{}", i + 1)));
        }
        let alias = |prefix: &str| -> &str {
            aliases
                .iter()
                .find(|(p, _)| *p == prefix)
                .map(|(_, a)| a.as_str())
                .unwrap_or("t0")
        };

        let mut select = Vec::new();
        for field in &self.root.fields {
            select.push(format!(
                "{}.{} AS {}_{}",
                alias(&self.root_prefix),
                field.name,
                self.root_prefix,
                field.name
            ));
        }
        for join in &self.joins {
            for field in &join.target.fields {
                select.push(format!(
                    "{}.{} AS {}_{}",
                    alias(&join.prefix),
                    field.name,
                    join.prefix,
                    field.name
                ));
            }
        }

        let mut sql = format!(
            "SELECT {} FROM {} {}",
            select.join(", "),
            self.root.name,
            alias(&self.root_prefix)
        );
        for join in &self.joins {
            let keyword = match join.kind {
                JoinKind::Inner => "INNER JOIN",
                JoinKind::Left => "LEFT JOIN",
            };
            sql.push_str(&format!(
                " {} {} {} ON {}.{} = {}.{}",
                keyword,
                join.target.name,
                alias(&join.prefix),
                alias(&join.prefix),
                join.relation.to_field,
                alias(&join.parent_prefix),
                join.relation.from_field,
            ));
        }

        let mut params = Vec::new();
        if !self.filters.is_empty() {
            let clauses: Vec<String> = self
                .filters
                .iter()
                .map(|f| {
                    params.push(f.value.clone());
                    format!("{}.{} = ?", alias(&self.root_prefix), f.field)
                })
                .collect();
            sql.push_str(&format!(" WHERE {}", clauses.join(" AND ")));
        }

        if let Some(order) = &self.order {
            let dir = match order.direction {
                OrderDirection::Asc => "ASC",
                OrderDirection::Desc => "DESC",
            };
            sql.push_str(&format!(
                " ORDER BY {}.{} {}",
                alias(&self.root_prefix),
                order.field,
                dir
            ));
        }

        (sql, params)
    }
}

/// Column prefix for an entity or relation name ("books" → "Books").
pub fn prefix_for(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

//! The plan descriptor: an immutable value describing query intent.

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::value::Value;

/// An equality predicate against a root entity field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqFilter {
    /// Field on the root entity.
    pub field: String,
    /// Value the field must equal.
    pub value: Value,
}

impl EqFilter {
    /// Create an equality filter.
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

/// Order specification for ranking results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSpec {
    /// Field to order by.
    pub field: String,
    /// Sort direction.
    pub direction: OrderDirection,
}

impl OrderSpec {
    /// Create an ascending order spec.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Asc,
        }
    }

    /// Create a descending order spec.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Desc,
        }
    }
}

/// Comparison operator for nested post-filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
}

/// A transform applied to a stored field to produce a derived value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transform {
    /// The stored value, untransformed.
    Identity,
    /// Calendar year extracted from a date or timestamp field.
    YearOf,
}

/// A field reference plus the transform producing the compared value.
///
/// Derived fields are the reason the nested post-filter is never pushed to
/// the data source: the source stores `published`, not `year(published)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedField {
    /// Stored field on the nested entity.
    pub field: String,
    /// Transform applied before comparison.
    pub transform: Transform,
}

/// A predicate over a derived field of the nested rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedFilter {
    /// Derived field the predicate compares.
    pub derived: DerivedField,
    /// Comparison operator.
    pub op: CompareOp,
    /// Comparison value.
    pub value: Value,
}

impl NestedFilter {
    /// Create a filter over an untransformed nested field.
    pub fn field(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self {
            derived: DerivedField {
                field: field.into(),
                transform: Transform::Identity,
            },
            op,
            value: value.into(),
        }
    }

    /// Create a filter over the year extracted from a date field.
    pub fn year_of(field: impl Into<String>, op: CompareOp, year: i32) -> Self {
        Self {
            derived: DerivedField {
                field: field.into(),
                transform: Transform::YearOf,
            },
            op,
            value: Value::Int32(year),
        }
    }
}

/// Which child collection to fan out, and the post-filter on its rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedSelect {
    /// Relation name on the root entity (e.g. "books").
    pub relation: String,
    /// Post-filter applied to nested rows after fetch.
    pub filter: Option<NestedFilter>,
}

impl NestedSelect {
    /// Select a child collection without a post-filter.
    pub fn new(relation: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            filter: None,
        }
    }

    /// Attach a post-filter to the nested rows.
    pub fn with_filter(mut self, filter: NestedFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// An immutable description of one materialization query.
///
/// The descriptor is pure data: equality filters (ANDed, in order), one
/// ordering key, a non-negative limit, and an optional nested-collection
/// selector with its post-filter. Strategies decide how much of it is
/// pushed to the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDescriptor {
    /// Root entity to materialize.
    pub root: String,
    /// Equality filters over root fields, all ANDed.
    pub filters: Vec<EqFilter>,
    /// Ranking key and direction.
    pub order: OrderSpec,
    /// Maximum number of roots to return. Validated non-negative.
    pub limit: i64,
    /// Child collection to fan out, if any.
    pub nested: Option<NestedSelect>,
}

impl PlanDescriptor {
    /// Create a descriptor for a root entity with no filters, ordered by
    /// the entity's own id ascending and unlimited.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            filters: vec![],
            order: OrderSpec::asc("id"),
            limit: i64::MAX,
            nested: None,
        }
    }

    /// Add an ANDed equality filter.
    pub fn filter_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(EqFilter::new(field, value));
        self
    }

    /// Order descending by the given field.
    pub fn order_desc(mut self, field: impl Into<String>) -> Self {
        self.order = OrderSpec::desc(field);
        self
    }

    /// Order ascending by the given field.
    pub fn order_asc(mut self, field: impl Into<String>) -> Self {
        self.order = OrderSpec::asc(field);
        self
    }

    /// Keep at most `limit` roots.
    pub fn take(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Fan out the given child collection.
    pub fn nested(mut self, nested: NestedSelect) -> Self {
        self.nested = Some(nested);
        self
    }

    /// Validate the descriptor's self-contained invariants.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.root.is_empty() {
            return Err(PlanError::MissingRoot);
        }
        if self.limit < 0 {
            return Err(PlanError::NegativeLimit(self.limit));
        }
        Ok(())
    }
}

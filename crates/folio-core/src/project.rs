//! Projection of materialized root groups into the client-facing shape.
//!
//! Projection is the one typed edge of the engine: everything upstream
//! works on generic [`EntityRow`](crate::source::EntityRow) values, and
//! this module maps the library schema's rows onto concrete structs. The
//! nested post-filter is applied here, after fetch, so every strategy
//! shares the same filtering code path.

use folio_plan::{NestedFilter, PlanDescriptor, Value};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::filter::FilterEvaluator;
use crate::source::EntityRow;
use crate::strategy::RootGroup;

/// A book in the projected result, reduced to title and publication year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookProjection {
    /// Book title.
    pub title: String,
    /// Calendar year the book was published.
    pub published_year: i32,
}

/// One projected author: root fields, flattened user fields, and the
/// post-filtered book collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorProjection {
    /// Author identity.
    pub id: i64,
    /// From the linked user record.
    pub first_name: String,
    /// From the linked user record.
    pub last_name: String,
    /// From the linked user record.
    pub user_name: String,
    /// From the linked user record.
    pub email: String,
    /// Author age in years.
    pub age: i32,
    /// Author country.
    pub country: String,
    /// Cached book count the ranking used. May disagree with `books.len()`
    /// both because of the post-filter and because the cache can be stale.
    pub books_count: i64,
    /// Books surviving the nested post-filter, in source order.
    pub books: Vec<BookProjection>,
}

/// Project root groups into author records, applying the plan's nested
/// post-filter to each group's children.
///
/// Group order is preserved; a root whose books all fail the post-filter
/// still projects, with an empty collection.
pub fn project_roots(
    groups: &[RootGroup],
    plan: &PlanDescriptor,
) -> Result<Vec<AuthorProjection>, Error> {
    let filter = plan.nested.as_ref().and_then(|n| n.filter.as_ref());
    groups
        .iter()
        .map(|group| project_author(group, filter))
        .collect()
}

fn project_author(
    group: &RootGroup,
    filter: Option<&NestedFilter>,
) -> Result<AuthorProjection, Error> {
    let author = &group.root;
    let context = format!("author id {}", author.id);

    let user = group
        .parent
        .as_ref()
        .ok_or_else(|| Error::mapping("user", context.clone()))?;

    let books = group
        .children
        .iter()
        .filter(|row| filter.map_or(true, |f| FilterEvaluator::matches_nested(f, row)))
        .map(project_book)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AuthorProjection {
        id: author.id,
        first_name: require_str(user, "first_name", &context)?,
        last_name: require_str(user, "last_name", &context)?,
        user_name: require_str(user, "user_name", &context)?,
        email: require_str(user, "email", &context)?,
        age: require_i32(author, "age", &context)?,
        country: require_str(author, "country", &context)?,
        books_count: require_i64(author, "books_count", &context)?,
        books,
    })
}

fn project_book(row: &EntityRow) -> Result<BookProjection, Error> {
    let context = format!("book id {}", row.id);
    let published = require(row, "published", &context)?;
    let published_year = FilterEvaluator::year_of(published)
        .ok_or_else(|| Error::mapping("published", context.clone()))?;
    Ok(BookProjection {
        title: require_str(row, "name", &context)?,
        published_year,
    })
}

fn require<'a>(row: &'a EntityRow, field: &str, context: &str) -> Result<&'a Value, Error> {
    row.get(field).ok_or_else(|| Error::mapping(field, context))
}

fn require_str(row: &EntityRow, field: &str, context: &str) -> Result<String, Error> {
    require(row, field, context)?
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| Error::mapping(field, context))
}

fn require_i32(row: &EntityRow, field: &str, context: &str) -> Result<i32, Error> {
    require(row, field, context)?
        .as_i32()
        .ok_or_else(|| Error::mapping(field, context))
}

fn require_i64(row: &EntityRow, field: &str, context: &str) -> Result<i64, Error> {
    require(row, field, context)?
        .as_i64()
        .ok_or_else(|| Error::mapping(field, context))
}

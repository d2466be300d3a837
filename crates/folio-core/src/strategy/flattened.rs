//! Flattened-join strategy: one denormalized query, folded client-side.

use std::collections::{HashMap, HashSet};

use folio_plan::PlanDescriptor;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::catalog::{Catalog, EntityDef};
use crate::error::Error;
use crate::source::{EntityRow, FlatRow, JoinQuery, RelationalSource};

use super::{RootGroup, limit_of};

/// Issue one flattened join and fold the result into nested groups.
///
/// Root columns repeat across each child row, so the fold groups by root
/// identity in first-seen order and applies the limit to distinct groups,
/// never to raw rows — taking N raw rows could yield fewer than N roots or
/// split a root's children across the truncation boundary.
pub(super) fn fetch_groups(
    source: &dyn RelationalSource,
    catalog: &Catalog,
    plan: &PlanDescriptor,
    token: &CancelToken,
) -> Result<Vec<RootGroup>, Error> {
    let query = JoinQuery::for_plan(catalog, plan)?;
    let rows = source.execute_join(&query)?;
    token.check()?;

    let groups = fold_rows(&query, &rows, limit_of(plan))?;
    debug!(
        rows = rows.len(),
        groups = groups.len(),
        "folded flattened join"
    );
    Ok(groups)
}

/// Group flat rows by root identity, preserving first-seen order.
fn fold_rows(
    query: &JoinQuery,
    rows: &[FlatRow],
    limit: usize,
) -> Result<Vec<RootGroup>, Error> {
    let id_column = format!("{}_{}", query.root_prefix, query.root.id_field);
    let parent_join = query.root_to_one_joins().next();
    let nested_join = query.nested_join();

    let mut order: Vec<i64> = Vec::new();
    let mut groups: HashMap<i64, RootGroup> = HashMap::new();
    let mut seen_children: HashMap<i64, HashSet<i64>> = HashMap::new();

    for (idx, row) in rows.iter().enumerate() {
        let context = format!("join row {idx}");
        let root_id = row
            .require(&id_column, &context)?
            .as_i64()
            .ok_or_else(|| Error::mapping(id_column.clone(), context.clone()))?;

        if !groups.contains_key(&root_id) {
            let root = sub_row(row, &query.root_prefix, &query.root, &context)?
                .ok_or_else(|| Error::mapping(id_column.clone(), context.clone()))?;
            let parent = match parent_join {
                Some(join) => sub_row(row, &join.prefix, &join.target, &context)?,
                None => None,
            };
            order.push(root_id);
            groups.insert(
                root_id,
                RootGroup {
                    root,
                    parent,
                    children: Vec::new(),
                },
            );
        }

        if let Some(join) = nested_join {
            if let Some(child) = sub_row(row, &join.prefix, &join.target, &context)? {
                // Duplicate (root, child) pairs can appear when further
                // to-one joins fan the row out; keep the first.
                let seen = seen_children.entry(root_id).or_default();
                if seen.insert(child.id) {
                    if let Some(group) = groups.get_mut(&root_id) {
                        group.children.push(child);
                    }
                }
            }
        }
    }

    Ok(order
        .into_iter()
        .take(limit)
        .filter_map(|id| groups.remove(&id))
        .collect())
}

/// Extract one entity's row from a flat row by column prefix.
///
/// Returns `Ok(None)` when the entity's identity column is null (the
/// unmatched side of a left join); a missing column is a mapping failure.
fn sub_row(
    row: &FlatRow,
    prefix: &str,
    def: &EntityDef,
    context: &str,
) -> Result<Option<EntityRow>, Error> {
    let id_column = format!("{}_{}", prefix, def.id_field);
    let id_value = row.require(&id_column, context)?;
    let Some(id) = id_value.as_i64() else {
        return if id_value.is_null() {
            Ok(None)
        } else {
            Err(Error::mapping(id_column, context))
        };
    };

    let mut fields = Vec::with_capacity(def.fields.len());
    for field in &def.fields {
        let column = format!("{}_{}", prefix, field.name);
        let value = row.require(&column, context)?.clone();
        fields.push((field.name.clone(), value));
    }
    Ok(Some(EntityRow::new(id, fields)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::library_catalog;
    use folio_plan::{NestedSelect, Value};

    fn flat(author_id: i64, book_id: Option<i64>) -> FlatRow {
        let catalog = library_catalog();
        let author_def = catalog.entity("Author").unwrap();
        let user_def = catalog.entity("User").unwrap();
        let book_def = catalog.entity("Book").unwrap();
        let publisher_def = catalog.entity("Publisher").unwrap();

        let mut columns = Vec::new();
        for f in &author_def.fields {
            let v = match f.name.as_str() {
                "id" => Value::Int64(author_id),
                "user_id" => Value::Int64(author_id + 10),
                "age" => Value::Int32(27),
                "country" => Value::from("Serbia"),
                "books_count" => Value::Int64(1),
                _ => Value::from("x"),
            };
            columns.push((format!("Author_{}", f.name), v));
        }
        for f in &user_def.fields {
            let v = match f.name.as_str() {
                "id" => Value::Int64(author_id + 10),
                "email_confirmed" => Value::Bool(true),
                "created" | "last_activity" => Value::Timestamp(0),
                _ => Value::from("x"),
            };
            columns.push((format!("User_{}", f.name), v));
        }
        for f in &book_def.fields {
            let v = match (book_id, f.name.as_str()) {
                (None, _) => Value::Null,
                (Some(id), "id") => Value::Int64(id),
                (Some(_), "author_id") => Value::Int64(author_id),
                (Some(_), "published") => {
                    Value::Date(chrono::NaiveDate::from_ymd_opt(1890, 1, 1).unwrap())
                }
                (Some(_), "publisher_id") => Value::Int64(7),
                (Some(id), _) => Value::from(format!("b{id}")),
            };
            columns.push((format!("Books_{}", f.name), v));
        }
        for f in &publisher_def.fields {
            let v = if book_id.is_some() {
                match f.name.as_str() {
                    "id" => Value::Int64(7),
                    "established" => {
                        Value::Date(chrono::NaiveDate::from_ymd_opt(1800, 1, 1).unwrap())
                    }
                    _ => Value::from("press"),
                }
            } else {
                Value::Null
            };
            columns.push((format!("Books_Publisher_{}", f.name), v));
        }
        FlatRow::new(columns)
    }

    fn query() -> JoinQuery {
        let catalog = library_catalog();
        let plan = folio_plan::PlanDescriptor::new("Author")
            .order_desc("books_count")
            .nested(NestedSelect::new("books"));
        JoinQuery::for_plan(&catalog, &plan).unwrap()
    }

    #[test]
    fn test_fold_limit_counts_distinct_groups() {
        let rows = vec![
            flat(1, Some(100)),
            flat(1, Some(101)),
            flat(2, Some(200)),
            flat(3, Some(300)),
        ];
        let groups = fold_rows(&query(), &rows, 2).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].root.id, 1);
        assert_eq!(groups[0].children.len(), 2);
        assert_eq!(groups[1].root.id, 2);
    }

    #[test]
    fn test_fold_keeps_bookless_group() {
        let rows = vec![flat(1, None)];
        let groups = fold_rows(&query(), &rows, 10).unwrap();
        assert_eq!(groups.len(), 1);
        assert!(groups[0].children.is_empty());
        assert!(groups[0].parent.is_some());
    }

    #[test]
    fn test_fold_dedupes_repeated_children() {
        let rows = vec![flat(1, Some(100)), flat(1, Some(100))];
        let groups = fold_rows(&query(), &rows, 10).unwrap();
        assert_eq!(groups[0].children.len(), 1);
    }

    #[test]
    fn test_fold_missing_column_is_mapping_failure() {
        let mut row = flat(1, Some(100));
        row.columns.retain(|(name, _)| name != "Books_isbn");
        let err = fold_rows(&query(), &[row], 10).unwrap_err();
        assert!(matches!(
            err,
            Error::MappingFailure { column, context }
                if column == "Books_isbn" && context == "join row 0"
        ));
    }
}

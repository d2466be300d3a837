//! Row shapes exchanged with a relational data source.

use folio_plan::{OrderDirection, OrderSpec, Value};

use crate::error::Error;
use crate::filter::FilterEvaluator;

/// An entity row during execution: identity plus named field values.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRow {
    /// Entity identity.
    pub id: i64,
    /// Named field values, in source order.
    pub fields: Vec<(String, Value)>,
}

impl EntityRow {
    /// Create a row from an id and named values.
    pub fn new(id: i64, fields: Vec<(String, Value)>) -> Self {
        Self { id, fields }
    }

    /// Get a field value by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, v)| v)
    }
}

/// A denormalized row from a flattened join query.
///
/// Columns follow the `Entity_Field` / `Entity_NestedEntity_Field` naming
/// convention, with root columns repeated across each child row.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRow {
    /// Named column values.
    pub columns: Vec<(String, Value)>,
}

impl FlatRow {
    /// Create a flat row from named columns.
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    /// Get a column value by name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    /// Get a column value, surfacing a mapping failure if it is absent.
    pub fn require(&self, column: &str, context: &str) -> Result<&Value, Error> {
        self.get(column)
            .ok_or_else(|| Error::mapping(column, context))
    }
}

/// Stable in-place sort of entity rows by an order spec.
///
/// Rows missing the field or with incomparable values keep their input
/// position relative to each other; ties are never reordered.
pub fn sort_rows(rows: &mut [EntityRow], order: &OrderSpec) {
    rows.sort_by(|a, b| {
        let ord = match (a.get(&order.field), b.get(&order.field)) {
            (Some(va), Some(vb)) => {
                FilterEvaluator::compare_values(va, vb).unwrap_or(std::cmp::Ordering::Equal)
            }
            _ => std::cmp::Ordering::Equal,
        };
        match order.direction {
            OrderDirection::Asc => ord,
            OrderDirection::Desc => ord.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(id: i64, count: i64) -> EntityRow {
        EntityRow::new(
            id,
            vec![
                ("id".into(), Value::Int64(id)),
                ("books_count".into(), Value::Int64(count)),
            ],
        )
    }

    #[test]
    fn test_sort_desc_stable_ties() {
        let mut rows = vec![author(1, 3), author(2, 5), author(3, 3), author(4, 7)];
        sort_rows(&mut rows, &OrderSpec::desc("books_count"));
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        // Authors 1 and 3 tie on count; input order preserved.
        assert_eq!(ids, vec![4, 2, 1, 3]);
    }

    #[test]
    fn test_sort_asc() {
        let mut rows = vec![author(1, 3), author(2, 1)];
        sort_rows(&mut rows, &OrderSpec::asc("books_count"));
        assert_eq!(rows[0].id, 2);
    }

    #[test]
    fn test_flat_row_require() {
        let row = FlatRow::new(vec![("Author_id".into(), Value::Int64(9))]);
        assert!(row.require("Author_id", "join row 0").is_ok());
        let err = row.require("Books_id", "join row 0").unwrap_err();
        assert!(matches!(err, Error::MappingFailure { column, .. } if column == "Books_id"));
    }
}

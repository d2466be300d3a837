//! Filter evaluation for query execution.
//!
//! This module provides the `FilterEvaluator` that evaluates plan
//! predicates against entity field values, including the derived-field
//! transforms used by nested post-filters.

use std::cmp::Ordering;

use chrono::Datelike;
use folio_plan::{CompareOp, DerivedField, EqFilter, NestedFilter, Transform, Value};

use crate::source::EntityRow;

/// Evaluates plan predicates against entity rows.
pub struct FilterEvaluator;

impl FilterEvaluator {
    /// Evaluate ANDed equality filters against a row.
    ///
    /// Returns `true` only if every filter field is present and equal to
    /// the filter value. A missing field never matches.
    pub fn matches_all(filters: &[EqFilter], row: &EntityRow) -> bool {
        filters.iter().all(|f| {
            row.get(&f.field)
                .is_some_and(|v| Self::values_equal(v, &f.value))
        })
    }

    /// Evaluate a nested post-filter against a child row.
    ///
    /// The derived value is computed first; a missing field, a transform
    /// that does not apply, or incomparable types all evaluate to `false`.
    pub fn matches_nested(filter: &NestedFilter, row: &EntityRow) -> bool {
        let Some(derived) = Self::derived_value(&filter.derived, row) else {
            return false;
        };
        match filter.op {
            CompareOp::Eq => Self::values_equal(&derived, &filter.value),
            CompareOp::Ne => !Self::values_equal(&derived, &filter.value),
            CompareOp::Lt => Self::ordered(&derived, &filter.value, Ordering::is_lt),
            CompareOp::Le => Self::ordered(&derived, &filter.value, Ordering::is_le),
            CompareOp::Gt => Self::ordered(&derived, &filter.value, Ordering::is_gt),
            CompareOp::Ge => Self::ordered(&derived, &filter.value, Ordering::is_ge),
        }
    }

    /// Compute a derived field value from a row.
    pub fn derived_value(derived: &DerivedField, row: &EntityRow) -> Option<Value> {
        let stored = row.get(&derived.field)?;
        match derived.transform {
            Transform::Identity => Some(stored.clone()),
            Transform::YearOf => Self::year_of(stored).map(Value::Int32),
        }
    }

    /// Extract the calendar year from a date or timestamp value.
    pub fn year_of(value: &Value) -> Option<i32> {
        match value {
            Value::Date(d) => Some(d.year()),
            Value::Timestamp(micros) => {
                chrono::DateTime::from_timestamp_micros(*micros).map(|dt| dt.year())
            }
            _ => None,
        }
    }

    /// Check if two values are equal, coercing Int32/Int64.
    pub fn values_equal(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Int32(a), Value::Int64(b)) => i64::from(*a) == *b,
            (Value::Int64(a), Value::Int32(b)) => *a == i64::from(*b),
            (Value::Float64(a), Value::Float64(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            _ => false,
        }
    }

    /// Compare two values, returning their ordering if comparable.
    pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
        match (a, b) {
            (Value::Int32(a), Value::Int32(b)) => Some(a.cmp(b)),
            (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
            (Value::Int32(a), Value::Int64(b)) => Some(i64::from(*a).cmp(b)),
            (Value::Int64(a), Value::Int32(b)) => Some(a.cmp(&i64::from(*b))),
            (Value::Float64(a), Value::Float64(b)) => a.partial_cmp(b),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            _ => None, // Incompatible types
        }
    }

    fn ordered<F>(a: &Value, b: &Value, check: F) -> bool
    where
        F: FnOnce(Ordering) -> bool,
    {
        Self::compare_values(a, b).map(check).unwrap_or(false)
    }
}

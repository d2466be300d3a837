//! In-memory reference implementation of `RelationalSource`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use folio_plan::{EqFilter, OrderSpec, Value};
use tracing::debug;

use crate::catalog::{EntityDef, RelationDef};
use crate::error::Error;
use crate::filter::FilterEvaluator;

use super::join::{JoinKind, JoinQuery};
use super::rows::{EntityRow, FlatRow, sort_rows};
use super::RelationalSource;

/// An in-memory relational source backed by per-entity row tables.
///
/// Honors filter/order/limit pushdown with a stable sort, expands join
/// queries the way a SQL engine would, and tracks open sessions so tests
/// can assert release on every exit path. `fail_on` injects a transport
/// failure for a given entity.
#[derive(Debug, Default)]
pub struct MemorySource {
    tables: HashMap<String, Vec<EntityRow>>,
    fail_entity: Option<String>,
    open_sessions: Arc<AtomicUsize>,
}

/// Guard for one source session; releases on drop.
struct Session {
    counter: Arc<AtomicUsize>,
}

impl Drop for Session {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row into an entity table, preserving insertion order.
    pub fn insert(&mut self, entity: impl Into<String>, row: EntityRow) {
        self.tables.entry(entity.into()).or_default().push(row);
    }

    /// Builder form of [`insert`](Self::insert) for whole tables.
    pub fn with_rows(mut self, entity: impl Into<String>, rows: Vec<EntityRow>) -> Self {
        self.tables.entry(entity.into()).or_default().extend(rows);
        self
    }

    /// Inject a transport failure for fetches touching the given entity.
    pub fn fail_on(mut self, entity: impl Into<String>) -> Self {
        self.fail_entity = Some(entity.into());
        self
    }

    /// Number of sessions currently open. Zero unless a fetch is running.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    fn session(&self) -> Session {
        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        Session {
            counter: Arc::clone(&self.open_sessions),
        }
    }

    fn table(&self, entity: &str) -> Result<&[EntityRow], Error> {
        if self.fail_entity.as_deref() == Some(entity) {
            return Err(Error::SourceUnavailable(format!(
                "connection reset fetching '{entity}'"
            )));
        }
        Ok(self
            .tables
            .get(entity)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    fn prefixed_columns(row: &EntityRow, prefix: &str, def: &EntityDef) -> Vec<(String, Value)> {
        def.fields
            .iter()
            .map(|f| {
                let value = row.get(&f.name).cloned().unwrap_or(Value::Null);
                (format!("{}_{}", prefix, f.name), value)
            })
            .collect()
    }

    fn null_columns(prefix: &str, def: &EntityDef) -> Vec<(String, Value)> {
        def.fields
            .iter()
            .map(|f| (format!("{}_{}", prefix, f.name), Value::Null))
            .collect()
    }
}

/// A partially expanded join row: accumulated columns plus the entity row
/// bound at each prefix, so later joins can read parent-side key fields.
struct Partial {
    columns: Vec<(String, Value)>,
    bound: HashMap<String, EntityRow>,
}

impl RelationalSource for MemorySource {
    fn fetch_roots(
        &self,
        entity: &str,
        filters: &[EqFilter],
        order: Option<&OrderSpec>,
        limit: Option<usize>,
    ) -> Result<Vec<EntityRow>, Error> {
        let _session = self.session();
        let mut rows: Vec<EntityRow> = self
            .table(entity)?
            .iter()
            .filter(|row| FilterEvaluator::matches_all(filters, row))
            .cloned()
            .collect();
        if let Some(order) = order {
            sort_rows(&mut rows, order);
        }
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        debug!(entity, rows = rows.len(), "fetched root rows");
        Ok(rows)
    }

    fn fetch_related(
        &self,
        relation: &RelationDef,
        parents: &[EntityRow],
    ) -> Result<Vec<(i64, EntityRow)>, Error> {
        let _session = self.session();
        let targets = self.table(&relation.to_entity)?;

        // Build phase: index target rows by their join-field value.
        let mut by_key: HashMap<i64, Vec<&EntityRow>> = HashMap::new();
        for row in targets {
            // Rows whose join field is not key-typed cannot participate.
            let Some(key) = row.get(&relation.to_field).and_then(Value::as_i64) else {
                continue;
            };
            by_key.entry(key).or_default().push(row);
        }

        // Probe phase: look up each parent's key-side value.
        let mut out = Vec::new();
        for parent in parents {
            let Some(key) = parent.get(&relation.from_field).and_then(Value::as_i64) else {
                continue;
            };
            let Some(matches) = by_key.get(&key) else {
                continue;
            };
            if relation.is_to_many() {
                out.extend(matches.iter().map(|&m| (parent.id, m.clone())));
            } else if let Some(&first) = matches.first() {
                out.push((parent.id, first.clone()));
            }
        }
        debug!(
            relation = %relation.name,
            parents = parents.len(),
            rows = out.len(),
            "fetched related rows"
        );
        Ok(out)
    }

    fn execute_join(&self, query: &JoinQuery) -> Result<Vec<FlatRow>, Error> {
        let _session = self.session();
        let mut roots: Vec<EntityRow> = self
            .table(&query.root.name)?
            .iter()
            .filter(|row| FilterEvaluator::matches_all(&query.filters, row))
            .cloned()
            .collect();
        if let Some(order) = &query.order {
            sort_rows(&mut roots, order);
        }

        let mut out = Vec::new();
        for root in roots {
            let mut partials = vec![Partial {
                columns: Self::prefixed_columns(&root, &query.root_prefix, &query.root),
                bound: HashMap::from([(query.root_prefix.clone(), root)]),
            }];

            for join in &query.joins {
                let targets = self.table(&join.target.name)?;
                let mut next = Vec::new();
                for partial in partials {
                    let key = partial
                        .bound
                        .get(&join.parent_prefix)
                        .and_then(|parent| parent.get(&join.relation.from_field))
                        .and_then(Value::as_i64);
                    let matches: Vec<&EntityRow> = match key {
                        Some(key) => targets
                            .iter()
                            .filter(|t| {
                                t.get(&join.relation.to_field).and_then(Value::as_i64)
                                    == Some(key)
                            })
                            .collect(),
                        // Parent side absent (null from an earlier left join).
                        None => vec![],
                    };

                    if matches.is_empty() {
                        match join.kind {
                            JoinKind::Inner => {} // root combination dropped
                            JoinKind::Left => {
                                let mut columns = partial.columns.clone();
                                columns.extend(Self::null_columns(&join.prefix, &join.target));
                                next.push(Partial {
                                    columns,
                                    bound: partial.bound.clone(),
                                });
                            }
                        }
                        continue;
                    }

                    let take = if join.relation.is_to_many() {
                        matches.len()
                    } else {
                        1
                    };
                    for target in matches.into_iter().take(take) {
                        let mut columns = partial.columns.clone();
                        columns.extend(Self::prefixed_columns(target, &join.prefix, &join.target));
                        let mut bound = partial.bound.clone();
                        bound.insert(join.prefix.clone(), target.clone());
                        next.push(Partial { columns, bound });
                    }
                }
                partials = next;
            }

            out.extend(partials.into_iter().map(|p| FlatRow::new(p.columns)));
        }
        debug!(root = %query.root.name, rows = out.len(), "executed flattened join");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::library_catalog;
    use folio_plan::{NestedSelect, PlanDescriptor};

    fn author(id: i64, user_id: i64, country: &str, count: i64) -> EntityRow {
        EntityRow::new(
            id,
            vec![
                ("id".into(), Value::Int64(id)),
                ("user_id".into(), Value::Int64(user_id)),
                ("age".into(), Value::Int32(27)),
                ("country".into(), Value::from(country)),
                ("nick_name".into(), Value::from(format!("nick{id}"))),
                ("books_count".into(), Value::Int64(count)),
            ],
        )
    }

    fn user(id: i64) -> EntityRow {
        EntityRow::new(
            id,
            vec![
                ("id".into(), Value::Int64(id)),
                ("first_name".into(), Value::from(format!("First{id}"))),
                ("last_name".into(), Value::from(format!("Last{id}"))),
                ("user_name".into(), Value::from(format!("user{id}"))),
                ("email".into(), Value::from(format!("u{id}@example.com"))),
                ("created".into(), Value::Timestamp(0)),
                ("email_confirmed".into(), Value::Bool(true)),
                ("last_activity".into(), Value::Timestamp(0)),
            ],
        )
    }

    fn book(id: i64, author_id: i64, publisher_id: i64) -> EntityRow {
        EntityRow::new(
            id,
            vec![
                ("id".into(), Value::Int64(id)),
                ("author_id".into(), Value::Int64(author_id)),
                ("name".into(), Value::from(format!("Book {id}"))),
                ("isbn".into(), Value::from(format!("isbn-{id}"))),
                (
                    "published".into(),
                    Value::Date(chrono::NaiveDate::from_ymd_opt(1890, 1, 1).unwrap()),
                ),
                ("publisher_id".into(), Value::Int64(publisher_id)),
            ],
        )
    }

    fn publisher(id: i64) -> EntityRow {
        EntityRow::new(
            id,
            vec![
                ("id".into(), Value::Int64(id)),
                ("name".into(), Value::from(format!("Press {id}"))),
                (
                    "established".into(),
                    Value::Date(chrono::NaiveDate::from_ymd_opt(1800, 1, 1).unwrap()),
                ),
            ],
        )
    }

    fn seeded_source() -> MemorySource {
        MemorySource::new()
            .with_rows(
                "Author",
                vec![
                    author(1, 11, "Serbia", 2),
                    author(2, 12, "France", 9),
                    author(3, 13, "Serbia", 5),
                ],
            )
            .with_rows("User", vec![user(11), user(12), user(13)])
            .with_rows(
                "Book",
                vec![book(100, 1, 500), book(101, 1, 500), book(102, 3, 501)],
            )
            .with_rows("Publisher", vec![publisher(500), publisher(501)])
    }

    #[test]
    fn test_fetch_roots_pushdown() {
        let source = seeded_source();
        let filters = vec![EqFilter::new("country", "Serbia")];
        let rows = source
            .fetch_roots("Author", &filters, Some(&OrderSpec::desc("books_count")), Some(1))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 3);
        assert_eq!(source.open_sessions(), 0);
    }

    #[test]
    fn test_fetch_roots_unfiltered_scan() {
        let source = seeded_source();
        let rows = source.fetch_roots("Author", &[], None, None).unwrap();
        assert_eq!(rows.len(), 3);
        // Source order preserved when no ordering is requested.
        assert_eq!(rows[0].id, 1);
    }

    #[test]
    fn test_fetch_related_to_many() {
        let source = seeded_source();
        let catalog = library_catalog();
        let relation = catalog.relation("Author", "books").unwrap();
        let parents = source.fetch_roots("Author", &[], None, None).unwrap();
        let related = source.fetch_related(relation, &parents).unwrap();
        assert_eq!(related.len(), 3);
        assert_eq!(related[0].0, 1);
        assert_eq!(related[2], (3, book(102, 3, 501)));
    }

    #[test]
    fn test_fetch_related_to_one_keys_on_parent() {
        let source = seeded_source();
        let catalog = library_catalog();
        let relation = catalog.relation("Author", "user").unwrap();
        let parents = source.fetch_roots("Author", &[], None, None).unwrap();
        let related = source.fetch_related(relation, &parents).unwrap();
        assert_eq!(related.len(), 3);
        assert_eq!(related[0].0, 1);
        assert_eq!(related[0].1.id, 11);
    }

    #[test]
    fn test_execute_join_expands_and_orders() {
        let source = seeded_source();
        let catalog = library_catalog();
        let plan = PlanDescriptor::new("Author")
            .filter_eq("country", "Serbia")
            .order_desc("books_count")
            .take(10)
            .nested(NestedSelect::new("books"));
        let query = JoinQuery::for_plan(&catalog, &plan).unwrap();
        let rows = source.execute_join(&query).unwrap();

        // Author 3 (count 5) first with one book, then author 1 with two.
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("Author_id"), Some(&Value::Int64(3)));
        assert_eq!(rows[0].get("Books_id"), Some(&Value::Int64(102)));
        assert_eq!(
            rows[0].get("Books_Publisher_name"),
            Some(&Value::from("Press 501"))
        );
        assert_eq!(rows[1].get("Author_id"), Some(&Value::Int64(1)));
        assert_eq!(rows[2].get("Author_id"), Some(&Value::Int64(1)));
        assert_eq!(rows[1].get("User_email"), Some(&Value::from("u11@example.com")));
    }

    #[test]
    fn test_execute_join_left_keeps_bookless_author() {
        let mut source = seeded_source();
        source.insert("Author", author(4, 13, "Serbia", 0));
        let catalog = library_catalog();
        let plan = PlanDescriptor::new("Author")
            .filter_eq("country", "Serbia")
            .order_desc("books_count")
            .nested(NestedSelect::new("books"));
        let query = JoinQuery::for_plan(&catalog, &plan).unwrap();
        let rows = source.execute_join(&query).unwrap();

        let bookless: Vec<&FlatRow> = rows
            .iter()
            .filter(|r| r.get("Author_id") == Some(&Value::Int64(4)))
            .collect();
        assert_eq!(bookless.len(), 1);
        assert_eq!(bookless[0].get("Books_id"), Some(&Value::Null));
        assert_eq!(bookless[0].get("Books_Publisher_id"), Some(&Value::Null));
        // The inner user join still resolved.
        assert_eq!(bookless[0].get("User_id"), Some(&Value::Int64(13)));
    }

    #[test]
    fn test_failure_injection_releases_session() {
        let source = seeded_source().fail_on("Book");
        let catalog = library_catalog();
        let relation = catalog.relation("Author", "books").unwrap();
        let parents = source.fetch_roots("Author", &[], None, None).unwrap();
        let err = source.fetch_related(relation, &parents).unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(_)));
        assert_eq!(source.open_sessions(), 0);
    }
}

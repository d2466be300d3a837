//! Benchmark harness helpers.

use folio_core::{Catalog, MemorySource, library_catalog};
use folio_plan::{CompareOp, NestedFilter, NestedSelect, PlanDescriptor};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::fixtures::{Scale, generate_library};

/// Install a tracing subscriber honoring `RUST_LOG`. Safe to call more
/// than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// A populated source and catalog for one benchmark run.
pub struct TestContext {
    pub source: MemorySource,
    pub catalog: Catalog,
}

impl TestContext {
    /// Build a context populated at the given scale.
    pub fn with_scale(scale: Scale) -> Self {
        let lib = generate_library(scale);
        debug!(
            ?scale,
            authors = lib.authors.len(),
            books = lib.books.len(),
            "generated benchmark library"
        );
        let source = MemorySource::new()
            .with_rows("User", lib.users)
            .with_rows("Author", lib.authors)
            .with_rows("Book", lib.books)
            .with_rows("Publisher", lib.publishers);
        Self {
            source,
            catalog: library_catalog(),
        }
    }
}

/// The canonical benchmark plan: top-2 Serbian authors aged 27 by cached
/// book count, with their pre-1900 books.
pub fn canonical_plan() -> PlanDescriptor {
    PlanDescriptor::new("Author")
        .filter_eq("country", "Serbia")
        .filter_eq("age", 27)
        .order_desc("books_count")
        .take(2)
        .nested(
            NestedSelect::new("books")
                .with_filter(NestedFilter::year_of("published", CompareOp::Lt, 1900)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{Strategy, equivalent};

    #[test]
    fn test_strategies_agree_on_generated_data() {
        let ctx = TestContext::with_scale(Scale::Tiny);
        let plan = canonical_plan();
        let eager = Strategy::Eager
            .materialize(&ctx.source, &ctx.catalog, &plan)
            .unwrap();
        let pushdown = Strategy::Pushdown
            .materialize(&ctx.source, &ctx.catalog, &plan)
            .unwrap();
        let flattened = Strategy::FlattenedJoin
            .materialize(&ctx.source, &ctx.catalog, &plan)
            .unwrap();
        assert!(equivalent(&eager, &pushdown));
        assert!(equivalent(&pushdown, &flattened));
        assert_eq!(eager.len(), 2);
    }
}

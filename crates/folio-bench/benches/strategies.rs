//! Strategy comparison benchmarks.
//!
//! The canonical query returns at most two authors at every scale, so the
//! gap between strategies is pure overhead: rows transferred and objects
//! materialized that the result does not need.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use folio_bench::fixtures::Scale;
use folio_bench::harness::{TestContext, canonical_plan, init_tracing};
use folio_core::plan::PlanDescriptor;
use folio_core::{Strategy, equivalent};

const STRATEGIES: [Strategy; 3] = [Strategy::Eager, Strategy::Pushdown, Strategy::FlattenedJoin];

fn bench_canonical_query(c: &mut Criterion) {
    init_tracing();
    let mut group = c.benchmark_group("materialize/canonical");

    for &scale in &[Scale::Small, Scale::Medium] {
        let ctx = TestContext::with_scale(scale);
        let plan = canonical_plan();

        // Oracle check outside the timed loop: a strategy that got faster
        // by diverging measures nothing.
        let baseline = Strategy::Eager
            .materialize(&ctx.source, &ctx.catalog, &plan)
            .unwrap();
        for strategy in &STRATEGIES[1..] {
            let out = strategy
                .materialize(&ctx.source, &ctx.catalog, &plan)
                .unwrap();
            assert!(equivalent(&baseline, &out), "{strategy:?} diverged");
        }

        for strategy in STRATEGIES {
            let id = BenchmarkId::new(format!("{strategy:?}"), format!("{scale:?}"));
            group.bench_with_input(id, &(), |b, _| {
                b.iter(|| {
                    black_box(
                        strategy
                            .materialize(&ctx.source, &ctx.catalog, &plan)
                            .unwrap(),
                    );
                });
            });
        }
    }

    group.finish();
}

fn bench_unfiltered_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("materialize/scan");

    let ctx = TestContext::with_scale(Scale::Small);
    // No filters or limit: pushdown loses its selectivity advantage and
    // the strategies converge on transfer volume.
    let plan = PlanDescriptor::new("Author").order_desc("books_count");

    for strategy in STRATEGIES {
        group.bench_function(format!("{strategy:?}"), |b| {
            b.iter(|| {
                black_box(
                    strategy
                        .materialize(&ctx.source, &ctx.catalog, &plan)
                        .unwrap(),
                );
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_canonical_query, bench_unfiltered_scan);
criterion_main!(benches);

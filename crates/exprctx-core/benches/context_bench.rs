//! # Expression Context Benchmarks
//!
//! Cold resolution versus cached reads against the in-memory terminology.
//!
//! Run with: `cargo bench -p exprctx-core`

use chrono::{DateTime, Duration, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use exprctx_core::memory::{ContentVersion, MemoryTerminology};
use exprctx_core::primitives::IS_A;
use exprctx_core::{
    Branch, BranchPath, CharacteristicType, Collaborators, Concept, ConceptId, ExpressionContext,
    Mrcm, Relationship,
};
use std::hint::black_box;
use std::sync::Arc;

/// MAIN holds an `|Is a|` chain of `size` concepts; MAIN/PROJECT is based on it.
fn create_chain_store(size: u64) -> Arc<MemoryTerminology> {
    let epoch = DateTime::<Utc>::UNIX_EPOCH;
    let main = BranchPath::new("MAIN").expect("path");
    let project = BranchPath::new("MAIN/PROJECT").expect("path");

    let mut store = MemoryTerminology::new();
    store
        .create_branch(Branch {
            path: main.clone(),
            creation: epoch,
            base: epoch,
            head: epoch,
        })
        .expect("branch");

    let mut version = ContentVersion::new(epoch).with_mrcm(Mrcm::default());
    for id in 1..=size {
        let mut concept = Concept::new(ConceptId(id));
        if id > 1 {
            concept.relationships.push(Relationship {
                id,
                source_id: ConceptId(id),
                type_id: ConceptId(IS_A),
                destination_id: ConceptId(id - 1),
                relationship_group: 0,
                characteristic_type: CharacteristicType::Inferred,
                active: true,
            });
        }
        version = version.with_concept(concept);
    }
    store.commit(&main, version).expect("commit");

    let branched = epoch + Duration::days(1);
    store
        .create_branch(Branch {
            path: project,
            creation: branched,
            base: branched,
            head: branched,
        })
        .expect("branch");
    Arc::new(store)
}

fn new_context(store: &Arc<MemoryTerminology>) -> ExpressionContext {
    ExpressionContext::builder(
        BranchPath::new("MAIN/PROJECT").expect("path"),
        Collaborators::from_shared(Arc::clone(store)),
    )
    .use_dependant_release_branch_for_mrcm(true)
    .build()
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_cold_focus_ancestors(c: &mut Criterion) {
    let mut group = c.benchmark_group("cold_focus_ancestors");

    for size in [10u64, 100, 1000].iter() {
        let store = create_chain_store(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut ctx = new_context(&store);
                ctx.set_focus_concept_id(ConceptId(size));
                black_box(ctx.ancestors_and_self_of_focus_concept().expect("ancestors"))
            });
        });
    }

    group.finish();
}

fn bench_cached_reads(c: &mut Criterion) {
    let store = create_chain_store(1000);
    let mut ctx = new_context(&store);
    ctx.set_focus_concept_id(ConceptId(1000));
    let _ = ctx.ancestors_and_self_of_focus_concept().expect("warm");
    let _ = ctx.mrcm_ungrouped_attributes().expect("warm");

    c.bench_function("cached_reads", |b| {
        b.iter(|| {
            black_box(ctx.mrcm_branch_criteria().expect("criteria"));
            black_box(ctx.mrcm_ungrouped_attributes().expect("ungrouped"));
            black_box(ctx.ancestors_and_self_of_focus_concept().expect("ancestors"))
        });
    });
}

criterion_group!(benches, bench_cold_focus_ancestors, bench_cached_reads);
criterion_main!(benches);

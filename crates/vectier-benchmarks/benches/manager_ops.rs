//! Compression manager operation benchmarks
//!
//! Store/retrieve latency per tier, transition cost, and the heat
//! maintenance pass over a populated manager.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vectier_benchmarks::{generate_random_vectors, trained_manager, DEFAULT_DIMENSION};
use vectier_core::Tier;

fn bench_store(c: &mut Criterion) {
    let mut manager = trained_manager();
    let vectors = generate_random_vectors(1000, DEFAULT_DIMENSION);
    let mut next = 0usize;

    c.bench_function("manager_store", |bencher| {
        bencher.iter(|| {
            let i = next % vectors.len();
            next += 1;
            manager.store(format!("doc-{}", i), black_box(&vectors[i]))
        });
    });
}

fn bench_retrieve_by_tier(c: &mut Criterion) {
    let mut group = c.benchmark_group("manager_retrieve");
    let mut manager = trained_manager();
    let vector = generate_random_vectors(1, DEFAULT_DIMENSION).remove(0);

    for tier in Tier::ALL {
        let id = format!("doc-{}", tier);
        manager.store(id.as_str(), &vector).expect("store");
        if tier != Tier::Hot {
            manager.transition_tier(&id, tier).expect("transition");
        }
    }

    for tier in Tier::ALL {
        let id = format!("doc-{}", tier);
        group.bench_function(BenchmarkId::from_parameter(tier), |bencher| {
            bencher.iter(|| manager.retrieve(black_box(&id)));
        });
    }

    group.finish();
}

fn bench_transition(c: &mut Criterion) {
    let mut group = c.benchmark_group("manager_transition");
    let vector = generate_random_vectors(1, DEFAULT_DIMENSION).remove(0);

    for target in [Tier::Warm, Tier::Cool, Tier::Cold, Tier::Frozen] {
        let mut manager = trained_manager();
        // Re-store each round so the vector starts hot again
        group.bench_function(BenchmarkId::new("store_then_transition", target), |bencher| {
            bencher.iter(|| {
                manager.store("doc", black_box(&vector))?;
                manager.transition_tier("doc", target)
            });
        });
    }

    group.finish();
}

fn bench_heat_maintenance(c: &mut Criterion) {
    let mut manager = trained_manager();
    for (i, vector) in generate_random_vectors(5000, DEFAULT_DIMENSION)
        .iter()
        .enumerate()
    {
        manager.store(format!("doc-{}", i), vector).expect("store");
    }

    c.bench_function("decay_and_check_5000", |bencher| {
        bencher.iter(|| {
            manager.decay_heat_scores().expect("decay");
            manager.check_transitions()
        });
    });
}

criterion_group!(
    benches,
    bench_store,
    bench_retrieve_by_tier,
    bench_transition,
    bench_heat_maintenance
);
criterion_main!(benches);

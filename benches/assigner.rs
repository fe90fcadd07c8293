//! Assignment hot-path benchmarks
//!
//! The pick sits on every cold request, so it must stay a handful of
//! nanoseconds: one mutex acquisition, one index, one modular increment.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use survey_rotor::experiment::{Experiment, ExperimentRegistry, VariantAssigner};

fn registry_with_variants(n: usize) -> ExperimentRegistry {
    let variants = (0..n).map(|i| format!("variant-{i}")).collect();
    ExperimentRegistry::new(vec![
        Experiment::new("bench", "benchAssignment", variants).unwrap()
    ])
    .unwrap()
}

fn bench_pick_next(c: &mut Criterion) {
    let mut group = c.benchmark_group("pick_next");

    for n in [2usize, 8, 32] {
        let registry = registry_with_variants(n);
        let assigner = VariantAssigner::new(&registry);
        let experiment = registry.get("bench").unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(assigner.pick_next(black_box(experiment)).unwrap()));
        });
    }

    group.finish();
}

fn bench_builtin_registry_pick(c: &mut Criterion) {
    let registry = ExperimentRegistry::builtin().unwrap();
    let assigner = VariantAssigner::new(&registry);
    let experiment = registry.get("feedback").unwrap();

    c.bench_function("builtin_feedback_pick", |b| {
        b.iter(|| black_box(assigner.pick_next(black_box(experiment)).unwrap()));
    });
}

criterion_group!(benches, bench_pick_next, bench_builtin_registry_pick);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use virus_sandbox::catalog::{Gene, GeneDatabase, BASE_ENTITY_NAME};
use virus_sandbox::genome::compile;
use virus_sandbox::simulation::{run_batch, Engine};

fn sample_engine(count: u64) -> Engine {
    let db = GeneDatabase::with_sample();
    let genes: Vec<Gene> = db.genes().cloned().collect();
    let blueprint = compile(BASE_ENTITY_NAME, count, &genes, Some(&db)).expect("sample catalog compiles");
    Engine::new(&blueprint, Some(&db)).with_seed(42)
}

/// One turn of the sample virus from a fresh start.
fn bench_advance_turn(c: &mut Criterion) {
    let engine = sample_engine(10);

    c.bench_function("advance_turn_sample", |b| {
        b.iter_batched(
            || engine.clone(),
            |mut engine| black_box(engine.advance_turn()),
            BatchSize::SmallInput,
        )
    });
}

/// One turn with a large starting population, dominated by per-unit draws.
fn bench_advance_turn_large(c: &mut Criterion) {
    let engine = sample_engine(5_000);

    c.bench_function("advance_turn_5000", |b| {
        b.iter_batched(
            || engine.clone(),
            |mut engine| black_box(engine.advance_turn()),
            BatchSize::SmallInput,
        )
    });
}

/// A parallel batch of short runs.
fn bench_batch(c: &mut Criterion) {
    let engine = sample_engine(10);
    let seeds: Vec<u64> = (0..32).collect();

    c.bench_function("run_batch_32x50", |b| {
        b.iter(|| black_box(run_batch(&engine, &seeds, 50)))
    });
}

criterion_group!(
    benches,
    bench_advance_turn,
    bench_advance_turn_large,
    bench_batch
);
criterion_main!(benches);

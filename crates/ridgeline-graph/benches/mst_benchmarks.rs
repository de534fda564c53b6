use criterion::{Criterion, black_box, criterion_group, criterion_main};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use ridgeline_graph::*;

fn points(n: usize) -> Vec<Vec3> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    (0..n)
        .map(|_| {
            Vec3::new(
                rng.random_range(0.0..1000.0),
                rng.random_range(0.0..1000.0),
                rng.random_range(0.0..0.2),
            )
        })
        .collect()
}

fn bench_heap_insert_extract(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let keys: Vec<u64> = (0..10_000).map(|_| rng.random_range(0..1_000_000)).collect();
    c.bench_function("heap_insert_extract_10k", |bencher| {
        bencher.iter(|| {
            let mut heap = FibonacciHeap::with_capacity(keys.len());
            for (i, &k) in keys.iter().enumerate() {
                heap.insert(i, k);
            }
            while let Some(v) = heap.extract_min() {
                black_box(v);
            }
        })
    });
}

fn bench_heap_decrease_key(c: &mut Criterion) {
    c.bench_function("heap_decrease_key_10k", |bencher| {
        bencher.iter(|| {
            let mut heap = FibonacciHeap::with_capacity(10_000);
            let refs: Vec<EntryRef> = (0..10_000u64).map(|i| heap.insert(i, u64::MAX)).collect();
            heap.extract_min();
            for (i, r) in refs.iter().enumerate().skip(1) {
                heap.change_key(*r, 10_000 - i as u64);
            }
            black_box(heap.min_key())
        })
    });
}

fn bench_complete_graph(c: &mut Criterion) {
    let pts = points(300);
    c.bench_function("complete_graph_300", |bencher| {
        bencher.iter(|| black_box(Graph::from_points(black_box(&pts))))
    });
}

fn bench_mst(c: &mut Criterion) {
    let graph = Graph::from_points(&points(300));
    c.bench_function("mst_300", |bencher| {
        bencher.iter(|| black_box(minimum_spanning_forest(black_box(&graph))))
    });
}

criterion_group!(
    benches,
    bench_heap_insert_extract,
    bench_heap_decrease_key,
    bench_complete_graph,
    bench_mst,
);
criterion_main!(benches);

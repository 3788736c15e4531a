//! LRU cache benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use tabula_core::LruCache;

/// Benchmark set with eviction at several capacities.
fn bench_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("lru_set");

    for capacity in [100, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(capacity), capacity, |b, &capacity| {
            let mut cache = LruCache::new(capacity);
            let mut key = 0usize;
            b.iter(|| {
                key += 1;
                black_box(cache.set(key, key));
            });
        });
    }
    group.finish();
}

/// Benchmark get with a skewed key distribution.
fn bench_get(c: &mut Criterion) {
    let mut cache = LruCache::new(1_000);
    for key in 0..1_000usize {
        cache.set(key, key);
    }
    let mut rng = rand::thread_rng();

    c.bench_function("lru_get", |b| {
        b.iter(|| {
            let key = rng.gen_range(0..2_000usize);
            black_box(cache.get(&key));
        });
    });
}

criterion_group!(benches, bench_set, bench_get);
criterion_main!(benches);

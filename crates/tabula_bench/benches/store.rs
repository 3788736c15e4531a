//! Record store benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tabula_bench::utils::{build_store, random_records};
use tabula_core::{sort::OrderBy, SetOptions, StoreConfig, Where};
use tabula_value::fields;
use tokio::runtime::Runtime;

/// Benchmark select through the index fast path against a full scan.
fn bench_select(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("select");

    for size in [1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        let records = random_records(*size, 20);
        let indexed = build_store(
            &rt,
            StoreConfig::new().index(["city"]).use_workers(false),
            records.clone(),
        );
        let scanned = build_store(&rt, StoreConfig::new().use_workers(false), records);
        let query = Where::new().eq("city", "city-7");

        group.bench_with_input(BenchmarkId::new("index", size), size, |b, _| {
            b.iter(|| rt.block_on(indexed.select(black_box(&query))).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("scan", size), size, |b, _| {
            b.iter(|| rt.block_on(scanned.select(black_box(&query))).unwrap());
        });
    }
    group.finish();
}

/// Benchmark multi-key sorting, inline and on the worker pool.
fn bench_sort(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("sort");
    let order = OrderBy::parse("city, age desc").unwrap();

    for size in [1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        let records = random_records(*size, 20);
        let inline = build_store(&rt, StoreConfig::new().use_workers(false), records.clone());
        let pooled = build_store(&rt, StoreConfig::new(), records);

        group.bench_with_input(BenchmarkId::new("inline", size), size, |b, _| {
            b.iter(|| rt.block_on(inline.sort(black_box(&order), true, None)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("worker", size), size, |b, _| {
            b.iter(|| rt.block_on(pooled.sort(black_box(&order), true, None)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("view", size), size, |b, _| {
            b.iter(|| rt.block_on(inline.sort(black_box(&order), false, None)).unwrap());
        });
    }
    group.finish();
}

/// Benchmark single record updates on an indexed store.
fn bench_set(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let store = build_store(
        &rt,
        StoreConfig::new().index(["age"]).index(["city", "age"]).use_workers(false),
        random_records(10_000, 20),
    );
    let mut next = 0usize;

    c.bench_function("set_update", |b| {
        b.iter(|| {
            next = (next + 1) % 10_000;
            let key = next.to_string();
            let data = fields([("age", (next % 60) as i64)]);
            rt.block_on(store.set(Some(&key), black_box(data), SetOptions::new()))
                .unwrap();
        });
    });
}

criterion_group!(benches, bench_select, bench_sort, bench_set);
criterion_main!(benches);

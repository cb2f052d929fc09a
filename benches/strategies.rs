//! Single-threaded add/check cost of each variant.
//!
//! All four variants set identical bits, so the differences measured here are the
//! price of their synchronization with no contention.

use bloomsync::builder::BloomFilterBuilder;
use bloomsync::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ITEMS: usize = 10_000;

fn random_strings(count: usize, len: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(len)
                .map(char::from)
                .collect()
        })
        .collect()
}

fn builder() -> BloomFilterBuilder {
    BloomFilterBuilder::new()
        .id("bench")
        .expected_items(ITEMS)
        .false_positive_rate(0.01)
}

fn bench_add(c: &mut Criterion) {
    let data = random_strings(ITEMS, 24, 1);
    let mut group = c.benchmark_group("add");
    group.throughput(Throughput::Elements(ITEMS as u64));

    group.bench_function("exclusive", |b| {
        let mut filter = builder().build_exclusive().unwrap();
        b.iter(|| {
            for v in &data {
                filter.add(black_box(v.as_str()));
            }
        });
    });
    group.bench_function("global_lock", |b| {
        let filter = builder().build_global_lock().unwrap();
        b.iter(|| {
            for v in &data {
                filter.add(black_box(v.as_str()));
            }
        });
    });
    group.bench_function("lock_free", |b| {
        let filter = builder().build_lock_free().unwrap();
        b.iter(|| {
            for v in &data {
                filter.add(black_box(v.as_str()));
            }
        });
    });
    for shards in [8, 64, 512] {
        group.bench_with_input(BenchmarkId::new("sharded", shards), &shards, |b, &shards| {
            let filter = builder().num_shards(shards).build_sharded().unwrap();
            b.iter(|| {
                for v in &data {
                    filter.add(black_box(v.as_str()));
                }
            });
        });
    }

    group.finish();
}

fn bench_check(c: &mut Criterion) {
    let data = random_strings(ITEMS, 24, 1);
    // Half present, half absent
    let probes: Vec<String> = data
        .iter()
        .take(ITEMS / 2)
        .cloned()
        .chain(random_strings(ITEMS / 2, 24, 2))
        .collect();

    let mut group = c.benchmark_group("check");
    group.throughput(Throughput::Elements(probes.len() as u64));

    let mut exclusive = builder().build_exclusive().unwrap();
    let global = builder().build_global_lock().unwrap();
    let lock_free = builder().build_lock_free().unwrap();
    let sharded = builder().build_sharded().unwrap();
    for v in &data {
        exclusive.add(v.as_str());
        global.add(v.as_str());
        lock_free.add(v.as_str());
        sharded.add(v.as_str());
    }

    group.bench_function("exclusive", |b| {
        b.iter(|| probes.iter().filter(|v| exclusive.check(black_box(v.as_str()))).count());
    });
    group.bench_function("global_lock", |b| {
        b.iter(|| probes.iter().filter(|v| global.check(black_box(v.as_str()))).count());
    });
    group.bench_function("lock_free", |b| {
        b.iter(|| probes.iter().filter(|v| lock_free.check(black_box(v.as_str()))).count());
    });
    group.bench_function("sharded", |b| {
        b.iter(|| probes.iter().filter(|v| sharded.check(black_box(v.as_str()))).count());
    });

    group.finish();
}

fn bench_union(c: &mut Criterion) {
    let mut group = c.benchmark_group("union");
    let donor = {
        let mut filter = builder().build_exclusive().unwrap();
        for i in 0..ITEMS as u64 {
            filter.add(&i);
        }
        filter.state()
    };

    group.bench_function("lock_free", |b| {
        let filter = builder().build_lock_free().unwrap();
        b.iter(|| filter.union(black_box(&donor)));
    });
    group.bench_function("sharded", |b| {
        let filter = builder().build_sharded().unwrap();
        b.iter(|| filter.union(black_box(&donor)));
    });

    group.finish();
}

criterion_group!(benches, bench_add, bench_check, bench_union);
criterion_main!(benches);

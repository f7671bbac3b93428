//! # Shared Bloom Filter Benchmarks
//!
//! | Benchmark | What it measures |
//! |-----------|------------------|
//! | fingerprint | FNV-1 hash plus k offsets |
//! | cache | sharded cache check and load |
//! | filter/* | facade operations on the memory backend, cache on and off |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;

use redis_bloom_filter::domain::Fingerprint;
use redis_bloom_filter::{
    BackendKind, FilterConfigBuilder, MembershipCache, MemoryBackend, SharedBloomFilter,
};

fn random_values(count: usize) -> Vec<[u8; 16]> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| rng.gen()).collect()
}

fn memory_filter(cache_size: usize) -> SharedBloomFilter {
    let config = FilterConfigBuilder::new()
        .backend(BackendKind::Memory)
        .key("bench")
        .expected_items(100_000)
        .target_fpr(0.01)
        .cache_size(cache_size)
        .build()
        .expect("Valid config");
    SharedBloomFilter::open(&config, MemoryBackend::new().into()).expect("Memory backend opens")
}

fn bench_fingerprint(c: &mut Criterion) {
    let value = b"https://example.com/some/fairly/long/path?with=query";

    c.bench_function("fingerprint_positions_k7", |b| {
        b.iter(|| {
            let fp = Fingerprint::of(black_box(value));
            black_box(fp.positions(7, 136_930).sum::<usize>())
        })
    });
}

fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache");
    let cache = MembershipCache::new(65_536);
    let values = random_values(1_000);
    for value in &values {
        cache.load(value);
    }

    group.throughput(Throughput::Elements(values.len() as u64));
    group.bench_function("check_hit", |b| {
        b.iter(|| values.iter().filter(|v| cache.check(black_box(*v))).count())
    });
    group.bench_function("check_and_load", |b| {
        b.iter(|| {
            values
                .iter()
                .filter(|v| cache.check_and_load(black_box(*v)))
                .count()
        })
    });

    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");
    let values = random_values(1_000);

    for cache_size in [0, 65_536] {
        let filter = memory_filter(cache_size);
        for value in &values {
            let _ = filter.append(value);
        }

        group.throughput(Throughput::Elements(values.len() as u64));
        group.bench_with_input(BenchmarkId::new("append", cache_size), &values, |b, values| {
            b.iter(|| {
                for value in values {
                    let _ = filter.append(black_box(value));
                }
            })
        });
        group.bench_with_input(BenchmarkId::new("exists", cache_size), &values, |b, values| {
            b.iter(|| {
                values
                    .iter()
                    .filter(|v| filter.exists(black_box(v.as_slice())).unwrap_or(false))
                    .count()
            })
        });
        group.bench_with_input(
            BenchmarkId::new("exists_and_append", cache_size),
            &values,
            |b, values| {
                b.iter(|| {
                    values
                        .iter()
                        .filter(|v| {
                            filter
                                .exists_and_append(black_box(v.as_slice()))
                                .unwrap_or(false)
                        })
                        .count()
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_fingerprint, bench_cache, bench_filter);
criterion_main!(benches);

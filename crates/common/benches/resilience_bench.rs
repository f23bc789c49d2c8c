//! Hot-path benchmarks for the executor's shared primitives
//!
//! Covers request fingerprinting, sliding-window admission, response cache
//! lookups, and backoff delay calculation.
//!
//! Run with: `cargo bench --bench resilience_bench -p graphgate-common
//! --features runtime`

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use graphgate_common::cache::{fingerprint, ResponseCache};
use graphgate_common::resilience::{Backoff, MockClock, SlidingWindowRateLimiter};
use serde_json::json;

fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");

    for params in [1usize, 8, 32] {
        let query: BTreeMap<String, serde_json::Value> =
            (0..params).map(|i| (format!("param_{i}"), json!(format!("value_{i}")))).collect();
        let body = json!({"message": "hello", "published": true});

        group.bench_with_input(BenchmarkId::new("query_params", params), &query, |b, query| {
            b.iter(|| fingerprint(black_box("GET"), black_box("/v18.0/me/accounts"), query, Some(&body)));
        });
    }

    group.finish();
}

fn bench_limiter_admission(c: &mut Criterion) {
    let mut group = c.benchmark_group("sliding_window");

    group.bench_function("try_acquire_rolling", |b| {
        let clock = MockClock::new();
        let limiter =
            SlidingWindowRateLimiter::with_clock(90, Duration::from_secs(60), Arc::new(clock.clone()));
        b.iter(|| {
            if limiter.try_acquire(black_box("global")).is_err() {
                clock.advance(Duration::from_secs(1));
            }
        });
    });

    group.bench_function("try_acquire_many_keys", |b| {
        let limiter = SlidingWindowRateLimiter::with_clock(
            30,
            Duration::from_secs(60),
            Arc::new(MockClock::new()),
        );
        let keys: Vec<String> = (0..256).map(|i| format!("credential-{i}")).collect();
        let mut idx = 0usize;
        b.iter(|| {
            let _ = black_box(limiter.try_acquire(&keys[idx % keys.len()]));
            idx = idx.wrapping_add(1);
        });
    });

    group.finish();
}

fn bench_response_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("response_cache");
    let cache: ResponseCache<Vec<u8>> = ResponseCache::new(256);
    let keys: Vec<String> = (0..512).map(|i| format!("{i:064x}")).collect();
    for key in keys.iter().take(256) {
        cache.put(key.clone(), vec![0u8; 128]);
    }

    group.bench_function("get_mixed_hit_miss", |b| {
        let mut idx = 0usize;
        b.iter(|| {
            black_box(cache.get(&keys[idx % keys.len()]));
            idx = idx.wrapping_add(1);
        });
    });

    group.finish();
}

fn bench_backoff(c: &mut Criterion) {
    let backoff = Backoff::new(0.5, 30.0);
    c.bench_function("backoff_delay", |b| {
        b.iter(|| {
            for attempt in 0..10 {
                black_box(backoff.delay(black_box(attempt)));
            }
        });
    });
}

criterion_group!(
    resilience,
    bench_fingerprint,
    bench_limiter_admission,
    bench_response_cache,
    bench_backoff
);
criterion_main!(resilience);

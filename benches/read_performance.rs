//! Performance benchmarks for live-config.
//!
//! Covers:
//! - Read latency of `get_value`
//! - Cell clone cost
//! - Concurrent readers
//! - Reads that keep flowing while the source reloads
//! - Reload fan-out to subscribers

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use live_config::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct BenchConfig {
    value: i32,
    name: String,
    flag: bool,
    items: Vec<String>,
}

impl BenchConfig {
    fn sample(value: i32) -> Self {
        Self {
            value,
            name: format!("bench_{}", value),
            flag: value % 2 == 0,
            items: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        }
    }
}

fn bench_cell() -> (Arc<MemorySource>, LiveConfigCell<BenchConfig>) {
    let source = Arc::new(MemorySource::new());
    source
        .set_serialized("bench", &BenchConfig::sample(42))
        .unwrap();
    let cell = LiveConfigCell::new("bench", source.clone(), None).unwrap();
    (source, cell)
}

/// Benchmark single-threaded read latency
fn benchmark_read_latency(c: &mut Criterion) {
    let (_source, cell) = bench_cell();

    let mut group = c.benchmark_group("read_latency");
    group.bench_function("get_value", |b| {
        b.iter(|| {
            let cfg = cell.get_value().unwrap();
            black_box(&cfg.value);
        });
    });
    group.bench_function("try_get", |b| {
        b.iter(|| {
            black_box(cell.try_get());
        });
    });
    group.finish();
}

/// Benchmark clone performance
fn benchmark_clone(c: &mut Criterion) {
    let (_source, cell) = bench_cell();

    let mut group = c.benchmark_group("clone");
    group.bench_function("cell_clone", |b| {
        b.iter(|| {
            let cloned = cell.clone();
            black_box(cloned);
        });
    });
    group.finish();
}

/// Benchmark concurrent reads with varying thread counts
fn benchmark_concurrent_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_reads");

    for num_threads in [1, 2, 4, 8, 16] {
        group.throughput(Throughput::Elements(num_threads as u64 * 1000));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_threads", num_threads)),
            &num_threads,
            |b, &num_threads| {
                let (_source, cell) = bench_cell();
                let barrier = Arc::new(Barrier::new(num_threads + 1));

                b.iter_custom(|iters| {
                    let mut handles = vec![];

                    for _ in 0..num_threads {
                        let cell = cell.clone();
                        let barrier = Arc::clone(&barrier);

                        handles.push(thread::spawn(move || {
                            barrier.wait();

                            let start = std::time::Instant::now();
                            for _ in 0..iters {
                                let data = cell.get_value().unwrap();
                                black_box(&data.value);
                            }
                            start.elapsed()
                        }));
                    }

                    barrier.wait();

                    let total_duration: Duration =
                        handles.into_iter().map(|h| h.join().unwrap()).sum();
                    total_duration / num_threads as u32
                });
            },
        );
    }

    group.finish();
}

/// Benchmark reloads while readers keep reading
fn benchmark_reload_under_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("reload_under_load");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("reload_with_16_readers", |b| {
        b.iter_custom(|iters| {
            let (source, cell) = bench_cell();
            let keep_running = Arc::new(AtomicBool::new(true));
            let reads_completed = Arc::new(AtomicUsize::new(0));

            let mut readers = vec![];
            for _ in 0..16 {
                let cell = cell.clone();
                let running = Arc::clone(&keep_running);
                let counter = Arc::clone(&reads_completed);

                readers.push(thread::spawn(move || {
                    while running.load(Ordering::Relaxed) {
                        let data = cell.get_value().unwrap();
                        black_box(&data.value);
                        counter.fetch_add(1, Ordering::Relaxed);
                    }
                }));
            }

            let start = std::time::Instant::now();
            for i in 0..iters {
                source
                    .set_serialized("bench", &BenchConfig::sample(i as i32))
                    .unwrap();
            }
            let duration = start.elapsed();

            keep_running.store(false, Ordering::Relaxed);
            for reader in readers {
                reader.join().unwrap();
            }

            let total_reads = reads_completed.load(Ordering::Relaxed);
            println!("  Completed {} reads during {} reloads", total_reads, iters);

            duration
        });
    });

    group.finish();
}

/// Benchmark reload fan-out with varying subscriber counts
fn benchmark_reload_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("reload_fanout");

    for subscribers in [0usize, 1, 8, 64] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_subscribers", subscribers)),
            &subscribers,
            |b, &subscribers| {
                let (source, cell) = bench_cell();
                let delivered = Arc::new(AtomicUsize::new(0));
                let _subscriptions: Vec<_> = (0..subscribers)
                    .map(|_| {
                        let delivered = Arc::clone(&delivered);
                        cell.subscribe_fn(move |config: Arc<BenchConfig>| {
                            black_box(&config.value);
                            delivered.fetch_add(1, Ordering::Relaxed);
                        })
                        .unwrap()
                    })
                    .collect();

                let mut counter = 0;
                b.iter(|| {
                    counter += 1;
                    source
                        .set_serialized("bench", &BenchConfig::sample(counter))
                        .unwrap();
                });
            },
        );
    }

    group.finish();
}

/// Benchmark comparison with lock-based approaches
fn benchmark_mutex_comparison(c: &mut Criterion) {
    use std::sync::Mutex;

    let mut group = c.benchmark_group("mutex_comparison");

    let (_source, cell) = bench_cell();
    group.bench_function("cell_read", |b| {
        b.iter(|| {
            let cfg = cell.get_value().unwrap();
            black_box(&cfg.value);
        });
    });

    let config_mutex = Mutex::new(Arc::new(BenchConfig::sample(42)));
    group.bench_function("mutex_arc_read", |b| {
        b.iter(|| {
            let cfg = config_mutex.lock().unwrap();
            black_box(&cfg.value);
        });
    });

    let config_rwlock = std::sync::RwLock::new(BenchConfig::sample(42));
    group.bench_function("rwlock_read", |b| {
        b.iter(|| {
            let cfg = config_rwlock.read().unwrap();
            black_box(&cfg.value);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_read_latency,
    benchmark_clone,
    benchmark_concurrent_reads,
    benchmark_reload_under_load,
    benchmark_reload_fanout,
    benchmark_mutex_comparison,
);

criterion_main!(benches);

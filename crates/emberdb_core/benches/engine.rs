//! Engine operation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use emberdb_core::{Config, Engine};
use tempfile::tempdir;

fn keys(n: usize) -> Vec<Vec<u8>> {
    (0..n).map(|i| format!("key_{i:08}").into_bytes()).collect()
}

fn shuffled_keys(n: usize) -> Vec<Vec<u8>> {
    let mut indices: Vec<usize> = (0..n).collect();
    // Deterministic LCG shuffle so runs are comparable.
    let mut seed = 12345u64;
    for i in (1..indices.len()).rev() {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345) & 0x7FFF_FFFF;
        indices.swap(i, (seed as usize) % (i + 1));
    }
    indices
        .into_iter()
        .map(|i| format!("rnd_{i:08}").into_bytes())
        .collect()
}

fn durable_engine(dir: &tempfile::TempDir) -> Engine {
    // Benchmarks measure steady-state throughput; keep auto-checkpoints
    // out of the way.
    let config = Config::new().checkpoint_interval(0);
    Engine::open_with_config(dir.path().join("bench.wal"), &config)
}

fn bench_sequential_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_insert");

    for count in [1_000usize, 10_000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let keys = keys(count);
            b.iter(|| {
                let dir = tempdir().unwrap();
                let mut engine = durable_engine(&dir);
                for key in &keys {
                    engine
                        .put(black_box(key.clone()), b"value_payload_xxxx".to_vec())
                        .unwrap();
                }
                engine.flush_wal().unwrap();
            });
        });
    }
    group.finish();
}

fn bench_random_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_insert");

    for count in [1_000usize, 10_000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let keys = shuffled_keys(count);
            b.iter(|| {
                let mut engine = Engine::new();
                for key in &keys {
                    engine
                        .put(black_box(key.clone()), b"value_payload_xxxx".to_vec())
                        .unwrap();
                }
            });
        });
    }
    group.finish();
}

fn bench_point_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_lookup");
    group.throughput(Throughput::Elements(1));

    let keys = keys(10_000);
    let mut engine = Engine::new();
    for key in &keys {
        engine.put(key.clone(), b"v".to_vec()).unwrap();
    }

    let mut i = 0usize;
    group.bench_function("hot", |b| {
        b.iter(|| {
            let key = &keys[i % keys.len()];
            i = i.wrapping_add(7919);
            black_box(engine.get(black_box(key)))
        });
    });
    group.finish();
}

fn bench_update_in_place(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_in_place");
    group.throughput(Throughput::Elements(1));

    let keys = keys(10_000);
    let mut engine = Engine::new();
    for key in &keys {
        engine.put(key.clone(), b"initial".to_vec()).unwrap();
    }

    let mut i = 0usize;
    group.bench_function("existing_key", |b| {
        b.iter(|| {
            let key = keys[i % keys.len()].clone();
            i = i.wrapping_add(7919);
            engine.update(black_box(key), b"updated".to_vec()).unwrap();
        });
    });
    group.finish();
}

fn bench_mixed_workload(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_workload");
    group.throughput(Throughput::Elements(1));

    // 70% reads, 20% writes, 10% updates over a 10k-key set.
    let keys = keys(10_000);
    let mut engine = Engine::new();
    for key in &keys {
        engine.put(key.clone(), b"initial".to_vec()).unwrap();
    }

    let mut i = 0usize;
    group.bench_function("70r_20w_10u", |b| {
        b.iter(|| {
            let key = keys[i % keys.len()].clone();
            match i % 10 {
                0..=6 => {
                    black_box(engine.get(&key));
                }
                7 | 8 => {
                    engine.put(key, b"written".to_vec()).unwrap();
                }
                _ => {
                    engine.update(key, b"updated".to_vec()).unwrap();
                }
            }
            i = i.wrapping_add(1);
        });
    });
    group.finish();
}

fn bench_full_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_scan");

    for count in [1_000usize, 10_000] {
        group.throughput(Throughput::Elements(count as u64));
        let mut engine = Engine::new();
        for key in keys(count) {
            engine.put(key, b"payload".to_vec()).unwrap();
        }
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut visited = 0usize;
                engine.iterate_all(|_, _| visited += 1);
                assert_eq!(visited, count);
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_sequential_insert,
    bench_random_insert,
    bench_point_lookup,
    bench_update_in_place,
    bench_mixed_workload,
    bench_full_scan
);
criterion_main!(benches);

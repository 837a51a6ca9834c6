//! Benchmarks for buffer pool allocation and handle bookkeeping.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use otto_core::audio::BufferPool;

use crate::BLOCK_SIZES;

pub fn bench_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitives/pool");

    // Worst case for first-fit: seven slots held, the scan walks to the end
    let pool = BufferPool::new(256);
    let held = pool.allocate_multi::<7>();
    group.bench_function("allocate_last_slot", |b| {
        b.iter(|| black_box(pool.allocate()));
    });
    drop(held);

    group.bench_function("clone_and_drop", |b| {
        let handle = pool.allocate();
        b.iter(|| black_box(handle.clone()));
    });

    for &size in BLOCK_SIZES {
        let pool = BufferPool::new(size);
        group.bench_with_input(BenchmarkId::new("allocate_clear", size), &size, |b, _| {
            b.iter(|| black_box(pool.allocate_clear()));
        });
    }

    group.finish();
}

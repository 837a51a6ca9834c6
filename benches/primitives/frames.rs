//! Benchmarks for frame arithmetic over envelope channels.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use otto_core::{
    audio::{BufferPool, StereoData},
    frame,
};

use crate::BLOCK_SIZES;

pub fn bench_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitives/frames");

    for &size in BLOCK_SIZES {
        let pool = BufferPool::new(size);
        let wet = StereoData::from_audio(pool.allocate_multi_clear::<2>());
        let other = StereoData::from_audio(pool.allocate_multi_clear::<2>());
        let dry = pool.allocate_clear();
        let gains = frame![0.7, 0.3];

        // The dry/wet mix the graph runs once per block
        group.bench_with_input(BenchmarkId::new("stereo_mix", size), &size, |b, _| {
            b.iter(|| {
                for ((mut w, o), d) in wet.frames().zip(other.frames()).zip(dry.cells()) {
                    w += o + gains * black_box(d.get());
                }
            })
        });
    }

    group.finish();
}

//! Benchmarks for individual engines with realistic input.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use otto_core::{
    audio::{BufferPool, MonoData},
    engine::{Engine, Processor},
    engines::{Chorus, Delay, SineSynth, Subtractive},
    io::TimedEvent,
    AudioConfig,
};

use crate::BLOCK_SIZES;

pub fn bench_engines(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engines");
    // Six notes, every voice busy
    let chord = [48, 55, 60, 64, 67, 72].map(|key| TimedEvent::note_on(0, key, 100));

    for &size in BLOCK_SIZES {
        let config = AudioConfig::new(48_000.0, size);
        let pool = BufferPool::new(size);

        let mut subtractive = Subtractive::new();
        subtractive.init(&config);
        drop(subtractive.process(&pool, MonoData::mono_with_midi(pool.allocate_clear(), &chord)));
        group.bench_with_input(BenchmarkId::new("subtractive_6_voices", size), &size, |b, _| {
            b.iter(|| black_box(subtractive.process(&pool, MonoData::mono(pool.allocate_clear())).nframes))
        });

        let mut sine = SineSynth::new();
        sine.init(&config);
        drop(sine.process(&pool, MonoData::mono_with_midi(pool.allocate_clear(), &chord)));
        group.bench_with_input(BenchmarkId::new("sine_6_voices", size), &size, |b, _| {
            b.iter(|| black_box(sine.process(&pool, MonoData::mono(pool.allocate_clear())).nframes))
        });

        let mut delay = Delay::new();
        delay.init(&config);
        group.bench_with_input(BenchmarkId::new("delay", size), &size, |b, _| {
            b.iter(|| {
                let send = pool.allocate();
                send.fill(0.25);
                black_box(delay.process(&pool, MonoData::mono(send)).nframes)
            })
        });

        let mut chorus = Chorus::new();
        chorus.init(&config);
        group.bench_with_input(BenchmarkId::new("chorus", size), &size, |b, _| {
            b.iter(|| {
                let send = pool.allocate();
                send.fill(0.25);
                black_box(chorus.process(&pool, MonoData::mono(send)).nframes)
            })
        });
    }

    group.finish();
}

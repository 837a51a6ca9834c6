//! Benchmarks for the DSP primitives engines are built from.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use otto_core::dsp::{Adsr, DelayLine, Envelope, Oscillator, SVFilter, Waveform};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_dsp(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitives/dsp");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        let mut osc = Oscillator::new(Waveform::Saw);
        group.bench_with_input(BenchmarkId::new("saw", size), &size, |b, _| {
            b.iter(|| {
                for s in buffer.iter_mut() {
                    *s = osc.next_sample(black_box(220.0 / SAMPLE_RATE));
                }
            })
        });

        let mut filter = SVFilter::lowpass();
        group.bench_with_input(BenchmarkId::new("lowpass", size), &size, |b, _| {
            b.iter(|| {
                filter.prepare(black_box(1_000.0), 0.5, SAMPLE_RATE);
                for s in buffer.iter_mut() {
                    *s = filter.tick(*s);
                }
            })
        });

        let mut env = Envelope::new(Adsr::new(0.01, 0.1, 0.7, 0.3));
        env.note_on();
        group.bench_with_input(BenchmarkId::new("envelope", size), &size, |b, _| {
            b.iter(|| {
                for s in buffer.iter_mut() {
                    *s = env.next_sample(SAMPLE_RATE);
                }
            })
        });

        let mut line = DelayLine::with_capacity(48_000);
        group.bench_with_input(BenchmarkId::new("delay_interpolated", size), &size, |b, _| {
            b.iter(|| {
                for s in buffer.iter_mut() {
                    line.write(*s);
                    *s = line.read_interpolated(black_box(960.5));
                }
            })
        });
    }

    group.finish();
}

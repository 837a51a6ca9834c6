//! Benchmarks for one full block through the engine manager.
//!
//! This is the number that has to stay under the deadline: arpeggiator,
//! synth, both effect buses, the dry/wet mix and the master stage.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use otto_core::{
    engine::EngineSlot,
    io::TimedEvent,
    runtime::Runtime,
    AudioConfig,
};

use crate::BLOCK_SIZES;

pub fn bench_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/graph");
    let chord = [
        TimedEvent::note_on(0, 57, 100),
        TimedEvent::note_on(0, 60, 100),
        TimedEvent::note_on(0, 64, 100),
    ];

    for &size in BLOCK_SIZES {
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];

        let mut runtime = Runtime::new(AudioConfig::new(48_000.0, size));
        runtime.start();
        runtime.process_block(&[], &chord, &mut left, &mut right);
        group.bench_with_input(BenchmarkId::new("held_chord", size), &size, |b, _| {
            b.iter(|| runtime.process_block(&[], &[], black_box(&mut left), black_box(&mut right)))
        });

        let mut runtime = Runtime::new(AudioConfig::new(48_000.0, size));
        // Selection has to happen before start so the arp is initialized
        let _ = runtime
            .manager_mut()
            .select_by_name(EngineSlot::Arpeggiator, "Arp");
        runtime.start();
        runtime.process_block(&[], &chord, &mut left, &mut right);
        group.bench_with_input(BenchmarkId::new("arpeggiated", size), &size, |b, _| {
            b.iter(|| runtime.process_block(&[], &[], black_box(&mut left), black_box(&mut right)))
        });
    }

    group.finish();
}

//! Benchmarks for low-level building blocks.

mod dsp;
mod frames;
mod pool;

pub use dsp::bench_dsp;
pub use frames::bench_frames;
pub use pool::bench_pool;

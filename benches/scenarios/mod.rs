//! Scenario benchmarks: single engines and the whole graph.

mod engines;
mod graph;

pub use engines::bench_engines;
pub use graph::bench_graph;

//! Realtime signal core for a portable synthesizer.
//!
//! The audio thread calls [`runtime::Runtime::process_block`] once per block.
//! Inside, buffers come from a fixed [`audio::BufferPool`], travel between
//! engines wrapped in [`audio::ProcessData`] envelopes, and go back to the
//! pool before the call returns. Nothing on that path allocates or locks.

pub mod audio; // Buffer pool, handles, frames and process envelopes
pub mod config;
pub mod dsp;
pub mod engine; // Roles, dispatchers and the top-level graph
pub mod engines; // Engine variants shipped with the core
pub mod error;
pub mod io;
pub mod runtime;

pub use config::AudioConfig;
pub use error::EngineError;

/// Number of slots in a pool built with [`audio::BufferPool::new`].
pub const DEFAULT_POOL_CAPACITY: usize = 8;
pub const DEFAULT_BUFFER_SIZE: usize = 256;
pub const DEFAULT_SAMPLE_RATE: f32 = 48_000.0;
pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;

//! Low-level DSP primitives used by the shipped engines.
//!
//! These components are allocation-free once built and safe to embed directly
//! inside voice and effect structs.

/// Circular delay line with linear interpolation.
pub mod delay;
/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// State-variable filter with multiple responses.
pub mod filter;
pub mod oscillator;

pub use delay::DelayLine;
pub use envelope::{Adsr, Envelope, EnvelopeStage};
pub use filter::{FilterType, SVFilter};
pub use oscillator::{Oscillator, Waveform};

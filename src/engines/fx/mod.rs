//! Effect engines. Each takes a mono send and returns a stereo pair.

mod chorus;
mod delay;

pub use chorus::{Chorus, ChorusProps};
pub use delay::{Delay, DelayProps};

//! Engines shipped with the core, one module per role.

pub mod arp;
pub mod fx;
pub mod master;
pub mod sends;
pub mod synth;

pub use arp::{Arp, Bypass};
pub use fx::{Chorus, Delay};
pub use master::Master;
pub use sends::Sends;
pub use synth::{SineSynth, Subtractive};

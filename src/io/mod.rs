// Purpose - MIDI types and format conversions at the engine boundary

pub mod converter;
pub mod midi;

pub use midi::{MidiEvent, TimedEvent};

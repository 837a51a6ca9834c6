use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    PitchBend { channel: u8, value: i16 },
    ProgramChange { channel: u8, program: u8 },
}

impl MidiEvent {
    /// Note-on with velocity 0 counts as a note-off.
    pub fn is_note_off(&self) -> bool {
        matches!(
            self,
            MidiEvent::NoteOff { .. } | MidiEvent::NoteOn { velocity: 0, .. }
        )
    }

    pub fn is_note_on(&self) -> bool {
        matches!(self, MidiEvent::NoteOn { velocity, .. } if *velocity > 0)
    }

    pub fn key(&self) -> Option<u8> {
        match self {
            MidiEvent::NoteOn { key, .. } | MidiEvent::NoteOff { key, .. } => Some(*key),
            _ => None,
        }
    }
}

/// A MIDI event and the frame inside the current block where it happens.
///
/// Event lists handed to engines are ordered by `frame`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub frame: u32,
    pub event: MidiEvent,
}

impl TimedEvent {
    pub fn new(frame: u32, event: MidiEvent) -> Self {
        Self { frame, event }
    }

    pub fn note_on(frame: u32, key: u8, velocity: u8) -> Self {
        Self::new(
            frame,
            MidiEvent::NoteOn {
                channel: 0,
                key,
                velocity,
            },
        )
    }

    pub fn note_off(frame: u32, key: u8) -> Self {
        Self::new(
            frame,
            MidiEvent::NoteOff {
                channel: 0,
                key,
                velocity: 0,
            },
        )
    }

    /// Same event, moved by `offset` frames (saturating at 0).
    pub fn shifted(self, offset: i64) -> Self {
        let frame = (self.frame as i64 + offset).clamp(0, u32::MAX as i64) as u32;
        Self { frame, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_velocity_note_on_is_note_off() {
        let event = MidiEvent::NoteOn {
            channel: 0,
            key: 60,
            velocity: 0,
        };
        assert!(event.is_note_off());
        assert!(!event.is_note_on());
    }

    #[test]
    fn test_shifted_saturates_at_zero() {
        let event = TimedEvent::note_on(10, 60, 100);
        assert_eq!(event.shifted(-64).frame, 0);
        assert_eq!(event.shifted(6).frame, 16);
    }
}

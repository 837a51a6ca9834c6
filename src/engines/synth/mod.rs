//! Polyphonic synth engines and the voice bank they share.

mod sine;
mod subtractive;

use std::cell::Cell;

pub use sine::{SineProps, SineSynth};
pub use subtractive::{Subtractive, SubtractiveProps};

use crate::{
    dsp::{Adsr, Envelope, Oscillator, Waveform},
    io::{
        converter::{midi_note_to_freq, pitch_bend_ratio},
        MidiEvent, TimedEvent,
    },
};

pub const VOICE_COUNT: usize = 6;
/// Semitones each way at full pitch-bend deflection.
pub const PITCH_BEND_RANGE: f32 = 2.0;

const CC_ALL_SOUND_OFF: u8 = 120;
const CC_ALL_NOTES_OFF: u8 = 123;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,
    Held,
    Releasing,
}

#[derive(Debug, Clone)]
struct Voice {
    osc: Oscillator,
    env: Envelope,
    key: u8,
    velocity: f32,
    frequency: f32,
    age: u64,
}

impl Voice {
    fn new(waveform: Waveform) -> Self {
        Self {
            osc: Oscillator::new(waveform),
            env: Envelope::default(),
            key: 0,
            velocity: 0.0,
            frequency: 0.0,
            age: 0,
        }
    }

    fn state(&self) -> VoiceState {
        if !self.env.is_active() {
            VoiceState::Free
        } else if self.env.is_releasing() {
            VoiceState::Releasing
        } else {
            VoiceState::Held
        }
    }

    fn start(&mut self, key: u8, velocity: u8, age: u64) {
        self.key = key;
        self.velocity = velocity as f32 / 127.0;
        self.frequency = midi_note_to_freq(key);
        self.age = age;
        self.osc.reset();
        self.env.note_on();
    }
}

/// Fixed bank of voices driven by timed MIDI.
///
/// Events are applied at their frame, so a note starting at frame 37
/// produces silence for frames 0..37 and sound from 37 on. When every voice
/// is busy a new note takes a free voice, then the oldest releasing voice,
/// then the oldest voice overall.
#[derive(Debug, Clone)]
pub struct VoiceBank {
    voices: Vec<Voice>,
    sample_rate: f32,
    bend: f32,
    notes_started: u64,
}

impl VoiceBank {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            voices: vec![Voice::new(waveform); VOICE_COUNT],
            sample_rate: crate::DEFAULT_SAMPLE_RATE,
            bend: 1.0,
            notes_started: 0,
        }
    }

    /// Silence every voice and adopt `sample_rate`.
    pub fn init(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.bend = 1.0;
        for voice in &mut self.voices {
            voice.env.reset();
        }
    }

    pub fn set_envelope(&mut self, params: Adsr) {
        for voice in &mut self.voices {
            voice.env.set_params(params);
        }
    }

    pub fn active_voices(&self) -> usize {
        self.voices
            .iter()
            .filter(|v| v.state() != VoiceState::Free)
            .count()
    }

    pub fn voice_states(&self) -> impl Iterator<Item = (u8, VoiceState)> + '_ {
        self.voices.iter().map(|v| (v.key, v.state()))
    }

    pub fn handle_event(&mut self, event: &MidiEvent) {
        match *event {
            MidiEvent::NoteOn { key, velocity, .. } if velocity > 0 => self.note_on(key, velocity),
            MidiEvent::NoteOn { key, .. } | MidiEvent::NoteOff { key, .. } => self.note_off(key),
            MidiEvent::PitchBend { value, .. } => {
                self.bend = pitch_bend_ratio(value, PITCH_BEND_RANGE);
            }
            MidiEvent::ControlChange { controller, .. } => match controller {
                CC_ALL_NOTES_OFF => {
                    for voice in &mut self.voices {
                        voice.env.note_off(self.sample_rate);
                    }
                }
                CC_ALL_SOUND_OFF => {
                    for voice in &mut self.voices {
                        voice.env.reset();
                    }
                }
                _ => {}
            },
            MidiEvent::ProgramChange { .. } => {}
        }
    }

    fn note_on(&mut self, key: u8, velocity: u8) {
        let age = self.notes_started;
        self.notes_started += 1;
        let index = self.pick_voice();
        self.voices[index].start(key, velocity, age);
    }

    fn note_off(&mut self, key: u8) {
        for voice in &mut self.voices {
            if voice.key == key && voice.state() == VoiceState::Held {
                voice.env.note_off(self.sample_rate);
            }
        }
    }

    fn pick_voice(&self) -> usize {
        let oldest = |state: Option<VoiceState>| {
            self.voices
                .iter()
                .enumerate()
                .filter(|(_, v)| state.map_or(true, |s| v.state() == s))
                .min_by_key(|(_, v)| v.age)
                .map(|(i, _)| i)
        };

        self.voices
            .iter()
            .position(|v| v.state() == VoiceState::Free)
            .or_else(|| oldest(Some(VoiceState::Releasing)))
            .or_else(|| oldest(None))
            .unwrap_or(0)
    }

    /// Overwrite `out` with the sum of all voices, applying `midi` at the
    /// frames it names. Events past the end of `out` are applied after the
    /// last sample.
    pub fn render(&mut self, out: &[Cell<f32>], midi: &[TimedEvent]) {
        let mut pos = 0;
        for timed in midi {
            let at = (timed.frame as usize).clamp(pos, out.len());
            self.render_span(&out[pos..at]);
            pos = at;
            self.handle_event(&timed.event);
        }
        self.render_span(&out[pos..]);
    }

    fn render_span(&mut self, out: &[Cell<f32>]) {
        let increment_scale = self.bend / self.sample_rate;
        for sample in out {
            let mut sum = 0.0;
            for voice in &mut self.voices {
                if !voice.env.is_active() {
                    continue;
                }
                let level = voice.env.next_sample(self.sample_rate);
                sum += voice.osc.next_sample(voice.frequency * increment_scale) * level * voice.velocity;
            }
            sample.set(sum);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(len: usize) -> Vec<Cell<f32>> {
        (0..len).map(|_| Cell::new(1.0)).collect()
    }

    fn bank() -> VoiceBank {
        let mut bank = VoiceBank::new(Waveform::Saw);
        bank.init(1_000.0);
        bank.set_envelope(Adsr::new(0.001, 0.01, 1.0, 0.005));
        bank
    }

    #[test]
    fn test_note_starts_at_its_frame() {
        let mut bank = bank();
        let out = cells(16);
        bank.render(&out, &[TimedEvent::note_on(8, 60, 127)]);

        assert!(out[..8].iter().all(|s| s.get() == 0.0), "silent before the note");
        assert!(out[8..].iter().any(|s| s.get() != 0.0), "sound after the note");
    }

    #[test]
    fn test_note_off_releases_and_frees() {
        let mut bank = bank();
        let out = cells(32);
        bank.render(&out, &[TimedEvent::note_on(0, 60, 100), TimedEvent::note_off(4, 60)]);
        assert_eq!(bank.active_voices(), 0, "release of 5 samples is over");

        bank.render(&out, &[]);
        assert!(out.iter().all(|s| s.get() == 0.0));
    }

    #[test]
    fn test_velocity_zero_note_on_is_note_off() {
        let mut bank = bank();
        bank.handle_event(&TimedEvent::note_on(0, 64, 90).event);
        bank.handle_event(&TimedEvent::note_on(0, 64, 0).event);
        let states: Vec<_> = bank.voice_states().filter(|(k, _)| *k == 64).collect();
        assert!(states.iter().any(|(_, s)| *s == VoiceState::Releasing));
    }

    #[test]
    fn test_stealing_prefers_releasing_then_oldest() {
        let mut bank = bank();
        for key in 0..VOICE_COUNT as u8 {
            bank.handle_event(&TimedEvent::note_on(0, 60 + key, 100).event);
        }
        assert_eq!(bank.active_voices(), VOICE_COUNT);

        // Key 63 is releasing, so it goes before the older held 60
        bank.handle_event(&TimedEvent::note_off(0, 63).event);
        bank.handle_event(&TimedEvent::note_on(0, 80, 100).event);
        let keys: Vec<u8> = bank.voice_states().map(|(k, _)| k).collect();
        assert!(keys.contains(&60));
        assert!(!keys.contains(&63));

        // All held now: the oldest, 60, is stolen
        bank.handle_event(&TimedEvent::note_on(0, 81, 100).event);
        let keys: Vec<u8> = bank.voice_states().map(|(k, _)| k).collect();
        assert!(!keys.contains(&60));
        assert!(keys.contains(&81));
    }

    #[test]
    fn test_all_notes_off_releases_everything() {
        let mut bank = bank();
        bank.handle_event(&TimedEvent::note_on(0, 60, 100).event);
        bank.handle_event(&TimedEvent::note_on(0, 67, 100).event);
        bank.handle_event(&MidiEvent::ControlChange {
            channel: 0,
            controller: CC_ALL_NOTES_OFF,
            value: 0,
        });
        assert!(bank.voice_states().all(|(_, s)| s != VoiceState::Held));
    }
}

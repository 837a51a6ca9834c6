use serde::{Deserialize, Serialize};

use crate::{
    audio::{BufferPool, MidiData},
    engine::{Arpeggiator, Engine, Processor},
    io::{MidiEvent, TimedEvent},
    AudioConfig,
};

/*
Arpeggiator
===========

Held keys become a looping sequence of steps. A step is one or more notes
that start together:

  held C E G, Up, Standard         C  E  G  C  E  G ...
  held C E G, UpDown, Standard     C  E  G  E  C  E ...
  held C E G, UpDownInc, Standard  C  E  G  G  E  C  C ...
  held C E G, Up, OctaveUp         C  E  G  C' E' G' C ...
  held C E G, Up, OctaveUpUnison   CC' EE' GG' CC' ...
  held C E G, Up, FifthUnison      CG  EB  GD' CG ...
  held C E G, Chord, Standard      CEG CEG ...

Timing runs on two countdowns that carry across blocks:

  step counter   frames until the next step starts
  gate counter   frames until the sounding step gets its note-offs

      |<------------ step ------------>|<------------ step ---...
      on        off                    on        off
      |<-gate->|                        |<-gate->|

Pressing a key while nothing was held starts the first step on that
frame. Releasing every key stops new steps; the last step still gets its
note-off on time.

All buffers are reserved up front, so processing never allocates.
*/

const MAX_HELD: usize = 16;
const MAX_STEPS: usize = 128;
const OUTPUT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Playmode {
    Up,
    Down,
    UpDown,
    DownUp,
    /// Up then down, playing the top and bottom keys twice.
    UpDownInc,
    /// Down then up, playing the bottom and top keys twice.
    DownUpInc,
    AsPlayed,
    Chord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OctaveMode {
    Standard,
    /// The pattern once as played, once an octave higher.
    OctaveUp,
    /// Every step doubled an octave higher.
    OctaveUpUnison,
    /// Every step doubled a fifth higher.
    FifthUnison,
    /// The pattern as played, an octave up, then an octave down.
    OctaveUpDown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArpProps {
    pub playmode: Playmode,
    pub octavemode: OctaveMode,
    /// Fraction of a step each note sounds for, 0.01 to 1.
    pub note_length: f32,
    /// Steps per second.
    pub rate: f32,
}

impl Default for ArpProps {
    fn default() -> Self {
        Self {
            playmode: Playmode::Up,
            octavemode: OctaveMode::Standard,
            note_length: 0.2,
            rate: 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Note {
    key: u8,
    velocity: u8,
}

pub struct Arp {
    pub props: ArpProps,
    sample_rate: f32,

    held: Vec<Note>,
    order: Vec<Note>,
    notes: Vec<Note>,
    steps: Vec<(usize, usize)>,
    sounding: Vec<u8>,
    output: Vec<TimedEvent>,

    cursor: usize,
    step_counter: usize,
    gate_counter: Option<usize>,
    dirty: bool,
    overflowed: bool,
}

impl Arp {
    pub fn new() -> Self {
        Self {
            props: ArpProps::default(),
            sample_rate: crate::DEFAULT_SAMPLE_RATE,
            held: Vec::with_capacity(MAX_HELD),
            order: Vec::with_capacity(MAX_HELD * 2),
            notes: Vec::with_capacity(MAX_STEPS * 2),
            steps: Vec::with_capacity(MAX_STEPS),
            sounding: Vec::with_capacity(MAX_STEPS * 2),
            output: Vec::with_capacity(OUTPUT_CAPACITY),
            cursor: 0,
            step_counter: 0,
            gate_counter: None,
            dirty: false,
            overflowed: false,
        }
    }

    /// True once a block produced more than the output can hold and events
    /// were dropped. Cleared by `init` and `reset`.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Keys currently held, in the order they were pressed.
    pub fn held_keys(&self) -> impl Iterator<Item = u8> + '_ {
        self.held.iter().map(|n| n.key)
    }

    fn press(&mut self, key: u8, velocity: u8) {
        if self.held.iter().any(|n| n.key == key) || self.held.len() == MAX_HELD {
            return;
        }
        if self.held.is_empty() {
            self.step_counter = 0;
            self.cursor = 0;
        }
        self.held.push(Note { key, velocity });
        self.dirty = true;
    }

    fn lift(&mut self, key: u8) {
        let before = self.held.len();
        self.held.retain(|n| n.key != key);
        self.dirty |= self.held.len() != before;
    }

    fn emit(&mut self, event: TimedEvent) {
        if self.output.len() < OUTPUT_CAPACITY {
            self.output.push(event);
        } else {
            self.overflowed = true;
        }
    }

    /// Turn the held keys into `steps` according to the current modes.
    fn rebuild(&mut self) {
        self.dirty = false;
        self.order.clear();
        self.notes.clear();
        self.steps.clear();

        self.order.extend_from_slice(&self.held);
        if self.props.playmode != Playmode::AsPlayed {
            self.order.sort_unstable_by_key(|n| n.key);
        }
        let len = self.order.len();
        match self.props.playmode {
            Playmode::Down => self.order.reverse(),
            Playmode::UpDown if len > 2 => {
                for i in (1..len - 1).rev() {
                    self.order.push(self.order[i]);
                }
            }
            Playmode::DownUp if len > 2 => {
                self.order.reverse();
                for i in (1..len - 1).rev() {
                    self.order.push(self.order[i]);
                }
            }
            Playmode::DownUp => self.order.reverse(),
            Playmode::UpDownInc => {
                for i in (0..len).rev() {
                    self.order.push(self.order[i]);
                }
            }
            Playmode::DownUpInc => {
                self.order.reverse();
                for i in (0..len).rev() {
                    self.order.push(self.order[i]);
                }
            }
            _ => {}
        }

        let chord = self.props.playmode == Playmode::Chord;
        let passes: &[i8] = match self.props.octavemode {
            OctaveMode::Standard | OctaveMode::OctaveUpUnison | OctaveMode::FifthUnison => &[0],
            OctaveMode::OctaveUp => &[0, 12],
            OctaveMode::OctaveUpDown => &[0, 12, -12],
        };
        let unison = match self.props.octavemode {
            OctaveMode::OctaveUpUnison => Some(12),
            OctaveMode::FifthUnison => Some(7),
            _ => None,
        };

        for &shift in passes {
            if chord {
                let start = self.notes.len();
                for i in 0..self.order.len() {
                    self.push_note(self.order[i], shift, unison);
                }
                self.push_step(start);
            } else {
                for i in 0..self.order.len() {
                    let start = self.notes.len();
                    self.push_note(self.order[i], shift, unison);
                    self.push_step(start);
                }
            }
        }

        if !self.steps.is_empty() {
            self.cursor %= self.steps.len();
        }
    }

    fn push_note(&mut self, note: Note, shift: i8, unison: Option<i8>) {
        let shifted = |by: i8| {
            let key = note.key as i16 + by as i16;
            (0..=127).contains(&key).then_some(Note {
                key: key as u8,
                velocity: note.velocity,
            })
        };
        if let Some(n) = shifted(shift) {
            self.notes.push(n);
        }
        if let Some(interval) = unison {
            if let Some(n) = shifted(shift + interval) {
                self.notes.push(n);
            }
        }
    }

    fn push_step(&mut self, start: usize) {
        if self.notes.len() > start && self.steps.len() < MAX_STEPS {
            self.steps.push((start, self.notes.len()));
        }
    }

    fn release_sounding(&mut self, frame: u32) {
        for i in 0..self.sounding.len() {
            let key = self.sounding[i];
            self.emit(TimedEvent::note_off(frame, key));
        }
        self.sounding.clear();
        self.gate_counter = None;
    }

    fn start_step(&mut self, frame: u32, gate: usize) {
        // A retrigger inside the gate cuts the previous step short
        if !self.sounding.is_empty() {
            self.release_sounding(frame);
        }
        if self.dirty {
            self.rebuild();
        }
        let Some(&(start, end)) = self.steps.get(self.cursor) else {
            return;
        };
        for i in start..end {
            let note = self.notes[i];
            self.emit(TimedEvent::note_on(frame, note.key, note.velocity));
            if self.sounding.len() < self.sounding.capacity() {
                self.sounding.push(note.key);
            }
        }
        self.gate_counter = Some(gate);
        self.cursor = (self.cursor + 1) % self.steps.len();
    }

    fn handle_input(&mut self, frame: u32, event: &MidiEvent) {
        match *event {
            MidiEvent::NoteOn { key, velocity, .. } if velocity > 0 => self.press(key, velocity),
            MidiEvent::NoteOn { key, .. } | MidiEvent::NoteOff { key, .. } => self.lift(key),
            other => self.emit(TimedEvent::new(frame, other)),
        }
    }
}

impl Default for Arp {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for Arp {
    const NAME: &'static str = "Arp";
    type Props = ArpProps;

    fn props(&self) -> &ArpProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut ArpProps {
        self.dirty = true;
        &mut self.props
    }

    fn init(&mut self, config: &AudioConfig) {
        self.sample_rate = config.sample_rate;
        self.reset();
    }

    /// Forgets held keys without sending note-offs.
    fn reset(&mut self) {
        self.held.clear();
        self.sounding.clear();
        self.steps.clear();
        self.cursor = 0;
        self.step_counter = 0;
        self.gate_counter = None;
        self.overflowed = false;
    }
}

impl Processor<Arpeggiator> for Arp {
    fn process<'a>(&'a mut self, _pool: &'a BufferPool, data: MidiData<'a>) -> MidiData<'a> {
        self.output.clear();

        let nframes = data.nframes;
        let step_len = (self.sample_rate / self.props.rate.max(0.01)).max(1.0) as usize;
        let gate = ((step_len as f32 * self.props.note_length.clamp(0.01, 1.0)) as usize)
            .clamp(1, step_len);

        let mut events = data.midi.iter().peekable();
        let mut frame = 0;
        while frame < nframes {
            while let Some(timed) = events.next_if(|e| e.frame as usize <= frame) {
                self.handle_input(frame as u32, &timed.event);
            }

            if self.gate_counter == Some(0) {
                self.release_sounding(frame as u32);
            }
            if self.step_counter == 0 && !self.held.is_empty() {
                self.start_step(frame as u32, gate);
                self.step_counter = step_len;
            }

            let next_event = events.peek().map_or(nframes, |e| e.frame as usize);
            let mut advance = next_event.min(nframes) - frame;
            if !self.held.is_empty() {
                advance = advance.min(self.step_counter);
            }
            if let Some(g) = self.gate_counter {
                advance = advance.min(g);
            }
            let advance = advance.max(1);

            frame += advance;
            self.step_counter = self.step_counter.saturating_sub(advance);
            if let Some(g) = self.gate_counter.as_mut() {
                *g = g.saturating_sub(advance);
            }
        }

        // Events stamped past the block land on its last frame
        let last = nframes.saturating_sub(1) as u32;
        for timed in events {
            self.handle_input(last, &timed.event);
        }

        MidiData::from_midi(&self.output, nframes)
    }
}

/// Passes MIDI through untouched.
#[derive(Default)]
pub struct Bypass {
    pub props: BypassProps,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BypassProps {}

impl Engine for Bypass {
    const NAME: &'static str = "Bypass";
    type Props = BypassProps;

    fn props(&self) -> &BypassProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut BypassProps {
        &mut self.props
    }
}

impl Processor<Arpeggiator> for Bypass {
    fn process<'a>(&'a mut self, _pool: &'a BufferPool, data: MidiData<'a>) -> MidiData<'a> {
        data
    }
}

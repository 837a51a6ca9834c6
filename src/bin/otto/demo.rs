//! Built-in MIDI loop so the binary makes sound without a controller.

use otto_core::io::TimedEvent;

const PROGRESSION: [[u8; 3]; 4] = [[60, 64, 67], [57, 60, 64], [53, 57, 60], [55, 59, 62]];
const CHORD_SECONDS: f32 = 2.0;
const VELOCITY: u8 = 96;

/// Holds each chord of a four-chord loop for two seconds.
pub struct DemoLoop {
    chord_frames: usize,
    position: usize,
    chord: usize,
    events: Vec<TimedEvent>,
}

impl DemoLoop {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            chord_frames: ((sample_rate * CHORD_SECONDS) as usize).max(1),
            position: 0,
            chord: 0,
            events: Vec::with_capacity(32),
        }
    }

    /// Events for the next `nframes` frames, stamped relative to the block.
    pub fn advance(&mut self, nframes: usize) -> &[TimedEvent] {
        self.events.clear();

        let mut frame = 0;
        while frame < nframes {
            if self.position == 0 {
                let previous = (self.chord + PROGRESSION.len() - 1) % PROGRESSION.len();
                for key in PROGRESSION[previous] {
                    self.events.push(TimedEvent::note_off(frame as u32, key));
                }
                for key in PROGRESSION[self.chord] {
                    self.events.push(TimedEvent::note_on(frame as u32, key, VELOCITY));
                }
            }

            let step = (self.chord_frames - self.position).min(nframes - frame);
            frame += step;
            self.position += step;
            if self.position == self.chord_frames {
                self.position = 0;
                self.chord = (self.chord + 1) % PROGRESSION.len();
            }
        }

        &self.events
    }
}

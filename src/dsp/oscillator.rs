use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

/*
| waveform | harmonics           | character       |
| -------- | ------------------- | --------------- |
| sine     | fundamental only    | pure, hollow    |
| saw      | all, falling as 1/n | bright, buzzy   |
| square   | odd, falling as 1/n | woody, hollow   |
| triangle | odd, as 1/n²        | soft, mellow    |
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waveform {
    Sine,
    Saw,
    Square,
    Triangle,
}

/// Phase accumulator in cycles, `0.0..1.0`.
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub waveform: Waveform,
    phase: f32,
}

impl Oscillator {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
        }
    }

    /// Emit one sample at the current phase, then advance by `increment`
    /// cycles (frequency / sample rate).
    #[inline]
    pub fn next_sample(&mut self, increment: f32) -> f32 {
        let p = self.phase;
        let out = match self.waveform {
            Waveform::Sine => (TAU * p).sin(),
            Waveform::Saw => 2.0 * p - 1.0,
            Waveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
        };

        self.phase += increment;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }
        out
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

use serde::{Deserialize, Serialize};

use crate::MIN_TIME;

/*
ADSR Envelope
=============

Linear ramps, one state machine per voice:

    Level
      1.0 ┐     ╱╲
          │    ╱  ╲___________
      S   │   ╱               ╲
          │  ╱                 ╲
      0.0 └─╱───────────────────╲──→ Time
           Attack Decay  Sustain  Release

  Idle ──gate on──→ Attack ──level=1──→ Decay ──level=S──→ Sustain
    ↑                  │                  │                   │
    │                  └──────── gate off ┴───────────────────┘
    │                                     ↓
    └─────────────level=0──────────── Release

Gate off releases from wherever the level is, so an early note-off during
the attack fades from the partial level instead of jumping to sustain first.

Per-sample increments come from the stage time and the sample rate:

    increment = change / (seconds * sample_rate)

Release snapshots its start level and length at gate-off and interpolates,
so it always lands on exactly 0.
*/

/// Envelope times in seconds plus the sustain level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Adsr {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    /// Times floored at one sample, sustain clamped to 0..=1.
    fn sanitized(self) -> Self {
        Self {
            attack: self.attack.max(MIN_TIME),
            decay: self.decay.max(MIN_TIME),
            sustain: self.sustain.clamp(0.0, 1.0),
            release: self.release.max(MIN_TIME),
        }
    }
}

impl Default for Adsr {
    fn default() -> Self {
        Self::new(0.01, 0.1, 0.7, 0.3)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

#[derive(Debug, Clone)]
pub struct Envelope {
    params: Adsr,
    stage: EnvelopeStage,
    level: f32,

    release_start: f32,
    release_total: u32,
    release_elapsed: u32,
}

impl Envelope {
    pub fn new(params: Adsr) -> Self {
        Self {
            params: params.sanitized(),
            stage: EnvelopeStage::Idle,
            level: 0.0,
            release_start: 0.0,
            release_total: 1,
            release_elapsed: 0,
        }
    }

    /// Takes effect from the next sample. A running release keeps its length.
    pub fn set_params(&mut self, params: Adsr) {
        self.params = params.sanitized();
    }

    pub fn params(&self) -> Adsr {
        self.params
    }

    /// Gate high. Retriggers from zero so repeated notes stay distinct.
    pub fn note_on(&mut self) {
        self.level = 0.0;
        self.stage = EnvelopeStage::Attack;
        self.release_elapsed = 0;
    }

    /// Gate low. Starts the release from the current level.
    pub fn note_off(&mut self, sample_rate: f32) {
        if self.stage == EnvelopeStage::Idle {
            return;
        }
        self.release_start = self.level;
        self.release_total = (self.params.release * sample_rate).round().max(1.0) as u32;
        self.release_elapsed = 0;
        self.stage = EnvelopeStage::Release;
    }

    /// Advance one sample and return the new level.
    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => self.level = 0.0,
            EnvelopeStage::Attack => {
                self.level += 1.0 / (self.params.attack * sample_rate);
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                }
            }
            EnvelopeStage::Decay => {
                let target = self.params.sustain;
                self.level -= (1.0 - target) / (self.params.decay * sample_rate);
                if self.level <= target {
                    self.level = target;
                    self.stage = EnvelopeStage::Sustain;
                }
            }
            EnvelopeStage::Sustain => self.level = self.params.sustain,
            EnvelopeStage::Release => {
                let progress = self.release_elapsed as f32 / self.release_total as f32;
                self.level = (self.release_start * (1.0 - progress)).max(0.0);
                self.release_elapsed = self.release_elapsed.saturating_add(1);
                if self.release_elapsed >= self.release_total {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    pub fn is_releasing(&self) -> bool {
        self.stage == EnvelopeStage::Release
    }

    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
        self.release_elapsed = 0;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new(Adsr::default())
    }
}

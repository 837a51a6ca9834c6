use std::f32::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use crate::{
    audio::{BufferPool, MonoData, StereoData},
    dsp::DelayLine,
    engine::{Effect, Engine, Processor},
    AudioConfig,
};

const BASE_DELAY_MS: f32 = 20.0;
const MAX_DEPTH_MS: f32 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChorusProps {
    /// LFO speed in Hz.
    pub rate: f32,
    /// How far the delay swings either side of 20ms.
    pub depth_ms: f32,
    pub mix: f32,
}

impl Default for ChorusProps {
    fn default() -> Self {
        Self {
            rate: 0.8,
            depth_ms: 2.0,
            mix: 0.5,
        }
    }
}

/// Modulated delay read twice, the right tap half an LFO cycle behind the
/// left, so the two sides detune in opposite directions.
pub struct Chorus {
    pub props: ChorusProps,
    line: DelayLine,
    lfo_phase: f32,
    sample_rate: f32,
}

impl Chorus {
    pub fn new() -> Self {
        let mut chorus = Self {
            props: ChorusProps::default(),
            line: DelayLine::with_capacity(2),
            lfo_phase: 0.0,
            sample_rate: crate::DEFAULT_SAMPLE_RATE,
        };
        chorus.init(&AudioConfig::default());
        chorus
    }
}

impl Default for Chorus {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for Chorus {
    const NAME: &'static str = "Chorus";
    type Props = ChorusProps;

    fn props(&self) -> &ChorusProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut ChorusProps {
        &mut self.props
    }

    fn init(&mut self, config: &AudioConfig) {
        let max_ms = BASE_DELAY_MS + MAX_DEPTH_MS;
        self.line.resize(config.frames(max_ms * 0.001) + 2);
        self.lfo_phase = 0.0;
        self.sample_rate = config.sample_rate;
    }

    fn reset(&mut self) {
        self.line.reset();
        self.lfo_phase = 0.0;
    }
}

impl Processor<Effect> for Chorus {
    fn process<'a>(&'a mut self, pool: &'a BufferPool, data: MonoData<'a>) -> StereoData<'a> {
        let out = data.redirect(pool.allocate_multi::<2>());

        let ms_to_samples = self.sample_rate * 0.001;
        let depth = self.props.depth_ms.clamp(0.0, MAX_DEPTH_MS) * ms_to_samples;
        let base = BASE_DELAY_MS * ms_to_samples;
        let phase_inc = TAU * self.props.rate.clamp(0.01, 10.0) / self.sample_rate;
        let mix = self.props.mix.clamp(0.0, 1.0);

        for (input, frame) in data.channel(0).iter().zip(out.frames()) {
            let dry = input.get();
            self.line.write(dry);

            let left = self.line.read_interpolated(base + depth * self.lfo_phase.sin());
            let right = self.line.read_interpolated(base + depth * (self.lfo_phase + PI).sin());
            frame.set_channel(0, dry + (left - dry) * mix);
            frame.set_channel(1, dry + (right - dry) * mix);

            self.lfo_phase += phase_inc;
            if self.lfo_phase >= TAU {
                self.lfo_phase -= TAU;
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_mix_passes_input_to_both_sides() {
        let pool = BufferPool::new(32);
        let mut chorus = Chorus::new();
        chorus.props.mix = 0.0;

        let input = pool.allocate();
        input.fill(0.5);
        let out = chorus.process(&pool, MonoData::mono(input));

        assert!(out.frames().all(|f| f == crate::frame![0.5, 0.5]));
        assert_eq!(pool.in_use(), 2, "send buffer returned to the pool");
    }

    #[test]
    fn test_sides_differ_when_modulated() {
        let pool = BufferPool::new(2048);
        let mut chorus = Chorus::new();
        chorus.props = ChorusProps {
            rate: 5.0,
            depth_ms: 5.0,
            mix: 1.0,
        };

        let input = pool.allocate();
        for i in 0..input.len() {
            input.set(i, (i as f32 * 0.05).sin());
        }
        let out = chorus.process(&pool, MonoData::mono(input));

        let diff: f32 = out.frames().skip(1500).map(|f| (f.channel(0) - f.channel(1)).abs()).sum();
        assert!(diff > 1.0, "expected stereo spread, got {diff}");
    }
}

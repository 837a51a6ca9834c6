use serde::{Deserialize, Serialize};

use crate::{
    audio::{BufferPool, MonoData, StereoData},
    dsp::DelayLine,
    engine::{Effect, Engine, Processor},
    AudioConfig,
};

/*
Ping-pong delay
===============

   send ──(+)──→ [ left line ] ──┬──→ left out
           ↑                     │
           │                     ↓ × feedback
           │                 [ right line ] ──┬──→ right out
           │                                  │
           └──────────── × feedback ──────────┘

Each echo lands on the opposite side from the one before. `spread` narrows
the pair through a mid/side blend: 1 keeps full ping-pong, 0 sums both
sides to the centre.

The return is wet only. The dry signal reaches the mix through the sends.
*/

const MAX_DELAY_SECONDS: f32 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayProps {
    pub time_ms: f32,
    pub feedback: f32,
    pub spread: f32,
}

impl Default for DelayProps {
    fn default() -> Self {
        Self {
            time_ms: 300.0,
            feedback: 0.4,
            spread: 1.0,
        }
    }
}

pub struct Delay {
    pub props: DelayProps,
    left: DelayLine,
    right: DelayLine,
    sample_rate: f32,
}

impl Delay {
    pub fn new() -> Self {
        let capacity = AudioConfig::default().frames(MAX_DELAY_SECONDS) + 1;
        Self {
            props: DelayProps::default(),
            left: DelayLine::with_capacity(capacity),
            right: DelayLine::with_capacity(capacity),
            sample_rate: crate::DEFAULT_SAMPLE_RATE,
        }
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for Delay {
    const NAME: &'static str = "Delay";
    type Props = DelayProps;

    fn props(&self) -> &DelayProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut DelayProps {
        &mut self.props
    }

    fn init(&mut self, config: &AudioConfig) {
        let capacity = config.frames(MAX_DELAY_SECONDS) + 1;
        self.left.resize(capacity);
        self.right.resize(capacity);
        self.sample_rate = config.sample_rate;
    }

    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}

impl Processor<Effect> for Delay {
    fn process<'a>(&'a mut self, pool: &'a BufferPool, data: MonoData<'a>) -> StereoData<'a> {
        let out = data.redirect(pool.allocate_multi::<2>());

        let delay = ((self.props.time_ms * 0.001 * self.sample_rate) as usize).max(1);
        let feedback = self.props.feedback.clamp(0.0, 0.95);
        let side_gain = self.props.spread.clamp(0.0, 1.0);

        for (input, frame) in data.channel(0).iter().zip(out.frames()) {
            // Read before write so a delay of N is N samples, not N - 1
            let l = self.left.read(delay - 1);
            let r = self.right.read(delay - 1);
            self.left.write(input.get() + r * feedback);
            self.right.write(l * feedback);

            let mid = (l + r) * 0.5;
            let side = (l - r) * 0.5 * side_gain;
            frame.set_channel(0, mid + side);
            frame.set_channel(1, mid - side);
        }

        out
    }
}

use serde::{Deserialize, Serialize};

use crate::{
    audio::{BufferPool, MonoData},
    dsp::{Adsr, SVFilter, Waveform},
    engine::{Engine, Processor, Synth},
    engines::synth::VoiceBank,
    AudioConfig,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtractiveProps {
    pub envelope: Adsr,
    pub cutoff: f32,
    pub resonance: f32,
    pub volume: f32,
}

impl Default for SubtractiveProps {
    fn default() -> Self {
        Self {
            envelope: Adsr::new(0.01, 0.3, 0.5, 0.5),
            cutoff: 1_800.0,
            resonance: 0.3,
            volume: 0.25,
        }
    }
}

/// Saw voices summed through one resonant lowpass.
pub struct Subtractive {
    pub props: SubtractiveProps,
    voices: VoiceBank,
    filter: SVFilter,
    sample_rate: f32,
}

impl Subtractive {
    pub fn new() -> Self {
        Self {
            props: SubtractiveProps::default(),
            voices: VoiceBank::new(Waveform::Saw),
            filter: SVFilter::lowpass(),
            sample_rate: crate::DEFAULT_SAMPLE_RATE,
        }
    }
}

impl Default for Subtractive {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for Subtractive {
    const NAME: &'static str = "Subtractive";
    type Props = SubtractiveProps;

    fn props(&self) -> &SubtractiveProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut SubtractiveProps {
        &mut self.props
    }

    fn init(&mut self, config: &AudioConfig) {
        self.sample_rate = config.sample_rate;
        self.voices.init(config.sample_rate);
        self.filter.reset();
    }
}

impl Processor<Synth> for Subtractive {
    fn process<'a>(&'a mut self, pool: &'a BufferPool, data: MonoData<'a>) -> MonoData<'a> {
        let out = pool.allocate();
        let cells = &out.cells()[..data.nframes];

        self.voices.set_envelope(self.props.envelope);
        self.voices.render(cells, data.midi);

        self.filter
            .prepare(self.props.cutoff, self.props.resonance, self.sample_rate);
        let volume = self.props.volume;
        for sample in cells {
            sample.set(self.filter.tick(sample.get()) * volume);
        }

        data.redirect_mono(out)
    }
}

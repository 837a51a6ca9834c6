use serde::{Deserialize, Serialize};

use crate::{
    audio::{BufferPool, MonoData},
    dsp::{Adsr, Waveform},
    engine::{Engine, Processor, Synth},
    engines::synth::VoiceBank,
    AudioConfig,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SineProps {
    pub envelope: Adsr,
    pub volume: f32,
}

impl Default for SineProps {
    fn default() -> Self {
        Self {
            envelope: Adsr::new(0.005, 0.2, 0.6, 0.4),
            volume: 0.3,
        }
    }
}

/// Plain sine voices. External audio on the input is ignored.
pub struct SineSynth {
    pub props: SineProps,
    voices: VoiceBank,
}

impl SineSynth {
    pub fn new() -> Self {
        Self {
            props: SineProps::default(),
            voices: VoiceBank::new(Waveform::Sine),
        }
    }

    pub fn voices(&self) -> &VoiceBank {
        &self.voices
    }
}

impl Default for SineSynth {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for SineSynth {
    const NAME: &'static str = "Sine";
    type Props = SineProps;

    fn props(&self) -> &SineProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut SineProps {
        &mut self.props
    }

    fn init(&mut self, config: &AudioConfig) {
        self.voices.init(config.sample_rate);
    }
}

impl Processor<Synth> for SineSynth {
    fn process<'a>(&'a mut self, pool: &'a BufferPool, data: MonoData<'a>) -> MonoData<'a> {
        let out = pool.allocate();
        let cells = &out.cells()[..data.nframes];

        self.voices.set_envelope(self.props.envelope);
        self.voices.render(cells, data.midi);
        out.scale(self.props.volume);

        data.redirect_mono(out)
    }
}

use serde_json::{Map, Value};

use crate::{
    audio::{BufferPool, MonoData, StereoData},
    engine::{
        AnyEngine, Arpeggiator, Effect, EngineCommand, EngineDispatcher, EngineSlot, Processor,
        Synth,
    },
    engines::{Arp, Bypass, Chorus, Delay, Master, Sends, SineSynth, Subtractive},
    frame, AudioConfig, EngineError,
};

/*
Signal graph
============

                    external in (mono audio + MIDI)
                        │
              midi_only │
                        ↓
                 ┌─────────────┐
                 │ Arpeggiator │
                 └─────────────┘
                        │ MIDI
   external audio ──redirect──┐
                        ↓     │
                 ┌─────────────┐
                 │    Synth    │
                 └─────────────┘
                        │ dry (mono)
          ┌─────── × to_fx1 ───┼─── × to_fx2 ───────┐
          ↓                    │                    ↓
   ┌─────────────┐             │             ┌─────────────┐
   │  Effect 1   │             │             │  Effect 2   │
   └─────────────┘             │             └─────────────┘
          │ stereo             │ × dry, pan         │ stereo
          └───────────────────(+)───────────────────┘
                               ↓
                        ┌─────────────┐
                        │   Master    │
                        └─────────────┘
                               ↓
                          stereo out

Pool use peaks at six slots while effect 2 runs: the synth output, the
effect 1 return pair, the effect 2 send, and the effect 2 return pair.
Effect 1's return pair carries the mix into the master stage, which
scales it in place.
*/

pub type ArpDispatcher = EngineDispatcher<Arpeggiator, (Bypass, Arp)>;
pub type SynthDispatcher = EngineDispatcher<Synth, (Subtractive, SineSynth)>;
pub type EffectDispatcher = EngineDispatcher<Effect, (Delay, Chorus)>;

/// Keys of the saved state document.
const STATE_KEYS: [&str; 6] = ["Synth", "Effect1", "Effect2", "Master", "Arpeggiator", "Sends"];

/// Owns every engine in the graph and runs it one block at a time.
pub struct EngineManager {
    config: AudioConfig,
    pub arpeggiator: ArpDispatcher,
    pub synth: SynthDispatcher,
    pub effect1: EffectDispatcher,
    pub effect2: EffectDispatcher,
    pub sends: Sends,
    pub master: Master,
}

impl EngineManager {
    pub fn new(config: AudioConfig) -> Self {
        let mut effect2 = EffectDispatcher::new((Delay::new(), Chorus::new()), true);
        // Chorus on the second bus; index 1 always exists
        let _ = effect2.select(1);

        Self {
            config,
            arpeggiator: EngineDispatcher::new((Bypass::default(), Arp::new()), true),
            synth: EngineDispatcher::new((Subtractive::new(), SineSynth::new()), false),
            effect1: EffectDispatcher::new((Delay::new(), Chorus::new()), true),
            effect2,
            sends: Sends::default(),
            master: Master::default(),
        }
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// Initialize every dispatcher for `config`. Call before the first block
    /// and after any change to the stream.
    pub fn start(&mut self, config: &AudioConfig) {
        self.config = *config;
        self.arpeggiator.init(config);
        self.synth.init(config);
        self.effect1.init(config);
        self.effect2.init(config);
        tracing::info!(
            sample_rate = config.sample_rate,
            buffer_size = config.buffer_size,
            "engines started"
        );
    }

    /// Run the graph for one block.
    ///
    /// Every buffer taken from `pool` in here is either released before
    /// returning or part of the returned envelope.
    pub fn process<'a>(&'a mut self, pool: &'a BufferPool, external_in: MonoData<'a>) -> StereoData<'a> {
        let nframes = external_in.nframes;

        let arp_out = self.arpeggiator.process(pool, external_in.midi_only());
        let mut synth_out = self
            .synth
            .process(pool, arp_out.redirect(external_in.into_audio()));

        let sends = &self.sends.props;
        let [fx1_bus, fx2_bus] = pool.allocate_multi::<2>();
        for ((dry, fx1), fx2) in synth_out
            .channel(0)
            .iter()
            .zip(fx1_bus.cells())
            .zip(fx2_bus.cells())
        {
            fx1.set(dry.get() * sends.to_fx1);
            fx2.set(dry.get() * sends.to_fx2);
        }

        let fx1_out = self
            .effect1
            .process(pool, MonoData::new([fx1_bus], &[], nframes));
        let mut fx2_out = self
            .effect2
            .process(pool, MonoData::new([fx2_bus], &[], nframes));

        let (dry_left, dry_right) = self.sends.dry_gains();
        let dry_gains = frame![dry_left, dry_right];
        for ((mut wet, other), dry) in fx1_out
            .frames()
            .zip(fx2_out.frames())
            .zip(synth_out.channel(0))
        {
            wet += other + dry_gains * dry.get();
        }

        synth_out.release();
        fx2_out.release();

        self.master.process(pool, fx1_out)
    }

    /// The selected engine in the named slot.
    pub fn by_name(&self, name: &str) -> Option<&dyn AnyEngine> {
        EngineSlot::by_name(name).map(|slot| self.current(slot))
    }

    pub fn current(&self, slot: EngineSlot) -> &dyn AnyEngine {
        match slot {
            EngineSlot::Arpeggiator => self.arpeggiator.current(),
            EngineSlot::Synth => self.synth.current(),
            EngineSlot::Effect1 => self.effect1.current(),
            EngineSlot::Effect2 => self.effect2.current(),
        }
    }

    pub fn current_mut(&mut self, slot: EngineSlot) -> &mut dyn AnyEngine {
        match slot {
            EngineSlot::Arpeggiator => self.arpeggiator.current_mut(),
            EngineSlot::Synth => self.synth.current_mut(),
            EngineSlot::Effect1 => self.effect1.current_mut(),
            EngineSlot::Effect2 => self.effect2.current_mut(),
        }
    }

    pub fn select(&mut self, slot: EngineSlot, index: usize) -> Result<(), EngineError> {
        match slot {
            EngineSlot::Arpeggiator => self.arpeggiator.select(index),
            EngineSlot::Synth => self.synth.select(index),
            EngineSlot::Effect1 => self.effect1.select(index),
            EngineSlot::Effect2 => self.effect2.select(index),
        }
    }

    pub fn select_by_name(&mut self, slot: EngineSlot, name: &str) -> Result<(), EngineError> {
        match slot {
            EngineSlot::Arpeggiator => self.arpeggiator.select_by_name(name),
            EngineSlot::Synth => self.synth.select_by_name(name),
            EngineSlot::Effect1 => self.effect1.select_by_name(name),
            EngineSlot::Effect2 => self.effect2.select_by_name(name),
        }
    }

    pub fn selected_name(&self, slot: EngineSlot) -> &'static str {
        match slot {
            EngineSlot::Arpeggiator => self.arpeggiator.selected_name(),
            EngineSlot::Synth => self.synth.selected_name(),
            EngineSlot::Effect1 => self.effect1.selected_name(),
            EngineSlot::Effect2 => self.effect2.selected_name(),
        }
    }

    /// Apply a command from the control thread. Bad indices are ignored so a
    /// stale command can never stop the audio thread.
    pub fn apply(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Select { slot, index } => {
                let _ = self.select(slot, index);
            }
            EngineCommand::Cycle { slot } => match slot {
                EngineSlot::Arpeggiator => self.arpeggiator.cycle(),
                EngineSlot::Synth => self.synth.cycle(),
                EngineSlot::Effect1 => self.effect1.cycle(),
                EngineSlot::Effect2 => self.effect2.cycle(),
            },
        }
    }

    pub fn to_json(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("Synth".into(), self.synth.to_json());
        doc.insert("Effect1".into(), self.effect1.to_json());
        doc.insert("Effect2".into(), self.effect2.to_json());
        doc.insert("Master".into(), AnyEngine::to_json(&self.master));
        doc.insert("Arpeggiator".into(), self.arpeggiator.to_json());
        doc.insert("Sends".into(), AnyEngine::to_json(&self.sends));
        Value::Object(doc)
    }

    /// Load a document written by [`to_json`](Self::to_json). Missing
    /// sections keep their current state.
    pub fn from_json(&mut self, value: &Value) -> Result<(), EngineError> {
        let Some(doc) = value.as_object() else {
            return Err(EngineError::MalformedDocument {
                key: "Engines".into(),
                reason: "expected an object",
            });
        };

        for key in doc.keys().filter(|k| !STATE_KEYS.contains(&k.as_str())) {
            tracing::warn!(key = %key, "ignoring unknown section in engine state");
        }

        if let Some(v) = doc.get("Synth") {
            self.synth.from_json(v)?;
        }
        if let Some(v) = doc.get("Effect1") {
            self.effect1.from_json(v)?;
        }
        if let Some(v) = doc.get("Effect2") {
            self.effect2.from_json(v)?;
        }
        if let Some(v) = doc.get("Master") {
            self.master.from_json(v)?;
        }
        if let Some(v) = doc.get("Arpeggiator") {
            self.arpeggiator.from_json(v)?;
        }
        if let Some(v) = doc.get("Sends") {
            self.sends.from_json(v)?;
        }
        tracing::info!("engine state loaded");
        Ok(())
    }
}

impl Default for EngineManager {
    fn default() -> Self {
        Self::new(AudioConfig::default())
    }
}

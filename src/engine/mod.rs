//! Engine roles, the traits every engine implements, and the dispatchers
//! that switch between interchangeable engines at runtime.

pub mod dispatcher;
pub mod manager;
pub mod message;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{
    audio::{BufferPool, MidiData, MonoData, StereoData},
    AudioConfig, EngineError,
};

pub use dispatcher::{EngineDispatcher, EngineSet};
pub use manager::EngineManager;
pub use message::{CommandReceiver, EngineCommand, EngineSlot};

/// Where in the graph an engine sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineKind {
    Arpeggiator,
    Synth,
    Effect,
    Misc,
}

/// A position in the graph and the envelopes that cross it.
///
/// Roles are type-level tags. An engine that implements [`Processor<Synth>`]
/// can only be put in a dispatcher for synths, and the compiler checks that
/// it takes mono audio with MIDI and hands back mono audio.
pub trait Role: 'static {
    const KIND: EngineKind;
    type Input<'a>;
    type Output<'a>;
}

/// MIDI in, MIDI out.
pub enum Arpeggiator {}
/// External audio plus MIDI in, one voice bus out.
pub enum Synth {}
/// A mono send in, a stereo return out.
pub enum Effect {}
/// Stereo in, stereo out. Master bus and utilities.
pub enum Misc {}

impl Role for Arpeggiator {
    const KIND: EngineKind = EngineKind::Arpeggiator;
    type Input<'a> = MidiData<'a>;
    type Output<'a> = MidiData<'a>;
}

impl Role for Synth {
    const KIND: EngineKind = EngineKind::Synth;
    type Input<'a> = MonoData<'a>;
    type Output<'a> = MonoData<'a>;
}

impl Role for Effect {
    const KIND: EngineKind = EngineKind::Effect;
    type Input<'a> = MonoData<'a>;
    type Output<'a> = StereoData<'a>;
}

impl Role for Misc {
    const KIND: EngineKind = EngineKind::Misc;
    type Input<'a> = StereoData<'a>;
    type Output<'a> = StereoData<'a>;
}

/// State shared by every engine: a name and a serializable set of props.
///
/// Props are plain data. Engines read them at the start of each block, so
/// replacing them from JSON between blocks takes effect on the next one.
pub trait Engine: Send {
    const NAME: &'static str;
    type Props: Serialize + DeserializeOwned;

    fn props(&self) -> &Self::Props;
    fn props_mut(&mut self) -> &mut Self::Props;

    /// Size internal state for the stream. Called off the audio thread, may
    /// allocate.
    fn init(&mut self, _config: &AudioConfig) {}

    /// Clear running state (delay lines, held notes, counters) in place.
    /// Runs on the audio thread when a dispatcher switches to this engine,
    /// so it must not allocate.
    fn reset(&mut self) {}
}

/// Runs one block for role `R`.
///
/// Buffers for the output come from `pool`. Implementations must not
/// allocate, lock or block.
pub trait Processor<R: Role>: Engine {
    fn process<'a>(&'a mut self, pool: &'a BufferPool, data: R::Input<'a>) -> R::Output<'a>;
}

/// Object-safe view of an [`Engine`] for selectors and persistence.
pub trait AnyEngine {
    fn name(&self) -> &'static str;
    fn to_json(&self) -> Value;
    fn from_json(&mut self, value: &Value) -> Result<(), EngineError>;
}

impl<E: Engine> AnyEngine for E {
    fn name(&self) -> &'static str {
        E::NAME
    }

    fn to_json(&self) -> Value {
        serde_json::to_value(self.props()).unwrap_or_else(|err| {
            tracing::error!(engine = E::NAME, %err, "failed to serialize engine props");
            Value::Null
        })
    }

    fn from_json(&mut self, value: &Value) -> Result<(), EngineError> {
        let props = E::Props::deserialize(value).map_err(|source| EngineError::InvalidState {
            engine: E::NAME,
            source,
        })?;
        *self.props_mut() = props;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default, Serialize, Deserialize)]
    #[serde(default)]
    struct GainProps {
        gain: f32,
        muted: bool,
    }

    #[derive(Default)]
    struct Gain {
        props: GainProps,
    }

    impl Engine for Gain {
        const NAME: &'static str = "Gain";
        type Props = GainProps;

        fn props(&self) -> &GainProps {
            &self.props
        }

        fn props_mut(&mut self) -> &mut GainProps {
            &mut self.props
        }
    }

    #[test]
    fn test_any_engine_round_trips_props() {
        let mut gain = Gain::default();
        gain.props.gain = 0.5;
        let saved = AnyEngine::to_json(&gain);
        assert_eq!(saved, json!({ "gain": 0.5, "muted": false }));

        let mut loaded = Gain::default();
        loaded.from_json(&saved).unwrap();
        assert_eq!(loaded.props.gain, 0.5);
        assert_eq!(loaded.name(), "Gain");
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let mut gain = Gain::default();
        gain.props.gain = 0.9;
        gain.from_json(&json!({ "muted": true })).unwrap();
        assert_eq!(gain.props.gain, 0.0);
        assert!(gain.props.muted);
    }

    #[test]
    fn test_wrong_type_is_reported_with_engine_name() {
        let mut gain = Gain::default();
        let err = gain.from_json(&json!({ "gain": "loud" })).unwrap_err();
        assert!(matches!(err, EngineError::InvalidState { engine: "Gain", .. }));
    }
}

use serde::{Deserialize, Serialize};

use crate::{
    audio::{BufferPool, StereoData},
    engine::{Engine, Misc, Processor},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterProps {
    pub volume: f32,
}

impl Default for MasterProps {
    fn default() -> Self {
        Self { volume: 0.5 }
    }
}

/// Final gain stage. Scales the mix in place.
#[derive(Default)]
pub struct Master {
    pub props: MasterProps,
}

impl Engine for Master {
    const NAME: &'static str = "Master";
    type Props = MasterProps;

    fn props(&self) -> &MasterProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut MasterProps {
        &mut self.props
    }
}

impl Processor<Misc> for Master {
    fn process<'a>(&'a mut self, _pool: &'a BufferPool, data: StereoData<'a>) -> StereoData<'a> {
        let volume = self.props.volume.clamp(0.0, 1.0);
        for frame in data.frames() {
            frame.set(frame.get() * volume);
        }
        data
    }
}

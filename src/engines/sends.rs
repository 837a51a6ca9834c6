use serde::{Deserialize, Serialize};

use crate::engine::Engine;

/// Send levels from the synth bus.
///
/// Not a processor: the graph reads these gains while splitting the synth
/// output into the two effect buses and while mixing the dry signal back in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SendsProps {
    pub to_fx1: f32,
    pub to_fx2: f32,
    pub dry: f32,
    /// -1 is hard left, 1 hard right.
    pub dry_pan: f32,
}

impl Default for SendsProps {
    fn default() -> Self {
        Self {
            to_fx1: 0.3,
            to_fx2: 0.3,
            dry: 0.7,
            dry_pan: 0.0,
        }
    }
}

#[derive(Default)]
pub struct Sends {
    pub props: SendsProps,
}

impl Sends {
    /// Left and right gains for the dry signal.
    pub fn dry_gains(&self) -> (f32, f32) {
        let pan = self.props.dry_pan.clamp(-1.0, 1.0);
        ((1.0 - pan) * self.props.dry, (1.0 + pan) * self.props.dry)
    }
}

impl Engine for Sends {
    const NAME: &'static str = "Sends";
    type Props = SendsProps;

    fn props(&self) -> &SendsProps {
        &self.props
    }

    fn props_mut(&mut self) -> &mut SendsProps {
        &mut self.props
    }
}

use std::collections::VecDeque;

#[cfg(feature = "rtrb")]
use rtrb::Consumer;

/// The switchable positions in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineSlot {
    Arpeggiator,
    Synth,
    Effect1,
    Effect2,
}

impl EngineSlot {
    pub const ALL: [EngineSlot; 4] = [
        EngineSlot::Arpeggiator,
        EngineSlot::Synth,
        EngineSlot::Effect1,
        EngineSlot::Effect2,
    ];

    /// Key used in saved state and by [`EngineManager::by_name`](super::EngineManager::by_name).
    pub fn name(self) -> &'static str {
        match self {
            EngineSlot::Arpeggiator => "Arpeggiator",
            EngineSlot::Synth => "Synth",
            EngineSlot::Effect1 => "Effect1",
            EngineSlot::Effect2 => "Effect2",
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.name() == name)
    }
}

/// Engine switches sent from a control thread to the audio thread.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Select { slot: EngineSlot, index: usize },
    Cycle { slot: EngineSlot },
}

pub trait CommandReceiver {
    fn pop(&mut self) -> Option<EngineCommand>;
}

#[cfg(feature = "rtrb")]
impl CommandReceiver for Consumer<EngineCommand> {
    fn pop(&mut self) -> Option<EngineCommand> {
        Consumer::pop(self).ok()
    }
}

/// Single-threaded queue, for tests and offline rendering.
impl CommandReceiver for VecDeque<EngineCommand> {
    fn pop(&mut self) -> Option<EngineCommand> {
        self.pop_front()
    }
}

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_BUFFER_SIZE, DEFAULT_POOL_CAPACITY, DEFAULT_SAMPLE_RATE};

/// Stream parameters shared by the pool, the runtime and every engine.
///
/// Missing fields fall back to their defaults when loaded from JSON, so a
/// config file only has to name what it changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: f32,
    /// Frames per internal block. Host blocks larger than this are split.
    pub buffer_size: usize,
    pub pool_capacity: usize,
}

impl AudioConfig {
    pub fn new(sample_rate: f32, buffer_size: usize) -> Self {
        Self {
            sample_rate,
            buffer_size,
            ..Self::default()
        }
    }

    /// Seconds to whole frames at this rate.
    pub fn frames(&self, seconds: f32) -> usize {
        (seconds * self.sample_rate).round().max(0.0) as usize
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

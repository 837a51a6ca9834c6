//! Host boundary: owns the pool and the graph, and turns host-sized blocks
//! of plain `f32` slices into internal blocks of `ProcessData`.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use crate::{
    audio::{BufferPool, MonoData},
    engine::{CommandReceiver, EngineManager},
    io::TimedEvent,
    AudioConfig,
};

/// MIDI events forwarded per internal block. Extra events are dropped.
pub const MIDI_CAPACITY: usize = 512;

/// Figures the audio thread publishes after every block, for a control
/// thread to read and log. Nothing on the audio thread logs.
#[derive(Debug, Default)]
pub struct RuntimeStats {
    peak_buffers: AtomicUsize,
    arp_overflowed: AtomicBool,
    blocks: AtomicUsize,
}

impl RuntimeStats {
    /// Pool high-water mark: the most buffers live at once.
    pub fn peak_buffers(&self) -> usize {
        self.peak_buffers.load(Ordering::Relaxed)
    }

    /// The arpeggiator dropped events because a block produced too many.
    pub fn arp_overflowed(&self) -> bool {
        self.arp_overflowed.load(Ordering::Relaxed)
    }

    /// Internal blocks rendered so far.
    pub fn blocks(&self) -> usize {
        self.blocks.load(Ordering::Relaxed)
    }
}

pub struct Runtime {
    config: AudioConfig,
    pool: BufferPool,
    manager: EngineManager,
    commands: Option<Box<dyn CommandReceiver + Send>>,
    midi: Vec<TimedEvent>,
    stats: Arc<RuntimeStats>,
}

impl Runtime {
    pub fn new(config: AudioConfig) -> Self {
        tracing::info!(
            sample_rate = config.sample_rate,
            buffer_size = config.buffer_size,
            pool_capacity = config.pool_capacity,
            "creating runtime"
        );
        Self {
            config,
            pool: BufferPool::with_capacity(config.pool_capacity, config.buffer_size),
            manager: EngineManager::new(config),
            commands: None,
            midi: Vec::with_capacity(MIDI_CAPACITY),
            stats: Arc::default(),
        }
    }

    /// Shared handle to the published stats. Clone it before moving the
    /// runtime into the audio callback.
    pub fn stats(&self) -> Arc<RuntimeStats> {
        Arc::clone(&self.stats)
    }

    /// Drain `commands` at the start of every block.
    pub fn with_commands(mut self, commands: impl CommandReceiver + Send + 'static) -> Self {
        self.commands = Some(Box::new(commands));
        self
    }

    /// Initialize every engine. Call once before the first block.
    pub fn start(&mut self) {
        self.manager.start(&self.config);
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn manager(&self) -> &EngineManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut EngineManager {
        &mut self.manager
    }

    /// Resize the pool and restart the engines for blocks of `buffer_size`.
    pub fn set_buffer_size(&mut self, buffer_size: usize) {
        self.config.buffer_size = buffer_size;
        self.pool.set_buffer_size(buffer_size);
        self.manager.start(&self.config);
    }

    /// Render one host block.
    ///
    /// `input` is the external mono signal and may be shorter than the
    /// block (or empty), the rest reads as silence. `midi` frames count from
    /// the start of the host block. Blocks longer than the configured
    /// buffer size are split, and MIDI is rebased onto each piece.
    pub fn process_block(
        &mut self,
        input: &[f32],
        midi: &[TimedEvent],
        left: &mut [f32],
        right: &mut [f32],
    ) {
        if let Some(commands) = self.commands.as_mut() {
            while let Some(command) = commands.pop() {
                self.manager.apply(command);
            }
        }

        let total = left.len().min(right.len());
        let block = self.pool.buffer_size().max(1);
        let mut offset = 0;

        while offset < total {
            let nframes = (total - offset).min(block);
            let window = offset..offset + nframes;

            self.midi.clear();
            self.midi.extend(
                midi.iter()
                    .filter(|e| window.contains(&(e.frame as usize)))
                    .take(MIDI_CAPACITY)
                    .map(|e| e.shifted(-(offset as i64))),
            );

            let buffer = self.pool.allocate_clear();
            let end = window.end.min(input.len());
            if offset < end {
                buffer.copy_from_slice(&input[offset..end]);
            }

            let out = self
                .manager
                .process(&self.pool, MonoData::new([buffer], &self.midi, nframes));
            out.audio[0].copy_to_slice(&mut left[window.clone()]);
            out.audio[1].copy_to_slice(&mut right[window]);

            offset += nframes;
            self.stats.blocks.fetch_add(1, Ordering::Relaxed);
        }

        self.stats
            .peak_buffers
            .store(self.pool.high_water_mark(), Ordering::Relaxed);
        self.stats.arp_overflowed.store(
            self.manager.arpeggiator.engines().1.overflowed(),
            Ordering::Relaxed,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineCommand, EngineSlot};
    use std::collections::VecDeque;

    fn runtime(buffer_size: usize) -> Runtime {
        let mut runtime = Runtime::new(AudioConfig::new(48_000.0, buffer_size));
        runtime.start();
        runtime
    }

    #[test]
    fn test_long_host_block_is_split() {
        let mut runtime = runtime(64);
        let mut left = vec![1.0; 200];
        let mut right = vec![1.0; 200];

        runtime.process_block(&[], &[TimedEvent::note_on(150, 60, 100)], &mut left, &mut right);

        assert!(left[..150].iter().all(|&s| s == 0.0), "silent before the note");
        assert!(left[150..].iter().any(|&s| s != 0.0), "note lands in the third piece");
        assert_eq!(runtime.pool().in_use(), 0);
    }

    #[test]
    fn test_commands_apply_before_the_block() {
        let mut queue = VecDeque::new();
        queue.push_back(EngineCommand::Cycle {
            slot: EngineSlot::Synth,
        });
        let mut runtime = Runtime::new(AudioConfig::new(48_000.0, 32)).with_commands(queue);
        runtime.start();

        let (mut left, mut right) = (vec![0.0; 32], vec![0.0; 32]);
        runtime.process_block(&[], &[], &mut left, &mut right);
        assert_eq!(runtime.manager().selected_name(EngineSlot::Synth), "Sine");
    }

    #[test]
    fn test_stats_follow_blocks() {
        let mut runtime = runtime(64);
        let stats = runtime.stats();
        assert_eq!(stats.blocks(), 0);

        let (mut left, mut right) = (vec![0.0; 200], vec![0.0; 200]);
        runtime.process_block(&[], &[TimedEvent::note_on(0, 60, 100)], &mut left, &mut right);

        assert_eq!(stats.blocks(), 4);
        assert_eq!(stats.peak_buffers(), runtime.pool().high_water_mark());
        assert!(stats.peak_buffers() >= 2);
        assert!(!stats.arp_overflowed());
    }

    #[test]
    fn test_set_buffer_size_changes_pieces() {
        let mut runtime = runtime(64);
        runtime.set_buffer_size(16);
        assert_eq!(runtime.pool().buffer_size(), 16);

        let (mut left, mut right) = (vec![0.0; 40], vec![0.0; 40]);
        runtime.process_block(&[0.5; 40], &[], &mut left, &mut right);
        assert_eq!(runtime.pool().in_use(), 0);
    }
}

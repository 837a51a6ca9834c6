use std::cell::Cell;

use crate::{
    audio::{
        frame::{zip_channels, ZipChannels},
        handle::BufferHandle,
    },
    io::midi::TimedEvent,
};

/*
Process Envelopes
=================

Everything an engine sees for one block travels in a `ProcessData`:

  audio     N buffer handles, one per channel
  midi      events for this block, ordered by frame
  nframes   how many frames of each buffer are valid

The channel count is part of the type, so a stage that wants stereo cannot
be handed mono by accident:

  MidiData   = ProcessData<0>   arpeggiators, sequencers
  MonoData   = ProcessData<1>   synth output, effect sends
  StereoData = ProcessData<2>   effect returns, master bus

Derived envelopes never copy samples. They clone handles (bumping the slot
counts) or leave them out:

  audio_only   same audio, no MIDI
  midi_only    same MIDI, no audio
  redirect     same MIDI and frame count, different buffers
  slice        a time window over the same buffers, MIDI left as is

`redirect` is how a stage hands its own output buffers downstream without
losing the block's MIDI and timing: the synth allocates a fresh buffer,
renders into it and returns `input.redirect_mono(out)`.
*/

/// Audio buffers, MIDI events and frame count for one processing block.
#[derive(Debug, Clone)]
pub struct ProcessData<'a, const N: usize> {
    pub audio: [BufferHandle<'a>; N],
    pub midi: &'a [TimedEvent],
    pub nframes: usize,
}

pub type MidiData<'a> = ProcessData<'a, 0>;
pub type MonoData<'a> = ProcessData<'a, 1>;
pub type StereoData<'a> = ProcessData<'a, 2>;

impl<'a, const N: usize> ProcessData<'a, N> {
    pub const CHANNELS: usize = N;

    /// `nframes` must not exceed the length of any buffer.
    pub fn new(audio: [BufferHandle<'a>; N], midi: &'a [TimedEvent], nframes: usize) -> Self {
        debug_assert!(
            audio.iter().all(|h| h.len() >= nframes),
            "nframes ({nframes}) exceeds a buffer in the envelope"
        );
        Self {
            audio,
            midi,
            nframes,
        }
    }

    /// Frame count taken from the first buffer.
    pub fn with_midi(audio: [BufferHandle<'a>; N], midi: &'a [TimedEvent]) -> Self {
        let nframes = audio.first().map_or(0, BufferHandle::len);
        Self::new(audio, midi, nframes)
    }

    pub fn from_audio(audio: [BufferHandle<'a>; N]) -> Self {
        Self::with_midi(audio, &[])
    }

    pub fn midi_only(&self) -> MidiData<'a> {
        ProcessData {
            audio: [],
            midi: self.midi,
            nframes: self.nframes,
        }
    }

    pub fn audio_only(&self) -> Self {
        Self {
            audio: self.audio.clone(),
            midi: &[],
            nframes: self.nframes,
        }
    }

    /// Keep MIDI and frame count, swap in `audio`.
    pub fn redirect<const M: usize>(&self, audio: [BufferHandle<'a>; M]) -> ProcessData<'a, M> {
        ProcessData::new(audio, self.midi, self.nframes)
    }

    pub fn redirect_mono(&self, buffer: BufferHandle<'a>) -> MonoData<'a> {
        self.redirect([buffer])
    }

    /// Frames `idx..idx + length` of every channel. `None` runs to `nframes`.
    ///
    /// MIDI is passed through untouched: event frames still count from the
    /// start of the full block.
    pub fn slice(&self, idx: usize, length: impl Into<Option<usize>>) -> Self {
        let length = length.into().unwrap_or(self.nframes - idx);
        Self {
            audio: std::array::from_fn(|c| self.audio[c].slice(idx, length)),
            midi: self.midi,
            nframes: length,
        }
    }

    /// One pointer per channel to the first sample of the block.
    pub fn raw_audio_buffers(&self) -> [*mut f32; N] {
        std::array::from_fn(|c| self.audio[c].as_ptr())
    }

    /// The valid part of channel `c`.
    pub fn channel(&self, c: usize) -> &'a [Cell<f32>] {
        &self.audio[c].cells()[..self.nframes]
    }

    /// Iterate the block frame by frame across all channels.
    pub fn frames(&self) -> ZipChannels<'a, N> {
        zip_channels(std::array::from_fn(|c| self.channel(c)))
    }

    /// Drop every buffer reference now instead of at end of scope.
    pub fn release(&mut self) {
        for handle in &mut self.audio {
            handle.release();
        }
    }

    pub fn into_audio(self) -> [BufferHandle<'a>; N] {
        self.audio
    }
}

impl<'a> MidiData<'a> {
    pub fn from_midi(midi: &'a [TimedEvent], nframes: usize) -> Self {
        Self::new([], midi, nframes)
    }
}

impl<'a> MonoData<'a> {
    pub fn mono(buffer: BufferHandle<'a>) -> Self {
        Self::from_audio([buffer])
    }

    pub fn mono_with_midi(buffer: BufferHandle<'a>, midi: &'a [TimedEvent]) -> Self {
        Self::with_midi([buffer], midi)
    }

    pub fn buffer(&self) -> &BufferHandle<'a> {
        &self.audio[0]
    }

    pub fn into_buffer(self) -> BufferHandle<'a> {
        let [buffer] = self.audio;
        buffer
    }
}

impl<'a> From<BufferHandle<'a>> for MonoData<'a> {
    fn from(buffer: BufferHandle<'a>) -> Self {
        Self::mono(buffer)
    }
}

//! otto - plays the signal core through the default output device
//!
//! Run with: cargo run -- [--config audio.json] [--state engines.json]
//! Log level comes from RUST_LOG, e.g. RUST_LOG=otto_core=debug.

mod demo;

use std::{fs, path::PathBuf, thread, time::Duration};

use color_eyre::eyre::{bail, eyre, Result, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::RingBuffer;
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

use otto_core::{
    engine::{EngineCommand, EngineSlot},
    runtime::Runtime,
    AudioConfig, MAX_BLOCK_SIZE,
};

use demo::DemoLoop;

/// Seconds between automatic engine switches.
const CYCLE_INTERVAL: Duration = Duration::from_secs(8);

#[derive(Default)]
struct Args {
    config: Option<PathBuf>,
    state: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        let slot = match arg.as_str() {
            "--config" => &mut args.config,
            "--state" => &mut args.state,
            other => bail!("unknown argument '{other}', expected --config or --state"),
        };
        let path = iter.next().ok_or_else(|| eyre!("{arg} needs a file path"))?;
        *slot = Some(PathBuf::from(path));
    }
    Ok(args)
}

fn load_json<T: DeserializeOwned>(path: &PathBuf) -> Result<T> {
    let text = fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).wrap_err_with(|| format!("failed to parse {}", path.display()))
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = parse_args()?;

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let supported = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let mut config: AudioConfig = match &args.config {
        Some(path) => load_json(path)?,
        None => AudioConfig::default(),
    };
    config.sample_rate = supported.sample_rate().0 as f32;
    config.buffer_size = config.buffer_size.clamp(1, MAX_BLOCK_SIZE);
    let channels = supported.channels() as usize;

    let (mut commands, receiver) = RingBuffer::<EngineCommand>::new(64);
    let mut runtime = Runtime::new(config).with_commands(receiver);
    runtime
        .manager_mut()
        .select_by_name(EngineSlot::Arpeggiator, "Arp")?;
    if let Some(path) = &args.state {
        let state: serde_json::Value = load_json(path)?;
        runtime
            .manager_mut()
            .from_json(&state)
            .wrap_err_with(|| format!("failed to load engine state from {}", path.display()))?;
    }
    runtime.start();
    let stats = runtime.stats();

    let mut demo = DemoLoop::new(config.sample_rate);
    let mut left = vec![0.0f32; MAX_BLOCK_SIZE];
    let mut right = vec![0.0f32; MAX_BLOCK_SIZE];

    let stream = device.build_output_stream(
        &supported.into(),
        move |data: &mut [f32], _| {
            let total_frames = data.len() / channels;
            let mut frames_written = 0;

            while frames_written < total_frames {
                let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                let midi = demo.advance(frames);
                runtime.process_block(&[], midi, &mut left[..frames], &mut right[..frames]);

                let out = &mut data[frames_written * channels..(frames_written + frames) * channels];
                for (i, frame) in out.chunks_mut(channels).enumerate() {
                    for (ch, sample) in frame.iter_mut().enumerate() {
                        *sample = if ch % 2 == 0 { left[i] } else { right[i] };
                    }
                }
                frames_written += frames;
            }
        },
        |err| tracing::error!(%err, "audio stream error"),
        None,
    )?;

    stream.play()?;
    tracing::info!(
        sample_rate = config.sample_rate,
        channels,
        "playing, press Ctrl+C to stop"
    );

    // The audio thread never logs; its figures are reported from here
    let mut peak_buffers = 0;
    let mut overflow_reported = false;

    let slots = [EngineSlot::Synth, EngineSlot::Effect1, EngineSlot::Effect2, EngineSlot::Arpeggiator];
    for slot in slots.into_iter().cycle() {
        thread::sleep(CYCLE_INTERVAL);

        if stats.peak_buffers() > peak_buffers {
            peak_buffers = stats.peak_buffers();
            tracing::debug!(buffers = peak_buffers, blocks = stats.blocks(), "buffer pool high-water mark raised");
        }
        if stats.arp_overflowed() && !overflow_reported {
            overflow_reported = true;
            tracing::warn!("arpeggiator output full, events were dropped");
        }

        if commands.push(EngineCommand::Cycle { slot }).is_err() {
            tracing::warn!(?slot, "command queue full");
        } else {
            tracing::info!(?slot, "switching engine");
        }
    }
    Ok(())
}

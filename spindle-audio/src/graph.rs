//! Effect graph - cpal output stream with tone filter and echo
//!
//! Signal flow per output frame:
//!   voice → tone filter → out
//!   voice → echo (with feedback) → mix gain → out
//!
//! The stream is opened lazily on the first play attempt.

use crate::delay::EchoDelay;
use crate::filter::ToneFilter;
use crate::player::{SharedVoice, Voice};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use spindle_core::{AudioGraph, GraphError, CUTOFF_MAX_HZ};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Output rate assumed when no device can be queried
pub const FALLBACK_SAMPLE_RATE: u32 = 48000;

/// Largest block rendered in one pass (stereo frames)
const MAX_BLOCK_FRAMES: usize = 4096;

/// Audio output failures
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("No audio output device found")]
    NoDevice,
    #[error("Failed to get audio config: {0}")]
    Config(String),
    #[error("Failed to create audio stream: {0}")]
    BuildStream(String),
    #[error("Failed to start audio: {0}")]
    PlayStream(String),
}

impl From<OutputError> for GraphError {
    fn from(err: OutputError) -> Self {
        GraphError(err.to_string())
    }
}

/// Echo settings fixed at graph construction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EchoSettings {
    pub time_ms: f32,
    pub feedback: f32,
}

impl Default for EchoSettings {
    fn default() -> Self {
        Self {
            time_ms: 250.0,
            feedback: 0.35,
        }
    }
}

/// Filter and echo, owned by the output callback
pub struct DspChain {
    filter: ToneFilter,
    echo: EchoDelay,
}

impl DspChain {
    pub fn new(sample_rate: u32, settings: EchoSettings) -> Self {
        Self {
            filter: ToneFilter::new(sample_rate, CUTOFF_MAX_HZ),
            echo: EchoDelay::new(sample_rate, settings.time_ms, settings.feedback),
        }
    }

    pub fn set_cutoff(&mut self, hz: f32) {
        self.filter.set_cutoff(hz);
    }

    pub fn set_echo_mix(&mut self, mix: f32) {
        self.echo.set_mix(mix);
    }

    /// Run the chain over a stereo interleaved block in place
    pub fn process(&mut self, block: &mut [f32]) {
        for frame in block.chunks_mut(2) {
            if frame.len() < 2 {
                continue;
            }
            let (src_l, src_r) = (frame[0], frame[1]);
            let (dry_l, dry_r) = self.filter.process_frame(src_l, src_r);
            let (wet_l, wet_r) = self.echo.process_frame(src_l, src_r);
            frame[0] = dry_l + wet_l;
            frame[1] = dry_r + wet_r;
        }
    }
}

/// Render one stereo block: voice, then the effect chain
pub fn render_block(voice: &mut Voice, chain: &mut DspChain, block: &mut [f32]) {
    voice.render(block);
    chain.process(block);
}

/// Device output rate, or the fallback when unavailable
pub fn preferred_sample_rate() -> u32 {
    cpal::default_host()
        .default_output_device()
        .and_then(|device| device.default_output_config().ok())
        .map(|config| config.sample_rate().0)
        .unwrap_or(FALLBACK_SAMPLE_RATE)
}

/// Host audio graph backed by a cpal output stream
pub struct EffectGraph {
    voice: SharedVoice,
    settings: EchoSettings,
    chain: Option<Arc<Mutex<DspChain>>>,
    stream: Option<cpal::Stream>,
    sample_rate: Option<u32>,
}

impl EffectGraph {
    pub fn new(voice: SharedVoice, settings: EchoSettings) -> Self {
        Self {
            voice,
            settings,
            chain: None,
            stream: None,
            sample_rate: None,
        }
    }

    /// Output rate of the running stream
    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    fn open_stream(&mut self) -> Result<(), OutputError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(OutputError::NoDevice)?;
        let config = device
            .default_output_config()
            .map_err(|e| OutputError::Config(e.to_string()))?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        let chain = Arc::new(Mutex::new(DspChain::new(sample_rate, self.settings)));

        let voice_for_callback = Arc::clone(&self.voice);
        let chain_for_callback = Arc::clone(&chain);
        let voice_for_errors = Arc::clone(&self.voice);

        // Pre-allocated stereo block (no allocation in the callback)
        let mut block = vec![0.0f32; MAX_BLOCK_FRAMES * 2];

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    // try_lock keeps the audio thread from blocking;
                    // on contention the block is silent
                    let (Some(mut voice), Some(mut chain)) =
                        (voice_for_callback.try_lock(), chain_for_callback.try_lock())
                    else {
                        data.fill(0.0);
                        return;
                    };
                    for out in data.chunks_mut(MAX_BLOCK_FRAMES * channels) {
                        let frames = out.len() / channels;
                        let stereo = &mut block[..frames * 2];
                        render_block(&mut voice, &mut chain, stereo);
                        write_interleaved(stereo, out, channels);
                    }
                },
                move |err| {
                    warn!(%err, "audio stream error");
                    voice_for_errors.lock().set_output(sample_rate, false);
                },
                None,
            )
            .map_err(|e| OutputError::BuildStream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| OutputError::PlayStream(e.to_string()))?;

        self.voice.lock().set_output(sample_rate, true);
        self.chain = Some(chain);
        self.stream = Some(stream);
        self.sample_rate = Some(sample_rate);
        info!(sample_rate, channels, "audio output started");
        Ok(())
    }
}

/// Spread a stereo block across `channels` output channels
fn write_interleaved(stereo: &[f32], out: &mut [f32], channels: usize) {
    match channels {
        1 => {
            for (i, sample) in out.iter_mut().enumerate() {
                *sample = (stereo[i * 2] + stereo[i * 2 + 1]) * 0.5;
            }
        }
        _ => {
            for (i, frame) in out.chunks_mut(channels).enumerate() {
                frame.fill(0.0);
                frame[0] = stereo[i * 2];
                if channels > 1 {
                    frame[1] = stereo[i * 2 + 1];
                }
            }
        }
    }
}

impl AudioGraph for EffectGraph {
    fn is_initialized(&self) -> bool {
        self.stream.is_some()
    }

    fn initialize(&mut self) -> Result<(), GraphError> {
        if self.stream.is_some() {
            return Ok(());
        }
        self.open_stream().map_err(|err| {
            warn!(%err, "audio graph unavailable");
            GraphError::from(err)
        })
    }

    fn set_cutoff_hz(&mut self, hz: f32) {
        if let Some(chain) = &self.chain {
            chain.lock().set_cutoff(hz);
        }
    }

    fn set_echo_mix(&mut self, mix: f32) {
        if let Some(chain) = &self.chain {
            chain.lock().set_echo_mix(mix);
        }
    }
}

//! Audio host for Spindle
//!
//! Implements the engine's collaborators over real audio output:
//! - SamplePlayer: in-memory track playback (the `Playback` primitive)
//! - EffectGraph: cpal output stream, tone filter and feedback echo (the `AudioGraph`)

mod delay;
mod filter;
mod graph;
mod player;

pub use delay::{EchoDelay, MAX_ECHO_SECS};
pub use filter::ToneFilter;
pub use graph::{
    preferred_sample_rate, render_block, DspChain, EchoSettings, EffectGraph, OutputError,
    FALLBACK_SAMPLE_RATE,
};
pub use player::{SamplePlayer, SharedVoice, Voice};

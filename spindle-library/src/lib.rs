//! Media input for Spindle - track decoding, background loading and config

mod config;
mod loader;

pub use config::Config;
pub use loader::{resample_stereo, to_stereo, LoadError, LoadedTrack, TrackLoader, TrackMetadata};

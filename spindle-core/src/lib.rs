//! Turntable engine for Spindle
//!
//! Pure motion and transport logic for one virtual vinyl deck:
//! - Rotation: platter angle integration, RPM, backspin inertia
//! - Scratch: pointer drags to platter rotation and playhead offsets
//! - Transport: play/pause, stop brake, cue, step, nudge
//! - Tempo: pitch fader to playback rate
//! - Effects: tone cutoff and echo mix routing into the host audio graph
//!
//! The host supplies a [`Playback`] primitive and an [`AudioGraph`], then
//! drives [`Turntable::tick`] once per frame.

mod clock;
mod effects;
mod engine;
mod error;
mod playback;
mod rotation;
mod scratch;
mod tempo;
mod transport;

pub use clock::FrameClock;
pub use effects::{
    AudioGraph, CutoffDisplay, EffectParams, EffectRouter, SimulatedGraph, CUTOFF_MAX_HZ,
    CUTOFF_MIN_HZ, CUTOFF_OPEN_HZ,
};
pub use engine::{
    format_time, EngineCommand, ScratchRelease, Turntable, TurntableState, DEFAULT_TEMPO_RANGE,
};
pub use error::{EngineError, GraphError};
pub use playback::{seek_clamped, Playback, PlaybackState, SimulatedPlayback};
pub use rotation::{
    omega_from_velocity, Inertia, InertiaStep, RotationMode, RotationModel, Rpm,
    INERTIA_DECAY, INERTIA_STOP, INERTIA_THRESHOLD, REFERENCE_FRAME_DT, SECONDS_PER_TURN,
};
pub use scratch::{
    shortest_delta, time_from_angle, Point, ScratchController, ScratchMove, ScratchSession,
    VELOCITY_WINDOW,
};
pub use tempo::{rate_from_tempo, NudgeDirection, NudgePulse, Tempo, NUDGE_DURATION, NUDGE_OFFSET};
pub use transport::{
    Brake, CueMark, StopKind, Transport, TransportEvent, BRAKE_DURATION, STEP_SECONDS,
};

//! Transport controller - play/pause/stop/brake/cue/nudge
//!
//! Owns the "is the record playing" intent and the transient rate effects
//! (the stop brake and nudge pulses). Every rate written to the playback
//! primitive goes through here so the tempo-derived nominal rate is always
//! restored after a transient.

use crate::error::EngineError;
use crate::playback::{seek_clamped, Playback};
use crate::tempo::{NudgeDirection, NudgePulse, Tempo};
use tracing::{debug, info};

/// Length of the stop brake ramp (seconds)
pub const BRAKE_DURATION: f64 = 0.400;

/// Default step size for step back / step forward (seconds)
pub const STEP_SECONDS: f64 = 1.0;

/// Motor spin-down in progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brake {
    start_rate: f64,
    elapsed: f64,
}

impl Brake {
    fn new(start_rate: f64) -> Self {
        Self {
            start_rate,
            elapsed: 0.0,
        }
    }

    /// Ramp progress in [0, 1]
    pub fn progress(&self) -> f64 {
        (self.elapsed / BRAKE_DURATION).clamp(0.0, 1.0)
    }

    /// Rate at the current progress: linear from start rate to zero
    pub fn rate(&self) -> f64 {
        self.start_rate * (1.0 - self.progress())
    }

    /// Fraction of motor speed left, for the platter visual
    pub fn spin(&self) -> f64 {
        1.0 - self.progress()
    }

    pub fn start_rate(&self) -> f64 {
        self.start_rate
    }
}

/// User-marked return position
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CueMark {
    position: Option<f64>,
}

impl CueMark {
    pub fn position(&self) -> Option<f64> {
        self.position
    }

    pub fn set(&mut self, position: f64) {
        self.position = Some(position);
    }
}

/// What `stop()` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopKind {
    /// Was not playing: position went straight to zero
    Reset,
    /// Was playing: brake ramp started
    Braking,
    /// A brake was already running
    AlreadyBraking,
}

/// Something the transport finished during `advance`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    BrakeFinished,
    NudgeFinished,
}

/// Play state, brake, nudge, cue and tempo
#[derive(Debug, Clone, Default)]
pub struct Transport {
    playing: bool,
    brake: Option<Brake>,
    nudge: Option<NudgePulse>,
    cue: CueMark,
    tempo: Tempo,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the record is meant to be playing
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn brake(&self) -> Option<&Brake> {
        self.brake.as_ref()
    }

    pub fn is_braking(&self) -> bool {
        self.brake.is_some()
    }

    pub fn nudge_pulse(&self) -> Option<&NudgePulse> {
        self.nudge.as_ref()
    }

    pub fn cue(&self) -> CueMark {
        self.cue
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    /// Motor speed fraction for the platter (1.0 unless braking)
    pub fn spin(&self) -> f64 {
        self.brake.map_or(1.0, |b| b.spin())
    }

    /// Rate the primitive should run at right now, ignoring the brake
    fn effective_rate(&self) -> f64 {
        let nominal = self.tempo.nominal_rate();
        self.nudge.map_or(nominal, |pulse| pulse.rate(nominal))
    }

    /// Start playback at the tempo-derived rate.
    ///
    /// Ignored while a brake is running (the ramp is not cancelable).
    pub fn play<P: Playback + ?Sized>(&mut self, playback: &mut P) -> Result<(), EngineError> {
        if self.brake.is_some() {
            debug!("play ignored while braking");
            return Ok(());
        }
        if !playback.is_loaded() {
            return Err(EngineError::NoMediaLoaded);
        }
        if self.playing {
            return Ok(());
        }
        playback.set_rate(self.effective_rate());
        playback.play()?;
        self.playing = true;
        info!(rate = playback.rate(), "playback started");
        Ok(())
    }

    /// Pause playback, keeping the position
    pub fn pause<P: Playback + ?Sized>(&mut self, playback: &mut P) {
        if self.playing {
            playback.pause();
            self.playing = false;
            info!(position = playback.position(), "playback paused");
        }
    }

    /// Play/pause button. Returns whether the transport is now playing.
    pub fn toggle<P: Playback + ?Sized>(&mut self, playback: &mut P) -> Result<bool, EngineError> {
        if self.playing {
            self.pause(playback);
        } else {
            self.play(playback)?;
        }
        Ok(self.playing)
    }

    /// Play/pause while the platter is held (scratch or inertia).
    ///
    /// Only the intent flips; the primitive stays paused and the platter's
    /// release decides whether to resume.
    pub fn toggle_held<P: Playback + ?Sized>(&mut self, playback: &P) -> Result<bool, EngineError> {
        if !self.playing && !playback.is_loaded() {
            return Err(EngineError::NoMediaLoaded);
        }
        if self.brake.is_none() {
            self.playing = !self.playing;
        }
        Ok(self.playing)
    }

    /// Restart the primitive after the platter is released.
    ///
    /// Does nothing unless the transport means to be playing. On failure
    /// the transport falls back to not playing.
    pub fn resume<P: Playback + ?Sized>(&mut self, playback: &mut P) -> Result<(), EngineError> {
        if !self.playing {
            return Ok(());
        }
        if self.brake.is_none() {
            playback.set_rate(self.effective_rate());
        }
        match playback.play() {
            Ok(()) => Ok(()),
            Err(err) => {
                self.playing = false;
                Err(err)
            }
        }
    }

    /// Stop button: brake if playing, otherwise jump to the start
    pub fn stop<P: Playback + ?Sized>(&mut self, playback: &mut P) -> StopKind {
        if self.brake.is_some() {
            return StopKind::AlreadyBraking;
        }
        if !self.playing {
            seek_clamped(playback, 0.0);
            return StopKind::Reset;
        }
        self.playing = false;
        self.nudge = None;
        self.brake = Some(Brake::new(playback.rate()));
        info!(start_rate = playback.rate(), "brake started");
        StopKind::Braking
    }

    /// A hand on the platter ends a running brake where it is. The playhead
    /// is left to the hand instead of being parked at the start.
    pub fn take_over_brake<P: Playback + ?Sized>(&mut self, playback: &mut P) -> bool {
        if self.brake.take().is_none() {
            return false;
        }
        playback.set_rate(self.tempo.nominal_rate());
        info!("brake taken over by hand");
        true
    }

    /// Remember the current position as the cue
    pub fn set_cue<P: Playback + ?Sized>(&mut self, playback: &P) {
        self.cue.set(playback.position());
        debug!(cue = playback.position(), "cue set");
    }

    /// Jump to the cue. Returns false if no cue is set.
    pub fn go_cue<P: Playback + ?Sized>(&mut self, playback: &mut P) -> bool {
        match self.cue.position() {
            Some(position) => {
                seek_clamped(playback, position);
                true
            }
            None => false,
        }
    }

    /// Seek relative to the current position, clamped to the track
    pub fn step<P: Playback + ?Sized>(&mut self, playback: &mut P, seconds: f64) -> f64 {
        let target = playback.position() + seconds;
        seek_clamped(playback, target)
    }

    /// Momentarily push the rate off nominal. Ignored while braking.
    pub fn nudge<P: Playback + ?Sized>(&mut self, playback: &mut P, direction: NudgeDirection) {
        if self.brake.is_some() {
            debug!("nudge ignored while braking");
            return;
        }
        let pulse = NudgePulse::new(direction);
        playback.set_rate(pulse.rate(self.tempo.nominal_rate()));
        self.nudge = Some(pulse);
    }

    /// Change the tempo. Written through at once unless a brake is running,
    /// in which case it becomes the rate restored when the brake completes.
    pub fn set_tempo<P: Playback + ?Sized>(&mut self, playback: &mut P, percent: f64) {
        self.tempo.set_percent(percent);
        if self.brake.is_none() {
            playback.set_rate(self.effective_rate());
        }
    }

    /// Run the brake ramp and nudge timer for `dt` seconds
    pub fn advance<P: Playback + ?Sized>(
        &mut self,
        playback: &mut P,
        dt: f64,
    ) -> Option<TransportEvent> {
        if let Some(brake) = self.brake.as_mut() {
            brake.elapsed += dt.max(0.0);
            playback.set_rate(brake.rate());
            if brake.progress() >= 1.0 {
                self.brake = None;
                playback.pause();
                seek_clamped(playback, 0.0);
                playback.set_rate(self.tempo.nominal_rate());
                info!("brake finished");
                return Some(TransportEvent::BrakeFinished);
            }
            return None;
        }

        if let Some(pulse) = self.nudge.as_mut() {
            if pulse.advance(dt) {
                self.nudge = None;
                playback.set_rate(self.tempo.nominal_rate());
                return Some(TransportEvent::NudgeFinished);
            }
        }
        None
    }

    /// The primitive reached the end of the track
    pub fn on_ended(&mut self) {
        if self.playing {
            info!("track ended");
        }
        self.playing = false;
    }

    /// Forget play state and transients (new media). Keeps cue and tempo.
    pub fn reset(&mut self) {
        self.playing = false;
        self.brake = None;
        self.nudge = None;
    }
}

//! Turntable engine - the context object every operation goes through
//!
//! Ties the rotation model, scratch controller, transport and effect router
//! to one playback primitive and one audio graph. The host drives it with
//! `tick(dt)` (or `frame(now)`) once per rendered frame and calls the
//! command methods from its input layer. Nothing here blocks or spawns.

use crate::clock::FrameClock;
use crate::effects::{AudioGraph, EffectParams, EffectRouter, CUTOFF_MAX_HZ, CUTOFF_MIN_HZ};
use crate::error::EngineError;
use crate::playback::{seek_clamped, Playback, PlaybackState};
use crate::rotation::{RotationMode, RotationModel, Rpm};
use crate::scratch::{Point, ScratchController, ScratchMove};
use crate::tempo::NudgeDirection;
use crate::transport::{StopKind, Transport, TransportEvent};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default tempo fader range (± percent)
pub const DEFAULT_TEMPO_RANGE: f64 = 8.0;

/// Commands the input layer can send to the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineCommand {
    TogglePlay,
    Play,
    Pause,
    Stop,
    SetCue,
    GoCue,
    Step(f64),
    Nudge(NudgeDirection),
    SetTempo(f64),
    AdjustTempo(f64),
    SetRpm(Rpm),
    SetCutoff(f32),
    /// Exponential steps: positive opens, negative closes
    AdjustCutoff(f32),
    SetEchoMix(f32),
    AdjustEchoMix(f32),
    ScratchPress(Point, Duration),
    ScratchMove(Point, Duration),
    ScratchRelease,
}

/// Outcome of letting go of the platter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScratchRelease {
    /// No scratch was in progress
    NotScratching,
    /// Released fast enough to keep spinning
    Inertia { velocity: f64 },
    /// Released slowly; `resumed` tells whether playback restarted
    Settled { resumed: bool },
}

/// Snapshot for rendering
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TurntableState {
    pub loaded: bool,
    pub playback: PlaybackState,
    pub angle: f64,            // radians, unbounded
    pub angular_velocity: f64, // rad/s
    pub mode: RotationMode,
    pub rpm: Rpm,
    pub tempo_percent: f64,
    pub tempo_display: String,
    pub effects: EffectParams,
    pub cutoff_display: String,
    pub echo_display: String,
    pub cue: Option<f64>,
    pub braking: bool,
    pub nudging: Option<NudgeDirection>,
    pub scratching: bool,
    pub graph_ready: bool,
}

impl TurntableState {
    /// Same line as [`Turntable::readout`], from the snapshot
    pub fn readout(&self) -> String {
        format!(
            "{} / {} | {} RPM",
            format_time(self.playback.position),
            format_time(self.playback.duration),
            self.rpm.label()
        )
    }

    /// "Cue: mm:ss", or "Cue: --" while unset
    pub fn cue_label(&self) -> String {
        match self.cue {
            Some(secs) => format!("Cue: {}", format_time(secs)),
            None => "Cue: --".to_string(),
        }
    }
}

/// Format seconds as "mm:ss" (non-finite values print "00:00")
pub fn format_time(secs: f64) -> String {
    if !secs.is_finite() {
        return "00:00".to_string();
    }
    let secs = secs.max(0.0);
    let mins = (secs / 60.0).floor() as u64;
    let rest = (secs % 60.0).floor() as u64;
    format!("{:02}:{:02}", mins, rest)
}

/// One turntable: platter, transport, tempo and effects over a playback primitive
pub struct Turntable<P: Playback, G: AudioGraph> {
    playback: P,
    graph: G,
    clock: FrameClock,
    rotation: RotationModel,
    scratch: ScratchController,
    transport: Transport,
    effects: EffectRouter,
    tempo_range: f64,
}

impl<P: Playback, G: AudioGraph> Turntable<P, G> {
    /// Create a turntable at 33⅓ RPM
    pub fn new(playback: P, graph: G) -> Self {
        Self::with_rpm(playback, graph, Rpm::default())
    }

    pub fn with_rpm(playback: P, graph: G, rpm: Rpm) -> Self {
        Self {
            playback,
            graph,
            clock: FrameClock::new(),
            rotation: RotationModel::new(rpm),
            scratch: ScratchController::default(),
            transport: Transport::new(),
            effects: EffectRouter::new(),
            tempo_range: DEFAULT_TEMPO_RANGE,
        }
    }

    pub fn playback(&self) -> &P {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut P {
        &mut self.playback
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    pub fn rotation(&self) -> &RotationModel {
        &self.rotation
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn effects(&self) -> &EffectRouter {
        &self.effects
    }

    /// Bound for `AdjustTempo` (± percent)
    pub fn set_tempo_range(&mut self, range: f64) {
        self.tempo_range = range.abs();
    }

    pub fn tempo_range(&self) -> f64 {
        self.tempo_range
    }

    /// Platter center in input coordinates
    pub fn set_platter_center(&mut self, center: Point) {
        self.scratch.set_center(center);
    }

    /// Hand or inertia currently owns the platter
    fn platter_held(&self) -> bool {
        matches!(
            self.rotation.mode(),
            RotationMode::Scratching | RotationMode::Inertial
        )
    }

    /// Media finished loading into the primitive ("metadata ready")
    pub fn media_ready(&mut self) {
        self.transport.reset();
        self.scratch.cancel();
        self.rotation.reset_motion();
        self.playback
            .set_rate(self.transport.tempo().nominal_rate());
        info!(duration = self.playback.duration(), "media ready");
    }

    /// Build the audio graph on first use and push the current effect settings
    fn ensure_graph(&mut self) -> Result<(), EngineError> {
        if self.graph.is_initialized() {
            return Ok(());
        }
        self.graph.initialize()?;
        self.effects.sync(&mut self.graph);
        info!("audio graph initialized");
        Ok(())
    }

    /// Start playback
    pub fn play(&mut self) -> Result<(), EngineError> {
        if !self.playback.is_loaded() {
            return Err(EngineError::NoMediaLoaded);
        }
        self.ensure_graph()?;
        if self.platter_held() {
            if !self.transport.is_playing() {
                self.transport.toggle_held(&self.playback)?;
            }
            return Ok(());
        }
        let result = self.transport.play(&mut self.playback);
        self.rotation.set_playing(self.transport.is_playing());
        result
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if self.platter_held() {
            if self.transport.is_playing() {
                // Cannot fail when going from playing to paused
                let _ = self.transport.toggle_held(&self.playback);
            }
            return;
        }
        self.transport.pause(&mut self.playback);
        self.rotation.set_playing(self.transport.is_playing());
    }

    /// Play/pause button. Returns whether the transport is now playing.
    pub fn toggle_play(&mut self) -> Result<bool, EngineError> {
        if self.transport.is_playing() {
            self.pause();
        } else {
            self.play()?;
        }
        Ok(self.transport.is_playing())
    }

    /// Stop button: brake when playing, otherwise back to the start.
    ///
    /// Inertia is dropped first; if the record was meant to be playing it
    /// restarts so the brake is heard. Under the hand there is nothing to
    /// brake, so the record goes back to the start.
    pub fn stop(&mut self) -> StopKind {
        match self.rotation.mode() {
            RotationMode::Inertial => {
                self.rotation.reset_motion();
                if let Err(err) = self.transport.resume(&mut self.playback) {
                    warn!(%err, "resume before brake failed");
                }
                self.rotation.set_playing(self.transport.is_playing());
            }
            RotationMode::Scratching if self.transport.is_playing() => {
                // Going from playing to paused cannot fail
                let _ = self.transport.toggle_held(&self.playback);
            }
            _ => {}
        }
        let kind = self.transport.stop(&mut self.playback);
        if kind == StopKind::Reset {
            self.rotation.set_playing(false);
        }
        kind
    }

    pub fn set_cue(&mut self) {
        self.transport.set_cue(&self.playback);
    }

    /// Jump to the cue (no-op when unset)
    pub fn go_cue(&mut self) -> bool {
        self.transport.go_cue(&mut self.playback)
    }

    /// Relative seek, clamped to the track
    pub fn step(&mut self, seconds: f64) -> f64 {
        self.transport.step(&mut self.playback, seconds)
    }

    pub fn nudge(&mut self, direction: NudgeDirection) {
        self.transport.nudge(&mut self.playback, direction);
    }

    pub fn set_tempo(&mut self, percent: f64) {
        self.transport.set_tempo(&mut self.playback, percent);
    }

    /// Move the tempo fader by `delta` percent within the tempo range
    pub fn adjust_tempo(&mut self, delta: f64) {
        let percent = (self.transport.tempo().percent() + delta)
            .clamp(-self.tempo_range, self.tempo_range);
        self.set_tempo(percent);
    }

    pub fn set_rpm(&mut self, rpm: Rpm) {
        self.rotation.set_rpm(rpm);
    }

    /// Write the tone filter cutoff (no-op before the graph exists)
    pub fn set_cutoff(&mut self, hz: f32) -> bool {
        self.effects.set_cutoff(&mut self.graph, hz)
    }

    /// Step the cutoff exponentially, staying within the tone control range
    pub fn adjust_cutoff(&mut self, steps: f32) -> bool {
        let current = self.effects.params().cutoff_hz;
        let factor: f32 = if steps > 0.0 { 1.1 } else { 0.9 };
        let cutoff = (current * factor.powf(steps.abs())).clamp(CUTOFF_MIN_HZ, CUTOFF_MAX_HZ);
        self.set_cutoff(cutoff)
    }

    /// Write the echo mix (no-op before the graph exists)
    pub fn set_echo_mix(&mut self, mix: f32) -> bool {
        self.effects.set_echo_mix(&mut self.graph, mix)
    }

    pub fn adjust_echo_mix(&mut self, delta: f32) -> bool {
        let mix = self.effects.params().echo_mix + delta;
        self.set_echo_mix(mix)
    }

    /// Hand comes down on the platter
    pub fn press(&mut self, point: Point, now: Duration) {
        self.rotation.begin_scratch();
        self.transport.take_over_brake(&mut self.playback);
        let playing = self.transport.is_playing();
        if !self.playback.is_paused() {
            self.playback.pause();
        }
        self.scratch.press(point, now, playing);
        debug!(playing, "scratch press");
    }

    /// Hand moves the platter: rotate it and drag the playhead along
    pub fn move_to(&mut self, point: Point, now: Duration) -> Option<ScratchMove> {
        let mv = self.scratch.move_to(point, now)?;
        self.rotation.apply_scratch_delta(mv.angle_delta);
        let target = self.playback.position() + mv.time_delta;
        seek_clamped(&mut self.playback, target);
        Some(mv)
    }

    /// Hand lets go: coast on inertia, or resume if the record was playing
    pub fn release(&mut self) -> Result<ScratchRelease, EngineError> {
        let Some(session) = self.scratch.release() else {
            return Ok(ScratchRelease::NotScratching);
        };
        let velocity = session.velocity();
        if self
            .rotation
            .end_scratch(velocity, self.transport.is_playing())
        {
            debug!(velocity, "inertia started");
            return Ok(ScratchRelease::Inertia { velocity });
        }
        match self.transport.resume(&mut self.playback) {
            Ok(()) => Ok(ScratchRelease::Settled {
                resumed: self.transport.is_playing(),
            }),
            Err(err) => {
                self.rotation.set_playing(false);
                warn!(%err, "resume after scratch failed");
                Err(err)
            }
        }
    }

    /// Advance all time-dependent state by `dt` seconds.
    ///
    /// The only error is a failed resume when inertia runs out while the
    /// record is meant to be playing.
    pub fn tick(&mut self, dt: f64) -> Result<(), EngineError> {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        if self.playback.take_ended() {
            self.transport.on_ended();
            self.rotation.set_playing(false);
        }

        if let Some(TransportEvent::BrakeFinished) =
            self.transport.advance(&mut self.playback, dt)
        {
            self.rotation.set_playing(self.transport.is_playing());
        }

        let Some(step) = self.rotation.advance(dt, self.transport.spin()) else {
            return Ok(());
        };
        let target = self.playback.position() + step.position_delta;
        seek_clamped(&mut self.playback, target);

        if !step.finished {
            return Ok(());
        }
        debug!("inertia finished");
        match self.transport.resume(&mut self.playback) {
            Ok(()) => {
                self.rotation.set_playing(self.transport.is_playing());
                Ok(())
            }
            Err(err) => {
                self.rotation.set_playing(false);
                warn!(%err, "resume after inertia failed");
                Err(err)
            }
        }
    }

    /// Clock driver entry point: `now` is a monotonic frame timestamp
    pub fn frame(&mut self, now: Duration) -> Result<(), EngineError> {
        let dt = self.clock.advance(now);
        self.tick(dt)
    }

    /// Dispatch a command from the input layer
    pub fn handle_command(&mut self, cmd: EngineCommand) -> Result<(), EngineError> {
        match cmd {
            EngineCommand::TogglePlay => {
                self.toggle_play()?;
            }
            EngineCommand::Play => self.play()?,
            EngineCommand::Pause => self.pause(),
            EngineCommand::Stop => {
                self.stop();
            }
            EngineCommand::SetCue => self.set_cue(),
            EngineCommand::GoCue => {
                self.go_cue();
            }
            EngineCommand::Step(seconds) => {
                self.step(seconds);
            }
            EngineCommand::Nudge(direction) => self.nudge(direction),
            EngineCommand::SetTempo(percent) => self.set_tempo(percent),
            EngineCommand::AdjustTempo(delta) => self.adjust_tempo(delta),
            EngineCommand::SetRpm(rpm) => self.set_rpm(rpm),
            EngineCommand::SetCutoff(hz) => {
                self.set_cutoff(hz);
            }
            EngineCommand::AdjustCutoff(steps) => {
                self.adjust_cutoff(steps);
            }
            EngineCommand::SetEchoMix(mix) => {
                self.set_echo_mix(mix);
            }
            EngineCommand::AdjustEchoMix(delta) => {
                self.adjust_echo_mix(delta);
            }
            EngineCommand::ScratchPress(point, now) => self.press(point, now),
            EngineCommand::ScratchMove(point, now) => {
                self.move_to(point, now);
            }
            EngineCommand::ScratchRelease => {
                self.release()?;
            }
        }
        Ok(())
    }

    /// "position / duration | RPM" readout line
    pub fn readout(&self) -> String {
        format!(
            "{} / {} | {} RPM",
            format_time(self.playback.position()),
            format_time(self.playback.duration()),
            self.rotation.rpm().label()
        )
    }

    /// Snapshot everything the UI shows
    pub fn state(&self) -> TurntableState {
        TurntableState {
            loaded: self.playback.is_loaded(),
            playback: PlaybackState::capture(&self.playback, self.transport.is_playing()),
            angle: self.rotation.angle(),
            angular_velocity: self.rotation.angular_velocity(),
            mode: self.rotation.mode(),
            rpm: self.rotation.rpm(),
            tempo_percent: self.transport.tempo().percent(),
            tempo_display: self.transport.tempo().display(),
            effects: self.effects.params(),
            cutoff_display: self.effects.cutoff_display().to_string(),
            echo_display: self.effects.echo_display(),
            cue: self.transport.cue().position(),
            braking: self.transport.is_braking(),
            nudging: self.transport.nudge_pulse().map(|p| p.direction()),
            scratching: self.scratch.is_active(),
            graph_ready: self.graph.is_initialized(),
        }
    }
}

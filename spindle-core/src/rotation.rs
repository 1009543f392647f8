//! Platter rotation model
//!
//! Integrates the platter angle every frame. Three sources can drive it:
//! - the motor (fixed angular velocity from the selected RPM)
//! - the hand (scratch deltas applied one-to-one, see `scratch`)
//! - inertia (a decaying backspin velocity left over from a fast release)
//!
//! The angle is visual only and never wraps.

use std::f64::consts::TAU;

/// Seconds of audio covered by one full platter turn
pub const SECONDS_PER_TURN: f64 = 1.8;

/// Release velocity (audio seconds per second) above which the platter keeps spinning
pub const INERTIA_THRESHOLD: f64 = 0.4;

/// Inertia ends once |velocity| falls below this
pub const INERTIA_STOP: f64 = 0.02;

/// Velocity multiplier per reference frame
pub const INERTIA_DECAY: f64 = 0.94;

/// Frame interval the decay factor is calibrated for (60 Hz)
pub const REFERENCE_FRAME_DT: f64 = 1.0 / 60.0;

/// Convert an audio-time velocity into platter angular velocity (rad/s)
#[inline]
pub fn omega_from_velocity(velocity: f64) -> f64 {
    velocity / SECONDS_PER_TURN * TAU
}

/// Record speed selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rpm {
    #[default]
    ThirtyThree,
    FortyFive,
}

impl Rpm {
    /// Revolutions per minute
    pub fn value(self) -> f64 {
        match self {
            Rpm::ThirtyThree => 33.33,
            Rpm::FortyFive => 45.0,
        }
    }

    /// Label for the readout
    pub fn label(self) -> &'static str {
        match self {
            Rpm::ThirtyThree => "33⅓",
            Rpm::FortyFive => "45",
        }
    }

    /// Motor angular velocity in rad/s
    pub fn angular_velocity(self) -> f64 {
        self.value() / 60.0 * TAU
    }

    /// Parse "33", "33.33", "33⅓" or "45"
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "33" | "33.33" | "33⅓" | "33 1/3" => Some(Rpm::ThirtyThree),
            "45" => Some(Rpm::FortyFive),
            _ => None,
        }
    }
}

/// What is currently driving the platter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationMode {
    /// Not moving
    #[default]
    Idle,
    /// Motor driven
    Playing,
    /// Hand driven (a scratch session is open)
    Scratching,
    /// Coasting after a fast release
    Inertial,
}

/// Backspin state left over from a scratch release
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inertia {
    /// Audio seconds per second
    velocity: f64,
    /// Per-reference-frame multiplier, in (0, 1)
    decay_factor: f64,
}

impl Inertia {
    /// Seed inertia from a release velocity, if it is fast enough
    pub fn from_release(velocity: f64) -> Option<Self> {
        (velocity.abs() > INERTIA_THRESHOLD).then_some(Self {
            velocity,
            decay_factor: INERTIA_DECAY,
        })
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn decay_factor(&self) -> f64 {
        self.decay_factor
    }

    /// Platter angular velocity for the current velocity
    pub fn omega(&self) -> f64 {
        omega_from_velocity(self.velocity)
    }

    /// Apply `dt` seconds of decay, corrected for the actual frame interval
    pub fn decay(&mut self, dt: f64) {
        if dt > 0.0 {
            self.velocity *= self.decay_factor.powf(dt / REFERENCE_FRAME_DT);
        }
    }

    /// Whether the velocity has dropped below the stop threshold
    pub fn is_spent(&self) -> bool {
        self.velocity.abs() < INERTIA_STOP
    }
}

/// Result of one inertial frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InertiaStep {
    /// Audio seconds to move the playhead by
    pub position_delta: f64,
    /// Inertia ended this frame
    pub finished: bool,
}

/// Platter angle integrator and mode state machine
#[derive(Debug, Clone)]
pub struct RotationModel {
    angle: f64,
    mode: RotationMode,
    rpm: Rpm,
    /// Angular velocity applied on the last frame (rad/s)
    angular_velocity: f64,
    inertia: Option<Inertia>,
}

impl Default for RotationModel {
    fn default() -> Self {
        Self::new(Rpm::default())
    }
}

impl RotationModel {
    pub fn new(rpm: Rpm) -> Self {
        Self {
            angle: 0.0,
            mode: RotationMode::Idle,
            rpm,
            angular_velocity: 0.0,
            inertia: None,
        }
    }

    /// Accumulated platter angle in radians
    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn mode(&self) -> RotationMode {
        self.mode
    }

    pub fn rpm(&self) -> Rpm {
        self.rpm
    }

    pub fn set_rpm(&mut self, rpm: Rpm) {
        self.rpm = rpm;
    }

    /// Angular velocity applied on the last frame (rad/s)
    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    pub fn inertia(&self) -> Option<&Inertia> {
        self.inertia.as_ref()
    }

    /// Follow the transport. Ignored while the hand or inertia owns the platter.
    pub fn set_playing(&mut self, playing: bool) {
        if matches!(self.mode, RotationMode::Idle | RotationMode::Playing) {
            self.mode = if playing {
                RotationMode::Playing
            } else {
                RotationMode::Idle
            };
        }
    }

    /// Hand takes the platter. Cancels any inertia.
    pub fn begin_scratch(&mut self) {
        self.inertia = None;
        self.mode = RotationMode::Scratching;
        self.angular_velocity = 0.0;
    }

    /// Apply a hand-driven angle delta
    pub fn apply_scratch_delta(&mut self, delta: f64) {
        self.angle += delta;
    }

    /// Hand lets go. Returns true when the release starts inertia.
    pub fn end_scratch(&mut self, velocity: f64, playing: bool) -> bool {
        match Inertia::from_release(velocity) {
            Some(inertia) => {
                self.inertia = Some(inertia);
                self.mode = RotationMode::Inertial;
                true
            }
            None => {
                self.inertia = None;
                self.mode = if playing {
                    RotationMode::Playing
                } else {
                    RotationMode::Idle
                };
                false
            }
        }
    }

    /// Drop everything and stop (new media, reset)
    pub fn reset_motion(&mut self) {
        self.inertia = None;
        self.mode = RotationMode::Idle;
        self.angular_velocity = 0.0;
    }

    /// Integrate `dt` seconds.
    ///
    /// `spin` scales the motor speed (1.0 normally, less during a brake).
    /// Returns the inertial step when coasting; on the finishing frame the
    /// mode drops to `Idle` and the caller decides whether to resume.
    pub fn advance(&mut self, dt: f64, spin: f64) -> Option<InertiaStep> {
        match self.mode {
            RotationMode::Playing => {
                self.angular_velocity = self.rpm.angular_velocity() * spin;
                self.angle += self.angular_velocity * dt;
                None
            }
            RotationMode::Inertial => {
                let inertia = self.inertia.as_mut()?;
                let position_delta = inertia.velocity * dt;
                self.angular_velocity = inertia.omega();
                self.angle += self.angular_velocity * dt;
                inertia.decay(dt);
                let finished = inertia.is_spent();
                if finished {
                    self.reset_motion();
                }
                Some(InertiaStep {
                    position_delta,
                    finished,
                })
            }
            RotationMode::Idle | RotationMode::Scratching => {
                self.angular_velocity = 0.0;
                None
            }
        }
    }
}

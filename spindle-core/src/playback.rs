//! Playback primitive seam
//!
//! The engine never decodes or resamples audio itself. It drives a host
//! playback primitive through the [`Playback`] trait: read/write position,
//! read duration, read/write rate, start (which may fail), pause, and an
//! end-of-track notification.

use crate::error::EngineError;

/// Host media-playback primitive
pub trait Playback {
    /// Whether a track is loaded
    fn is_loaded(&self) -> bool;

    /// Track duration in seconds (0.0 when nothing is loaded)
    fn duration(&self) -> f64;

    /// Current position in seconds
    fn position(&self) -> f64;

    /// Move the playhead. Callers go through [`seek_clamped`].
    fn set_position(&mut self, secs: f64);

    /// Current playback rate (1.0 = normal speed)
    fn rate(&self) -> f64;

    /// Set playback rate
    fn set_rate(&mut self, rate: f64);

    /// Start playback. May be refused by the host.
    fn play(&mut self) -> Result<(), EngineError>;

    /// Pause playback, keeping the position
    fn pause(&mut self);

    /// Whether the primitive is currently paused
    fn is_paused(&self) -> bool;

    /// Returns true once after the track played to its end
    fn take_ended(&mut self) -> bool;
}

/// Seek to `secs`, clamped to `[0, duration]`. Returns the position written.
pub fn seek_clamped<P: Playback + ?Sized>(playback: &mut P, secs: f64) -> f64 {
    let duration = playback.duration();
    let max = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
    let target = if secs.is_nan() { 0.0 } else { secs.clamp(0.0, max) };
    playback.set_position(target);
    target
}

/// Snapshot of the playback primitive as seen by the transport
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackState {
    pub position: f64, // seconds
    pub duration: f64, // seconds
    pub rate: f64,
    pub is_playing: bool,
}

impl PlaybackState {
    /// Mirror the primitive; `is_playing` is the transport's view, not the primitive's
    pub fn capture<P: Playback + ?Sized>(playback: &P, is_playing: bool) -> Self {
        Self {
            position: playback.position(),
            duration: playback.duration(),
            rate: playback.rate(),
            is_playing,
        }
    }
}

/// Playback primitive driven by a virtual clock.
///
/// Used for headless runs and tests: nothing advances until [`advance`] is
/// called, and a refusal to start can be injected with [`block_next_play`].
///
/// [`advance`]: SimulatedPlayback::advance
/// [`block_next_play`]: SimulatedPlayback::block_next_play
#[derive(Debug, Clone)]
pub struct SimulatedPlayback {
    loaded: bool,
    duration: f64,
    position: f64,
    rate: f64,
    paused: bool,
    ended: bool,
    blocked: Option<String>,
}

impl Default for SimulatedPlayback {
    fn default() -> Self {
        Self {
            loaded: false,
            duration: 0.0,
            position: 0.0,
            rate: 1.0,
            paused: true,
            ended: false,
            blocked: None,
        }
    }
}

impl SimulatedPlayback {
    /// Create an empty primitive
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a primitive with a track of `duration` seconds loaded
    pub fn with_track(duration: f64) -> Self {
        let mut playback = Self::new();
        playback.load(duration);
        playback
    }

    /// Load a track of `duration` seconds
    pub fn load(&mut self, duration: f64) {
        self.loaded = true;
        self.duration = duration.max(0.0);
        self.position = 0.0;
        self.paused = true;
        self.ended = false;
    }

    /// Make the next `play()` fail with `PlaybackBlocked(reason)`
    pub fn block_next_play(&mut self, reason: impl Into<String>) {
        self.blocked = Some(reason.into());
    }

    /// Advance the media clock by `dt` seconds of wall time
    pub fn advance(&mut self, dt: f64) {
        if self.paused || !self.loaded {
            return;
        }
        self.position += self.rate * dt;
        if self.position >= self.duration {
            self.position = self.duration;
            self.paused = true;
            self.ended = true;
        } else if self.position < 0.0 {
            self.position = 0.0;
        }
    }
}

impl Playback for SimulatedPlayback {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn set_position(&mut self, secs: f64) {
        self.position = secs;
    }

    fn rate(&self) -> f64 {
        self.rate
    }

    fn set_rate(&mut self, rate: f64) {
        self.rate = rate;
    }

    fn play(&mut self) -> Result<(), EngineError> {
        if let Some(reason) = self.blocked.take() {
            return Err(EngineError::PlaybackBlocked(reason));
        }
        if !self.loaded {
            return Err(EngineError::NoMediaLoaded);
        }
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn take_ended(&mut self) -> bool {
        std::mem::take(&mut self.ended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seek_clamped_bounds() {
        let mut p = SimulatedPlayback::with_track(120.0);
        assert_eq!(seek_clamped(&mut p, -5.0), 0.0);
        assert_eq!(seek_clamped(&mut p, 500.0), 120.0);
        assert_eq!(seek_clamped(&mut p, 42.5), 42.5);
        assert_eq!(p.position(), 42.5);
    }

    #[test]
    fn test_seek_clamped_without_track() {
        let mut p = SimulatedPlayback::new();
        assert_eq!(seek_clamped(&mut p, 10.0), 0.0);
        assert_eq!(seek_clamped(&mut p, f64::NAN), 0.0);
    }

    #[test]
    fn test_simulated_advance_respects_rate() {
        let mut p = SimulatedPlayback::with_track(10.0);
        p.set_rate(1.5);
        p.play().unwrap();
        p.advance(2.0);
        assert!((p.position() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_simulated_end_of_track_notifies_once() {
        let mut p = SimulatedPlayback::with_track(1.0);
        p.play().unwrap();
        p.advance(2.0);
        assert_eq!(p.position(), 1.0);
        assert!(p.is_paused());
        assert!(p.take_ended());
        assert!(!p.take_ended());
    }

    #[test]
    fn test_simulated_block_next_play() {
        let mut p = SimulatedPlayback::with_track(1.0);
        p.block_next_play("autoplay");
        assert_eq!(p.play(), Err(EngineError::PlaybackBlocked("autoplay".into())));
        assert!(p.is_paused());
        assert!(p.play().is_ok());
    }

    #[test]
    fn test_capture_mirrors_primitive() {
        let mut p = SimulatedPlayback::with_track(30.0);
        p.set_position(12.0);
        p.set_rate(0.96);
        let state = PlaybackState::capture(&p, true);
        assert_eq!(state.position, 12.0);
        assert_eq!(state.duration, 30.0);
        assert_eq!(state.rate, 0.96);
        assert!(state.is_playing);
    }
}

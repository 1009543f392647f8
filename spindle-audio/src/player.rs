//! Sample player - the playback primitive behind the turntable
//!
//! Holds a decoded track in memory and reads it out at a variable rate.
//! The [`Voice`] is shared with the output callback; [`SamplePlayer`] is the
//! control-side handle the engine talks to.

use parking_lot::Mutex;
use spindle_core::{EngineError, Playback};
use std::sync::Arc;

/// Playhead over an in-memory stereo track
pub struct Voice {
    /// Stereo interleaved samples
    samples: Arc<Vec<f32>>,
    /// Track sample rate
    sample_rate: u32,
    /// Output device rate (0 until the stream is open)
    output_rate: u32,
    /// Playhead in track frames (fractional)
    position: f64,
    rate: f64,
    paused: bool,
    ended: bool,
    /// Output stream is running
    output_ready: bool,
}

impl Default for Voice {
    fn default() -> Self {
        Self {
            samples: Arc::new(Vec::new()),
            sample_rate: 44100,
            output_rate: 0,
            position: 0.0,
            rate: 1.0,
            paused: true,
            ended: false,
            output_ready: false,
        }
    }
}

impl Voice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the track. Playhead goes back to the start, paused.
    pub fn load(&mut self, samples: Arc<Vec<f32>>, sample_rate: u32) {
        self.samples = samples;
        self.sample_rate = sample_rate.max(1);
        self.position = 0.0;
        self.paused = true;
        self.ended = false;
    }

    pub fn is_loaded(&self) -> bool {
        self.frames() > 0
    }

    /// Track length in frames
    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }

    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn position(&self) -> f64 {
        self.position / self.sample_rate as f64
    }

    pub fn set_position(&mut self, secs: f64) {
        let secs = if secs.is_finite() { secs } else { 0.0 };
        self.position = (secs * self.sample_rate as f64).clamp(0.0, self.frames() as f64);
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn set_rate(&mut self, rate: f64) {
        self.rate = if rate.is_finite() { rate.max(0.0) } else { 1.0 };
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_output(&mut self, sample_rate: u32, ready: bool) {
        self.output_rate = sample_rate;
        self.output_ready = ready;
    }

    pub fn output_ready(&self) -> bool {
        self.output_ready
    }

    /// Track frames consumed per output frame at rate 1.0
    fn rate_ratio(&self) -> f64 {
        if self.output_rate == 0 {
            1.0
        } else {
            self.sample_rate as f64 / self.output_rate as f64
        }
    }

    /// Fill `out` (stereo interleaved) and advance the playhead.
    ///
    /// Writes silence while paused. Reaching the end pauses the voice and
    /// raises the ended flag.
    pub fn render(&mut self, out: &mut [f32]) {
        let frames = self.frames();
        if self.paused || frames == 0 {
            out.fill(0.0);
            return;
        }

        let step = self.rate * self.rate_ratio();
        for frame in out.chunks_mut(2) {
            if self.paused {
                frame.fill(0.0);
                continue;
            }
            let (l, r) = self.read_interpolated(self.position);
            frame[0] = l;
            if frame.len() > 1 {
                frame[1] = r;
            }
            self.position += step;
            if self.position >= frames as f64 {
                self.position = frames as f64;
                self.paused = true;
                self.ended = true;
            }
        }
    }

    /// Linear interpolation between neighbouring frames
    #[inline]
    fn read_interpolated(&self, pos: f64) -> (f32, f32) {
        let frames = self.frames();
        let idx = (pos as usize).min(frames - 1);
        let next = (idx + 1).min(frames - 1);
        let frac = (pos - idx as f64) as f32;

        let l = self.samples[idx * 2] * (1.0 - frac) + self.samples[next * 2] * frac;
        let r = self.samples[idx * 2 + 1] * (1.0 - frac) + self.samples[next * 2 + 1] * frac;
        (l, r)
    }
}

/// Shared handle to the voice
pub type SharedVoice = Arc<Mutex<Voice>>;

/// Control-side playback handle
#[derive(Clone, Default)]
pub struct SamplePlayer {
    voice: SharedVoice,
}

impl SamplePlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a voice that is already shared
    pub fn from_voice(voice: SharedVoice) -> Self {
        Self { voice }
    }

    /// Voice shared with the output callback
    pub fn voice(&self) -> SharedVoice {
        Arc::clone(&self.voice)
    }

    /// Hand a decoded track to the voice
    pub fn load(&self, samples: Arc<Vec<f32>>, sample_rate: u32) {
        self.voice.lock().load(samples, sample_rate);
    }
}

impl Playback for SamplePlayer {
    fn is_loaded(&self) -> bool {
        self.voice.lock().is_loaded()
    }

    fn duration(&self) -> f64 {
        self.voice.lock().duration()
    }

    fn position(&self) -> f64 {
        self.voice.lock().position()
    }

    fn set_position(&mut self, secs: f64) {
        self.voice.lock().set_position(secs);
    }

    fn rate(&self) -> f64 {
        self.voice.lock().rate()
    }

    fn set_rate(&mut self, rate: f64) {
        self.voice.lock().set_rate(rate);
    }

    fn play(&mut self) -> Result<(), EngineError> {
        let mut voice = self.voice.lock();
        if !voice.is_loaded() {
            return Err(EngineError::NoMediaLoaded);
        }
        if !voice.output_ready {
            return Err(EngineError::PlaybackBlocked(
                "audio output is not running".into(),
            ));
        }
        if voice.position >= voice.frames() as f64 {
            voice.position = 0.0;
        }
        voice.paused = false;
        voice.ended = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.voice.lock().paused = true;
    }

    fn is_paused(&self) -> bool {
        self.voice.lock().paused
    }

    fn take_ended(&mut self) -> bool {
        std::mem::take(&mut self.voice.lock().ended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One second of a stereo ramp at `rate` Hz
    fn ramp_track(rate: u32) -> Arc<Vec<f32>> {
        let mut samples = Vec::with_capacity(rate as usize * 2);
        for i in 0..rate {
            let v = i as f32 / rate as f32;
            samples.push(v);
            samples.push(-v);
        }
        Arc::new(samples)
    }

    fn ready_player(rate: u32) -> SamplePlayer {
        let player = SamplePlayer::new();
        player.load(ramp_track(rate), rate);
        player.voice().lock().set_output(rate, true);
        player
    }

    #[test]
    fn test_empty_player() {
        let mut player = SamplePlayer::new();
        assert!(!player.is_loaded());
        assert_eq!(player.duration(), 0.0);
        assert_eq!(player.play(), Err(EngineError::NoMediaLoaded));
    }

    #[test]
    fn test_play_needs_running_output() {
        let mut player = SamplePlayer::new();
        player.load(ramp_track(1000), 1000);
        assert!(matches!(
            player.play(),
            Err(EngineError::PlaybackBlocked(_))
        ));
        assert!(player.is_paused());
    }

    #[test]
    fn test_seek_is_clamped() {
        let mut player = ready_player(1000);
        player.set_position(5.0);
        assert_eq!(player.position(), 1.0);
        player.set_position(-1.0);
        assert_eq!(player.position(), 0.0);
        player.set_position(f64::NAN);
        assert_eq!(player.position(), 0.0);
    }

    #[test]
    fn test_render_advances_by_rate() {
        let mut player = ready_player(1000);
        player.set_rate(0.5);
        player.play().unwrap();

        let voice = player.voice();
        let mut out = vec![0.0f32; 200]; // 100 frames
        voice.lock().render(&mut out);
        assert!((player.position() - 0.05).abs() < 1e-9);
        assert!(out.iter().all(|s| s.is_finite()));
        // Right channel mirrors the left
        assert!((out[10] + out[11]).abs() < 1e-6);
    }

    #[test]
    fn test_render_resamples_to_output_rate() {
        let player = SamplePlayer::new();
        player.load(ramp_track(1000), 1000);
        player.voice().lock().set_output(2000, true);
        let mut handle = player.clone();
        handle.play().unwrap();

        let mut out = vec![0.0f32; 400];
        player.voice().lock().render(&mut out);
        assert!((handle.position() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_paused_renders_silence() {
        let player = ready_player(1000);
        let mut out = vec![1.0f32; 64];
        player.voice().lock().render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(player.position(), 0.0);
    }

    #[test]
    fn test_end_reported_once() {
        let mut player = ready_player(1000);
        player.set_position(0.99);
        player.play().unwrap();

        let mut out = vec![0.0f32; 100];
        player.voice().lock().render(&mut out);
        assert!(player.is_paused());
        assert_eq!(player.position(), 1.0);
        assert!(player.take_ended());
        assert!(!player.take_ended());
    }

    #[test]
    fn test_play_at_end_restarts() {
        let mut player = ready_player(1000);
        player.set_position(1.0);
        player.play().unwrap();
        assert_eq!(player.position(), 0.0);
    }
}

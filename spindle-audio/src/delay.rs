//! Feedback echo on the wet path
//!
//! The delay line is fed with the unfiltered source plus its own output
//! scaled by the feedback gain. The mix gain only scales what reaches the
//! output, so echoes keep building while the mix is down.

/// Longest echo the line can hold (seconds)
pub const MAX_ECHO_SECS: f32 = 1.0;

/// Stereo feedback delay
pub struct EchoDelay {
    sample_rate: f32,
    /// Stereo interleaved ring buffer
    buffer: Vec<f32>,
    /// Buffer length in stereo frames
    buffer_frames: usize,
    write_pos: usize,
    /// Delay in whole frames
    delay_frames: usize,
    /// Feedback gain (0.0 - 0.95)
    feedback: f32,
    /// Output gain for the wet signal (0.0 - 1.0)
    mix: f32,
}

impl EchoDelay {
    pub fn new(sample_rate: u32, delay_ms: f32, feedback: f32) -> Self {
        let sr = sample_rate.max(1) as f32;
        let buffer_frames = ((sr * MAX_ECHO_SECS) as usize).max(2);
        let mut delay = Self {
            sample_rate: sr,
            buffer: vec![0.0; buffer_frames * 2],
            buffer_frames,
            write_pos: 0,
            delay_frames: 1,
            feedback: 0.0,
            mix: 0.0,
        };
        delay.set_delay_ms(delay_ms);
        delay.set_feedback(feedback);
        delay
    }

    /// Set echo time in milliseconds (1 ms up to the line length)
    pub fn set_delay_ms(&mut self, ms: f32) {
        let max_ms = MAX_ECHO_SECS * 1000.0;
        let ms = if ms.is_finite() { ms.clamp(1.0, max_ms) } else { 250.0 };
        self.delay_frames =
            ((ms * self.sample_rate / 1000.0).round() as usize).clamp(1, self.buffer_frames - 1);
    }

    pub fn delay_ms(&self) -> f32 {
        self.delay_frames as f32 / self.sample_rate * 1000.0
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.95);
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    pub fn mix(&self) -> f32 {
        self.mix
    }

    /// Soft saturation for the feedback path
    #[inline(always)]
    fn soft_saturate(x: f32) -> f32 {
        x / (1.0 + x.abs())
    }

    /// Feed one source frame, return the mixed wet frame
    #[inline]
    pub fn process_frame(&mut self, l: f32, r: f32) -> (f32, f32) {
        let read_pos = if self.write_pos >= self.delay_frames {
            self.write_pos - self.delay_frames
        } else {
            self.buffer_frames - (self.delay_frames - self.write_pos)
        };
        let delayed_l = self.buffer[read_pos * 2];
        let delayed_r = self.buffer[read_pos * 2 + 1];

        let write_idx = self.write_pos * 2;
        self.buffer[write_idx] = Self::soft_saturate(l + delayed_l * self.feedback);
        self.buffer[write_idx + 1] = Self::soft_saturate(r + delayed_r * self.feedback);
        self.write_pos = (self.write_pos + 1) % self.buffer_frames;

        (delayed_l * self.mix, delayed_r * self.mix)
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impulse_returns_after_delay() {
        let mut delay = EchoDelay::new(1000, 10.0, 0.5);
        delay.set_mix(1.0);
        let mut out = Vec::new();
        out.push(delay.process_frame(0.5, 0.5).0);
        for _ in 0..30 {
            out.push(delay.process_frame(0.0, 0.0).0);
        }
        let first = out.iter().position(|&s| s != 0.0).unwrap();
        assert_eq!(first, 10);
        // Second repeat is quieter
        assert!(out[20].abs() > 0.0);
        assert!(out[20].abs() < out[10].abs());
    }

    #[test]
    fn test_zero_mix_is_silent() {
        let mut delay = EchoDelay::new(1000, 5.0, 0.35);
        for _ in 0..100 {
            let (l, r) = delay.process_frame(1.0, -1.0);
            assert_eq!(l, 0.0);
            assert_eq!(r, 0.0);
        }
    }

    #[test]
    fn test_feedback_stays_bounded() {
        let mut delay = EchoDelay::new(1000, 1.0, 5.0);
        assert_eq!(delay.feedback(), 0.95);
        delay.set_mix(1.0);
        for _ in 0..10_000 {
            let (l, r) = delay.process_frame(1.0, 1.0);
            assert!(l.is_finite() && l.abs() <= 1.0);
            assert!(r.is_finite() && r.abs() <= 1.0);
        }
    }

    #[test]
    fn test_delay_time_clamped() {
        let mut delay = EchoDelay::new(48000, 250.0, 0.35);
        assert!((delay.delay_ms() - 250.0).abs() < 0.1);
        delay.set_delay_ms(5000.0);
        assert!(delay.delay_ms() < 1000.0);
        delay.set_delay_ms(0.0);
        assert!(delay.delay_ms() >= 1.0 / 48.0);
    }

    #[test]
    fn test_soft_saturate() {
        assert!(EchoDelay::soft_saturate(10.0) < 1.0);
        assert!(EchoDelay::soft_saturate(-10.0) > -1.0);
        assert!((EchoDelay::soft_saturate(0.1) - 0.091).abs() < 0.01);
    }
}

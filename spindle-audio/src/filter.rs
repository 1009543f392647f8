//! Biquad low-pass tone filter

use std::f32::consts::PI;

/// Butterworth Q
const DEFAULT_Q: f32 = 0.707;

/// Stereo biquad low-pass on the dry path
pub struct ToneFilter {
    sample_rate: f32,
    cutoff: f32, // Hz
    q: f32,

    // Biquad coefficients
    a0: f32,
    a1: f32,
    a2: f32,
    b1: f32,
    b2: f32,

    // State variables (stereo)
    x1_l: f32,
    x2_l: f32,
    y1_l: f32,
    y2_l: f32,
    x1_r: f32,
    x2_r: f32,
    y1_r: f32,
    y2_r: f32,
}

impl ToneFilter {
    pub fn new(sample_rate: u32, cutoff: f32) -> Self {
        let mut filter = Self {
            sample_rate: sample_rate.max(1) as f32,
            cutoff,
            q: DEFAULT_Q,
            a0: 1.0,
            a1: 0.0,
            a2: 0.0,
            b1: 0.0,
            b2: 0.0,
            x1_l: 0.0,
            x2_l: 0.0,
            y1_l: 0.0,
            y2_l: 0.0,
            x1_r: 0.0,
            x2_r: 0.0,
            y1_r: 0.0,
            y2_r: 0.0,
        };
        filter.set_cutoff(cutoff);
        filter
    }

    /// Set cutoff frequency. Kept below Nyquist for the current rate.
    pub fn set_cutoff(&mut self, cutoff: f32) {
        let nyquist_guard = self.sample_rate * 0.49;
        self.cutoff = if cutoff.is_finite() {
            cutoff.clamp(10.0, nyquist_guard)
        } else {
            nyquist_guard
        };
        self.calculate_coefficients();
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    fn calculate_coefficients(&mut self) {
        let omega = 2.0 * PI * self.cutoff / self.sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * self.q);

        let b0 = (1.0 - cos_omega) / 2.0;
        let b1 = 1.0 - cos_omega;
        let b2 = (1.0 - cos_omega) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        self.a0 = b0 / a0;
        self.a1 = b1 / a0;
        self.a2 = b2 / a0;
        self.b1 = a1 / a0;
        self.b2 = a2 / a0;
    }

    #[inline]
    fn process_sample(&mut self, input: f32, is_right: bool) -> f32 {
        let (x1, x2, y1, y2) = if is_right {
            (
                &mut self.x1_r,
                &mut self.x2_r,
                &mut self.y1_r,
                &mut self.y2_r,
            )
        } else {
            (
                &mut self.x1_l,
                &mut self.x2_l,
                &mut self.y1_l,
                &mut self.y2_l,
            )
        };

        let output =
            self.a0 * input + self.a1 * *x1 + self.a2 * *x2 - self.b1 * *y1 - self.b2 * *y2;

        *x2 = *x1;
        *x1 = input;
        *y2 = *y1;
        *y1 = output;

        output
    }

    /// Filter one stereo frame
    #[inline]
    pub fn process_frame(&mut self, l: f32, r: f32) -> (f32, f32) {
        (self.process_sample(l, false), self.process_sample(r, true))
    }

    pub fn reset(&mut self) {
        self.x1_l = 0.0;
        self.x2_l = 0.0;
        self.y1_l = 0.0;
        self.y2_l = 0.0;
        self.x1_r = 0.0;
        self.x2_r = 0.0;
        self.y1_r = 0.0;
        self.y2_r = 0.0;
    }
}

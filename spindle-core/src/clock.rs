//! Frame clock - turns monotonic frame timestamps into time deltas

use std::time::Duration;

/// Converts the host's per-frame timestamps into `dt` seconds.
///
/// The timestamp is opaque: anything monotonic measured from a fixed origin
/// (e.g. `Instant::duration_since(start)`) works.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last: Option<Duration>,
}

impl FrameClock {
    /// Create a clock that has not seen a frame yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a frame at `now` and return seconds since the previous frame.
    ///
    /// The first frame yields 0.0. A timestamp earlier than the previous one
    /// also yields 0.0 and does not move the clock backwards.
    pub fn advance(&mut self, now: Duration) -> f64 {
        let dt = match self.last {
            None => 0.0,
            Some(last) => now.saturating_sub(last).as_secs_f64(),
        };
        self.last = Some(self.last.map_or(now, |last| last.max(now)));
        dt
    }

    /// Forget the previous frame (next `advance` yields 0.0)
    pub fn reset(&mut self) {
        self.last = None;
    }
}

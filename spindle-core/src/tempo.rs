//! Tempo/pitch model
//!
//! Tempo is a percentage offset from the record's natural speed. Speed and
//! pitch move together, as on a real turntable.

/// Rate offset applied by a nudge
pub const NUDGE_OFFSET: f64 = 0.04;

/// How long a nudge holds the offset (seconds)
pub const NUDGE_DURATION: f64 = 0.120;

/// Playback rate multiplier for a tempo percentage
#[inline]
pub fn rate_from_tempo(percent: f64) -> f64 {
    1.0 + percent / 100.0
}

/// Tempo setting (the pitch fader)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tempo {
    percent: f64,
}

impl Tempo {
    pub fn new(percent: f64) -> Self {
        Self { percent }
    }

    /// Current tempo in percent
    pub fn percent(&self) -> f64 {
        self.percent
    }

    /// Set tempo in percent
    pub fn set_percent(&mut self, percent: f64) {
        self.percent = percent;
    }

    /// Rate the transport returns to after any transient
    pub fn nominal_rate(&self) -> f64 {
        rate_from_tempo(self.percent)
    }

    /// Applied rate as a signed percentage, e.g. "+2.5%"
    pub fn display(&self) -> String {
        let shown = (self.nominal_rate() - 1.0) * 100.0;
        if shown.abs() < 0.05 {
            "0.0%".to_string()
        } else {
            format!("{:+.1}%", shown)
        }
    }
}

/// Nudge direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudgeDirection {
    Slower,
    Faster,
}

impl NudgeDirection {
    /// Signed rate offset for this direction
    pub fn offset(self) -> f64 {
        match self {
            NudgeDirection::Slower => -NUDGE_OFFSET,
            NudgeDirection::Faster => NUDGE_OFFSET,
        }
    }
}

/// A momentary rate offset that expires after [`NUDGE_DURATION`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NudgePulse {
    direction: NudgeDirection,
    remaining: f64,
}

impl NudgePulse {
    pub fn new(direction: NudgeDirection) -> Self {
        Self {
            direction,
            remaining: NUDGE_DURATION,
        }
    }

    pub fn direction(&self) -> NudgeDirection {
        self.direction
    }

    /// Rate to apply while the pulse is live
    pub fn rate(&self, nominal: f64) -> f64 {
        nominal + self.direction.offset()
    }

    /// Consume `dt` seconds. Returns true when the pulse has expired.
    pub fn advance(&mut self, dt: f64) -> bool {
        self.remaining -= dt.max(0.0);
        self.remaining <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_from_tempo_exact() {
        for p in [-16.0, -8.0, -2.5, -0.1, 0.0, 0.1, 3.3, 8.0, 50.0] {
            assert_eq!(rate_from_tempo(p), 1.0 + p / 100.0);
        }
        assert_eq!(rate_from_tempo(0.0), 1.0);
    }

    #[test]
    fn test_tempo_display() {
        assert_eq!(Tempo::new(0.0).display(), "0.0%");
        assert_eq!(Tempo::new(2.5).display(), "+2.5%");
        assert_eq!(Tempo::new(-8.0).display(), "-8.0%");
    }

    #[test]
    fn test_nudge_pulse_expires() {
        let mut pulse = NudgePulse::new(NudgeDirection::Faster);
        assert!((pulse.rate(1.0) - 1.04).abs() < 1e-12);
        assert!(!pulse.advance(0.1));
        assert!(pulse.advance(0.03));
    }

    #[test]
    fn test_nudge_slower_offset() {
        let pulse = NudgePulse::new(NudgeDirection::Slower);
        assert!((pulse.rate(1.02) - 0.98).abs() < 1e-12);
    }
}

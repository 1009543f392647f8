//! Scratch controller - pointer motion to platter angle and audio time
//!
//! A drag on the platter is sampled as pointer positions. Each sample is
//! turned into an angle around the platter center; the shortest-path delta
//! between samples becomes both a platter rotation and a playhead offset
//! (one turn = `SECONDS_PER_TURN` seconds of audio).
//!
//! Release velocity is measured over a short trailing window rather than the
//! last pair of samples: terminals deliver pointer reports in bursts, so two
//! consecutive samples can be microseconds apart.

use crate::rotation::{REFERENCE_FRAME_DT, SECONDS_PER_TURN};
use std::collections::VecDeque;
use std::f64::consts::{PI, TAU};
use std::time::Duration;

/// Span of recent samples the drag velocity is averaged over
pub const VELOCITY_WINDOW: Duration = Duration::from_millis(50);

/// Pointer position in the host's coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Angle of this point around `center`, in (-π, π]
    pub fn angle_around(self, center: Point) -> f64 {
        (self.y - center.y).atan2(self.x - center.x)
    }
}

/// Shortest signed angle from `from` to `to`, normalized into (-π, π]
pub fn shortest_delta(from: f64, to: f64) -> f64 {
    let mut d = to - from;
    if d > PI {
        d -= TAU;
    } else if d <= -PI {
        d += TAU;
    }
    d
}

/// Audio seconds covered by a platter angle
#[inline]
pub fn time_from_angle(angle: f64) -> f64 {
    angle / TAU * SECONDS_PER_TURN
}

/// An open drag gesture
#[derive(Debug, Clone, PartialEq)]
pub struct ScratchSession {
    last_angle: f64,
    last_sample_time: Duration,
    /// (timestamp, audio seconds moved) per sample; the front entry is the
    /// anchor the window is measured from
    samples: VecDeque<(Duration, f64)>,
    /// Audio seconds per second over the trailing window
    velocity: f64,
    /// Transport was playing when the hand came down
    resume_after: bool,
}

impl ScratchSession {
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn resume_after(&self) -> bool {
        self.resume_after
    }

    pub fn last_angle(&self) -> f64 {
        self.last_angle
    }

    /// Record a sample and re-estimate the velocity.
    ///
    /// Keeps exactly one sample at or before the window start as the anchor.
    /// Spans shorter than one reference frame are stretched to one frame.
    fn record(&mut self, now: Duration, time_delta: f64) -> f64 {
        self.samples.push_back((now, time_delta));
        let window_start = now.saturating_sub(VELOCITY_WINDOW);
        while self.samples.len() > 2 && self.samples[1].0 <= window_start {
            self.samples.pop_front();
        }

        let Some(&(anchor, _)) = self.samples.front() else {
            return 0.0;
        };
        let span = now.saturating_sub(anchor).as_secs_f64();
        if span <= 0.0 {
            return 0.0;
        }
        let moved: f64 = self.samples.iter().skip(1).map(|&(_, d)| d).sum();
        moved / span.max(REFERENCE_FRAME_DT)
    }
}

/// One processed pointer sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScratchMove {
    /// Platter rotation in radians
    pub angle_delta: f64,
    /// Playhead offset in audio seconds
    pub time_delta: f64,
    /// Instantaneous velocity (audio seconds per second)
    pub velocity: f64,
}

/// Tracks the platter center and the current drag, if any
#[derive(Debug, Clone, Default)]
pub struct ScratchController {
    center: Point,
    session: Option<ScratchSession>,
}

impl ScratchController {
    pub fn new(center: Point) -> Self {
        Self {
            center,
            session: None,
        }
    }

    /// Platter center used for angle computation
    pub fn center(&self) -> Point {
        self.center
    }

    /// Update the platter center (the host re-lays out the platter)
    pub fn set_center(&mut self, center: Point) {
        self.center = center;
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&ScratchSession> {
        self.session.as_ref()
    }

    /// Open a session at `point`. Replaces any session already open.
    pub fn press(&mut self, point: Point, now: Duration, was_playing: bool) {
        self.session = Some(ScratchSession {
            last_angle: point.angle_around(self.center),
            last_sample_time: now,
            samples: VecDeque::from([(now, 0.0)]),
            velocity: 0.0,
            resume_after: was_playing,
        });
    }

    /// Process a pointer sample. Returns None without an open session.
    ///
    /// A sample with no time elapsed since the window anchor records zero
    /// velocity.
    pub fn move_to(&mut self, point: Point, now: Duration) -> Option<ScratchMove> {
        let center = self.center;
        let session = self.session.as_mut()?;

        let angle = point.angle_around(center);
        let angle_delta = shortest_delta(session.last_angle, angle);
        session.last_angle = angle;

        // Out-of-order timestamps are treated as arriving with no delay
        let now = session.last_sample_time.max(now);
        session.last_sample_time = now;

        let time_delta = time_from_angle(angle_delta);
        session.velocity = session.record(now, time_delta);

        Some(ScratchMove {
            angle_delta,
            time_delta,
            velocity: session.velocity,
        })
    }

    /// Close the session, handing it back for the release decision
    pub fn release(&mut self) -> Option<ScratchSession> {
        self.session.take()
    }

    /// Drop the session without a release decision
    pub fn cancel(&mut self) {
        self.session = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on_circle(angle: f64) -> Point {
        Point::new(angle.cos() * 10.0, angle.sin() * 10.0)
    }

    #[test]
    fn test_shortest_delta_wraps_seam() {
        // Crossing from just below π to just above -π is a small positive step
        let d = shortest_delta(PI - 0.1, -PI + 0.1);
        assert!((d - 0.2).abs() < 1e-12);

        let d = shortest_delta(-PI + 0.1, PI - 0.1);
        assert!((d + 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_shortest_delta_range() {
        assert_eq!(shortest_delta(0.0, PI), PI);
        assert_eq!(shortest_delta(PI, 0.0), PI);
        assert!((shortest_delta(0.0, 0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_half_turn_velocity() {
        let mut scratch = ScratchController::new(Point::default());
        scratch.press(on_circle(0.0), Duration::from_millis(1000), true);
        let mv = scratch
            .move_to(Point::new(-10.0, 0.0), Duration::from_millis(1100))
            .unwrap();
        assert!((mv.time_delta - 0.9).abs() < 1e-12);
        assert!((mv.velocity - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_dt_sample_has_zero_velocity() {
        let mut scratch = ScratchController::new(Point::default());
        scratch.press(on_circle(0.0), Duration::from_millis(50), false);
        let mv = scratch
            .move_to(on_circle(0.3), Duration::from_millis(50))
            .unwrap();
        assert_eq!(mv.velocity, 0.0);
        assert!(mv.time_delta > 0.0);
    }

    #[test]
    fn test_burst_velocity_is_averaged() {
        // Two reports 20µs apart after a 16 ms gap
        let mut scratch = ScratchController::new(Point::default());
        scratch.press(on_circle(0.0), Duration::ZERO, true);
        scratch.move_to(on_circle(0.1), Duration::from_micros(16_000));
        let mv = scratch
            .move_to(on_circle(0.2), Duration::from_micros(16_020))
            .unwrap();

        // 16.02 ms is just under one reference frame
        let expected = time_from_angle(0.2) / REFERENCE_FRAME_DT;
        assert!((mv.velocity - expected).abs() < 1e-9);
        assert!(mv.velocity < 4.0);
    }

    #[test]
    fn test_burst_after_press_uses_one_frame() {
        let mut scratch = ScratchController::new(Point::default());
        scratch.press(on_circle(0.0), Duration::from_millis(100), true);
        let mv = scratch
            .move_to(on_circle(0.1), Duration::from_micros(100_005))
            .unwrap();
        let expected = time_from_angle(0.1) / REFERENCE_FRAME_DT;
        assert!((mv.velocity - expected).abs() < 1e-9);
    }

    #[test]
    fn test_velocity_window_drops_old_samples() {
        let mut scratch = ScratchController::new(Point::default());
        scratch.press(on_circle(0.0), Duration::ZERO, true);
        scratch.move_to(on_circle(1.0), Duration::from_millis(100));
        scratch.move_to(on_circle(1.1), Duration::from_millis(200));
        let mv = scratch
            .move_to(on_circle(1.2), Duration::from_millis(300))
            .unwrap();
        // Anchored on the sample at 200 ms: 0.1 rad over 0.1 s
        let expected = time_from_angle(0.1) / 0.1;
        assert!((mv.velocity - expected).abs() < 1e-9);
    }

    #[test]
    fn test_move_without_session_is_ignored() {
        let mut scratch = ScratchController::new(Point::default());
        assert!(scratch.move_to(on_circle(1.0), Duration::ZERO).is_none());
        assert!(scratch.release().is_none());
    }

    #[test]
    fn test_angles_use_center() {
        let center = Point::new(40.0, 12.0);
        let scratch = ScratchController::new(center);
        assert!((Point::new(40.0, 20.0).angle_around(scratch.center()) - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_release_returns_session() {
        let mut scratch = ScratchController::new(Point::default());
        scratch.press(on_circle(0.0), Duration::ZERO, true);
        scratch.move_to(on_circle(0.2), Duration::from_millis(10));
        let session = scratch.release().unwrap();
        assert!(session.resume_after());
        assert!(session.velocity() > 0.0);
        assert!(!scratch.is_active());
    }
}

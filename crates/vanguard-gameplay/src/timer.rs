//! Frame-driven countdown timer.
//!
//! Timers advance only through explicit [`CountdownTimer::tick`] calls made
//! once per frame; there is no internal clock.

use serde::{Deserialize, Serialize};

/// Slack allowed when a countdown is compared against zero.
///
/// Frame deltas like 0.2 are inexact in `f32`; a countdown fed `duration / n`
/// exactly `n` times can stop a few ulps above zero.
const EXPIRY_SLACK: f32 = 1e-5;

/// Returns true once `remaining` is zero, up to rounding, for a countdown
/// that started at `duration`.
#[must_use]
pub(crate) fn countdown_elapsed(remaining: f32, duration: f32) -> bool {
    remaining <= EXPIRY_SLACK * duration.abs().max(1.0)
}

/// A countdown that stops once its remaining time reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountdownTimer {
    /// Initial duration in seconds.
    duration: f32,
    /// Remaining time in seconds.
    remaining: f32,
    /// Whether the timer is still counting down.
    running: bool,
}

impl CountdownTimer {
    /// Creates a running timer.
    #[must_use]
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            remaining: duration,
            running: duration > 0.0,
        }
    }

    /// Advances the timer. Returns true on the tick that stops it.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.running {
            return false;
        }
        self.remaining -= dt;
        if countdown_elapsed(self.remaining, self.duration) {
            self.remaining = 0.0;
            self.running = false;
            return true;
        }
        false
    }

    /// Restarts the countdown from the full duration.
    pub fn reset(&mut self) {
        self.remaining = self.duration;
        self.running = self.duration > 0.0;
    }

    /// Returns true once the countdown has elapsed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        !self.running
    }

    /// Remaining seconds.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Initial duration in seconds.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Elapsed fraction in `0.0..=1.0`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (1.0 - self.remaining / self.duration).clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_stops_once() {
        let mut timer = CountdownTimer::new(1.0);
        assert!(!timer.tick(0.5));
        assert!(!timer.is_finished());
        assert!(timer.tick(0.5));
        assert!(timer.is_finished());
        assert!(!timer.tick(0.5));
        assert_eq!(timer.remaining(), 0.0);
    }

    #[test]
    fn test_timer_absorbs_frame_rounding() {
        let mut timer = CountdownTimer::new(1.0);
        for _ in 0..4 {
            assert!(!timer.tick(0.2));
        }
        assert!(timer.tick(0.2));

        let mut timer = CountdownTimer::new(1.0);
        let ticks: Vec<bool> = (0..10).map(|_| timer.tick(0.1)).collect();
        assert_eq!(ticks.iter().position(|&t| t), Some(9));

        let mut timer = CountdownTimer::new(1.0);
        for dt in [0.3, 0.1, 0.25] {
            assert!(!timer.tick(dt));
        }
        assert!(timer.tick(0.35));
    }

    #[test]
    fn test_timer_reset() {
        let mut timer = CountdownTimer::new(2.0);
        timer.tick(1.5);
        assert!((timer.progress() - 0.75).abs() < 1e-6);
        timer.reset();
        assert_eq!(timer.remaining(), 2.0);
        assert!(!timer.is_finished());
    }
}

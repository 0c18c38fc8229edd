//! Clock sources
//!
//! The registry never owns tick cadence. It reads two monotonic readings
//! from a [`ClockSource`] supplied by whoever drives it:
//!
//! - **scaled** time, which can be slowed down or paused
//! - **unscaled** time, which always advances
//!
//! [`FrameClock`] is the reference implementation: the driver steps it
//! once per frame before calling `TimerRegistry::advance`.

use std::cell::Cell;

use cadence_types::ClockKind;

/// Supplies the current time readings, in seconds.
///
/// Both readings must be monotonically non-decreasing.
pub trait ClockSource {
    /// Time that follows the time scale
    fn scaled_time(&self) -> f64;

    /// Time that ignores the time scale
    fn unscaled_time(&self) -> f64;

    /// Reading for the given clock kind
    fn time(&self, kind: ClockKind) -> f64 {
        match kind {
            ClockKind::Scaled => self.scaled_time(),
            ClockKind::Unscaled => self.unscaled_time(),
        }
    }
}

/// Frame-stepped clock with a time scale.
///
/// Interior mutability lets the driver keep stepping the clock while the
/// registry and every timer hold shared references to it.
#[derive(Debug)]
pub struct FrameClock {
    scaled: Cell<f64>,
    unscaled: Cell<f64>,
    time_scale: Cell<f64>,
    frame: Cell<u64>,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Create a clock at t = 0 running at real time
    pub fn new() -> Self {
        Self {
            scaled: Cell::new(0.0),
            unscaled: Cell::new(0.0),
            time_scale: Cell::new(1.0),
            frame: Cell::new(0),
        }
    }

    /// Create a clock at t = 0 with the given time scale
    pub fn with_time_scale(time_scale: f64) -> Self {
        let clock = Self::new();
        clock.set_time_scale(time_scale);
        clock
    }

    /// Advance one frame.
    ///
    /// Unscaled time moves by `delta_secs`, scaled time by
    /// `delta_secs * time_scale`. Negative or NaN deltas are treated as 0.
    pub fn step(&self, delta_secs: f64) {
        let delta = if delta_secs > 0.0 { delta_secs } else { 0.0 };
        self.unscaled.set(self.unscaled.get() + delta);
        self.scaled
            .set(self.scaled.get() + delta * self.time_scale.get());
        self.frame.set(self.frame.get() + 1);
    }

    /// Set both readings to `t`. Never moves either reading backwards.
    pub fn jump_to(&self, t: f64) {
        if t > self.scaled.get() {
            self.scaled.set(t);
        }
        if t > self.unscaled.get() {
            self.unscaled.set(t);
        }
        self.frame.set(self.frame.get() + 1);
    }

    /// Set the scale applied to scaled time. Clamped to >= 0; 0 pauses.
    pub fn set_time_scale(&self, time_scale: f64) {
        let scale = if time_scale > 0.0 { time_scale } else { 0.0 };
        self.time_scale.set(scale);
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale.get()
    }

    /// Number of steps/jumps taken so far
    pub fn frame_count(&self) -> u64 {
        self.frame.get()
    }
}

impl ClockSource for FrameClock {
    fn scaled_time(&self) -> f64 {
        self.scaled.get()
    }

    fn unscaled_time(&self) -> f64 {
        self.unscaled.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_applies_time_scale_to_scaled_only() {
        let clock = FrameClock::with_time_scale(0.5);
        clock.step(2.0);

        assert_eq!(clock.unscaled_time(), 2.0);
        assert_eq!(clock.scaled_time(), 1.0);
        assert_eq!(clock.frame_count(), 1);
    }

    #[test]
    fn zero_scale_pauses_scaled_time() {
        let clock = FrameClock::new();
        clock.step(1.0);
        clock.set_time_scale(0.0);
        clock.step(1.0);

        assert_eq!(clock.scaled_time(), 1.0);
        assert_eq!(clock.unscaled_time(), 2.0);
    }

    #[test]
    fn clock_never_runs_backwards() {
        let clock = FrameClock::new();
        clock.jump_to(3.0);
        clock.jump_to(1.0);
        clock.step(-5.0);
        clock.set_time_scale(-2.0);

        assert_eq!(clock.scaled_time(), 3.0);
        assert_eq!(clock.unscaled_time(), 3.0);
        assert_eq!(clock.time_scale(), 0.0);
    }

    #[test]
    fn time_selects_reading_by_kind() {
        let clock = FrameClock::with_time_scale(2.0);
        clock.step(1.5);

        assert_eq!(clock.time(ClockKind::Scaled), 3.0);
        assert_eq!(clock.time(ClockKind::Unscaled), 1.5);
    }
}

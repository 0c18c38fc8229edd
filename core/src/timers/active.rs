//! Timer state and time algebra
//!
//! A `Timer` is the plain data behind a `TimerHandle`: its bounds, state
//! and halt bookkeeping. Every method takes the current reading of the
//! timer's own clock, so nothing here touches the clock, the registry or
//! the callbacks. Those are wired up in `handle.rs` and `registry.rs`.
//!
//! # Lifecycle
//!
//! ```text
//!  Inactive ──arm──▶ Active ──suspend──▶ Suspended
//!                     │  ▲ ◀───resume───────┘
//!                     │  └──────arm/loop──────┐
//!                     ├──cancel──▶ Cancelled ─┤
//!                     └──complete─▶ Completed ┘
//! ```

use cadence_types::{ClockKind, TimerState};

/// Runtime state of a single countdown
#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    // ─── Bounds (seconds on the timer's clock) ──────────────────────────────
    start_time: f64,
    end_time: f64,

    // ─── State ──────────────────────────────────────────────────────────────
    state: TimerState,
    looping: bool,
    clock: ClockKind,

    /// Remaining time captured when the timer was suspended or cancelled
    suspended_remaining: f64,

    /// True when the suspension came from the user rather than the owner
    suspended_manually: bool,

    /// Treat as done regardless of the clock (cleared when bounds reset)
    forced_done: bool,
}

impl Timer {
    /// Create an inactive timer
    pub fn new(clock: ClockKind, looping: bool) -> Self {
        Self {
            start_time: 0.0,
            end_time: 0.0,
            state: TimerState::Inactive,
            looping,
            clock,
            suspended_remaining: 0.0,
            suspended_manually: false,
            forced_done: false,
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn clock(&self) -> ClockKind {
        self.clock
    }

    pub fn uses_unscaled_clock(&self) -> bool {
        self.clock == ClockKind::Unscaled
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    /// Seconds between start and end
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn suspended_manually(&self) -> bool {
        self.suspended_manually
    }

    pub fn is_forced_done(&self) -> bool {
        self.forced_done
    }

    // ─── Transitions ────────────────────────────────────────────────────────

    /// Any state → Active with a fresh duration measured from `now`.
    ///
    /// Non-positive durations collapse to zero so that `end >= start` holds;
    /// such a timer is done on the next sweep.
    pub fn arm(&mut self, now: f64, duration: f64) {
        let duration = if duration > 0.0 { duration } else { 0.0 };
        self.start_time = now;
        self.end_time = now + duration;
        self.state = TimerState::Active;
        self.suspended_remaining = 0.0;
        self.suspended_manually = false;
        self.forced_done = false;
    }

    /// Active → Suspended. Returns true if the state changed.
    ///
    /// Suspending an already-suspended timer manually upgrades the
    /// suspension to manual so it will no longer auto-resume.
    pub fn suspend(&mut self, now: f64, manual: bool) -> bool {
        match self.state {
            TimerState::Active => {
                self.suspended_remaining = self.remaining_at(now);
                self.suspended_manually = manual;
                self.state = TimerState::Suspended;
                true
            }
            TimerState::Suspended => {
                self.suspended_manually |= manual;
                false
            }
            _ => false,
        }
    }

    /// Suspended → Active, keeping the remaining time. Returns true if the
    /// state changed.
    pub fn resume(&mut self, now: f64) -> bool {
        if self.state != TimerState::Suspended {
            return false;
        }
        let duration = self.duration();
        self.end_time = now + self.suspended_remaining;
        self.start_time = self.end_time - duration;
        self.suspended_remaining = 0.0;
        self.suspended_manually = false;
        self.state = TimerState::Active;
        true
    }

    /// Active/Suspended → Cancelled, freezing the remaining time. Returns
    /// true if the state changed.
    pub fn cancel(&mut self, now: f64) -> bool {
        match self.state {
            TimerState::Active => {
                self.suspended_remaining = self.remaining_at(now);
                self.state = TimerState::Cancelled;
                true
            }
            // Remaining time is already frozen
            TimerState::Suspended => {
                self.suspended_manually = false;
                self.state = TimerState::Cancelled;
                true
            }
            _ => false,
        }
    }

    /// Active → Completed
    pub fn complete(&mut self) {
        self.state = TimerState::Completed;
    }

    /// Completed → Active for another period: the new period starts where
    /// the last one ended.
    pub fn loop_once(&mut self) {
        let duration = self.duration();
        self.start_time = self.end_time;
        self.end_time += duration;
        self.forced_done = false;
        self.state = TimerState::Active;
    }

    /// Push the end time forward. Non-positive amounts are ignored.
    ///
    /// State and the forced-done flag are left alone; a halted timer also
    /// gets the extra time added to its frozen remainder.
    pub fn extend(&mut self, secs: f64) {
        if secs.is_nan() || secs <= 0.0 {
            return;
        }
        self.end_time += secs;
        if self.state.is_halted() {
            self.suspended_remaining += secs;
        }
    }

    /// Mark the timer done regardless of its clock
    pub fn force_done(&mut self) {
        self.forced_done = true;
    }

    // ─── Queries ────────────────────────────────────────────────────────────

    /// Completion predicate: not halted, and either forced or past the end
    pub fn is_done(&self, now: f64) -> bool {
        match self.state {
            TimerState::Active | TimerState::Completed => self.forced_done || now >= self.end_time,
            _ => false,
        }
    }

    /// Seconds left. Frozen while halted, never negative.
    pub fn time_remaining(&self, now: f64) -> f64 {
        match self.state {
            TimerState::Suspended | TimerState::Cancelled => self.suspended_remaining,
            TimerState::Active => self.remaining_at(now),
            TimerState::Inactive | TimerState::Completed => 0.0,
        }
    }

    /// Seconds since start, measured up to the halt instant while halted
    pub fn elapsed(&self, now: f64) -> f64 {
        (self.effective_now(now) - self.start_time).clamp(0.0, self.duration())
    }

    /// Linear progress between start and end, clamped to `[0, 1]`
    pub fn percentage_done(&self, now: f64) -> f32 {
        match self.state {
            TimerState::Inactive => 0.0,
            TimerState::Completed => 1.0,
            _ => {
                let duration = self.duration();
                if duration <= 0.0 {
                    return 1.0;
                }
                let t = (self.effective_now(now) - self.start_time) / duration;
                t.clamp(0.0, 1.0) as f32
            }
        }
    }

    /// `percentage_done` eased with smoothstep
    pub fn smoothed_percentage_done(&self, now: f64) -> f32 {
        let t = self.percentage_done(now);
        t * t * (3.0 - 2.0 * t)
    }

    fn remaining_at(&self, now: f64) -> f64 {
        (self.end_time - now).max(0.0)
    }

    /// The instant progress is measured at: `now` while running, the halt
    /// instant while halted
    fn effective_now(&self, now: f64) -> f64 {
        if self.state.is_halted() {
            self.end_time - self.suspended_remaining
        } else {
            now
        }
    }
}

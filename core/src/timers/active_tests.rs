//! Tests for Timer state transitions and time algebra
//!
//! These drive `Timer` directly with explicit clock readings; no registry
//! or callbacks are involved.

use cadence_types::{ClockKind, TimerState};

use super::Timer;

const EPS: f64 = 1e-9;

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < EPS,
        "expected {expected}, got {actual}"
    );
}

fn armed(now: f64, duration: f64) -> Timer {
    let mut timer = Timer::new(ClockKind::Scaled, false);
    timer.arm(now, duration);
    timer
}

// ═══════════════════════════════════════════════════════════════════════════
// Arming
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn new_timer_is_inactive() {
    let timer = Timer::new(ClockKind::Unscaled, true);

    assert_eq!(timer.state(), TimerState::Inactive);
    assert!(timer.uses_unscaled_clock());
    assert!(timer.is_looping());
    assert!(!timer.is_done(100.0));
    assert_eq!(timer.percentage_done(100.0), 0.0);
    assert_eq!(timer.time_remaining(100.0), 0.0);
}

#[test]
fn arm_sets_bounds_from_now() {
    let timer = armed(3.0, 2.0);

    assert_eq!(timer.state(), TimerState::Active);
    assert_close(timer.start_time(), 3.0);
    assert_close(timer.end_time(), 5.0);
    assert_close(timer.duration(), 2.0);
}

#[test]
fn negative_duration_collapses_to_zero() {
    let timer = armed(1.0, -4.0);

    assert_close(timer.end_time(), timer.start_time());
    assert!(timer.is_done(1.0));
    assert_eq!(timer.percentage_done(1.0), 1.0);
}

#[test]
fn arm_clears_forced_done_and_halt_state() {
    let mut timer = armed(0.0, 2.0);
    timer.force_done();
    timer.suspend(1.0, true);

    timer.arm(2.0, 3.0);

    assert_eq!(timer.state(), TimerState::Active);
    assert!(!timer.is_forced_done());
    assert!(!timer.suspended_manually());
    assert!(!timer.is_done(4.0));
}

// ═══════════════════════════════════════════════════════════════════════════
// Completion predicate
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn done_exactly_at_end_time() {
    let timer = armed(0.0, 2.0);

    assert!(!timer.is_done(1.0));
    assert!(!timer.is_done(1.999));
    assert!(timer.is_done(2.0));
    assert!(timer.is_done(7.5));
}

#[test]
fn forced_done_ignores_clock() {
    let mut timer = armed(0.0, 10.0);
    timer.force_done();

    assert!(timer.is_done(0.0));
}

#[test]
fn halted_timer_is_never_done() {
    let mut suspended = armed(0.0, 1.0);
    suspended.force_done();
    suspended.suspend(0.5, true);

    let mut cancelled = armed(0.0, 1.0);
    cancelled.cancel(0.5);

    assert!(!suspended.is_done(5.0));
    assert!(!cancelled.is_done(5.0));
}

// ═══════════════════════════════════════════════════════════════════════════
// Suspend / resume / cancel
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn suspend_then_resume_shifts_bounds() {
    let mut timer = armed(0.0, 2.0);

    assert!(timer.suspend(1.0, true));
    assert_eq!(timer.state(), TimerState::Suspended);
    assert_close(timer.time_remaining(1.0), 1.0);
    assert_close(timer.time_remaining(3.5), 1.0);

    assert!(timer.resume(4.0));
    assert_eq!(timer.state(), TimerState::Active);
    assert_close(timer.end_time(), 5.0);
    assert_close(timer.start_time(), 3.0);
    assert_close(timer.duration(), 2.0);
    assert_close(timer.time_remaining(4.0), 1.0);
}

#[test]
fn suspend_only_from_active() {
    let mut inactive = Timer::new(ClockKind::Scaled, false);
    assert!(!inactive.suspend(0.0, true));

    let mut cancelled = armed(0.0, 1.0);
    cancelled.cancel(0.2);
    assert!(!cancelled.suspend(0.3, true));
    assert_eq!(cancelled.state(), TimerState::Cancelled);
}

#[test]
fn manual_suspend_upgrades_owner_suspension() {
    let mut timer = armed(0.0, 2.0);
    timer.suspend(0.5, false);
    assert!(!timer.suspended_manually());

    assert!(!timer.suspend(0.7, true));
    assert!(timer.suspended_manually());
    assert_close(timer.time_remaining(0.7), 1.5);
}

#[test]
fn resume_is_noop_unless_suspended() {
    let mut timer = armed(0.0, 2.0);
    assert!(!timer.resume(1.0));
    assert_close(timer.end_time(), 2.0);
}

#[test]
fn cancel_freezes_remaining() {
    let mut timer = armed(0.0, 2.0);

    assert!(timer.cancel(1.0));
    assert_eq!(timer.state(), TimerState::Cancelled);
    assert_close(timer.time_remaining(1.0), 1.0);
    assert_close(timer.time_remaining(50.0), 1.0);
    assert!(!timer.cancel(2.0));
}

#[test]
fn cancel_while_suspended_keeps_frozen_remaining() {
    let mut timer = armed(0.0, 4.0);
    timer.suspend(1.0, true);

    assert!(timer.cancel(3.0));
    assert_close(timer.time_remaining(3.0), 3.0);
}

// ═══════════════════════════════════════════════════════════════════════════
// Loop / extend
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn loop_starts_next_period_at_previous_end() {
    let mut timer = armed(0.0, 1.5);
    timer.force_done();
    timer.complete();

    timer.loop_once();

    assert_eq!(timer.state(), TimerState::Active);
    assert_close(timer.start_time(), 1.5);
    assert_close(timer.end_time(), 3.0);
    assert!(!timer.is_forced_done());
}

#[test]
fn extend_only_moves_end_forward() {
    let mut timer = armed(0.0, 2.0);

    timer.extend(1.0);
    assert_close(timer.end_time(), 3.0);
    assert_close(timer.duration(), 3.0);

    timer.extend(-1.0);
    timer.extend(0.0);
    timer.extend(f64::NAN);
    assert_close(timer.end_time(), 3.0);
}

#[test]
fn extend_keeps_forced_done() {
    let mut timer = armed(0.0, 2.0);
    timer.force_done();
    timer.extend(5.0);

    assert!(timer.is_done(0.1));
}

#[test]
fn extend_while_suspended_adds_to_remaining() {
    let mut timer = armed(0.0, 2.0);
    timer.suspend(1.0, true);
    timer.extend(2.0);

    assert_close(timer.time_remaining(1.0), 3.0);
    timer.resume(10.0);
    assert_close(timer.end_time(), 13.0);
    assert_close(timer.duration(), 4.0);
}

// ═══════════════════════════════════════════════════════════════════════════
// Progress
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn percentage_is_linear_and_clamped() {
    let timer = armed(0.0, 2.0);

    assert_eq!(timer.percentage_done(0.0), 0.0);
    assert_eq!(timer.percentage_done(0.5), 0.25);
    assert_eq!(timer.percentage_done(1.0), 0.5);
    assert_eq!(timer.percentage_done(2.0), 1.0);
    assert_eq!(timer.percentage_done(9.0), 1.0);
}

#[test]
fn percentage_while_halted_uses_halt_instant() {
    let mut timer = armed(0.0, 4.0);
    timer.suspend(1.0, true);

    assert_eq!(timer.percentage_done(3.0), 0.25);
    assert_close(timer.elapsed(3.0), 1.0);
}

#[test]
fn smoothed_percentage_applies_smoothstep() {
    let timer = armed(0.0, 4.0);

    assert_eq!(timer.smoothed_percentage_done(0.0), 0.0);
    assert_eq!(timer.smoothed_percentage_done(1.0), 0.15625);
    assert_eq!(timer.smoothed_percentage_done(2.0), 0.5);
    assert_eq!(timer.smoothed_percentage_done(4.0), 1.0);
}

#[test]
fn remaining_never_negative() {
    let timer = armed(0.0, 1.0);
    assert_eq!(timer.time_remaining(3.0), 0.0);
}

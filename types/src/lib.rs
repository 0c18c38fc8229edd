//! Shared configuration and snapshot types for cadence
//!
//! This crate contains serializable types that are shared between the
//! timer core (cadence-core) and the drivers built on top of it (cadence-cli).

use serde::{Deserialize, Serialize};

/// Default tolerance used to merge near-simultaneous completions (seconds)
pub const DEFAULT_TIE_BREAK_SECS: f64 = 0.01;

// ─────────────────────────────────────────────────────────────────────────────
// Timer State
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle state of a timer.
///
/// A timer is in exactly one of these states at any observation point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    /// Created but never given a duration
    #[default]
    Inactive,
    /// Counting down
    Active,
    /// Halted with its remaining time frozen
    Suspended,
    /// Halted for good; only a restart brings it back
    Cancelled,
    /// Reached its end time
    Completed,
}

impl TimerState {
    /// Returns true if the remaining time is frozen (suspended or cancelled)
    pub fn is_halted(&self) -> bool {
        matches!(self, TimerState::Suspended | TimerState::Cancelled)
    }

    /// Short lowercase label for display
    pub fn label(&self) -> &'static str {
        match self {
            TimerState::Inactive => "inactive",
            TimerState::Active => "active",
            TimerState::Suspended => "suspended",
            TimerState::Cancelled => "cancelled",
            TimerState::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TimerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

/// Which clock reading a timer measures itself against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockKind {
    /// Follows the time scale (pauses when the scale is 0)
    #[default]
    Scaled,
    /// Always advances at real rate
    Unscaled,
}

impl ClockKind {
    pub fn from_unscaled(unscaled: bool) -> Self {
        if unscaled {
            ClockKind::Unscaled
        } else {
            ClockKind::Scaled
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Snapshot (query surface)
// ─────────────────────────────────────────────────────────────────────────────

/// Read-only view of one registered timer, taken at a single instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub state: TimerState,
    pub clock: ClockKind,
    pub looping: bool,

    // Timing (seconds on the timer's own clock)
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub time_remaining: f64,
    pub percent_done: f32,

    pub suspended_manually: bool,
    pub has_owner: bool,
    pub registered: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Settings for a timer registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Two timers whose end times differ by at most this many seconds
    /// complete on the same sweep
    #[serde(default = "default_tie_break")]
    pub tie_break_threshold_secs: f64,

    /// Capacity reserved for the timer list up front
    #[serde(default = "default_capacity")]
    pub initial_capacity: usize,
}

fn default_tie_break() -> f64 {
    DEFAULT_TIE_BREAK_SECS
}

fn default_capacity() -> usize {
    64
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            tie_break_threshold_secs: DEFAULT_TIE_BREAK_SECS,
            initial_capacity: default_capacity(),
        }
    }
}

/// Settings for a tick driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Tick rate used when driving the registry in real time
    #[serde(default = "default_fps")]
    pub frames_per_second: u32,

    /// Initial scale applied to the scaled clock (1.0 = real time, 0.0 = paused)
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
}

fn default_fps() -> u32 {
    60
}

fn default_time_scale() -> f64 {
    1.0
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            frames_per_second: default_fps(),
            time_scale: default_time_scale(),
        }
    }
}

impl DriverConfig {
    /// Seconds between two frames at the configured rate
    pub fn frame_secs(&self) -> f64 {
        1.0 / f64::from(self.frames_per_second.max(1))
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub driver: DriverConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halted_states() {
        assert!(TimerState::Suspended.is_halted());
        assert!(TimerState::Cancelled.is_halted());
        assert!(!TimerState::Active.is_halted());
        assert!(!TimerState::Completed.is_halted());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [driver]
            frames_per_second = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.driver.frames_per_second, 30);
        assert_eq!(config.driver.time_scale, 1.0);
        assert_eq!(config.registry, RegistryConfig::default());
    }

    #[test]
    fn frame_secs_guards_zero_rate() {
        let driver = DriverConfig {
            frames_per_second: 0,
            time_scale: 1.0,
        };
        assert_eq!(driver.frame_secs(), 1.0);
    }
}

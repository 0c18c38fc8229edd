//! Timer system
//!
//! This module provides:
//! - **Timer**: state and time algebra of a single countdown
//! - **Handles**: the caller's control surface for one timer
//! - **Callbacks**: optional handlers fired as a timer changes state
//! - **Registry**: the ordered set of live timers and the per-tick sweep
//! - **Owners**: the liveness capability a timer can be bound to
//!
//! # Timer States
//!
//! - `Inactive`: created, never given a duration
//! - `Active`: counting down against its clock
//! - `Suspended`: paused by the user or by a disabled owner
//! - `Cancelled`: stopped, remaining time frozen
//! - `Completed`: reached its end (looping timers restart immediately)

mod active;
mod callbacks;
mod handle;
mod owner;
mod registry;

#[cfg(test)]
mod active_tests;

pub use active::Timer;
pub use callbacks::{TimerCallbacks, TimerEvent, TimerHandler, UpdateHandler};
pub use handle::{TimerHandle, TimerId, TimerOptions};
pub use owner::TimerOwner;
pub use registry::TimerRegistry;

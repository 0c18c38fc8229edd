//! Timer handles
//!
//! A `TimerHandle` is the caller's reference to a timer. The registry keeps
//! its own clone; dropping every external handle does not unregister the
//! timer, only a sweep does.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use cadence_types::{ClockKind, TimerSnapshot, TimerState};
use tracing::{debug, warn};

use super::active::Timer;
use super::callbacks::{TimerCallbacks, TimerEvent};
use super::owner::OwnerRef;
use super::registry::{RegistryShared, TimerRegistry};
use crate::clock::ClockSource;

/// Registry-unique timer identifier
pub type TimerId = u64;

/// Creation options for a timer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimerOptions {
    /// Restart automatically with the same duration on completion
    pub looping: bool,
    /// Measure against unscaled time
    pub unscaled: bool,
    /// Optional name for diagnostics
    pub label: Option<String>,
}

impl TimerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    pub fn unscaled(mut self) -> Self {
        self.unscaled = true;
        self
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub(crate) fn clock(&self) -> ClockKind {
        ClockKind::from_unscaled(self.unscaled)
    }
}

/// Shared storage behind a handle
pub(crate) struct TimerCell {
    pub(crate) id: TimerId,
    pub(crate) label: Option<String>,
    pub(crate) timer: RefCell<Timer>,
    pub(crate) callbacks: RefCell<TimerCallbacks>,
    pub(crate) callback_generation: Cell<u64>,
    pub(crate) owner: Option<OwnerRef>,
    pub(crate) clock: Rc<dyn ClockSource>,
    pub(crate) registry: Weak<RegistryShared>,
    /// Whether the registry's list currently holds this timer
    pub(crate) registered: Cell<bool>,
}

/// Reference-counted handle to one timer.
///
/// Clones refer to the same timer. All control calls take effect
/// immediately; the next sweep observes the new state.
#[derive(Clone)]
pub struct TimerHandle(Rc<TimerCell>);

impl PartialEq for TimerHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TimerHandle {}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("id", &self.0.id)
            .field("label", &self.0.label)
            .field("timer", &*self.0.timer.borrow())
            .field("owner", &self.0.owner)
            .field("registered", &self.0.registered.get())
            .finish()
    }
}

impl TimerHandle {
    pub(crate) fn new(cell: TimerCell) -> Self {
        Self(Rc::new(cell))
    }

    pub(crate) fn cell(&self) -> &TimerCell {
        &self.0
    }

    /// Read-only access to the underlying timer state
    pub fn timer(&self) -> Ref<'_, Timer> {
        self.0.timer.borrow()
    }

    /// Current reading of this timer's clock
    pub fn now(&self) -> f64 {
        let kind = self.0.timer.borrow().clock();
        self.0.clock.time(kind)
    }

    pub fn id(&self) -> TimerId {
        self.0.id
    }

    pub fn label(&self) -> Option<&str> {
        self.0.label.as_deref()
    }

    pub fn has_owner(&self) -> bool {
        self.0.owner.is_some()
    }

    /// The registry this timer belongs to, if it still exists
    pub fn registry(&self) -> Option<TimerRegistry> {
        self.0.registry.upgrade().map(TimerRegistry::from_shared)
    }

    /// Whether the registry currently processes this timer
    pub fn is_registered(&self) -> bool {
        self.0.registered.get()
    }

    // ─── Control surface ────────────────────────────────────────────────────

    /// Arm the timer with a new duration measured from now.
    ///
    /// Works from any state and (re-)registers the timer.
    pub fn start(&self, duration: f64) {
        let now = self.now();
        self.0.timer.borrow_mut().arm(now, duration);
        self.ensure_registered();
    }

    /// Re-arm with the current duration measured from now, firing
    /// on-restarted. Clears cancelled/suspended state.
    pub fn restart(&self) {
        let now = self.now();
        {
            let mut timer = self.0.timer.borrow_mut();
            let duration = timer.duration();
            timer.arm(now, duration);
        }
        self.ensure_registered();
        self.fire(TimerEvent::Restarted);
    }

    /// Stop the timer for good, freezing its remaining time
    pub fn cancel(&self) {
        let now = self.now();
        let changed = self.0.timer.borrow_mut().cancel(now);
        if changed {
            self.fire(TimerEvent::Cancelled);
        }
    }

    /// Pause the timer. A manual suspension is never undone by the owner
    /// becoming enabled again.
    pub fn suspend(&self, manual: bool) {
        let now = self.now();
        let changed = self.0.timer.borrow_mut().suspend(now, manual);
        if changed {
            self.fire(TimerEvent::Suspended);
        }
    }

    /// Continue a suspended timer with the time it had left
    pub fn resume(&self) {
        let now = self.now();
        let changed = self.0.timer.borrow_mut().resume(now);
        if changed {
            self.fire(TimerEvent::Resumed);
        }
    }

    /// Push the end time forward by `secs` (ignored if not positive)
    pub fn extend(&self, secs: f64) {
        self.0.timer.borrow_mut().extend(secs);
    }

    /// Complete on the next sweep regardless of the clock
    pub fn force_completion(&self) {
        self.0.timer.borrow_mut().force_done();
    }

    pub fn set_looping(&self, looping: bool) {
        self.0.timer.borrow_mut().set_looping(looping);
    }

    // ─── Queries ────────────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.0.timer.borrow().state()
    }

    pub fn is_done(&self) -> bool {
        let now = self.now();
        self.0.timer.borrow().is_done(now)
    }

    pub fn is_looping(&self) -> bool {
        self.0.timer.borrow().is_looping()
    }

    pub fn uses_unscaled_clock(&self) -> bool {
        self.0.timer.borrow().uses_unscaled_clock()
    }

    pub fn start_time(&self) -> f64 {
        self.0.timer.borrow().start_time()
    }

    pub fn end_time(&self) -> f64 {
        self.0.timer.borrow().end_time()
    }

    pub fn duration(&self) -> f64 {
        self.0.timer.borrow().duration()
    }

    pub fn time_remaining(&self) -> f64 {
        let now = self.now();
        self.0.timer.borrow().time_remaining(now)
    }

    pub fn elapsed(&self) -> f64 {
        let now = self.now();
        self.0.timer.borrow().elapsed(now)
    }

    pub fn percentage_done(&self) -> f32 {
        let now = self.now();
        self.0.timer.borrow().percentage_done(now)
    }

    pub fn smoothed_percentage_done(&self) -> f32 {
        let now = self.now();
        self.0.timer.borrow().smoothed_percentage_done(now)
    }

    /// Point-in-time view for diagnostics
    pub fn snapshot(&self) -> TimerSnapshot {
        let now = self.now();
        let timer = self.0.timer.borrow();
        TimerSnapshot {
            id: self.0.id,
            label: self.0.label.clone(),
            state: timer.state(),
            clock: timer.clock(),
            looping: timer.is_looping(),
            start_time: timer.start_time(),
            end_time: timer.end_time(),
            duration: timer.duration(),
            time_remaining: timer.time_remaining(now),
            percent_done: timer.percentage_done(now),
            suspended_manually: timer.suspended_manually(),
            has_owner: self.has_owner(),
            registered: self.0.registered.get(),
        }
    }

    // ─── Registry plumbing ──────────────────────────────────────────────────

    /// `(alive, enabled)` of the owner; timers without one are always both
    pub(crate) fn owner_status(&self) -> (bool, bool) {
        self.0
            .owner
            .as_ref()
            .map(OwnerRef::status)
            .unwrap_or((true, true))
    }

    fn ensure_registered(&self) {
        if self.0.registered.get() {
            return;
        }
        match self.0.registry.upgrade() {
            Some(shared) => shared.register(self),
            None => warn!(
                timer_id = self.0.id,
                "timer armed after its registry was dropped; it will never be swept"
            ),
        }
    }

    pub(crate) fn mark_registered(&self, registered: bool) {
        if self.0.registered.replace(registered) != registered {
            debug!(timer_id = self.0.id, registered, "timer registration changed");
        }
    }
}

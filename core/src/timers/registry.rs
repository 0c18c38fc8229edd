//! Timer registry and per-tick sweep
//!
//! The registry holds every live timer and advances them once per tick.
//! The driver steps its clock and then calls [`TimerRegistry::advance`].
//!
//! # Sweep
//!
//! 1. Timers are stably sorted by ascending end time.
//! 2. Each timer is visited exactly once, in that order:
//!    - owner gone → evicted, no callbacks
//!    - cancelled → evicted
//!    - owner disabled → suspended (non-manually); owner enabled again →
//!      non-manual suspensions resume; either way no completion this tick
//!    - not done, but ends within the tie-break threshold of a timer that
//!      came due earlier in this sweep, or of a next timer that is already
//!      done → forced done
//!    - not done → on-updated(percent)
//!    - done → on-updated(1.0), on-completed, then looped or evicted
//! 3. Eviction removes the timer in place and shrinks the visit count, so
//!    nothing is skipped or visited twice.
//!
//! Timers recorded by a handler during the sweep are appended past the
//! visit count and first processed on the next tick. A `clear()` from a
//! handler ends the sweep.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use cadence_types::{RegistryConfig, TimerSnapshot, TimerState};
use tracing::{debug, trace, warn};

use super::active::Timer;
use super::callbacks::{TimerCallbacks, TimerEvent};
use super::handle::{TimerCell, TimerHandle, TimerId, TimerOptions};
use super::owner::{OwnerRef, TimerOwner};
use crate::clock::ClockSource;

/// Why a timer left the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EvictReason {
    OwnerGone,
    Cancelled,
    Completed,
    /// Found in a state the sweep does not process (inactive/completed)
    Stale,
}

/// Result of visiting one timer
enum Visit {
    Keep,
    Evict(EvictReason),
}

/// State shared between a registry and the timers it created
pub(crate) struct RegistryShared {
    timers: RefCell<Vec<TimerHandle>>,
    clock: Rc<dyn ClockSource>,
    config: RegistryConfig,
    next_id: Cell<TimerId>,
    sweeping: Cell<bool>,
    ticks: Cell<u64>,
    /// Bumped by `clear()`
    clears: Cell<u64>,
}

impl RegistryShared {
    /// Append a timer to the sweep list
    pub(crate) fn register(&self, timer: &TimerHandle) {
        self.timers.borrow_mut().push(timer.clone());
        timer.mark_registered(true);
    }
}

impl Drop for RegistryShared {
    fn drop(&mut self) {
        for timer in self.timers.get_mut().iter() {
            timer.mark_registered(false);
        }
    }
}

/// Resets the sweeping flag even if a handler panics
struct SweepGuard<'a>(&'a Cell<bool>);

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Ordered collection of live timers.
///
/// Cloning yields another handle to the same registry. Handlers should reach
/// the registry through `TimerHandle::registry()` rather than capturing a
/// clone, which would keep the registry alive through its own timers.
#[derive(Clone)]
pub struct TimerRegistry {
    shared: Rc<RegistryShared>,
}

impl fmt::Debug for TimerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerRegistry")
            .field("timers", &self.len())
            .field("ticks", &self.tick_count())
            .field("config", &self.shared.config)
            .finish()
    }
}

impl TimerRegistry {
    /// Create a registry reading the given clock, with default settings
    pub fn new(clock: Rc<dyn ClockSource>) -> Self {
        Self::with_config(clock, RegistryConfig::default())
    }

    pub fn with_config(clock: Rc<dyn ClockSource>, config: RegistryConfig) -> Self {
        let shared = RegistryShared {
            timers: RefCell::new(Vec::with_capacity(config.initial_capacity)),
            clock,
            config,
            next_id: Cell::new(1),
            sweeping: Cell::new(false),
            ticks: Cell::new(0),
            clears: Cell::new(0),
        };
        Self {
            shared: Rc::new(shared),
        }
    }

    pub(crate) fn from_shared(shared: Rc<RegistryShared>) -> Self {
        Self { shared }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.shared.config
    }

    pub fn clock(&self) -> Rc<dyn ClockSource> {
        Rc::clone(&self.shared.clock)
    }

    /// Number of completed `advance` calls
    pub fn tick_count(&self) -> u64 {
        self.shared.ticks.get()
    }

    pub fn is_sweeping(&self) -> bool {
        self.shared.sweeping.get()
    }

    // ─── Registration ───────────────────────────────────────────────────────

    /// Create a timer without starting it. It joins the registry on its
    /// first `start(duration)`.
    pub fn create(&self, callbacks: TimerCallbacks, options: TimerOptions) -> TimerHandle {
        self.build(None, callbacks, options)
    }

    /// Create a timer and start it with `duration` seconds
    pub fn record(
        &self,
        duration: f64,
        callbacks: TimerCallbacks,
        options: TimerOptions,
    ) -> TimerHandle {
        let timer = self.build(None, callbacks, options);
        timer.start(duration);
        timer
    }

    /// Create a timer tied to `owner` and start it.
    ///
    /// The timer is suspended while the owner is disabled and evicted once
    /// the owner is dropped or reports itself dead. The registry only holds
    /// a weak reference to the owner.
    pub fn bind<O: TimerOwner + 'static>(
        &self,
        owner: &Rc<O>,
        duration: f64,
        callbacks: TimerCallbacks,
        options: TimerOptions,
    ) -> TimerHandle {
        let timer = self.build(Some(OwnerRef::new(owner)), callbacks, options);
        timer.start(duration);
        timer
    }

    fn build(
        &self,
        owner: Option<OwnerRef>,
        callbacks: TimerCallbacks,
        options: TimerOptions,
    ) -> TimerHandle {
        let id = self.shared.next_id.get();
        self.shared.next_id.set(id + 1);

        TimerHandle::new(TimerCell {
            id,
            label: options.label.clone(),
            timer: RefCell::new(Timer::new(options.clock(), options.looping)),
            callbacks: RefCell::new(callbacks),
            callback_generation: Cell::new(0),
            owner,
            clock: Rc::clone(&self.shared.clock),
            registry: Rc::downgrade(&self.shared),
            registered: Cell::new(false),
        })
    }

    // ─── Sweep ──────────────────────────────────────────────────────────────

    /// Advance every registered timer once. Call exactly once per tick,
    /// after stepping the clock.
    pub fn advance(&self) {
        let shared = &self.shared;
        if shared.sweeping.replace(true) {
            warn!("advance() called from a timer callback during a sweep; ignoring");
            return;
        }
        let _guard = SweepGuard(&shared.sweeping);

        let tick = shared.ticks.get() + 1;
        shared.ticks.set(tick);

        shared
            .timers
            .borrow_mut()
            .sort_by(|a, b| a.end_time().total_cmp(&b.end_time()));

        let clears = shared.clears.get();
        let mut count = shared.timers.borrow().len();
        let visited = count;
        let mut index = 0;
        // End time of the last timer that came due on its own this sweep
        let mut settled: Option<f64> = None;

        while index < count {
            // Handlers may touch the list, so never hold a borrow across a visit
            let Some(timer) = shared.timers.borrow().get(index).cloned() else {
                break;
            };

            let outcome = self.visit(&timer, index, &mut settled);
            if shared.clears.get() != clears {
                debug!(tick, "registry cleared during sweep, stopping");
                break;
            }

            match outcome {
                Visit::Keep => index += 1,
                Visit::Evict(reason) => {
                    self.evict(index, &timer, reason);
                    count -= 1;
                }
            }
        }

        trace!(
            tick,
            visited,
            remaining = shared.timers.borrow().len(),
            "sweep finished"
        );
    }

    fn visit(&self, timer: &TimerHandle, index: usize, settled: &mut Option<f64>) -> Visit {
        let (alive, enabled) = timer.owner_status();
        if !alive {
            return Visit::Evict(EvictReason::OwnerGone);
        }

        let state = timer.state();
        match state {
            TimerState::Cancelled => return Visit::Evict(EvictReason::Cancelled),
            TimerState::Inactive | TimerState::Completed => {
                return Visit::Evict(EvictReason::Stale);
            }
            TimerState::Active | TimerState::Suspended => {}
        }

        if !enabled {
            if state != TimerState::Suspended {
                debug!(timer_id = timer.id(), "owner disabled, suspending timer");
                timer.suspend(false);
            }
            return Visit::Keep;
        }

        if state == TimerState::Suspended {
            if !timer.timer().suspended_manually() {
                debug!(timer_id = timer.id(), "owner enabled, resuming timer");
                timer.resume();
            }
            return Visit::Keep;
        }

        if timer.is_done() {
            if !timer.timer().is_forced_done() {
                *settled = Some(timer.end_time());
            }
        } else {
            if !self.finishes_with_neighbour(timer, index, *settled) {
                timer.fire_updated(timer.percentage_done());
                return Visit::Keep;
            }
            trace!(timer_id = timer.id(), "tie-break with neighbour, forcing completion");
            timer.force_completion();
        }

        self.complete(timer)
    }

    /// Whether `timer` ends within the tie-break threshold of the last timer
    /// that came due this sweep, or of the next timer in sweep order if that
    /// one is already done
    fn finishes_with_neighbour(
        &self,
        timer: &TimerHandle,
        index: usize,
        settled: Option<f64>,
    ) -> bool {
        let threshold = self.shared.config.tie_break_threshold_secs;
        let end = timer.end_time();

        if settled.is_some_and(|prev| (end - prev).abs() <= threshold) {
            return true;
        }

        let Some(next) = self.shared.timers.borrow().get(index + 1).cloned() else {
            return false;
        };
        if next.state() != TimerState::Active || !next.is_done() {
            return false;
        }
        (next.end_time() - end).abs() <= threshold
    }

    fn complete(&self, timer: &TimerHandle) -> Visit {
        timer.cell().timer.borrow_mut().complete();
        timer.fire_updated(1.0);
        timer.fire(TimerEvent::Completed);

        // Re-armed from inside its own handler
        if timer.state() != TimerState::Completed {
            return Visit::Keep;
        }

        if timer.is_looping() {
            timer.cell().timer.borrow_mut().loop_once();
            timer.fire(TimerEvent::Restarted);
            return Visit::Keep;
        }

        Visit::Evict(EvictReason::Completed)
    }

    fn evict(&self, index: usize, timer: &TimerHandle, reason: EvictReason) {
        {
            let mut timers = self.shared.timers.borrow_mut();
            if timers.get(index) == Some(timer) {
                timers.remove(index);
            } else if let Some(pos) = timers.iter().position(|t| t == timer) {
                timers.remove(pos);
            }
        }
        timer.mark_registered(false);
        debug!(timer_id = timer.id(), ?reason, "timer evicted");
    }

    // ─── Query surface ──────────────────────────────────────────────────────

    /// Number of registered timers
    pub fn len(&self) -> usize {
        self.shared.timers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.timers.borrow().is_empty()
    }

    pub fn contains(&self, timer: &TimerHandle) -> bool {
        self.shared.timers.borrow().iter().any(|t| t == timer)
    }

    /// Find a registered timer by id
    pub fn get(&self, id: TimerId) -> Option<TimerHandle> {
        self.shared
            .timers
            .borrow()
            .iter()
            .find(|t| t.id() == id)
            .cloned()
    }

    /// Handles to every registered timer, in the order of the last sweep
    pub fn timers(&self) -> Vec<TimerHandle> {
        self.shared.timers.borrow().clone()
    }

    /// Read-only view of every registered timer
    pub fn snapshot(&self) -> Vec<TimerSnapshot> {
        self.timers().iter().map(TimerHandle::snapshot).collect()
    }

    // ─── Bulk control ───────────────────────────────────────────────────────

    /// Cancel every registered timer. They are evicted on the next sweep.
    pub fn cancel_all(&self) {
        for timer in self.timers() {
            timer.cancel();
        }
    }

    /// Manually suspend every registered timer
    pub fn suspend_all(&self) {
        for timer in self.timers() {
            timer.suspend(true);
        }
    }

    /// Resume every suspended timer, manual or not
    pub fn resume_all(&self) {
        for timer in self.timers() {
            timer.resume();
        }
    }

    /// Drop every timer without firing any callback
    pub fn clear(&self) {
        let clears = &self.shared.clears;
        clears.set(clears.get().wrapping_add(1));
        let timers = std::mem::take(&mut *self.shared.timers.borrow_mut());
        for timer in &timers {
            timer.mark_registered(false);
        }
        debug!(count = timers.len(), "registry cleared");
    }
}

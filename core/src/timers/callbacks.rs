//! Timer callbacks
//!
//! Every timer carries an optional handler per event kind. Absent handlers
//! are a no-op. Handlers run synchronously, either from a control call on
//! the handle (`cancel`, `suspend`, ...) or from inside the registry sweep.
//!
//! Handlers receive the `TimerHandle` of the timer that fired, so they can
//! restart, extend or inspect their own timer without capturing it (which
//! would create a reference cycle). A handler may also record, cancel or
//! suspend other timers; the sweep tolerates that, but the order in which
//! other timers are visited during the same tick is not guaranteed.

use std::fmt;

use super::TimerHandle;

/// Handler for lifecycle events
pub type TimerHandler = Box<dyn FnMut(&TimerHandle)>;

/// Handler for progress updates, receives the percentage done in `[0, 1]`
pub type UpdateHandler = Box<dyn FnMut(&TimerHandle, f32)>;

/// Lifecycle events a timer can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerEvent {
    Completed,
    Cancelled,
    Suspended,
    Resumed,
    Restarted,
}

impl TimerEvent {
    pub const ALL: [TimerEvent; 5] = [
        TimerEvent::Completed,
        TimerEvent::Cancelled,
        TimerEvent::Suspended,
        TimerEvent::Resumed,
        TimerEvent::Restarted,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TimerEvent::Completed => "completed",
            TimerEvent::Cancelled => "cancelled",
            TimerEvent::Suspended => "suspended",
            TimerEvent::Resumed => "resumed",
            TimerEvent::Restarted => "restarted",
        }
    }
}

/// Set of optional handlers attached to one timer.
///
/// ```ignore
/// let callbacks = TimerCallbacks::new()
///     .on_updated(|_, pct| println!("{:.0}%", pct * 100.0))
///     .on_completed(|timer| println!("timer {} done", timer.id()));
/// ```
#[derive(Default)]
pub struct TimerCallbacks {
    updated: Option<UpdateHandler>,
    completed: Option<TimerHandler>,
    cancelled: Option<TimerHandler>,
    suspended: Option<TimerHandler>,
    resumed: Option<TimerHandler>,
    restarted: Option<TimerHandler>,
}

impl TimerCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Builder ────────────────────────────────────────────────────────────

    pub fn on_updated(mut self, handler: impl FnMut(&TimerHandle, f32) + 'static) -> Self {
        self.updated = Some(Box::new(handler));
        self
    }

    pub fn on_completed(self, handler: impl FnMut(&TimerHandle) + 'static) -> Self {
        self.on(TimerEvent::Completed, handler)
    }

    pub fn on_cancelled(self, handler: impl FnMut(&TimerHandle) + 'static) -> Self {
        self.on(TimerEvent::Cancelled, handler)
    }

    pub fn on_suspended(self, handler: impl FnMut(&TimerHandle) + 'static) -> Self {
        self.on(TimerEvent::Suspended, handler)
    }

    pub fn on_resumed(self, handler: impl FnMut(&TimerHandle) + 'static) -> Self {
        self.on(TimerEvent::Resumed, handler)
    }

    pub fn on_restarted(self, handler: impl FnMut(&TimerHandle) + 'static) -> Self {
        self.on(TimerEvent::Restarted, handler)
    }

    /// Attach a handler for any lifecycle event
    pub fn on(mut self, event: TimerEvent, handler: impl FnMut(&TimerHandle) + 'static) -> Self {
        *self.slot_mut(event) = Some(Box::new(handler));
        self
    }

    // ─── In-place management ────────────────────────────────────────────────

    /// Replace (or remove, with `None`) the handler for a lifecycle event
    pub fn set(&mut self, event: TimerEvent, handler: Option<TimerHandler>) {
        *self.slot_mut(event) = handler;
    }

    /// Replace (or remove, with `None`) the progress handler
    pub fn set_updated(&mut self, handler: Option<UpdateHandler>) {
        self.updated = handler;
    }

    pub fn is_set(&self, event: TimerEvent) -> bool {
        match event {
            TimerEvent::Completed => self.completed.is_some(),
            TimerEvent::Cancelled => self.cancelled.is_some(),
            TimerEvent::Suspended => self.suspended.is_some(),
            TimerEvent::Resumed => self.resumed.is_some(),
            TimerEvent::Restarted => self.restarted.is_some(),
        }
    }

    pub fn has_update_handler(&self) -> bool {
        self.updated.is_some()
    }

    /// Check if no handler at all is attached
    pub fn is_empty(&self) -> bool {
        !self.has_update_handler() && TimerEvent::ALL.iter().all(|e| !self.is_set(*e))
    }

    fn slot_mut(&mut self, event: TimerEvent) -> &mut Option<TimerHandler> {
        match event {
            TimerEvent::Completed => &mut self.completed,
            TimerEvent::Cancelled => &mut self.cancelled,
            TimerEvent::Suspended => &mut self.suspended,
            TimerEvent::Resumed => &mut self.resumed,
            TimerEvent::Restarted => &mut self.restarted,
        }
    }
}

impl fmt::Debug for TimerCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set: Vec<&str> = TimerEvent::ALL
            .iter()
            .filter(|e| self.is_set(**e))
            .map(|e| e.label())
            .collect();
        f.debug_struct("TimerCallbacks")
            .field("updated", &self.has_update_handler())
            .field("events", &set)
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Dispatch
// ═══════════════════════════════════════════════════════════════════════════

// A handler is moved out of its slot while it runs so that it can freely
// call back into its own timer. It is put back afterwards unless the slot was
// refilled or the callback set was cleared/replaced in the meantime.

impl TimerHandle {
    /// Invoke the handler for `event`, if any
    pub(crate) fn fire(&self, event: TimerEvent) {
        let generation = self.cell().callback_generation.get();
        let Some(mut handler) = self.cell().callbacks.borrow_mut().slot_mut(event).take() else {
            return;
        };

        handler(self);

        if self.cell().callback_generation.get() == generation {
            let mut callbacks = self.cell().callbacks.borrow_mut();
            let slot = callbacks.slot_mut(event);
            if slot.is_none() {
                *slot = Some(handler);
            }
        }
    }

    /// Invoke the progress handler, if any
    pub(crate) fn fire_updated(&self, percent: f32) {
        let generation = self.cell().callback_generation.get();
        let Some(mut handler) = self.cell().callbacks.borrow_mut().updated.take() else {
            return;
        };

        handler(self, percent);

        if self.cell().callback_generation.get() == generation {
            let mut callbacks = self.cell().callbacks.borrow_mut();
            if callbacks.updated.is_none() {
                callbacks.updated = Some(handler);
            }
        }
    }

    // ─── Public management on a live timer ──────────────────────────────────

    /// Attach or replace the handler for a lifecycle event
    pub fn set_handler(&self, event: TimerEvent, handler: impl FnMut(&TimerHandle) + 'static) {
        self.cell()
            .callbacks
            .borrow_mut()
            .set(event, Some(Box::new(handler)));
    }

    /// Remove the handler for a lifecycle event
    pub fn remove_handler(&self, event: TimerEvent) {
        self.cell().callbacks.borrow_mut().set(event, None);
    }

    /// Attach or replace the progress handler
    pub fn set_update_handler(&self, handler: impl FnMut(&TimerHandle, f32) + 'static) {
        self.cell()
            .callbacks
            .borrow_mut()
            .set_updated(Some(Box::new(handler)));
    }

    /// Swap in a whole new callback set, returning the old one
    pub fn replace_callbacks(&self, callbacks: TimerCallbacks) -> TimerCallbacks {
        self.bump_callback_generation();
        std::mem::replace(&mut *self.cell().callbacks.borrow_mut(), callbacks)
    }

    /// Drop every handler
    pub fn clear_callbacks(&self) {
        self.replace_callbacks(TimerCallbacks::new());
    }

    pub fn has_handler(&self, event: TimerEvent) -> bool {
        self.cell().callbacks.borrow().is_set(event)
    }

    fn bump_callback_generation(&self) {
        let generation = &self.cell().callback_generation;
        generation.set(generation.get().wrapping_add(1));
    }
}

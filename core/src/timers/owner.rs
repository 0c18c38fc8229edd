//! Owner liveness capability
//!
//! A timer may be bound to an external owner object. The registry only
//! observes the owner through a weak reference and never extends its
//! lifetime: once the owner is dropped (or reports itself dead) the timer
//! is evicted on the next sweep, and while the owner is disabled the timer
//! is suspended.

use std::fmt;
use std::rc::{Rc, Weak};

/// Host-side view of an object a timer can be bound to.
pub trait TimerOwner {
    /// Whether the owner still exists in the host.
    ///
    /// Dropping the owner's `Rc` already counts as dead; override this when
    /// the host keeps destroyed objects around.
    fn is_alive(&self) -> bool {
        true
    }

    /// Whether the owner is currently enabled. Timers bound to a disabled
    /// owner are suspended until it is enabled again.
    fn is_enabled(&self) -> bool;
}

/// Weak reference from a timer to its owner
#[derive(Clone)]
pub(crate) struct OwnerRef {
    owner: Weak<dyn TimerOwner>,
}

impl OwnerRef {
    pub(crate) fn new<O: TimerOwner + 'static>(owner: &Rc<O>) -> Self {
        let owner: Weak<O> = Rc::downgrade(owner);
        Self { owner }
    }

    /// Read both predicates at once: `(alive, enabled)`.
    ///
    /// A dead owner is never reported as enabled.
    pub(crate) fn status(&self) -> (bool, bool) {
        match self.owner.upgrade() {
            Some(owner) if owner.is_alive() => (true, owner.is_enabled()),
            _ => (false, false),
        }
    }
}

impl fmt::Debug for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerRef")
            .field("strong_count", &self.owner.strong_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct Destroyable {
        destroyed: Cell<bool>,
        enabled: Cell<bool>,
    }

    impl TimerOwner for Destroyable {
        fn is_alive(&self) -> bool {
            !self.destroyed.get()
        }

        fn is_enabled(&self) -> bool {
            self.enabled.get()
        }
    }

    fn owner() -> Rc<Destroyable> {
        Rc::new(Destroyable {
            destroyed: Cell::new(false),
            enabled: Cell::new(true),
        })
    }

    #[test]
    fn dropped_owner_is_dead() {
        let owner = owner();
        let owner_ref = OwnerRef::new(&owner);
        assert_eq!(owner_ref.status(), (true, true));

        drop(owner);
        assert_eq!(owner_ref.status(), (false, false));
    }

    #[test]
    fn destroyed_flag_is_dead_even_while_referenced() {
        let owner = owner();
        let owner_ref = OwnerRef::new(&owner);

        owner.destroyed.set(true);
        assert_eq!(owner_ref.status(), (false, false));
    }

    #[test]
    fn status_follows_enabled_flag() {
        let owner = owner();
        let owner_ref = OwnerRef::new(&owner);

        owner.enabled.set(false);
        assert_eq!(owner_ref.status(), (true, false));
    }

    #[test]
    fn reference_does_not_keep_owner_alive() {
        let owner = owner();
        let _owner_ref = OwnerRef::new(&owner);
        assert_eq!(Rc::strong_count(&owner), 1);
    }
}

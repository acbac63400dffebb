use portable_atomic::{AtomicU32, Ordering};

use crate::owner::Owner;

/// Single level lock shared by both cores. Tracks who holds it so that a
/// failed attempt can tell contention from self-deadlock.
pub struct PlainLock {
    owner: AtomicU32,
}

impl PlainLock {
    pub const fn new() -> PlainLock {
        PlainLock {
            owner: AtomicU32::new(Owner::NONE.raw()),
        }
    }

    /// Takes the lock for `owner` or reports who holds it, in one atomic step.
    pub fn try_enter(&self, owner: Owner) -> Result<(), Owner> {
        debug_assert!(owner != Owner::NONE, "Taking a lock for the unowned id");
        match self.owner.compare_exchange(
            Owner::NONE.raw(),
            owner.raw(),
            Ordering::Acquire,
            Ordering::Relaxed,
        ) {
            Ok(_) => Ok(()),
            // A failed exchange never observes the unowned value
            Err(current) => Err(Owner::from_raw(current).unwrap_or(Owner::NONE)),
        }
    }

    /// Spins until the lock is free, then takes it. No timeout.
    pub fn enter_blocking(&self, owner: Owner) {
        loop {
            if self.try_enter(owner).is_ok() {
                return;
            }
            while self.owner.load(Ordering::Relaxed) != Owner::NONE.raw() {
                core::hint::spin_loop();
            }
        }
    }

    pub fn exit(&self) {
        self.owner.store(Owner::NONE.raw(), Ordering::Release);
    }

    pub fn owner(&self) -> Option<Owner> {
        Owner::from_raw(self.owner.load(Ordering::Relaxed))
    }

    pub fn is_locked(&self) -> bool {
        self.owner().is_some()
    }
}

impl Default for PlainLock {
    fn default() -> Self {
        Self::new()
    }
}

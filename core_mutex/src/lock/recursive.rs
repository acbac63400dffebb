use portable_atomic::{AtomicU64, Ordering};

use crate::owner::Owner;

// Owner in the high half, nesting depth in the low half. Both change in one
// CAS, so an interrupt re-entering on the owning core always sees a
// consistent pair.
const FREE: u64 = pack(Owner::NONE.raw(), 0);

const fn pack(owner: u32, depth: u32) -> u64 {
    ((owner as u64) << 32) | depth as u64
}

const fn owner_of(state: u64) -> u32 {
    (state >> 32) as u32
}

const fn depth_of(state: u64) -> u32 {
    state as u32
}

/// Lock the current owner may take again without blocking itself. Ownership
/// is only given up when every nested `try_enter`/`enter_blocking` has been
/// matched by an `exit`.
pub struct RecursiveLock {
    state: AtomicU64,
}

impl RecursiveLock {
    pub const fn new() -> RecursiveLock {
        RecursiveLock {
            state: AtomicU64::new(FREE),
        }
    }

    pub fn try_enter(&self, owner: Owner) -> Result<(), Owner> {
        debug_assert!(owner != Owner::NONE, "Taking a lock for the unowned id");
        let mut current = self.state.load(Ordering::Relaxed);
        loop {
            let next = if current == FREE {
                pack(owner.raw(), 1)
            } else if owner_of(current) == owner.raw() {
                current + 1
            } else {
                return Err(Owner::from_raw(owner_of(current)).unwrap_or(Owner::NONE));
            };
            match self
                .state
                .compare_exchange_weak(current, next, Ordering::Acquire, Ordering::Relaxed)
            {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }

    pub fn enter_blocking(&self, owner: Owner) {
        loop {
            if self.try_enter(owner).is_ok() {
                return;
            }
            while self.state.load(Ordering::Relaxed) != FREE {
                core::hint::spin_loop();
            }
        }
    }

    pub fn exit(&self) {
        let mut current = self.state.load(Ordering::Relaxed);
        loop {
            debug_assert!(depth_of(current) > 0, "Exiting a recursive lock that is not held");
            let next = if depth_of(current) <= 1 { FREE } else { current - 1 };
            match self
                .state
                .compare_exchange_weak(current, next, Ordering::Release, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    pub fn owner(&self) -> Option<Owner> {
        Owner::from_raw(owner_of(self.state.load(Ordering::Relaxed)))
    }

    /// Nesting level of the current owner, 0 when free.
    pub fn depth(&self) -> u32 {
        depth_of(self.state.load(Ordering::Relaxed))
    }

    pub fn is_locked(&self) -> bool {
        self.owner().is_some()
    }
}

impl Default for RecursiveLock {
    fn default() -> Self {
        Self::new()
    }
}

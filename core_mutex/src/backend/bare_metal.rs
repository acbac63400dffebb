use log::{trace, warn};

use super::{AcquireError, LockBackend, WakeToken};
use crate::guard::Options;
use crate::lock::LockRef;
use crate::owner::is_self_deadlock;
use crate::port;

/// Both cores contend directly on the lock objects, no scheduler involved.
/// Waiting for the other core is a busy-wait.
#[derive(Debug, Default)]
pub struct BareMetal {
    _0: (),
}

impl BareMetal {
    pub const fn new() -> BareMetal {
        BareMetal { _0: () }
    }
}

impl LockBackend for BareMetal {
    type Ticket = ();

    fn acquire(&self, lock: LockRef<'_>, options: Options) -> Result<(), AcquireError> {
        let me = port::core_id();
        match lock.try_enter(me) {
            Ok(()) => Ok(()),
            Err(owner) if is_self_deadlock(me, owner) => {
                if options.debug_enabled() {
                    warn!("CoreMutex - Deadlock detected! core {} on {:?}", me, lock);
                }
                Err(AcquireError::SelfDeadlock(owner))
            }
            Err(owner) => {
                if options.debug_enabled() {
                    trace!("core {} waiting for {:?} held by core {}", me, lock, owner);
                }
                lock.enter_blocking(me);
                Ok(())
            }
        }
    }

    fn release(&self, lock: LockRef<'_>, _ticket: ()) -> WakeToken {
        lock.exit();
        WakeToken::NONE
    }
}

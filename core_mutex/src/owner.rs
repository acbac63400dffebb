use core::fmt;

/// Identity of whoever holds a lock: a core number bare-metal, a task number
/// under a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Owner(u32);

impl Owner {
    /// Reserved value stored in a lock nobody holds. Never handed out, so no
    /// caller can take a lock in its name.
    pub(crate) const NONE: Owner = Owner(u32::MAX);

    pub const fn new(id: u32) -> Owner {
        assert!(id != u32::MAX, "Owner id is reserved for unowned locks");
        Owner(id)
    }

    pub const fn id(self) -> u32 {
        self.0
    }

    pub(crate) const fn from_raw(raw: u32) -> Option<Owner> {
        if raw == Owner::NONE.0 {
            None
        } else {
            Some(Owner(raw))
        }
    }

    pub(crate) const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A failed try-acquire that reports the caller as the current owner can
/// never succeed by waiting: nobody else is able to release it.
#[inline]
pub fn is_self_deadlock(caller: Owner, reported: Owner) -> bool {
    caller == reported
}

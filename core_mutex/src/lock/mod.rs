mod plain;
mod recursive;

pub use plain::PlainLock;
pub use recursive::RecursiveLock;

use crate::owner::Owner;

/// Borrowed handle to one of the two lock kinds. The lock itself lives
/// elsewhere (usually a `static`) and must outlive every guard using it.
#[derive(Clone, Copy)]
pub enum LockRef<'a> {
    Plain(&'a PlainLock),
    Recursive(&'a RecursiveLock),
}

impl<'a> LockRef<'a> {
    /// Reentrant mode follows from the kind of lock.
    pub fn is_recursive(&self) -> bool {
        matches!(self, LockRef::Recursive(_))
    }

    /// Stable identity of the underlying lock object.
    pub fn addr(&self) -> usize {
        match self {
            LockRef::Plain(lock) => *lock as *const PlainLock as usize,
            LockRef::Recursive(lock) => *lock as *const RecursiveLock as usize,
        }
    }

    pub fn owner(&self) -> Option<Owner> {
        match self {
            LockRef::Plain(lock) => lock.owner(),
            LockRef::Recursive(lock) => lock.owner(),
        }
    }

    pub(crate) fn try_enter(&self, owner: Owner) -> Result<(), Owner> {
        match self {
            LockRef::Plain(lock) => lock.try_enter(owner),
            LockRef::Recursive(lock) => lock.try_enter(owner),
        }
    }

    pub(crate) fn enter_blocking(&self, owner: Owner) {
        match self {
            LockRef::Plain(lock) => lock.enter_blocking(owner),
            LockRef::Recursive(lock) => lock.enter_blocking(owner),
        }
    }

    pub(crate) fn exit(&self) {
        match self {
            LockRef::Plain(lock) => lock.exit(),
            LockRef::Recursive(lock) => lock.exit(),
        }
    }
}

impl<'a> From<&'a PlainLock> for LockRef<'a> {
    fn from(lock: &'a PlainLock) -> Self {
        LockRef::Plain(lock)
    }
}

impl<'a> From<&'a RecursiveLock> for LockRef<'a> {
    fn from(lock: &'a RecursiveLock) -> Self {
        LockRef::Recursive(lock)
    }
}

impl core::fmt::Debug for LockRef<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let kind = if self.is_recursive() { "Recursive" } else { "Plain" };
        write!(f, "{}@{:#x}", kind, self.addr())
    }
}

use core::cell::RefCell;

use critical_section::Mutex;

use crate::lock::LockRef;

struct Entry<M> {
    addr: usize,
    mutex: M,
}

/// Fixed size map from lock objects to the kernel mutexes standing in for
/// them. A kernel port can back [`Kernel::native_mutex`] with it to get the
/// lazy, create-once behaviour the kernel backend relies on.
///
/// [`Kernel::native_mutex`]: crate::Kernel::native_mutex
pub struct MutexRegistry<M, const N: usize> {
    entries: Mutex<RefCell<[Option<Entry<M>>; N]>>,
}

impl<M: Copy, const N: usize> MutexRegistry<M, N> {
    const EMPTY: Option<Entry<M>> = None;

    pub const fn new() -> MutexRegistry<M, N> {
        MutexRegistry {
            entries: Mutex::new(RefCell::new([Self::EMPTY; N])),
        }
    }

    /// Returns the mutex registered for `lock`, calling `create` with the
    /// reentrancy flag the first time this lock is seen. `None` when the
    /// registry is full or `create` fails, nothing is recorded then.
    ///
    /// `create` runs inside a critical section.
    pub fn get_or_create<F>(&self, lock: LockRef<'_>, create: F) -> Option<M>
    where
        F: FnOnce(bool) -> Option<M>,
    {
        let addr = lock.addr();
        critical_section::with(|cs| {
            let mut entries = self.entries.borrow(cs).borrow_mut();
            if let Some(entry) = entries.iter().flatten().find(|e| e.addr == addr) {
                return Some(entry.mutex);
            }
            let slot = entries.iter_mut().find(|e| e.is_none())?;
            let mutex = create(lock.is_recursive())?;
            *slot = Some(Entry { addr, mutex });
            Some(mutex)
        })
    }

    pub fn get(&self, lock: LockRef<'_>) -> Option<M> {
        let addr = lock.addr();
        critical_section::with(|cs| {
            let entries = self.entries.borrow(cs).borrow();
            entries
                .iter()
                .flatten()
                .find(|e| e.addr == addr)
                .map(|e| e.mutex)
        })
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.entries.borrow(cs).borrow().iter().flatten().count())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<M: Copy, const N: usize> Default for MutexRegistry<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

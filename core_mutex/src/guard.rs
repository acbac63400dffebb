//! The scoped guard.
//!
//! ```ignore
//! static UART_LOCK: PlainLock = PlainLock::new();
//! static RUNTIME: Runtime<NoKernel> = Runtime::bare_metal();
//!
//! fn write_uart(bytes: &[u8]) {
//!     let guard = CoreMutex::new(&RUNTIME, &UART_LOCK, Options::DEBUG);
//!     if !guard.is_acquired() {
//!         return;
//!     }
//!     // ... touch the peripheral
//! }
//! ```

use core::marker::PhantomData;
use core::mem;

use crate::backend::{AcquireError, LockBackend, WakeToken};
use crate::lock::LockRef;

/// Per-guard configuration byte. Only bit 0 is meaningful, the remaining
/// bits are kept as given and ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options(u8);

impl Options {
    /// Log a line when a self-deadlock is refused.
    pub const DEBUG_ENABLE: u8 = 1 << 0;

    pub const NONE: Options = Options(0);
    pub const DEBUG: Options = Options(Options::DEBUG_ENABLE);

    pub const fn from_bits(bits: u8) -> Options {
        Options(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn debug_enabled(self) -> bool {
        self.0 & Options::DEBUG_ENABLE != 0
    }
}

enum State<T> {
    Acquired(T),
    Failed(AcquireError),
    Released,
}

/// Holds `lock` from construction until drop, if it could be taken at all.
///
/// Construction never panics and never reports an error other than through
/// [`is_acquired`](CoreMutex::is_acquired). It refuses instead of spinning
/// forever when the calling core already holds a non-reentrant lock, and it
/// never blocks when called from an interrupt under a kernel. Callers must
/// check `is_acquired` before entering their critical section.
pub struct CoreMutex<'a, B: LockBackend> {
    backend: &'a B,
    lock: LockRef<'a>,
    options: Options,
    state: State<B::Ticket>,
    // Released by whoever took it
    _not_send: PhantomData<*const ()>,
}

impl<'a, B: LockBackend> CoreMutex<'a, B> {
    pub fn new<L>(backend: &'a B, lock: L, options: Options) -> CoreMutex<'a, B>
    where
        L: Into<LockRef<'a>>,
    {
        let lock = lock.into();
        let state = match backend.acquire(lock, options) {
            Ok(ticket) => State::Acquired(ticket),
            Err(err) => State::Failed(err),
        };
        CoreMutex {
            backend,
            lock,
            options,
            state,
            _not_send: PhantomData,
        }
    }

    pub fn is_acquired(&self) -> bool {
        matches!(self.state, State::Acquired(_))
    }

    /// Why construction did not get the lock.
    pub fn failure(&self) -> Option<AcquireError> {
        match self.state {
            State::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_reentrant(&self) -> bool {
        self.lock.is_recursive()
    }

    pub fn options(&self) -> Options {
        self.options
    }

    pub fn lock(&self) -> LockRef<'a> {
        self.lock
    }

    /// Releases now and hands back the wake request instead of acting on it,
    /// so an interrupt handler can trigger the context switch on its way out.
    /// Dropping the guard does the same and yields right away.
    pub fn release(mut self) -> WakeToken {
        self.finish()
    }

    fn finish(&mut self) -> WakeToken {
        match mem::replace(&mut self.state, State::Released) {
            State::Acquired(ticket) => self.backend.release(self.lock, ticket),
            State::Failed(_) | State::Released => WakeToken::NONE,
        }
    }
}

impl<B: LockBackend> Drop for CoreMutex<'_, B> {
    fn drop(&mut self) {
        let wake = self.finish();
        if wake.should_yield() {
            self.backend.wake(wake);
        }
    }
}

impl<B: LockBackend> core::fmt::Debug for CoreMutex<'_, B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CoreMutex")
            .field("lock", &self.lock)
            .field("acquired", &self.is_acquired())
            .field("failure", &self.failure())
            .field("options", &self.options)
            .finish()
    }
}

//! Lock backends: the environment specific half of an acquisition.
//!
//! A firmware image runs either bare-metal, with both cores hitting the lock
//! objects directly, or under a preemptive kernel that owns the blocking and
//! waking of tasks. The choice is made once at startup by building a
//! [`Runtime`]; guards only ever talk to the [`LockBackend`] trait.

mod bare_metal;
mod kernel;

pub use bare_metal::BareMetal;
pub use kernel::{Kernel, KernelBackend, KernelTicket, NoKernel};

use core::fmt;

use crate::guard::Options;
use crate::lock::LockRef;
use crate::owner::Owner;

/// Where the current call is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    Task,
    Interrupt,
}

/// Deferred request for a context switch, produced by interrupt-safe kernel
/// operations that made a higher priority task ready.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[must_use]
pub struct WakeToken(bool);

impl WakeToken {
    pub const NONE: WakeToken = WakeToken(false);
    pub const YIELD: WakeToken = WakeToken(true);

    pub const fn from_woken(woken: bool) -> WakeToken {
        WakeToken(woken)
    }

    pub const fn should_yield(self) -> bool {
        self.0
    }

    /// Same accumulation as an ISR `higher_priority_task_woken` out-param
    /// passed to several calls in a row.
    pub const fn merge(self, other: WakeToken) -> WakeToken {
        WakeToken(self.0 | other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireError {
    /// Bare-metal: the calling core already holds this non-reentrant lock.
    SelfDeadlock(Owner),
    /// Kernel: called from an interrupt while someone else holds the lock.
    InterruptContention,
    /// Kernel: no native mutex could be obtained for the lock.
    NoNativeMutex,
}

impl fmt::Display for AcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquireError::SelfDeadlock(owner) => {
                write!(f, "deadlock, lock already held by core {}", owner)
            }
            AcquireError::InterruptContention => write!(f, "lock busy in interrupt context"),
            AcquireError::NoNativeMutex => write!(f, "kernel mutex unavailable"),
        }
    }
}

pub trait LockBackend {
    /// What a successful acquisition has to remember for its release.
    type Ticket;

    fn acquire(&self, lock: LockRef<'_>, options: Options) -> Result<Self::Ticket, AcquireError>;

    /// Undoes `acquire`. The returned token must be acted upon by the caller
    /// once it leaves interrupt context.
    fn release(&self, lock: LockRef<'_>, ticket: Self::Ticket) -> WakeToken;

    /// Acts on a wake token, i.e. requests the pending context switch.
    fn wake(&self, _token: WakeToken) {}
}

/// Process-wide runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    BareMetal,
    Kernel,
}

impl Environment {
    /// Maps the boolean "kernel present" startup flag.
    pub const fn from_flag(kernel_present: bool) -> Environment {
        if kernel_present {
            Environment::Kernel
        } else {
            Environment::BareMetal
        }
    }
}

/// Backend chosen once for the whole image.
pub enum Runtime<K: Kernel> {
    BareMetal(BareMetal),
    Kernel(KernelBackend<K>),
}

pub enum RuntimeTicket<M> {
    BareMetal,
    Kernel(KernelTicket<M>),
}

impl Runtime<NoKernel> {
    pub const fn bare_metal() -> Runtime<NoKernel> {
        Runtime::BareMetal(BareMetal::new())
    }
}

impl<K: Kernel> Runtime<K> {
    pub const fn kernel(kernel: K) -> Runtime<K> {
        Runtime::Kernel(KernelBackend::new(kernel))
    }

    /// Picks the backend for `env`. The kernel is dropped when running
    /// bare-metal.
    pub fn select(env: Environment, kernel: K) -> Runtime<K> {
        match env {
            Environment::BareMetal => Runtime::BareMetal(BareMetal::new()),
            Environment::Kernel => Runtime::kernel(kernel),
        }
    }

    pub fn environment(&self) -> Environment {
        match self {
            Runtime::BareMetal(_) => Environment::BareMetal,
            Runtime::Kernel(_) => Environment::Kernel,
        }
    }
}

impl<K: Kernel> LockBackend for Runtime<K> {
    type Ticket = RuntimeTicket<K::Mutex>;

    fn acquire(&self, lock: LockRef<'_>, options: Options) -> Result<Self::Ticket, AcquireError> {
        match self {
            Runtime::BareMetal(b) => b.acquire(lock, options).map(|()| RuntimeTicket::BareMetal),
            Runtime::Kernel(k) => k.acquire(lock, options).map(RuntimeTicket::Kernel),
        }
    }

    fn release(&self, lock: LockRef<'_>, ticket: Self::Ticket) -> WakeToken {
        match (self, ticket) {
            (Runtime::BareMetal(b), RuntimeTicket::BareMetal) => b.release(lock, ()),
            (Runtime::Kernel(k), RuntimeTicket::Kernel(t)) => k.release(lock, t),
            // A Runtime never changes variant, so tickets always match it
            _ => unreachable!("ticket issued by another environment"),
        }
    }

    fn wake(&self, token: WakeToken) {
        if let Runtime::Kernel(k) = self {
            k.wake(token);
        }
    }
}

use log::error;

use super::{AcquireError, ExecutionContext, LockBackend, WakeToken};
use crate::guard::Options;
use crate::lock::LockRef;
use crate::port;

/// What the kernel port has to provide. Modeled on a FreeRTOS style mutex
/// API: a blocking task-level take/give pair and non-blocking `*_from_isr`
/// variants reporting whether a higher priority task got woken.
pub trait Kernel {
    /// Native mutex handle.
    type Mutex: Copy;

    /// Maps `lock` to its native mutex, creating it on first use. Must return
    /// the same handle for the same lock every time.
    fn native_mutex(&self, lock: LockRef<'_>, recursive: bool) -> Option<Self::Mutex>;

    fn context(&self) -> ExecutionContext {
        port::current_context()
    }

    /// May suspend the calling task until the mutex is free.
    fn take(&self, mutex: Self::Mutex, recursive: bool);

    fn give(&self, mutex: Self::Mutex, recursive: bool);

    /// Never blocks. `None` when the mutex is held.
    fn take_from_isr(&self, mutex: Self::Mutex) -> Option<WakeToken>;

    fn give_from_isr(&self, mutex: Self::Mutex) -> WakeToken;

    fn yield_from_isr(&self, token: WakeToken);
}

impl<K: Kernel + ?Sized> Kernel for &K {
    type Mutex = K::Mutex;

    fn native_mutex(&self, lock: LockRef<'_>, recursive: bool) -> Option<Self::Mutex> {
        (**self).native_mutex(lock, recursive)
    }

    fn context(&self) -> ExecutionContext {
        (**self).context()
    }

    fn take(&self, mutex: Self::Mutex, recursive: bool) {
        (**self).take(mutex, recursive)
    }

    fn give(&self, mutex: Self::Mutex, recursive: bool) {
        (**self).give(mutex, recursive)
    }

    fn take_from_isr(&self, mutex: Self::Mutex) -> Option<WakeToken> {
        (**self).take_from_isr(mutex)
    }

    fn give_from_isr(&self, mutex: Self::Mutex) -> WakeToken {
        (**self).give_from_isr(mutex)
    }

    fn yield_from_isr(&self, token: WakeToken) {
        (**self).yield_from_isr(token)
    }
}

/// Kernel type for images that never run under a kernel.
pub enum NoKernel {}

impl Kernel for NoKernel {
    type Mutex = core::convert::Infallible;

    fn native_mutex(&self, _lock: LockRef<'_>, _recursive: bool) -> Option<Self::Mutex> {
        match *self {}
    }

    fn context(&self) -> ExecutionContext {
        match *self {}
    }

    fn take(&self, mutex: Self::Mutex, _recursive: bool) {
        match mutex {}
    }

    fn give(&self, mutex: Self::Mutex, _recursive: bool) {
        match mutex {}
    }

    fn take_from_isr(&self, mutex: Self::Mutex) -> Option<WakeToken> {
        match mutex {}
    }

    fn give_from_isr(&self, mutex: Self::Mutex) -> WakeToken {
        match mutex {}
    }

    fn yield_from_isr(&self, _token: WakeToken) {
        match *self {}
    }
}

pub struct KernelTicket<M> {
    mutex: M,
    context: ExecutionContext,
    wake: WakeToken,
}

impl<M> KernelTicket<M> {
    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    /// Wake request recorded by an interrupt-context take.
    pub fn wake(&self) -> WakeToken {
        self.wake
    }
}

/// Acquisition through the kernel's own mutexes. No self-deadlock check
/// here: reentrancy is the native recursive mutex's business.
pub struct KernelBackend<K> {
    kernel: K,
}

impl<K: Kernel> KernelBackend<K> {
    pub const fn new(kernel: K) -> KernelBackend<K> {
        KernelBackend { kernel }
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }
}

impl<K: Kernel> LockBackend for KernelBackend<K> {
    type Ticket = KernelTicket<K::Mutex>;

    fn acquire(&self, lock: LockRef<'_>, options: Options) -> Result<Self::Ticket, AcquireError> {
        let recursive = lock.is_recursive();
        let mutex = match self.kernel.native_mutex(lock, recursive) {
            Some(mutex) => mutex,
            None => {
                if options.debug_enabled() {
                    error!("CoreMutex - no kernel mutex for {:?}", lock);
                }
                return Err(AcquireError::NoNativeMutex);
            }
        };

        let context = self.kernel.context();
        let wake = match context {
            ExecutionContext::Interrupt => match self.kernel.take_from_isr(mutex) {
                Some(wake) => wake,
                None => return Err(AcquireError::InterruptContention),
            },
            ExecutionContext::Task => {
                self.kernel.take(mutex, recursive);
                WakeToken::NONE
            }
        };
        Ok(KernelTicket { mutex, context, wake })
    }

    fn release(&self, lock: LockRef<'_>, ticket: Self::Ticket) -> WakeToken {
        match ticket.context {
            ExecutionContext::Interrupt => ticket.wake.merge(self.kernel.give_from_isr(ticket.mutex)),
            ExecutionContext::Task => {
                self.kernel.give(ticket.mutex, lock.is_recursive());
                WakeToken::NONE
            }
        }
    }

    fn wake(&self, token: WakeToken) {
        if token.should_yield() {
            self.kernel.yield_from_isr(token);
        }
    }
}

#![cfg_attr(target_os = "none", no_std)]

//! Deadlock-safe mutex guard for sharing peripherals (UARTs, USB, ...)
//! between the two cores of an RP2040 class part.
//!
//! A [`CoreMutex`] takes a [`PlainLock`] or [`RecursiveLock`] when built and
//! gives it back when dropped. Under a kernel the lock is mapped to a native
//! kernel mutex and taken with the kernel's blocking or ISR-safe calls;
//! bare-metal the cores contend on the lock directly, and a core that tries
//! to take a non-reentrant lock it already owns gets a failed guard instead
//! of spinning forever.

mod backend;
mod guard;
mod lock;
mod owner;
mod registry;

#[cfg(test)]
mod test_support;

pub use backend::{
    AcquireError, BareMetal, Environment, ExecutionContext, Kernel, KernelBackend, KernelTicket,
    LockBackend, NoKernel, Runtime, RuntimeTicket, WakeToken,
};
pub use guard::{CoreMutex, Options};
pub use lock::{LockRef, PlainLock, RecursiveLock};
pub use owner::{is_self_deadlock, Owner};
pub use registry::MutexRegistry;

#[cfg_attr(not(target_os = "none"), path = "std_lib_port.rs")]
#[cfg_attr(target_os = "none", path = "cortex_m_port.rs")]
pub mod port;

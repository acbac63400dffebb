//! Host stand-in for the hardware port. Each thread plays one core, and an
//! interrupt handler is simulated by running a closure with the interrupt
//! flag raised.

use std::cell::Cell;

use crate::backend::ExecutionContext;
use crate::owner::Owner;

thread_local! {
    static CORE_NUM: Cell<u32> = const { Cell::new(0) };
    static IN_ISR: Cell<bool> = const { Cell::new(false) };
}

pub fn core_id() -> Owner {
    Owner::new(CORE_NUM.with(|c| c.get()))
}

pub fn current_context() -> ExecutionContext {
    if IN_ISR.with(|f| f.get()) {
        ExecutionContext::Interrupt
    } else {
        ExecutionContext::Task
    }
}

/// Makes the calling thread report itself as core `num`.
pub fn bind_core(num: u32) {
    CORE_NUM.with(|c| c.set(num));
}

/// Runs `f` as if it were the body of an interrupt handler.
pub fn in_interrupt<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    let _restore = IsrFlagRestore(IN_ISR.with(|flag| flag.replace(true)));
    f()
}

/// Puts the interrupt flag back when the simulated handler ends, unwinding
/// included.
struct IsrFlagRestore(bool);

impl Drop for IsrFlagRestore {
    fn drop(&mut self) {
        IN_ISR.with(|flag| flag.set(self.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_core_is_per_thread() {
        bind_core(1);
        assert_eq!(core_id(), Owner::new(1));
        let other = std::thread::spawn(core_id).join().unwrap();
        assert_eq!(other, Owner::new(0));
    }

    #[test]
    fn interrupt_flag_nests() {
        assert_eq!(current_context(), ExecutionContext::Task);
        in_interrupt(|| {
            assert_eq!(current_context(), ExecutionContext::Interrupt);
            in_interrupt(|| assert_eq!(current_context(), ExecutionContext::Interrupt));
            assert_eq!(current_context(), ExecutionContext::Interrupt);
        });
        assert_eq!(current_context(), ExecutionContext::Task);
    }

    #[test]
    fn panicking_handler_leaves_task_context() {
        let r = std::panic::catch_unwind(|| in_interrupt(|| panic!("handler fault")));
        assert!(r.is_err());
        assert_eq!(current_context(), ExecutionContext::Task);
    }
}

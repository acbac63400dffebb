use cortex_m::peripheral::{scb::VectActive, SCB};

use crate::backend::ExecutionContext;
use crate::owner::Owner;

// RP2040 SIO CPUID register, reads 0 on core 0 and 1 on core 1
const SIO_CPUID: *const u32 = 0xd000_0000 as *const u32;

#[inline]
pub fn core_id() -> Owner {
    let num = unsafe { core::ptr::read_volatile(SIO_CPUID) };
    Owner::new(num)
}

#[inline]
pub fn current_context() -> ExecutionContext {
    match SCB::vect_active() {
        VectActive::ThreadMode => ExecutionContext::Task,
        _ => ExecutionContext::Interrupt,
    }
}

//! # AArch32 Exception Dispatch
//!
//! This module owns the 32-bit exception vector table and the dispatch
//! trampolines the exception entry assembly calls. The 32-bit exception
//! model gives each source its own banked-mode vector, so there are six
//! entry points and no syndrome decode on this path; every trampoline is
//! a straight table dispatch.
//!
//! ## Exception Sources
//!
//! ```text
//! Slot  Source             Taken on
//! ─────────────────────────────────────────────────────
//!  0    Undefined          Undefined instruction
//!  1    SoftwareInterrupt  SVC (formerly SWI) execution
//!  2    PrefetchAbort      Instruction fetch fault
//!  3    DataAbort          Data access fault
//!  4    IRQ                Physical IRQ line
//!  5    FIQ                Physical FIQ line
//! ```
//!
//! Slots follow the hardware vector order with the Reset vector and the
//! reserved slot omitted; neither reaches this layer.

use core::ffi::c_void;

use crate::handler::{ExceptionHandler, VectorTableEntry};
use crate::table::VectorTable;

// =============================================================================
// Exception Sources
// =============================================================================

/// Number of AArch32 exception sources
pub const EXCEPTION_COUNT: usize = 6;

/// AArch32 exception source identifiers, in vector order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum ExceptionId {
    /// Undefined instruction exception
    Undefined         = 0,

    /// Software interrupt (SVC instruction)
    SoftwareInterrupt = 1,

    /// Prefetch abort (instruction fetch fault)
    PrefetchAbort     = 2,

    /// Data abort (data access fault)
    DataAbort         = 3,

    /// IRQ interrupt
    Irq               = 4,

    /// FIQ interrupt
    Fiq               = 5,
}

impl ExceptionId {
    /// Get the vector table index for this source
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Convert from a vector table index
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < EXCEPTION_COUNT {
            // Safety: all values 0..EXCEPTION_COUNT are valid enum variants
            Some(unsafe { core::mem::transmute(index) })
        } else {
            None
        }
    }

    /// Get a human-readable name for this source
    pub const fn name(self) -> &'static str {
        match self {
            ExceptionId::Undefined => "Undefined",
            ExceptionId::SoftwareInterrupt => "SoftwareInterrupt",
            ExceptionId::PrefetchAbort => "PrefetchAbort",
            ExceptionId::DataAbort => "DataAbort",
            ExceptionId::Irq => "IRQ",
            ExceptionId::Fiq => "FIQ",
        }
    }
}

// =============================================================================
// Vector Table
// =============================================================================

/// The AArch32 vector table, one slot per exception source
static VECTOR_TABLE: VectorTable<EXCEPTION_COUNT> = VectorTable::new();

/// Establish the all-unregistered state
///
/// # Safety
///
/// All exception sources must be masked; no dispatch may run
/// concurrently with initialization.
pub unsafe fn init() {
    unsafe { VECTOR_TABLE.reset() };
    log::info!("exceptions: vector table initialized ({} sources)", EXCEPTION_COUNT);
}

/// Register a handler and context for an exception source
///
/// Overwrites any previous registration for the source.
///
/// # Safety
///
/// The caller must keep `id` masked (or otherwise guarantee no
/// concurrent dispatch or registration of the same source) for the
/// duration of the call, and the handler must remain valid for as long
/// as it stays registered.
pub unsafe fn register_handler(id: ExceptionId, handler: ExceptionHandler, context: *mut c_void) {
    unsafe { VECTOR_TABLE.register(id.index(), handler, context) };
    log::debug!("exceptions: registered handler for {}", id.name());
}

/// Remove the handler registration for an exception source
///
/// # Safety
///
/// Same contract as [`register_handler`]: `id` must stay masked for the
/// duration of the call and until a handler is registered again.
pub unsafe fn unregister_handler(id: ExceptionId) {
    unsafe { VECTOR_TABLE.unregister(id.index()) };
    log::debug!("exceptions: removed handler for {}", id.name());
}

/// Read the current registration for an exception source
#[inline]
pub fn handler_entry(id: ExceptionId) -> VectorTableEntry {
    VECTOR_TABLE.entry(id.index())
}

/// Dispatch the registered handler for an exception source
///
/// Fatal if no handler is registered: the source was unmasked before its
/// handler was in place.
#[inline]
pub fn dispatch(id: ExceptionId) {
    VECTOR_TABLE.dispatch(id.index());
}

// =============================================================================
// Dispatch Trampolines
// =============================================================================

/// Undefined instruction trampoline, called from the vector entry code
#[cfg(target_arch = "arm")]
#[no_mangle]
pub extern "C" fn handle_undefined() {
    dispatch(ExceptionId::Undefined);
}

/// Software interrupt trampoline, called from the vector entry code
#[cfg(target_arch = "arm")]
#[no_mangle]
pub extern "C" fn handle_swi() {
    dispatch(ExceptionId::SoftwareInterrupt);
}

/// Prefetch abort trampoline, called from the vector entry code
#[cfg(target_arch = "arm")]
#[no_mangle]
pub extern "C" fn handle_prefetch_abort() {
    dispatch(ExceptionId::PrefetchAbort);
}

/// Data abort trampoline, called from the vector entry code
#[cfg(target_arch = "arm")]
#[no_mangle]
pub extern "C" fn handle_data_abort() {
    dispatch(ExceptionId::DataAbort);
}

/// IRQ trampoline, called from the vector entry code
#[cfg(target_arch = "arm")]
#[no_mangle]
pub extern "C" fn handle_irq() {
    dispatch(ExceptionId::Irq);
}

/// FIQ trampoline, called from the vector entry code
#[cfg(target_arch = "arm")]
#[no_mangle]
pub extern "C" fn handle_fiq() {
    dispatch(ExceptionId::Fiq);
}

// =============================================================================
// Compile-time Assertions
// =============================================================================

const _: () = {
    // Identifiers are contiguous vector-order indices
    assert!(ExceptionId::Undefined as usize == 0);
    assert!(ExceptionId::SoftwareInterrupt as usize == 1);
    assert!(ExceptionId::PrefetchAbort as usize == 2);
    assert!(ExceptionId::DataAbort as usize == 3);
    assert!(ExceptionId::Irq as usize == 4);
    assert!(ExceptionId::Fiq as usize == 5);
};

static_assertions::const_assert_eq!(EXCEPTION_COUNT, 6);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn count_up(context: *mut c_void) {
        unsafe { *context.cast::<u32>() += 1 };
    }

    extern "C" fn add_ten(context: *mut c_void) {
        unsafe { *context.cast::<u32>() += 10 };
    }

    extern "C" fn nop_handler(_context: *mut c_void) {}

    #[test]
    fn test_id_round_trip() {
        for index in 0..EXCEPTION_COUNT {
            let id = ExceptionId::from_index(index).unwrap();
            assert_eq!(id.index(), index);
        }
        assert_eq!(ExceptionId::from_index(EXCEPTION_COUNT), None);
    }

    // Each test below owns its exception sources outright; tests run
    // concurrently against the shared table.

    #[test]
    fn test_swi_dispatch_counts() {
        let mut counter: u32 = 0;
        unsafe {
            register_handler(
                ExceptionId::SoftwareInterrupt,
                count_up,
                (&mut counter as *mut u32).cast(),
            );
        }

        dispatch(ExceptionId::SoftwareInterrupt);
        dispatch(ExceptionId::SoftwareInterrupt);
        dispatch(ExceptionId::SoftwareInterrupt);
        assert_eq!(counter, 3);
    }

    #[test]
    fn test_undefined_register_lookup_unregister() {
        let mut value: u32 = 0;
        let context = (&mut value as *mut u32).cast::<c_void>();

        unsafe { register_handler(ExceptionId::Undefined, nop_handler, context) };
        let entry = handler_entry(ExceptionId::Undefined);
        assert_eq!(entry, VectorTableEntry::new(nop_handler, context));

        unsafe { unregister_handler(ExceptionId::Undefined) };
        assert!(!handler_entry(ExceptionId::Undefined).is_registered());
    }

    #[test]
    fn test_prefetch_abort_reregistration_overwrites() {
        let mut first: u32 = 0;
        let mut second: u32 = 0;

        unsafe {
            register_handler(
                ExceptionId::PrefetchAbort,
                count_up,
                (&mut first as *mut u32).cast(),
            );
            register_handler(
                ExceptionId::PrefetchAbort,
                add_ten,
                (&mut second as *mut u32).cast(),
            );
        }

        dispatch(ExceptionId::PrefetchAbort);
        assert_eq!(first, 0);
        assert_eq!(second, 10);
    }

    #[test]
    fn test_irq_and_fiq_are_independent() {
        let mut irq_count: u32 = 0;
        let mut fiq_count: u32 = 0;

        unsafe {
            register_handler(
                ExceptionId::Irq,
                count_up,
                (&mut irq_count as *mut u32).cast(),
            );
        }
        assert!(!handler_entry(ExceptionId::Fiq).is_registered());
        let irq_entry = handler_entry(ExceptionId::Irq);

        unsafe {
            register_handler(
                ExceptionId::Fiq,
                count_up,
                (&mut fiq_count as *mut u32).cast(),
            );
        }
        assert_eq!(handler_entry(ExceptionId::Irq), irq_entry);

        dispatch(ExceptionId::Irq);
        dispatch(ExceptionId::Fiq);
        assert_eq!(irq_count, 1);
        assert_eq!(fiq_count, 1);
    }

    #[test]
    #[should_panic]
    fn test_data_abort_unregistered_dispatch_is_fatal() {
        dispatch(ExceptionId::DataAbort);
    }
}

//! # AArch64 Exception Dispatch
//!
//! This module owns the 64-bit exception vector table and the dispatch
//! trampolines the exception entry assembly calls. AArch64 funnels every
//! exception into one of four entry points per vector bank; the trampoline
//! for the synchronous entry additionally reads ESR_EL1 and decodes the
//! exception class before dispatching.
//!
//! ## Exception Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Exception Flow                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  Hardware ──> Vector Entry (asm) ──> Trampoline             │
//! │                                          │                  │
//! │                     Synchronous only: ESR read + EC decode  │
//! │                                          │                  │
//! │                                Vector Table Lookup          │
//! │                                          │                  │
//! │                                Registered Handler           │
//! │                                          │                  │
//! │              Return to entry (asm) <─────┘                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Exception Sources
//!
//! ```text
//! Slot  Source        Taken on
//! ──────────────────────────────────────────────────────
//!  0    Synchronous   SVC, aborts, traps (decodes ESR_EL1)
//!  1    IRQ           Physical IRQ line
//!  2    FIQ           Physical FIQ line
//!  3    SError        Asynchronous external abort
//! ```
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use cortex_a_vectors::aarch64::{self, ExceptionId};
//! use cortex_a_vectors::mask::{self, ExceptionMask};
//!
//! extern "C" fn timer_irq(context: *mut core::ffi::c_void) {
//!     // acknowledge the interrupt controller, run the driver
//! }
//!
//! unsafe { aarch64::init() };
//! mask::with_masked(ExceptionMask::I, || unsafe {
//!     aarch64::register_handler(ExceptionId::Irq, timer_irq, core::ptr::null_mut());
//! });
//! mask::enable_irq();
//! ```

use core::ffi::c_void;

use crate::handler::{ExceptionHandler, VectorTableEntry};
use crate::table::VectorTable;

#[cfg(target_arch = "aarch64")]
use crate::esr::Esr;

// =============================================================================
// Exception Sources
// =============================================================================

/// Number of AArch64 exception sources
pub const EXCEPTION_COUNT: usize = 4;

/// AArch64 exception source identifiers, in vector order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum ExceptionId {
    /// Synchronous exception (SVC, aborts, traps)
    Synchronous = 0,

    /// IRQ interrupt
    Irq         = 1,

    /// FIQ interrupt
    Fiq         = 2,

    /// SError interrupt (asynchronous external abort)
    SError      = 3,
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
            ExceptionId::Synchronous => "Synchronous",
            ExceptionId::Irq => "IRQ",
            ExceptionId::Fiq => "FIQ",
            ExceptionId::SError => "SError",
        }
    }
}

// =============================================================================
// Vector Table
// =============================================================================

/// The AArch64 vector table, one slot per exception source
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

/// Synchronous exception trampoline, called from the vector entry code
///
/// Reads ESR_EL1 and decodes the exception class before dispatching.
/// Every class, reserved values included, routes through the single
/// Synchronous slot; the classification is observational until per-class
/// handlers exist.
#[cfg(target_arch = "aarch64")]
#[no_mangle]
pub extern "C" fn handle_synchronous() {
    let esr = Esr::new(crate::sysreg::read_esr_el1());
    let class = esr.exception_class();
    log::trace!("sync exception: {} (EC {:#04x})", class.name(), class.bits());
    dispatch(ExceptionId::Synchronous);
}

/// IRQ trampoline, called from the vector entry code
#[cfg(target_arch = "aarch64")]
#[no_mangle]
pub extern "C" fn handle_irq() {
    dispatch(ExceptionId::Irq);
}

/// FIQ trampoline, called from the vector entry code
#[cfg(target_arch = "aarch64")]
#[no_mangle]
pub extern "C" fn handle_fiq() {
    dispatch(ExceptionId::Fiq);
}

/// SError trampoline, called from the vector entry code
#[cfg(target_arch = "aarch64")]
#[no_mangle]
pub extern "C" fn handle_serror() {
    dispatch(ExceptionId::SError);
}

// =============================================================================
// Compile-time Assertions
// =============================================================================

const _: () = {
    // Identifiers are contiguous vector-order indices
    assert!(ExceptionId::Synchronous as usize == 0);
    assert!(ExceptionId::Irq as usize == 1);
    assert!(ExceptionId::Fiq as usize == 2);
    assert!(ExceptionId::SError as usize == 3);
};

static_assertions::const_assert_eq!(EXCEPTION_COUNT, 4);

// =============================================================================
// Tests
// =============================================================================

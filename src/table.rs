//! # Exception Vector Table
//!
//! This module provides the fixed-size table mapping exception source
//! slots to registered handlers. The table is the single mechanism behind
//! every dispatch trampoline: O(1) direct indexing, no locks, and no
//! allocation anywhere on the dispatch path.
//!
//! ## Slot Model
//!
//! ```text
//! ┌──────┬───────────────────────────────┐
//! │ Slot │ (handler, context)            │
//! ├──────┼───────────────────────────────┤
//! │  0   │ unregistered                  │
//! │  1   │ (timer_irq, &TIMER_STATE)     │
//! │ ...  │ ...                           │
//! │ N-1  │ unregistered                  │
//! └──────┴───────────────────────────────┘
//! ```
//!
//! Each slot is an independent single-writer cell. Writers must keep the
//! slot's exception source masked for the duration of the write; distinct
//! slots never require cross-synchronization.

use core::cell::UnsafeCell;
use core::ffi::c_void;
use core::fmt;
use core::mem::size_of;

use crate::handler::{ExceptionHandler, VectorTableEntry};

// =============================================================================
// Vector Table
// =============================================================================

/// Fixed-size exception vector table with `N` slots
///
/// The table is const-constructible so it can back a `static` owned by an
/// architecture module. All slots start unregistered; registration and
/// dispatch are the only mutation and invocation surfaces.
pub struct VectorTable<const N: usize> {
    slots: [UnsafeCell<VectorTableEntry>; N],
}

// SAFETY: Each slot is an independent cell. Writers hold the contract on
// `register`/`unregister`/`reset` (the affected source is masked, so no
// dispatch of the same slot runs concurrently), and readers therefore only
// ever observe whole entries.
unsafe impl<const N: usize> Sync for VectorTable<N> {}

impl<const N: usize> VectorTable<N> {
    /// Create a table with every slot unregistered
    pub const fn new() -> Self {
        #[allow(clippy::declare_interior_mutable_const)]
        const UNSET: UnsafeCell<VectorTableEntry> =
            UnsafeCell::new(VectorTableEntry::UNREGISTERED);
        Self { slots: [UNSET; N] }
    }

    /// Register a handler and context, overwriting the slot
    ///
    /// The write is visible to the next dispatch on the same core by the
    /// next instruction; no barrier is inserted.
    ///
    /// # Safety
    ///
    /// The caller must keep the slot's exception source masked (or
    /// otherwise guarantee no concurrent dispatch or write of this slot)
    /// for the duration of the call, and the handler must remain valid
    /// for as long as it stays registered.
    #[inline]
    pub unsafe fn register(&self, index: usize, handler: ExceptionHandler, context: *mut c_void) {
        unsafe { *self.slots[index].get() = VectorTableEntry::new(handler, context) };
    }

    /// Restore the slot to its unregistered state
    ///
    /// # Safety
    ///
    /// Same contract as [`register`](Self::register): the slot's exception
    /// source must be masked for the duration of the call.
    #[inline]
    pub unsafe fn unregister(&self, index: usize) {
        unsafe { *self.slots[index].get() = VectorTableEntry::UNREGISTERED };
    }

    /// Read the current entry at `index`
    ///
    /// O(1) direct indexing; never fails for in-range indices. Callers
    /// index through an exception source identifier, not external data.
    #[inline]
    pub fn entry(&self, index: usize) -> VectorTableEntry {
        // SAFETY: writers uphold the single-writer contract (the source is
        // masked during registration), so this read cannot race a write to
        // the same slot.
        unsafe { *self.slots[index].get() }
    }

    /// Invoke the registered handler at `index` with its context
    ///
    /// An unregistered slot is a configuration error in the surrounding
    /// system (the source was unmasked before its handler was registered)
    /// and is fatal: this logs the slot and panics rather than calling
    /// through an unset handler.
    #[inline]
    pub fn dispatch(&self, index: usize) {
        let entry = self.entry(index);
        match entry.handler {
            Some(handler) => handler(entry.context),
            None => {
                log::error!("EXCEPTION: no handler registered for vector slot {}", index);
                panic!("unhandled exception at vector slot {}", index);
            }
        }
    }

    /// Restore every slot to the unregistered state
    ///
    /// # Safety
    ///
    /// All exception sources covered by this table must be masked; no
    /// dispatch may run concurrently with the reset.
    pub unsafe fn reset(&self) {
        for slot in &self.slots {
            unsafe { *slot.get() = VectorTableEntry::UNREGISTERED };
        }
    }
}

impl<const N: usize> Default for VectorTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for VectorTable<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorTable").field("slots", &N).finish()
    }
}

// =============================================================================
// Compile-time Assertions
// =============================================================================

// An entry is a handler word plus a context word; the unset handler uses
// the null niche of `Option<fn>`.
static_assertions::const_assert_eq!(
    size_of::<VectorTableEntry>(),
    2 * size_of::<usize>()
);

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

    #[test]
    fn test_new_table_is_unregistered() {
        let table: VectorTable<4> = VectorTable::new();
        for index in 0..4 {
            assert_eq!(table.entry(index), VectorTableEntry::UNREGISTERED);
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let table: VectorTable<4> = VectorTable::new();
        let mut counter: u32 = 0;
        let context = (&mut counter as *mut u32).cast::<c_void>();

        unsafe { table.register(1, count_up, context) };

        let entry = table.entry(1);
        assert_eq!(entry, VectorTableEntry::new(count_up, context));
        assert!(entry.is_registered());
    }

    #[test]
    fn test_lookup_is_idempotent() {
        let table: VectorTable<4> = VectorTable::new();
        let mut counter: u32 = 0;
        unsafe { table.register(2, count_up, (&mut counter as *mut u32).cast()) };

        let first = table.entry(2);
        let second = table.entry(2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_dispatch_invokes_handler_once() {
        let table: VectorTable<4> = VectorTable::new();
        let mut counter: u32 = 0;
        unsafe { table.register(0, count_up, (&mut counter as *mut u32).cast()) };

        table.dispatch(0);
        assert_eq!(counter, 1);
        table.dispatch(0);
        assert_eq!(counter, 2);
    }

    #[test]
    fn test_reregistration_overwrites() {
        let table: VectorTable<4> = VectorTable::new();
        let mut first: u32 = 0;
        let mut second: u32 = 0;

        unsafe { table.register(3, count_up, (&mut first as *mut u32).cast()) };
        unsafe { table.register(3, add_ten, (&mut second as *mut u32).cast()) };

        table.dispatch(3);
        assert_eq!(first, 0);
        assert_eq!(second, 10);
    }

    #[test]
    fn test_slots_are_independent() {
        let table: VectorTable<4> = VectorTable::new();
        let mut counter: u32 = 0;

        unsafe { table.register(0, count_up, (&mut counter as *mut u32).cast()) };
        assert_eq!(table.entry(1), VectorTableEntry::UNREGISTERED);
        assert_eq!(table.entry(2), VectorTableEntry::UNREGISTERED);

        let before = table.entry(0);
        unsafe { table.register(1, add_ten, core::ptr::null_mut()) };
        assert_eq!(table.entry(0), before);
    }

    #[test]
    fn test_unregister_clears_slot() {
        let table: VectorTable<4> = VectorTable::new();
        let mut counter: u32 = 0;

        unsafe { table.register(2, count_up, (&mut counter as *mut u32).cast()) };
        assert!(table.entry(2).is_registered());

        unsafe { table.unregister(2) };
        assert_eq!(table.entry(2), VectorTableEntry::UNREGISTERED);
    }

    #[test]
    fn test_reset_clears_every_slot() {
        let table: VectorTable<4> = VectorTable::new();
        let mut counter: u32 = 0;
        let context = (&mut counter as *mut u32).cast::<c_void>();

        for index in 0..4 {
            unsafe { table.register(index, count_up, context) };
        }
        unsafe { table.reset() };

        for index in 0..4 {
            assert_eq!(table.entry(index), VectorTableEntry::UNREGISTERED);
        }
    }

    #[test]
    #[should_panic]
    fn test_dispatch_unregistered_is_fatal() {
        let table: VectorTable<4> = VectorTable::new();
        table.dispatch(3);
    }
}

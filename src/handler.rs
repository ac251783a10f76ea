//! # Exception Handler Types
//!
//! This module defines the handler function signature and the vector
//! table entry that pairs a handler with its opaque context.
//!
//! ## Handler Contract
//!
//! Handlers receive exactly one argument: the context value supplied at
//! registration time. The dispatch layer never inspects or mutates the
//! context; ownership stays with whoever registered it.

use core::ffi::c_void;
use core::ptr;

// =============================================================================
// Handler Function Type
// =============================================================================

/// Exception handler function
///
/// Called with the opaque context registered alongside it. The handler
/// runs in exception context with the taken exception class still being
/// serviced; it must leave processor state consistent for the entry
/// layer's restore sequence.
pub type ExceptionHandler = extern "C" fn(*mut c_void);

// =============================================================================
// Vector Table Entry
// =============================================================================

/// One vector table slot: a handler paired with its context
///
/// `handler` is `None` while the slot is unregistered. `context` is an
/// opaque pointer-sized handle passed unmodified to the handler on every
/// invocation. Entries compare by handler address and context pointer.
#[derive(Debug, Clone, Copy)]
pub struct VectorTableEntry {
    /// Registered handler, `None` when the slot is unset
    pub handler: Option<ExceptionHandler>,
    /// Opaque context passed to the handler on every invocation
    pub context: *mut c_void,
}

impl VectorTableEntry {
    /// The unregistered state every slot starts in
    pub const UNREGISTERED: Self = Self {
        handler: None,
        context: ptr::null_mut(),
    };

    /// Create an entry from a handler and its context
    #[inline]
    pub const fn new(handler: ExceptionHandler, context: *mut c_void) -> Self {
        Self {
            handler: Some(handler),
            context,
        }
    }

    /// Check if a handler is registered in this slot
    #[inline]
    pub const fn is_registered(&self) -> bool {
        self.handler.is_some()
    }
}

impl PartialEq for VectorTableEntry {
    fn eq(&self, other: &Self) -> bool {
        // Handlers compare by address.
        self.handler.map(|handler| handler as usize)
            == other.handler.map(|handler| handler as usize)
            && self.context == other.context
    }
}

impl Eq for VectorTableEntry {}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn nop_handler(_context: *mut c_void) {}

    extern "C" fn store_handler(context: *mut c_void) {
        unsafe { *context.cast::<u32>() = 7 };
    }

    #[test]
    fn test_unregistered_entry() {
        let entry = VectorTableEntry::UNREGISTERED;
        assert!(!entry.is_registered());
        assert!(entry.handler.is_none());
        assert!(entry.context.is_null());
    }

    #[test]
    fn test_registered_entry() {
        let mut value: u32 = 0;
        let context = (&mut value as *mut u32).cast::<c_void>();
        let entry = VectorTableEntry::new(nop_handler, context);
        assert!(entry.is_registered());
        assert_eq!(entry.context, context);
    }

    #[test]
    fn test_entry_equality() {
        let mut value: u32 = 0;
        let context = (&mut value as *mut u32).cast::<c_void>();
        let entry = VectorTableEntry::new(nop_handler, context);
        assert_eq!(entry, VectorTableEntry::new(nop_handler, context));
        assert_ne!(entry, VectorTableEntry::new(store_handler, context));
        assert_ne!(entry, VectorTableEntry::new(nop_handler, ptr::null_mut()));
        assert_ne!(entry, VectorTableEntry::UNREGISTERED);
        let unregistered = VectorTableEntry::UNREGISTERED;
        assert_eq!(unregistered, VectorTableEntry::UNREGISTERED);
    }
}

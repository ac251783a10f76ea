//! # System Register Access
//!
//! This module provides the volatile read primitive for named AArch64
//! system registers. The register name is a compile-time token pasted
//! into the `mrs` instruction; a name the assembler does not recognize
//! fails the build, so no runtime validation exists.

/// Read a system register by name
///
/// Expands to a single `mrs` instruction returning the register's
/// current 64-bit value. The read is performed at the call site every
/// time; it is never cached or reordered across.
///
/// ```rust,ignore
/// let esr = read_sysreg!(esr_el1);
/// let vbar = read_sysreg!(vbar_el1);
/// ```
#[macro_export]
macro_rules! read_sysreg {
    ($register:ident) => {{
        let value: u64;
        unsafe {
            ::core::arch::asm!(
                concat!("mrs {}, ", stringify!($register)),
                out(reg) value,
                options(nomem, nostack, preserves_flags),
            );
        }
        value
    }};
}

/// Read ESR_EL1 (Exception Syndrome Register)
#[inline]
pub fn read_esr_el1() -> u64 {
    read_sysreg!(esr_el1)
}

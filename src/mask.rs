//! # Exception Mask Control
//!
//! This module controls which exception classes the core will take,
//! through the DAIF flags on AArch64 and the CPSR control bits on
//! AArch32. Registration of a vector table entry is expected to happen
//! with the affected source masked; these helpers are how callers hold
//! that contract.
//!
//! ## Mask Bits
//!
//! ```text
//! Bit   Name   Meaning
//! ─────────────────────────────────────────────
//!  9     D     Debug exception mask (AArch64)
//!  8     A     SError / asynchronous abort mask
//!  7     I     IRQ mask
//!  6     F     FIQ mask
//! ```
//!
//! The A, I, and F positions are shared by the AArch64 DAIF view and the
//! AArch32 CPSR. Bit 9 is a mask bit only in the DAIF view; the AArch32
//! CPSR carries its E (endianness) bit at that position, so the 32-bit
//! write paths confine themselves to [`ExceptionMask::ALL_AARCH32`].

// =============================================================================
// Mask Flags
// =============================================================================

bitflags::bitflags! {
    /// Exception mask bits at their DAIF/CPSR bit positions
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExceptionMask: u64 {
        /// Debug exception mask (AArch64 only)
        const D = 1 << 9;
        /// SError / asynchronous abort mask
        const A = 1 << 8;
        /// IRQ mask
        const I = 1 << 7;
        /// FIQ mask
        const F = 1 << 6;

        /// All maskable exception classes
        const ALL = Self::D.bits() | Self::A.bits() | Self::I.bits() | Self::F.bits();

        /// All mask bits the 32-bit CPSR carries
        ///
        /// CPSR bit 9 is the E (endianness) bit, not a mask, so `D` is
        /// excluded.
        const ALL_AARCH32 = Self::A.bits() | Self::I.bits() | Self::F.bits();
    }
}

impl ExceptionMask {
    /// Check if IRQs are masked
    #[inline]
    pub fn irqs_masked(&self) -> bool {
        self.contains(Self::I)
    }

    /// Check if FIQs are masked
    #[inline]
    pub fn fiqs_masked(&self) -> bool {
        self.contains(Self::F)
    }

    /// Restrict to the bits the 32-bit CPSR treats as exception masks
    #[inline]
    pub const fn aarch32_writable(self) -> Self {
        self.intersection(Self::ALL_AARCH32)
    }
}

// =============================================================================
// AArch64 Mask Register Access
// =============================================================================

/// Read DAIF (exception mask flags)
#[cfg(target_arch = "aarch64")]
#[inline]
pub fn read_daif() -> u64 {
    let value: u64;
    unsafe {
        core::arch::asm!("mrs {}, DAIF", out(reg) value, options(nomem, nostack, preserves_flags));
    }
    value
}

/// Write DAIF (exception mask flags)
#[cfg(target_arch = "aarch64")]
#[inline]
pub fn write_daif(value: u64) {
    unsafe {
        core::arch::asm!("msr DAIF, {}", in(reg) value, options(nomem, nostack, preserves_flags));
    }
}

/// Unmask IRQs
#[cfg(target_arch = "aarch64")]
#[inline]
pub fn enable_irq() {
    unsafe {
        core::arch::asm!("msr DAIFClr, #0x2", options(nomem, nostack, preserves_flags));
    }
}

/// Mask IRQs
#[cfg(target_arch = "aarch64")]
#[inline]
pub fn disable_irq() {
    unsafe {
        core::arch::asm!("msr DAIFSet, #0x2", options(nomem, nostack, preserves_flags));
    }
}

/// Unmask FIQs
#[cfg(target_arch = "aarch64")]
#[inline]
pub fn enable_fiq() {
    unsafe {
        core::arch::asm!("msr DAIFClr, #0x1", options(nomem, nostack, preserves_flags));
    }
}

/// Mask FIQs
#[cfg(target_arch = "aarch64")]
#[inline]
pub fn disable_fiq() {
    unsafe {
        core::arch::asm!("msr DAIFSet, #0x1", options(nomem, nostack, preserves_flags));
    }
}

#[cfg(target_arch = "aarch64")]
#[inline]
fn read_mask_register() -> u64 {
    read_daif()
}

#[cfg(target_arch = "aarch64")]
#[inline]
fn write_mask_register(value: u64) {
    write_daif(value);
}

// Every DAIF bit is a mask bit.
#[cfg(target_arch = "aarch64")]
#[inline]
fn writable_bits(mask: ExceptionMask) -> u64 {
    mask.bits()
}

// =============================================================================
// AArch32 Mask Register Access
// =============================================================================

/// Read CPSR (current program status register)
#[cfg(target_arch = "arm")]
#[inline]
pub fn read_cpsr() -> u64 {
    let value: u32;
    unsafe {
        core::arch::asm!("mrs {}, cpsr", out(reg) value, options(nomem, nostack, preserves_flags));
    }
    value as u64
}

/// Write the CPSR control and extension fields
#[cfg(target_arch = "arm")]
#[inline]
pub fn write_cpsr(value: u64) {
    unsafe {
        core::arch::asm!(
            "msr cpsr_xc, {}",
            in(reg) value as u32,
            options(nomem, nostack, preserves_flags),
        );
    }
}

/// Unmask IRQs
#[cfg(target_arch = "arm")]
#[inline]
pub fn enable_irq() {
    unsafe {
        core::arch::asm!("cpsie i", options(nomem, nostack, preserves_flags));
    }
}

/// Mask IRQs
#[cfg(target_arch = "arm")]
#[inline]
pub fn disable_irq() {
    unsafe {
        core::arch::asm!("cpsid i", options(nomem, nostack, preserves_flags));
    }
}

/// Unmask FIQs
#[cfg(target_arch = "arm")]
#[inline]
pub fn enable_fiq() {
    unsafe {
        core::arch::asm!("cpsie f", options(nomem, nostack, preserves_flags));
    }
}

/// Mask FIQs
#[cfg(target_arch = "arm")]
#[inline]
pub fn disable_fiq() {
    unsafe {
        core::arch::asm!("cpsid f", options(nomem, nostack, preserves_flags));
    }
}

#[cfg(target_arch = "arm")]
#[inline]
fn read_mask_register() -> u64 {
    read_cpsr()
}

#[cfg(target_arch = "arm")]
#[inline]
fn write_mask_register(value: u64) {
    write_cpsr(value);
}

// CPSR bit 9 is the E (endianness) bit. A requested D mask must never
// reach the register write.
#[cfg(target_arch = "arm")]
#[inline]
fn writable_bits(mask: ExceptionMask) -> u64 {
    mask.aarch32_writable().bits()
}

// =============================================================================
// Shared Mask Operations
// =============================================================================

/// Get the current exception mask state
#[cfg(any(target_arch = "aarch64", target_arch = "arm"))]
#[inline]
pub fn current() -> ExceptionMask {
    ExceptionMask::from_bits_truncate(read_mask_register())
}

/// Mask the given exception classes, leaving the others unchanged
///
/// Bits the current execution state has no mask for are ignored.
#[cfg(any(target_arch = "aarch64", target_arch = "arm"))]
#[inline]
pub fn disable(mask: ExceptionMask) {
    write_mask_register(read_mask_register() | writable_bits(mask));
}

/// Unmask the given exception classes, leaving the others unchanged
///
/// Bits the current execution state has no mask for are ignored.
#[cfg(any(target_arch = "aarch64", target_arch = "arm"))]
#[inline]
pub fn enable(mask: ExceptionMask) {
    write_mask_register(read_mask_register() & !writable_bits(mask));
}

/// Execute a closure with the given classes masked, then restore
///
/// The previous mask state is restored wholesale when the closure
/// returns, so classes that were already masked stay masked.
#[cfg(any(target_arch = "aarch64", target_arch = "arm"))]
#[inline]
pub fn with_masked<F, R>(mask: ExceptionMask, f: F) -> R
where
    F: FnOnce() -> R,
{
    let saved = read_mask_register();
    write_mask_register(saved | writable_bits(mask));
    let result = f();
    write_mask_register(saved);
    result
}

// =============================================================================
// Mask Guard
// =============================================================================

/// RAII guard for the exception mask state
///
/// Masks the given classes when created, restores the previous mask
/// state when dropped.
#[cfg(any(target_arch = "aarch64", target_arch = "arm"))]
#[derive(Debug)]
pub struct MaskGuard {
    /// Mask register state before this guard was created
    saved: u64,
}

#[cfg(any(target_arch = "aarch64", target_arch = "arm"))]
impl MaskGuard {
    /// Create a new guard, masking the given exception classes
    ///
    /// Bits the current execution state has no mask for are ignored.
    pub fn new(mask: ExceptionMask) -> Self {
        let saved = read_mask_register();
        write_mask_register(saved | writable_bits(mask));
        Self { saved }
    }
}

#[cfg(any(target_arch = "aarch64", target_arch = "arm"))]
impl Drop for MaskGuard {
    fn drop(&mut self) {
        write_mask_register(self.saved);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_bit_positions() {
        assert_eq!(ExceptionMask::D.bits(), 1 << 9);
        assert_eq!(ExceptionMask::A.bits(), 1 << 8);
        assert_eq!(ExceptionMask::I.bits(), 1 << 7);
        assert_eq!(ExceptionMask::F.bits(), 1 << 6);
        assert_eq!(ExceptionMask::ALL.bits(), 0x3C0);
    }

    #[test]
    fn test_mask_composition() {
        let mask = ExceptionMask::I | ExceptionMask::F;
        assert_eq!(mask.bits(), 0xC0);
        assert!(mask.irqs_masked());
        assert!(mask.fiqs_masked());
        assert!(!mask.contains(ExceptionMask::A));
        assert!(ExceptionMask::ALL.contains(mask));
    }

    #[test]
    fn test_mask_from_raw_bits() {
        let mask = ExceptionMask::from_bits_truncate(0x3C0 | 0x1F);
        assert_eq!(mask, ExceptionMask::ALL);
        assert!(ExceptionMask::from_bits_truncate(0).is_empty());
    }

    #[test]
    fn test_aarch32_writable_excludes_endianness_bit() {
        // Bit 9 is CPSR.E on AArch32; a D request must never be written.
        assert_eq!(ExceptionMask::ALL_AARCH32.bits(), 0x1C0);
        assert!(!ExceptionMask::ALL_AARCH32.contains(ExceptionMask::D));
        assert_eq!(
            ExceptionMask::ALL.aarch32_writable(),
            ExceptionMask::A | ExceptionMask::I | ExceptionMask::F
        );
        assert_eq!(ExceptionMask::D.aarch32_writable(), ExceptionMask::empty());
        assert_eq!(
            (ExceptionMask::D | ExceptionMask::I).aarch32_writable(),
            ExceptionMask::I
        );
    }
}

//! # Exception Syndrome Register (ESR) Model
//!
//! This module decodes the AArch64 Exception Syndrome Register, which
//! describes the cause of a synchronous exception. The only field the
//! dispatch layer extracts today is the exception class (EC); the rest of
//! the register is carried opaquely.
//!
//! ## Register Layout
//!
//! ```text
//!  63                    32 31       26 25 24                     0
//! ┌────────────────────────┬───────────┬──┬───────────────────────┐
//! │         RES0/ISS2      │    EC     │IL│          ISS          │
//! └────────────────────────┴───────────┴──┴───────────────────────┘
//! ```
//!
//! The EC field is six bits, so its domain is 0x00-0x3F. Not every value
//! is architecturally allocated; decoding is still total, with reserved
//! values mapping to explicit `Reserved` classes rather than failing.

use core::fmt;

// =============================================================================
// Field Constants
// =============================================================================

/// Bit offset of the EC field within ESR_ELx
pub const EC_SHIFT: u32 = 26;

/// Mask of the EC field after shifting
pub const EC_MASK: u64 = 0x3F;

// =============================================================================
// Exception Classes
// =============================================================================

/// Exception class (EC) codes
///
/// One variant per six-bit EC value. Architecturally unallocated values
/// carry explicit `Reserved` variants so the decode is total by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExceptionClass {
    /// Unknown reason
    Unknown                   = 0x00,

    /// Trapped WFI or WFE instruction execution
    WfInstruction             = 0x01,

    /// Reserved (0x02)
    Reserved02                = 0x02,

    /// Trapped AArch32 MCR or MRC access (coproc 0b1111)
    Cp15McrMrc                = 0x03,

    /// Trapped AArch32 MCRR or MRRC access (coproc 0b1111)
    Cp15McrrMrrc              = 0x04,

    /// Trapped AArch32 MCR or MRC access (coproc 0b1110)
    Cp14McrMrc                = 0x05,

    /// Trapped AArch32 LDC or STC access (coproc 0b1110)
    Cp14LdcStc                = 0x06,

    /// Access to SME, SVE, Advanced SIMD or floating-point trapped
    AdvSimdFp                 = 0x07,

    /// Trapped VMRS access from an ID group trap (EL2 only)
    Cp10Id                    = 0x08,

    /// Trapped use of a pointer authentication instruction
    Pac                       = 0x09,

    /// Trapped execution of an LD64B or ST64B* instruction
    Ls64                      = 0x0A,

    /// Reserved (0x0B)
    Reserved0B                = 0x0B,

    /// Trapped AArch32 MRRC access (coproc 0b1110)
    Cp14Mrrc                  = 0x0C,

    /// Branch Target Identification exception
    Bti                       = 0x0D,

    /// Illegal Execution state
    IllegalState              = 0x0E,

    // 0x0F-0x10: Reserved
    /// Reserved (0x0F)
    Reserved0F                = 0x0F,
    /// Reserved (0x10)
    Reserved10                = 0x10,

    /// SVC instruction execution in AArch32 state
    Svc32                     = 0x11,

    /// HVC instruction execution in AArch32 state (EL2 only)
    Hvc32                     = 0x12,

    /// SMC instruction execution in AArch32 state (EL2 or above)
    Smc32                     = 0x13,

    /// Reserved (0x14)
    Reserved14                = 0x14,

    /// SVC instruction execution in AArch64 state
    Svc64                     = 0x15,

    /// HVC instruction execution in AArch64 state (EL2 only)
    Hvc64                     = 0x16,

    /// SMC instruction execution in AArch64 state (EL2 or above)
    Smc64                     = 0x17,

    /// Trapped MSR, MRS or System instruction execution in AArch64 state
    SysReg64                  = 0x18,

    /// Access to SVE functionality trapped
    Sve                       = 0x19,

    /// Trapped ERET, ERETAA or ERETAB instruction (EL2 only)
    Eret                      = 0x1A,

    /// Reserved (0x1B)
    Reserved1B                = 0x1B,

    /// Pointer authentication failure
    Fpac                      = 0x1C,

    /// Access to SME functionality trapped
    Sme                       = 0x1D,

    /// Reserved (0x1E)
    Reserved1E                = 0x1E,

    /// Implementation defined exception (EL3 only)
    ImpDef                    = 0x1F,

    /// Instruction Abort from a lower Exception level
    InstructionAbortLowerEl   = 0x20,

    /// Instruction Abort taken without a change in Exception level
    InstructionAbortCurrentEl = 0x21,

    /// PC alignment fault
    PcAlignment               = 0x22,

    /// Reserved (0x23)
    Reserved23                = 0x23,

    /// Data Abort from a lower Exception level
    DataAbortLowerEl          = 0x24,

    /// Data Abort taken without a change in Exception level
    DataAbortCurrentEl        = 0x25,

    /// SP alignment fault
    SpAlignment               = 0x26,

    /// Memory Operation (MOPS) exception
    Mops                      = 0x27,

    /// Trapped floating-point exception from AArch32 state
    FpException32             = 0x28,

    // 0x29-0x2B: Reserved
    /// Reserved (0x29)
    Reserved29                = 0x29,
    /// Reserved (0x2A)
    Reserved2A                = 0x2A,
    /// Reserved (0x2B)
    Reserved2B                = 0x2B,

    /// Trapped floating-point exception from AArch64 state
    FpException64             = 0x2C,

    // 0x2D-0x2E: Reserved
    /// Reserved (0x2D)
    Reserved2D                = 0x2D,
    /// Reserved (0x2E)
    Reserved2E                = 0x2E,

    /// SError interrupt
    SError                    = 0x2F,

    /// Breakpoint exception from a lower Exception level
    BreakpointLowerEl         = 0x30,

    /// Breakpoint exception taken without a change in Exception level
    BreakpointCurrentEl       = 0x31,

    /// Software Step exception from a lower Exception level
    SoftwareStepLowerEl       = 0x32,

    /// Software Step exception taken without a change in Exception level
    SoftwareStepCurrentEl     = 0x33,

    /// Watchpoint exception from a lower Exception level
    WatchpointLowerEl         = 0x34,

    /// Watchpoint exception taken without a change in Exception level
    WatchpointCurrentEl       = 0x35,

    // 0x36-0x37: Reserved
    /// Reserved (0x36)
    Reserved36                = 0x36,
    /// Reserved (0x37)
    Reserved37                = 0x37,

    /// BKPT instruction execution in AArch32 state
    Bkpt32                    = 0x38,

    /// Reserved (0x39)
    Reserved39                = 0x39,

    /// Vector Catch exception from AArch32 state (EL2 only)
    VectorCatch32             = 0x3A,

    /// Reserved (0x3B)
    Reserved3B                = 0x3B,

    /// BRK instruction execution in AArch64 state
    Brk64                     = 0x3C,

    // 0x3D-0x3F: Reserved
    /// Reserved (0x3D)
    Reserved3D                = 0x3D,
    /// Reserved (0x3E)
    Reserved3E                = 0x3E,
    /// Reserved (0x3F)
    Reserved3F                = 0x3F,
}

impl ExceptionClass {
    /// Convert from a raw six-bit class code
    ///
    /// High bits are masked off, so the conversion is total.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        // Safety: all values 0x00-0x3F are valid enum variants
        unsafe { core::mem::transmute(bits & EC_MASK as u8) }
    }

    /// Extract and decode the EC field from a raw ESR value
    #[inline]
    pub const fn from_esr(esr: u64) -> Self {
        Self::from_bits(((esr >> EC_SHIFT) & EC_MASK) as u8)
    }

    /// Get the raw six-bit class code
    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Check if this value is architecturally unallocated
    #[inline]
    pub const fn is_reserved(self) -> bool {
        matches!(
            self.bits(),
            0x02 | 0x0B
                | 0x0F
                | 0x10
                | 0x14
                | 0x1B
                | 0x1E
                | 0x23
                | 0x29..=0x2B
                | 0x2D
                | 0x2E
                | 0x36
                | 0x37
                | 0x39
                | 0x3B
                | 0x3D..=0x3F
        )
    }

    /// Check if this is an instruction or data abort
    #[inline]
    pub const fn is_abort(self) -> bool {
        matches!(
            self,
            ExceptionClass::InstructionAbortLowerEl
                | ExceptionClass::InstructionAbortCurrentEl
                | ExceptionClass::DataAbortLowerEl
                | ExceptionClass::DataAbortCurrentEl
        )
    }

    /// Check if this is a debug exception
    #[inline]
    pub const fn is_debug(self) -> bool {
        matches!(
            self,
            ExceptionClass::BreakpointLowerEl
                | ExceptionClass::BreakpointCurrentEl
                | ExceptionClass::SoftwareStepLowerEl
                | ExceptionClass::SoftwareStepCurrentEl
                | ExceptionClass::WatchpointLowerEl
                | ExceptionClass::WatchpointCurrentEl
                | ExceptionClass::Bkpt32
                | ExceptionClass::VectorCatch32
                | ExceptionClass::Brk64
        )
    }

    /// Get a human-readable name for this class
    pub const fn name(self) -> &'static str {
        match self {
            ExceptionClass::Unknown => "Unknown Reason",
            ExceptionClass::WfInstruction => "Trapped WFI/WFE",
            ExceptionClass::Cp15McrMrc => "Trapped CP15 MCR/MRC",
            ExceptionClass::Cp15McrrMrrc => "Trapped CP15 MCRR/MRRC",
            ExceptionClass::Cp14McrMrc => "Trapped CP14 MCR/MRC",
            ExceptionClass::Cp14LdcStc => "Trapped CP14 LDC/STC",
            ExceptionClass::AdvSimdFp => "Advanced SIMD/FP Access",
            ExceptionClass::Cp10Id => "Trapped CP10 VMRS",
            ExceptionClass::Pac => "Pointer Authentication Trap",
            ExceptionClass::Ls64 => "Trapped LD64B/ST64B",
            ExceptionClass::Cp14Mrrc => "Trapped CP14 MRRC",
            ExceptionClass::Bti => "Branch Target Exception",
            ExceptionClass::IllegalState => "Illegal Execution State",
            ExceptionClass::Svc32 => "SVC (AArch32)",
            ExceptionClass::Hvc32 => "HVC (AArch32)",
            ExceptionClass::Smc32 => "SMC (AArch32)",
            ExceptionClass::Svc64 => "SVC (AArch64)",
            ExceptionClass::Hvc64 => "HVC (AArch64)",
            ExceptionClass::Smc64 => "SMC (AArch64)",
            ExceptionClass::SysReg64 => "Trapped MSR/MRS (AArch64)",
            ExceptionClass::Sve => "SVE Access",
            ExceptionClass::Eret => "Trapped ERET",
            ExceptionClass::Fpac => "PAC Authentication Failure",
            ExceptionClass::Sme => "SME Access",
            ExceptionClass::ImpDef => "Implementation Defined",
            ExceptionClass::InstructionAbortLowerEl => "Instruction Abort (lower EL)",
            ExceptionClass::InstructionAbortCurrentEl => "Instruction Abort (current EL)",
            ExceptionClass::PcAlignment => "PC Alignment Fault",
            ExceptionClass::DataAbortLowerEl => "Data Abort (lower EL)",
            ExceptionClass::DataAbortCurrentEl => "Data Abort (current EL)",
            ExceptionClass::SpAlignment => "SP Alignment Fault",
            ExceptionClass::Mops => "Memory Copy/Set Exception",
            ExceptionClass::FpException32 => "FP Exception (AArch32)",
            ExceptionClass::FpException64 => "FP Exception (AArch64)",
            ExceptionClass::SError => "SError Interrupt",
            ExceptionClass::BreakpointLowerEl => "Breakpoint (lower EL)",
            ExceptionClass::BreakpointCurrentEl => "Breakpoint (current EL)",
            ExceptionClass::SoftwareStepLowerEl => "Software Step (lower EL)",
            ExceptionClass::SoftwareStepCurrentEl => "Software Step (current EL)",
            ExceptionClass::WatchpointLowerEl => "Watchpoint (lower EL)",
            ExceptionClass::WatchpointCurrentEl => "Watchpoint (current EL)",
            ExceptionClass::Bkpt32 => "BKPT (AArch32)",
            ExceptionClass::VectorCatch32 => "Vector Catch (AArch32)",
            ExceptionClass::Brk64 => "BRK (AArch64)",
            _ => "Reserved",
        }
    }
}

impl From<u8> for ExceptionClass {
    fn from(bits: u8) -> Self {
        Self::from_bits(bits)
    }
}

impl From<ExceptionClass> for u8 {
    fn from(class: ExceptionClass) -> Self {
        class.bits()
    }
}

// =============================================================================
// ESR Value
// =============================================================================

/// A raw Exception Syndrome Register value
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Esr(u64);

impl Esr {
    /// Wrap a raw register value
    #[inline]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw register value
    #[inline]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Get the raw exception class field (bits 31:26)
    #[inline]
    pub const fn ec(self) -> u8 {
        ((self.0 >> EC_SHIFT) & EC_MASK) as u8
    }

    /// Decode the exception class
    #[inline]
    pub const fn exception_class(self) -> ExceptionClass {
        ExceptionClass::from_esr(self.0)
    }

    /// Get instruction length (true = 32-bit, false = 16-bit)
    #[inline]
    pub const fn instruction_is_32bit(self) -> bool {
        (self.0 & (1 << 25)) != 0
    }

    /// Get the ISS (Instruction Specific Syndrome) field (bits 24:0)
    #[inline]
    pub const fn instruction_syndrome(self) -> u32 {
        (self.0 & 0x1FFFFFF) as u32
    }
}

impl From<u64> for Esr {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl From<Esr> for u64 {
    fn from(esr: Esr) -> Self {
        esr.bits()
    }
}

impl fmt::Debug for Esr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Esr({:#x} [{:?} EC={:#04x}])",
            self.0,
            self.exception_class(),
            self.ec()
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ec_decode_is_total() {
        for value in 0u8..=0x3F {
            let esr = Esr::new((value as u64) << EC_SHIFT);
            assert_eq!(esr.ec(), value);
            assert_eq!(ExceptionClass::from_esr(esr.bits()).bits(), value);
        }
    }

    #[test]
    fn test_svc64_decode() {
        // SVC #0 taken from AArch64: EC 0x15, IL set, zero ISS.
        let esr = Esr::new(0x56000000);
        assert_eq!(esr.ec(), 0x15);
        assert_eq!(esr.exception_class(), ExceptionClass::Svc64);
        assert_eq!(esr.exception_class().name(), "SVC (AArch64)");
        assert!(esr.instruction_is_32bit());
        assert_eq!(esr.instruction_syndrome(), 0);
    }

    #[test]
    fn test_data_abort_syndrome_fields() {
        // Data Abort, current EL, 32-bit instruction, translation fault ISS
        let esr = Esr::new(0x96000045);
        assert_eq!(esr.exception_class(), ExceptionClass::DataAbortCurrentEl);
        assert!(esr.instruction_is_32bit());
        assert_eq!(esr.instruction_syndrome(), 0x45);
        assert!(esr.exception_class().is_abort());
    }

    #[test]
    fn test_from_bits_masks_high_bits() {
        assert_eq!(ExceptionClass::from_bits(0x55), ExceptionClass::Svc64);
        assert_eq!(ExceptionClass::from_bits(0xFF), ExceptionClass::Reserved3F);
    }

    #[test]
    fn test_reserved_classes() {
        assert!(ExceptionClass::Reserved02.is_reserved());
        assert!(ExceptionClass::Reserved29.is_reserved());
        assert!(ExceptionClass::Reserved3F.is_reserved());
        assert_eq!(ExceptionClass::Reserved14.name(), "Reserved");

        assert!(!ExceptionClass::Unknown.is_reserved());
        assert!(!ExceptionClass::Svc64.is_reserved());
        assert!(!ExceptionClass::DataAbortLowerEl.is_reserved());
    }

    #[test]
    fn test_class_predicates() {
        assert!(ExceptionClass::InstructionAbortLowerEl.is_abort());
        assert!(!ExceptionClass::Svc64.is_abort());
        assert!(ExceptionClass::Brk64.is_debug());
        assert!(ExceptionClass::WatchpointCurrentEl.is_debug());
        assert!(!ExceptionClass::SError.is_debug());
    }

    #[test]
    fn test_reserved_count() {
        let reserved = (0u8..=0x3F)
            .filter(|value| ExceptionClass::from_bits(*value).is_reserved())
            .count();
        assert_eq!(reserved, 20);
    }
}

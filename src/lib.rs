//! # cortex-a-vectors
//!
//! Exception vector dispatch for ARM application cores. This crate is the
//! C-level layer between the exception entry assembly and registered
//! handlers: a fixed-size vector table per execution state, one dispatch
//! trampoline per architectural exception source, and exception syndrome
//! classification on the 64-bit synchronous path.
//!
//! ## Design
//!
//! The dispatch path is deterministic and minimal: no locks, no
//! allocation, O(1) table indexing, and a direct call through the
//! registered handler. Everything around it — vector table placement,
//! register save/restore, GIC programming — belongs to external
//! collaborators; this crate receives control already in exception
//! context and returns it to the same entry layer.
//!
//! ## Components
//!
//! - **`handler`**: handler signature and the (handler, context) entry
//! - **`table`**: the fixed-size vector table and its dispatch mechanism
//! - **`esr`**: exception class constants and total EC decode
//! - **`sysreg`**: volatile system register reads (AArch64 targets)
//! - **`mask`**: DAIF/CPSR exception mask control
//! - **`aarch64`** / **`aarch32`**: per-state sources, tables, trampolines
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

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod esr;
pub mod handler;
pub mod mask;
pub mod table;

#[cfg(feature = "aarch32")]
pub mod aarch32;
#[cfg(feature = "aarch64")]
pub mod aarch64;
#[cfg(all(feature = "aarch64", target_arch = "aarch64"))]
pub mod sysreg;

pub use esr::{Esr, ExceptionClass};
pub use handler::{ExceptionHandler, VectorTableEntry};
pub use mask::ExceptionMask;
pub use table::VectorTable;

//! # Kernel Entry Convention
//!
//! Stage-2 jumps to the first byte of the kernel image in 64-bit mode with:
//!
//! * `RDI`: physical address of the sealed Handoff Descriptor Block,
//! * interrupts disabled,
//! * `CS` = [`CODE64`](crate::selectors::CODE64), data segments =
//!   [`DATA64`](crate::selectors::DATA64),
//! * the first [`IDENTITY_MAP_BYTES`](crate::memory::IDENTITY_MAP_BYTES)
//!   identity mapped.
//!
//! The kernel sets up its own stack before touching memory.

/// Signature of the kernel entry point as seen from the loader.
pub type KernelEntryFn = extern "sysv64" fn(handoff: u64) -> !;

//! # Stage-2 Mode-Transition Engine
//!
//! Stage-1 jumps here in 16-bit real mode with the boot drive in `DL`. This
//! stage prepares everything the kernel needs, then leaves real mode for good:
//!
//! ```text
//! Entered
//!   └▶ ExtendedAddressingEnabled   A20 via INT 15h, else the 8042 output port
//!       └▶ KernelImageLoaded        INT 13h extended reads, ≤ 64 sectors each
//!           └▶ DescriptorTablesBuilt GDT inside this image, relocated from CS
//!               └▶ PageTablesBuilt   2 MiB identity map (long mode only)
//!                   └▶ HandoffBlockFinalized  HDB at HANDOFF_ADDR
//!                       └▶ ModeSwitched ─▶ KernelEntered
//! ```
//!
//! The [`Engine`] walks these stages strictly in order. It never touches the
//! machine directly: firmware services go through [`Firmware`], privileged CPU
//! operations and raw memory through [`CpuControl`] and [`PhysicalMemory`],
//! and the keyboard controller through [`kernel_hal::PortIo`]. The binary
//! supplies BIOS-backed implementations; the tests supply recording mocks.
//!
//! The last step, [`Engine::enter_kernel`], hands a [`ModeSwitch`] plan to the
//! trampoline, which performs the register writes in the documented order
//! and jumps to the kernel with the HDB address as its only argument.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod a20;
pub mod config;
pub mod context;
pub mod disk;
mod engine;
pub mod error;
pub mod firmware;
pub mod gdt;
pub mod handoff;
pub mod machine;
pub mod paging;
pub mod stage;
pub mod switch;

pub use config::{Stage2Config, TargetMode};
pub use context::BootContext;
pub use engine::Engine;
pub use error::{BootError, DiskError};
pub use firmware::{DiskRead, Firmware, FirmwareError, Teletype};
pub use machine::{CpuControl, PhysicalMemory};
pub use stage::Stage;
pub use switch::{LongModeRegisters, ModeSwitch};

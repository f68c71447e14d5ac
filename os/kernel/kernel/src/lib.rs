//! # Kernel
//!
//! What runs after Stage-2 jumps to `0x10000` in long mode:
//!
//! ```text
//! _start_kernel (RDI = HDB)
//!   ├─ status::StatusReport::from_handoff   machine facts for `status`
//!   ├─ console::TextConsole                 80×25 text buffer
//!   ├─ interrupts::Idt + pic::Pic8259       vectors 0..=31 faults, 32..=47 devices
//!   ├─ keyboard::KEYBOARD on line 1         scan code → pending-key slot
//!   └─ shell::run                           poll, edit, dispatch
//! ```
//!
//! The library holds everything that can be exercised on the host: the
//! interrupt table encoding, the PIC protocol over [`kernel_hal::PortIo`],
//! scan-code translation, the console and the shell. The binary adds the
//! entry point, the service-routine stubs and the hardware instances.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod console;
pub mod interrupts;
pub mod keyboard;
pub mod pic;
pub mod shell;
pub mod status;

pub use console::{CellBuffer, Terminal, TextConsole, VgaBuffer};
pub use interrupts::{Idt, IdtEntry, IdtGateAttr, InterruptFrame, IrqHandler, IrqTable, Route};
pub use keyboard::{KEYBOARD, KeyboardDriver};
pub use pic::Pic8259;
pub use shell::{Action, KeyInterrupts, ShellState};
pub use status::StatusReport;

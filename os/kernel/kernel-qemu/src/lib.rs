//! # QEMU Debug Console Logging
//!
//! Routes the [`log`] facade to QEMU's debug console (`-debugcon`), which
//! captures every byte written to I/O port `0x402`:
//!
//! ```bash
//! qemu-system-x86_64 -drive format=raw,file=disk.img -debugcon stdio
//! ```
//!
//! The same backend serves the real-mode loader and the kernel. Records are
//! formatted as `"[LEVEL] target: message\n"` straight into the port, with no
//! buffering or allocation, so logging works from the first instruction of
//! Rust code and from interrupt handlers.
//!
//! ## Mirroring
//! A [`QemuLogger`] can carry a mirror callback that receives the same text.
//! The loader mirrors into the BIOS teletype so boot progress is visible on
//! screen as well.
//!
//! ## Features
//! * `enabled` (default): port writes are compiled in. Without it the sink
//!   discards everything, and only the mirror (if any) sees output.
//!
//! ## Usage
//! ```rust,no_run
//! use kernel_qemu::QemuLogger;
//! use log::{LevelFilter, info};
//!
//! QemuLogger::new(LevelFilter::Debug).init().expect("logger installed once");
//! info!("interrupts ready");
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod logger;
mod sink;

pub use logger::{LoggerInitError, QemuLogger, write_record};
pub use sink::{DebugconSink, QEMU_DEBUG_PORT};

#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt;

    #[doc(hidden)]
    #[inline]
    pub fn qemu_write(args: fmt::Arguments) {
        // Best-effort debug output.
        let _ = fmt::write(&mut crate::DebugconSink, args);
    }
}

/// Write straight to the debug console, bypassing the logger.
///
/// For paths where the logger may not be usable (panics, the first lines of
/// the kernel entry).
#[macro_export]
macro_rules! qemu_trace {
    ($($arg:tt)*) => {{
        $crate::qemu_fmt::qemu_write(core::format_args!($($arg)*));
    }};
}

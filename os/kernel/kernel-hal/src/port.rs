//! # x86 I/O Port Access
//!
//! Legacy devices on this platform (8259 PIC, 8042 keyboard controller,
//! QEMU's debug console) live in the 16-bit I/O port space and are reached
//! with `in`/`out` rather than memory loads and stores.
//!
//! ```text
//! 0x0020-0x0021   PIC #1 (command, data)
//! 0x0060          Keyboard controller data
//! 0x0064          Keyboard controller status (read) / command (write)
//! 0x0080          POST diagnostic port, used for I/O delays
//! 0x00A0-0x00A1   PIC #2 (command, data)
//! 0x0402          QEMU debugcon
//! ```

/// Unused POST diagnostic port; a write here takes roughly 1µs.
pub const POST_PORT: u16 = 0x80;

/// Byte-wide port I/O as a capability.
///
/// Everything that talks to a legacy device takes `&mut impl PortIo`, so the
/// device protocol can be exercised against a recording double.
pub trait PortIo {
    fn read_u8(&mut self, port: u16) -> u8;

    fn write_u8(&mut self, port: u16, value: u8);

    /// Give slow devices time to settle between consecutive commands.
    fn io_wait(&mut self) {
        self.write_u8(POST_PORT, 0);
    }
}

/// The real port bus.
///
/// Zero-sized; holding one is the permission to touch hardware ports.
#[derive(Debug)]
pub struct Ports {
    _private: (),
}

impl Ports {
    /// # Safety
    /// The caller must run at CPL0 (or with I/O permission for every port it
    /// will touch), and must serialize device protocols with interrupt
    /// handlers that talk to the same device.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl PortIo for Ports {
    #[inline]
    fn read_u8(&mut self, port: u16) -> u8 {
        // SAFETY: `Ports` can only be created by a caller that vouched for port access.
        unsafe { read_port(port) }
    }

    #[inline]
    fn write_u8(&mut self, port: u16, value: u8) {
        // SAFETY: see `read_u8`.
        unsafe { write_port(port, value) }
    }
}

/// Write one byte to an I/O port (`out dx, al`).
///
/// # Safety
/// - **Privilege:** CPL0 or an I/O permission that covers `port`; otherwise `#GP`.
/// - **Correct port:** the write must be valid for the device's current state.
///   The wrong value can wedge the system (e.g. masking every PIC line).
/// - **Concurrency:** multi-byte device protocols must not be interleaved with
///   an interrupt handler that talks to the same device.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[inline]
pub unsafe fn write_port(port: u16, val: u8) {
    // SAFETY: privilege and device state are the caller's obligations.
    unsafe {
        core::arch::asm!("out dx, al", in("dx") port, in("al") val, options(nomem, nostack, preserves_flags));
    }
}

/// Read one byte from an I/O port (`in al, dx`).
///
/// # Safety
/// Same requirements as [`write_port`]. Some status registers clear on read.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[inline]
pub unsafe fn read_port(port: u16) -> u8 {
    let v: u8;
    // SAFETY: as for `write_port`.
    unsafe {
        core::arch::asm!("in al, dx", in("dx") port, out("al") v, options(nomem, nostack, preserves_flags));
    }
    v
}

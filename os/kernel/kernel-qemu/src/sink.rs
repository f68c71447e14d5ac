use core::fmt;

/// I/O port captured by QEMU's `-debugcon`.
pub const QEMU_DEBUG_PORT: u16 = 0x402;

/// `fmt::Write` adapter over the debug console port.
///
/// On hardware without the device the writes go to an unused port and are
/// dropped by the chipset.
#[derive(Debug, Default, Copy, Clone)]
pub struct DebugconSink;

impl DebugconSink {
    #[cfg(all(feature = "enabled", any(target_arch = "x86", target_arch = "x86_64")))]
    #[inline]
    pub fn put(self, byte: u8) {
        // SAFETY: the debug console accepts any byte and has no state to corrupt.
        unsafe { kernel_hal::write_port(QEMU_DEBUG_PORT, byte) }
    }

    #[cfg(not(all(feature = "enabled", any(target_arch = "x86", target_arch = "x86_64"))))]
    #[inline]
    pub const fn put(self, _byte: u8) {}
}

impl fmt::Write for DebugconSink {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for b in s.bytes() {
            self.put(b);
        }
        Ok(())
    }
}

//! Descriptor-table registers (GDTR, IDTR).

/// Operand of `lgdt`/`lidt`: table size minus one, then the linear base.
///
/// In 16- and 32-bit code the CPU consumes the low four bytes of `base`,
/// so the same layout serves the loader and the 64-bit kernel.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DescriptorTablePointer {
    /// Size of the table **minus one** in bytes.
    pub limit: u16,
    /// Linear address of the first entry.
    pub base: u64,
}

const _: () = assert!(size_of::<DescriptorTablePointer>() == 10);

impl DescriptorTablePointer {
    /// Pointer for a table of `bytes` bytes at `base`.
    ///
    /// # Panics
    /// If `bytes` is zero or larger than 64 KiB.
    #[must_use]
    pub const fn new(base: u64, bytes: usize) -> Self {
        assert!(bytes > 0 && bytes <= 0x1_0000);
        #[allow(clippy::cast_possible_truncation)]
        Self {
            limit: (bytes - 1) as u16,
            base,
        }
    }
}

/// Load the GDTR (`lgdt`).
///
/// # Safety
/// - `ptr` must describe a valid table whose memory stays readable for as
///   long as any segment register refers to it.
/// - Segment registers are not reloaded; the caller follows up with a far
///   jump or explicit loads where required.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[inline]
pub unsafe fn load_descriptor_table(ptr: &DescriptorTablePointer) {
    // SAFETY: `ptr` is a live reference to a 6/10-byte pseudo-descriptor; the
    // table it names is the caller's obligation.
    unsafe {
        core::arch::asm!("lgdt [{}]", in(reg) core::ptr::from_ref(ptr), options(readonly, nostack, preserves_flags));
    }
}

/// Load the IDTR (`lidt`).
///
/// # Safety
/// Requires CPL0. Every present gate in the table must point at a handler
/// that is valid to run with the current code segment.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[inline]
pub unsafe fn load_interrupt_table(ptr: &DescriptorTablePointer) {
    // SAFETY: as for `load_descriptor_table`.
    unsafe {
        core::arch::asm!("lidt [{}]", in(reg) core::ptr::from_ref(ptr), options(readonly, nostack, preserves_flags));
    }
}

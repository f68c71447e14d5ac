//! Interrupt flag and halt control.

/// Enable maskable interrupts (`sti`).
///
/// # Safety
/// Requires CPL0 and a loaded interrupt table whose present gates point at
/// valid handlers.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[inline]
pub unsafe fn enable_interrupts() {
    // SAFETY: the caller guarantees CPL0 and a valid interrupt table. Not
    // `nomem`: memory written by handlers must be reloaded afterwards.
    unsafe { core::arch::asm!("sti", options(nostack)) }
}

/// Disable maskable interrupts (`cli`).
///
/// Outside CPL0 this raises `#GP` unless IOPL permits it.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[inline]
pub fn disable_interrupts() {
    // SAFETY: clearing IF cannot break memory safety; handlers simply stop
    // running until it is set again.
    unsafe { core::arch::asm!("cli", options(nostack)) }
}

/// Enable interrupts and sleep until the next one (`sti; hlt`).
///
/// `sti` takes effect after the following instruction, so an interrupt that
/// is already pending is taken after `hlt` has started and wakes it. Checking
/// for work with interrupts disabled and then calling this cannot miss a
/// wakeup.
///
/// # Safety
/// Same requirements as [`enable_interrupts`].
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[inline]
pub unsafe fn enable_interrupts_and_halt() {
    // SAFETY: the caller guarantees CPL0 and a valid interrupt table.
    unsafe { core::arch::asm!("sti", "hlt", options(nostack)) }
}

/// Stop this CPU for good: interrupts off, then `hlt` in a loop (an NMI may
/// still wake it).
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub fn halt_forever() -> ! {
    loop {
        // SAFETY: with IF clear `hlt` only waits; nothing returns from here.
        unsafe { core::arch::asm!("cli; hlt", options(nomem, nostack)) }
    }
}

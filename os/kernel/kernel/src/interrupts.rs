//! # x86-64 Interrupt Descriptor Table (IDT)
//!
//! The IDT tells the CPU which routine to run for each vector. This kernel
//! fills the first [`STUB_VECTORS`] gates:
//!
//! ```text
//!   0..=31   CPU exceptions     → logged, then the CPU halts
//!  32..=47   8259 device lines  → IrqTable::dispatch, then EOI
//!  48..=255  not present
//! ```
//!
//! Every present gate points at a small assembly stub (see the kernel binary)
//! that pushes the vector number, saves the general-purpose registers and
//! calls one common Rust dispatcher with an [`InterruptFrame`].
//!
//! ## Acronyms
//! - **IDT** – *Interrupt Descriptor Table* (256 gates describing traps/IRQs)
//! - **ISR** – *Interrupt Service Routine*
//! - **DPL** – *Descriptor Privilege Level* (0=kernel … 3=user)
//! - **IST** – *Interrupt Stack Table* (unused here; no TSS is loaded)
//! - **EOI** – *End Of Interrupt*, the acknowledgement the PIC waits for
//!
//! ## Example
//! ```
//! use kernel::interrupts::{Idt, IdtGateAttr};
//!
//! let mut idt = Idt::new();
//! idt.install(33, 0x0001_2340, 0x18, IdtGateAttr::interrupt_gate());
//! assert_eq!(idt[33].handler(), 0x0001_2340);
//! assert!(!idt[34].is_present());
//! ```

mod dispatch;
mod exceptions;
mod frame;

pub use dispatch::{IrqHandler, IrqTable, LineOutOfRange};
pub use exceptions::{exception_name, pushes_error_code};
pub use frame::{Fault, InterruptFrame, Route};

use bitfield_struct::bitfield;
use core::mem::size_of;
use core::ops::Index;
use kernel_hal::DescriptorTablePointer;

/// Number of gates in the table.
pub const VECTORS: usize = 256;

/// Gates that get a stub: 32 exceptions and 16 device lines.
pub const STUB_VECTORS: usize = 48;

// An IDT entry must be 16 bytes; the table is kept 16-byte aligned.
const _: () = assert!(size_of::<IdtEntry>() == 16);
const _: () = assert!(align_of::<Idt>() == 16);

/// Two bytes of an IDT entry that pack:
///
/// - **low byte**: `IST` (3 bits) + 5 reserved zero bits
/// - **high byte**: `| P | DPL(2) | S(0) | Type(4) |`
#[bitfield(u16)]
#[derive(Eq, PartialEq)]
pub struct IdtGateAttr {
    /// **IST** – Interrupt Stack Table index (0 disables IST switching).
    #[bits(3)]
    pub ist: u8,

    /// Must be zero (hardware-reserved).
    #[bits(5)]
    __zero0: u8,

    /// **Type** – 0xE = *Interrupt gate*, 0xF = *Trap gate*.
    #[bits(4)]
    pub typ: u8,

    /// **S** – System bit (must be `0` for interrupt/trap gates).
    #[bits(1)]
    pub s: bool,

    /// **DPL** – Descriptor Privilege Level (0..=3).
    #[bits(2)]
    pub dpl: u8,

    /// **P** – Present bit. Must be `1` for a valid entry.
    #[bits(1)]
    pub present: bool,
}

impl IdtGateAttr {
    /// Present **Interrupt Gate** (type 0xE): clears `IF` on entry.
    #[inline]
    #[must_use]
    pub const fn interrupt_gate() -> Self {
        Self::new().with_typ(0xE).with_s(false).with_present(true)
    }

    /// Present **Trap Gate** (type 0xF): leaves `IF` unchanged.
    #[inline]
    #[must_use]
    pub const fn trap_gate() -> Self {
        Self::new().with_typ(0xF).with_s(false).with_present(true)
    }
}

/// One **16-byte** x86-64 IDT gate descriptor.
///
/// ```text
/// bytes  0..2   offset[15:0]
///        2..4   selector
///        4..6   IdtGateAttr (IST, type, DPL, P)
///        6..8   offset[31:16]
///        8..12  offset[63:32]
///       12..16  zero
/// ```
#[repr(C)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct IdtEntry {
    offset_lo: u16,
    selector: u16,
    attributes: u16,
    offset_mid: u16,
    offset_hi: u32,
    reserved: u32,
}

impl IdtEntry {
    /// A zeroed, non-present entry.
    pub const MISSING: Self = Self {
        offset_lo: 0,
        selector: 0,
        attributes: 0,
        offset_mid: 0,
        offset_hi: 0,
        reserved: 0,
    };

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn new(handler: u64, selector: u16, attributes: IdtGateAttr) -> Self {
        Self {
            offset_lo: handler as u16,
            selector,
            attributes: attributes.into_bits(),
            offset_mid: (handler >> 16) as u16,
            offset_hi: (handler >> 32) as u32,
            reserved: 0,
        }
    }

    /// Linear address of the service routine.
    #[must_use]
    pub const fn handler(&self) -> u64 {
        (self.offset_hi as u64) << 32 | (self.offset_mid as u64) << 16 | self.offset_lo as u64
    }

    #[must_use]
    pub const fn selector(&self) -> u16 {
        self.selector
    }

    #[must_use]
    pub const fn attributes(&self) -> IdtGateAttr {
        IdtGateAttr::from_bits(self.attributes)
    }

    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.attributes().present()
    }
}

/// A 256-entry **Interrupt Descriptor Table**.
#[repr(C, align(16))]
pub struct Idt {
    entries: [IdtEntry; VECTORS],
}

impl Default for Idt {
    fn default() -> Self {
        Self::new()
    }
}

impl Idt {
    /// A table with every gate **not present**.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [IdtEntry::MISSING; VECTORS],
        }
    }

    /// Write the gate for `vector`.
    pub const fn install(
        &mut self,
        vector: u8,
        handler: u64,
        selector: u16,
        attributes: IdtGateAttr,
    ) {
        self.entries[vector as usize] = IdtEntry::new(handler, selector, attributes);
    }

    /// Install `stubs[i]` as an interrupt gate for vector `i`.
    ///
    /// # Panics
    /// If more than [`VECTORS`] stubs are given.
    pub fn install_stubs(&mut self, stubs: &[u64], selector: u16) {
        assert!(stubs.len() <= VECTORS, "more stubs than vectors");
        for (vector, &stub) in (0..=u8::MAX).zip(stubs) {
            self.install(vector, stub, selector, IdtGateAttr::interrupt_gate());
        }
    }

    /// The IDTR operand describing this table.
    #[must_use]
    pub fn pointer(&self) -> DescriptorTablePointer {
        let base = core::ptr::from_ref(self).addr() as u64;
        DescriptorTablePointer::new(base, size_of::<Self>())
    }

    /// Load this table into the IDTR.
    ///
    /// # Safety
    /// Must run at CPL0. Every present gate must point at a valid service
    /// routine reachable through its selector.
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    pub unsafe fn load(&'static self) {
        unsafe { kernel_hal::load_interrupt_table(&self.pointer()) }
    }
}

impl Index<u8> for Idt {
    type Output = IdtEntry;

    fn index(&self, vector: u8) -> &Self::Output {
        &self.entries[usize::from(vector)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_gate_attribute_byte() {
        assert_eq!(IdtGateAttr::interrupt_gate().into_bits(), 0x8E00);
        assert_eq!(IdtGateAttr::trap_gate().into_bits(), 0x8F00);
        assert_eq!(IdtGateAttr::interrupt_gate().with_dpl(3).into_bits(), 0xEE00);
    }

    #[test]
    fn entry_splits_the_handler_address() {
        let entry = IdtEntry::new(0x1234_5678_9ABC_DEF0, 0x18, IdtGateAttr::interrupt_gate());
        assert_eq!(entry.offset_lo, 0xDEF0);
        assert_eq!(entry.offset_mid, 0x9ABC);
        assert_eq!(entry.offset_hi, 0x1234_5678);
        assert_eq!(entry.handler(), 0x1234_5678_9ABC_DEF0);
        assert_eq!(entry.selector(), 0x18);
        assert!(entry.is_present());
        assert_eq!(entry.reserved, 0);
    }

    #[test]
    fn stubs_fill_the_first_vectors_only() {
        let stubs: Vec<u64> = (0..STUB_VECTORS as u64).map(|v| 0x1_0000 + v * 16).collect();
        let mut idt = Idt::new();
        idt.install_stubs(&stubs, 0x18);

        assert_eq!(idt[0].handler(), 0x1_0000);
        assert_eq!(idt[33].handler(), 0x1_0000 + 33 * 16);
        assert!(idt[47].is_present());
        assert!(!idt[48].is_present());
        assert!(!idt[255].is_present());
        assert_eq!(idt[8].attributes().typ(), 0xE);
    }

    #[test]
    fn pointer_covers_the_whole_table() {
        let idt = Idt::new();
        let pointer = idt.pointer();
        let limit = pointer.limit;
        assert_eq!(limit, 4095);
    }
}

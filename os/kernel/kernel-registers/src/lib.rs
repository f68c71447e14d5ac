//! # Typed x86 Control Registers
//!
//! Bitfield models of the registers touched on the way from real mode into
//! long mode: [`Cr0`] (protection and paging enables), [`Cr3`] (page-table
//! root), [`Cr4`] (physical address extension) and [`Efer`] (long mode
//! enable).
//!
//! The loader computes the values it is going to write with these types and
//! hands the raw bits to its mode-switch trampoline, which performs the
//! actual register writes. The types themselves never touch hardware.

#![cfg_attr(not(any(test, doctest)), no_std)]

pub mod cr0;
pub mod cr3;
pub mod cr4;
pub mod efer;

pub use cr0::Cr0;
pub use cr3::Cr3;
pub use cr4::Cr4;
pub use efer::Efer;

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_memory_addresses::PhysicalAddress;

    const LONG_MODE: [u64; 4] = [
        Cr4::new().with_pae(true).into_bits(),
        Efer::new().with_lme(true).into_bits(),
        Cr0::RESET.with_pe(true).with_pg(true).into_bits(),
        match Cr3::for_pml4(PhysicalAddress::new(0x1_0000)) {
            Some(cr3) => cr3.into_bits(),
            None => 0,
        },
    ];

    #[test]
    fn long_mode_values_are_plain_constants() {
        assert_eq!(LONG_MODE, [0x20, 0x100, 0x8000_0011, 0x1_0000]);
    }
}

//! # Physical and Real-Mode Address Types
//!
//! Strongly typed wrappers for the addresses that show up while the machine
//! climbs from 16-bit real mode into the kernel.
//!
//! ## Overview
//!
//! | Concept | Description |
//! |----------|-------------|
//! | [`PhysicalAddress`] | A raw physical address (RAM, BIOS data area, VGA buffer). |
//! | [`SegmentedAddress`] | A real-mode `segment:offset` pair; physical = `segment * 16 + offset`. |
//! | [`PageSize`] | Marker types ([`Size4K`], [`Size2M`]) for page-granular arithmetic. |
//!
//! ## Relocation
//!
//! Code that runs from a real-mode segment does not know its own physical
//! position at link time. Structures embedded in such an image (for example
//! a descriptor table) are located at runtime with [`relocate`]:
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let code_base = SegmentedAddress::segment_base(0x07E0);
//! let table = relocate(code_base, 0x0140);
//! assert_eq!(table.as_u64(), 0x7E00 + 0x0140);
//! ```
//!
//! ## Design Notes
//!
//! - The types are `#[repr(transparent)]`/`#[repr(C)]` and `Copy`, so they can
//!   cross into firmware packets and descriptor pointers unchanged.
//! - All arithmetic is `const fn`; overflow-prone conversions return `Option`.
//! - The crate does not assume a pointer width, so it builds for the 16-bit
//!   loader as well as for the 64-bit kernel.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

mod page_size;
mod physical_address;
mod segmented_address;

pub use page_size::{PageSize, Size2M, Size4K};
pub use physical_address::PhysicalAddress;
pub use segmented_address::{PARAGRAPH, SegmentedAddress};

/// Locate a structure embedded at `offset` bytes into an image whose first
/// byte lives at `base`.
///
/// The result is a pure function of its inputs; loaders call it with the base
/// of their current code segment instead of trusting a link-time address.
#[inline]
#[must_use]
pub const fn relocate(base: PhysicalAddress, offset: u64) -> PhysicalAddress {
    PhysicalAddress::new(base.as_u64() + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relocate_is_base_plus_offset() {
        for base in [0x0000_u64, 0x7C00, 0x7E00, 0x1_0000, 0x9_F000] {
            for offset in [0_u64, 0x18, 0x140, 0xFFFF] {
                let pa = relocate(PhysicalAddress::new(base), offset);
                assert_eq!(pa.as_u64(), base + offset);
            }
        }
    }

    #[test]
    fn relocate_from_segment_base_matches_segmented_address() {
        for segment in [0x0000_u16, 0x07C0, 0x07E0, 0x1000, 0x8000] {
            let via_relocate = relocate(SegmentedAddress::segment_base(segment), 0x0123);
            let via_pair = SegmentedAddress::new(segment, 0x0123).to_physical();
            assert_eq!(via_relocate, via_pair);
        }
    }

    #[test]
    fn alignment_helpers() {
        let a = PhysicalAddress::new(0x0021_2345);
        assert_eq!(a.align_down::<Size4K>().as_u64(), 0x0021_2000);
        assert_eq!(a.align_down::<Size2M>().as_u64(), 0x0020_0000);
        assert!(!a.is_aligned::<Size4K>());
        assert!(PhysicalAddress::new(0x3000).is_aligned::<Size4K>());
        assert!(PhysicalAddress::new(0x40_0000).is_aligned::<Size2M>());
    }
}

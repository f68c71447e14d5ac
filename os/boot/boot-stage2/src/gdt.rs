//! # Global Descriptor Table
//!
//! Flat segments only; base 0 and a 4 GiB limit everywhere, DPL 0:
//!
//! | Index | Selector | Raw                  | Segment              |
//! |-------|----------|----------------------|----------------------|
//! | 0     | `0x00`   | `0x0000000000000000` | null                 |
//! | 1     | `0x08`   | `0x00CF9A000000FFFF` | 32-bit code          |
//! | 2     | `0x10`   | `0x00CF92000000FFFF` | 32-bit data          |
//! | 3     | `0x18`   | `0x00AF9A000000FFFF` | 64-bit code (L=1)    |
//! | 4     | `0x20`   | `0x00CF92000000FFFF` | 64-bit data          |
//!
//! Entries 3 and 4 exist only on the long-mode path. The table lives inside
//! the Stage-2 image; its linear address is the base of the current code
//! segment plus the storage offset, so the result does not depend on where
//! the image was linked.

use crate::config::TargetMode;
use crate::machine::{CpuControl, PhysicalMemory};
use bitfield_struct::bitfield;
use kernel_hal::DescriptorTablePointer;
use kernel_info::selectors::{LONG_ENTRIES, PROTECTED_ENTRIES};
use kernel_memory_addresses::{PhysicalAddress, SegmentedAddress, relocate};

/// Bytes reserved in the image for the largest table.
pub const STORAGE_BYTES: usize = LONG_ENTRIES * size_of::<u64>();

/// A legacy code/data segment descriptor.
#[bitfield(u64)]
#[derive(Eq, PartialEq)]
pub struct SegmentDescriptor {
    #[bits(16)]
    pub limit_low: u16,
    #[bits(24)]
    pub base_low: u32,
    pub accessed: bool,
    /// Readable for code, writable for data.
    pub read_write: bool,
    /// Conforming for code, expand-down for data.
    pub direction: bool,
    pub executable: bool,
    /// Code or data (as opposed to a system descriptor).
    pub code_or_data: bool,
    #[bits(2)]
    pub dpl: u8,
    pub present: bool,
    #[bits(4)]
    pub limit_high: u8,
    pub available: bool,
    /// 64-bit code segment.
    pub long_mode: bool,
    /// 32-bit default operand size.
    pub default_big: bool,
    /// Limit counts 4 KiB units.
    pub granularity: bool,
    pub base_high: u8,
}

impl SegmentDescriptor {
    pub const NULL: Self = Self::new();

    /// Base 0, limit `0xFFFFF` pages, present, ring 0.
    const fn flat() -> Self {
        Self::new()
            .with_limit_low(0xFFFF)
            .with_limit_high(0xF)
            .with_granularity(true)
            .with_code_or_data(true)
            .with_present(true)
            .with_read_write(true)
    }

    #[must_use]
    pub const fn code32() -> Self {
        Self::flat().with_executable(true).with_default_big(true)
    }

    #[must_use]
    pub const fn data32() -> Self {
        Self::flat().with_default_big(true)
    }

    #[must_use]
    pub const fn code64() -> Self {
        Self::flat().with_executable(true).with_long_mode(true)
    }

    #[must_use]
    pub const fn data64() -> Self {
        Self::data32()
    }
}

/// The descriptor set for one target mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DescriptorTable {
    entries: [SegmentDescriptor; LONG_ENTRIES],
    len: usize,
}

impl DescriptorTable {
    #[must_use]
    pub const fn for_target(target: TargetMode) -> Self {
        let entries = [
            SegmentDescriptor::NULL,
            SegmentDescriptor::code32(),
            SegmentDescriptor::data32(),
            SegmentDescriptor::code64(),
            SegmentDescriptor::data64(),
        ];
        let len = match target {
            TargetMode::Protected => PROTECTED_ENTRIES,
            TargetMode::Long => LONG_ENTRIES,
        };
        Self { entries, len }
    }

    #[must_use]
    pub fn entries(&self) -> &[SegmentDescriptor] {
        &self.entries[..self.len]
    }

    #[must_use]
    pub const fn byte_len(&self) -> usize {
        self.len * size_of::<u64>()
    }

    /// Serialize into `out`, which must hold [`byte_len`](Self::byte_len) bytes.
    pub fn write_to(&self, out: &mut [u8]) {
        for (entry, chunk) in self.entries().iter().zip(out.chunks_exact_mut(8)) {
            chunk.copy_from_slice(&entry.into_bits().to_le_bytes());
        }
    }

    /// Write the table into its storage, relocated from the current code
    /// segment, and load the GDTR.
    pub fn install<M: CpuControl + PhysicalMemory>(&self, machine: &mut M) -> DescriptorTablePointer {
        let base = table_base(machine.code_segment(), machine.descriptor_table_offset());
        self.write_to(machine.region(base, self.byte_len()));
        let pointer = DescriptorTablePointer::new(base.as_u64(), self.byte_len());
        machine.load_descriptor_table(&pointer);
        pointer
    }
}

/// Linear address of the table storage at `offset` in code segment `cs`.
#[must_use]
pub const fn table_base(cs: u16, offset: u16) -> PhysicalAddress {
    relocate(SegmentedAddress::segment_base(cs), offset as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_descriptors() {
        assert_eq!(SegmentDescriptor::code32().into_bits(), 0x00CF_9A00_0000_FFFF);
        assert_eq!(SegmentDescriptor::data32().into_bits(), 0x00CF_9200_0000_FFFF);
        assert_eq!(SegmentDescriptor::code64().into_bits(), 0x00AF_9A00_0000_FFFF);
        assert_eq!(SegmentDescriptor::data64().into_bits(), 0x00CF_9200_0000_FFFF);
        assert_eq!(SegmentDescriptor::NULL.into_bits(), 0);
    }

    #[test]
    fn entry_count_per_target() {
        assert_eq!(DescriptorTable::for_target(TargetMode::Protected).entries().len(), 3);
        assert_eq!(DescriptorTable::for_target(TargetMode::Long).entries().len(), 5);
        assert_eq!(DescriptorTable::for_target(TargetMode::Long).byte_len(), STORAGE_BYTES);
    }

    #[test]
    fn serialization_is_deterministic() {
        let table = DescriptorTable::for_target(TargetMode::Long);
        let mut a = [0xEEu8; STORAGE_BYTES];
        let mut b = [0x11u8; STORAGE_BYTES];
        table.write_to(&mut a);
        table.write_to(&mut b);
        assert_eq!(a, b);
        assert_eq!(&a[8..16], &0x00CF_9A00_0000_FFFFu64.to_le_bytes());
    }

    #[test]
    fn base_follows_code_segment() {
        assert_eq!(table_base(0x0000, 0x7F40).as_u64(), 0x7F40);
        assert_eq!(table_base(0x07E0, 0x0140).as_u64(), 0x7F40);
        assert_eq!(table_base(0x2000, 0x0010).as_u64(), 0x2_0010);
    }
}

use bitfield_struct::bitfield;
use kernel_memory_addresses::{PhysicalAddress, Size4K};

/// CR3: physical base of the top-level page table (PCID disabled).
#[bitfield(u64)]
#[derive(Eq, PartialEq)]
pub struct Cr3 {
    #[bits(3)]
    __reserved1: u8,

    /// Bit 3 (PWT): write-through for the PML4 walk.
    pub pwt: bool,

    /// Bit 4 (PCD): cache disable for the PML4 walk.
    pub pcd: bool,

    #[bits(7)]
    __reserved2: u8,

    /// Bits 12–51: PML4 physical base >> 12.
    #[bits(40)]
    pml4_base_4k: u64,

    #[bits(12)]
    __reserved3: u16,
}

impl Cr3 {
    /// A write-back `Cr3` pointing at the PML4 at `pml4`.
    ///
    /// Returns `None` if `pml4` is not 4 KiB aligned.
    #[must_use]
    pub const fn for_pml4(pml4: PhysicalAddress) -> Option<Self> {
        if !pml4.is_aligned::<Size4K>() {
            return None;
        }
        Some(Self::new().with_pml4_base_4k(pml4.as_u64() >> 12))
    }

    /// Physical address of the PML4 this value points at.
    #[must_use]
    pub const fn pml4(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.pml4_base_4k() << 12)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_aligned_root() {
        let cr3 = Cr3::for_pml4(PhysicalAddress::new(0x1000)).unwrap();
        assert_eq!(cr3.into_bits(), 0x1000);
        assert_eq!(cr3.pml4().as_u64(), 0x1000);
    }

    #[test]
    fn rejects_unaligned_root() {
        assert!(Cr3::for_pml4(PhysicalAddress::new(0x1008)).is_none());
    }
}

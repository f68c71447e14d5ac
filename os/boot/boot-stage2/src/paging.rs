//! # Boot Identity Map
//!
//! Three consecutive 4 KiB frames, one populated branch per level:
//!
//! ```text
//! base + 0x0000  PML4[0] ─▶ PDPT
//! base + 0x1000  PDPT[0] ─▶ PD
//! base + 0x2000  PD[i]    = i × 2 MiB, present | writable | large
//! ```
//!
//! Virtual equals physical for the first `identity_map_bytes`. The tables
//! are written once and never touched again by the loader.

use crate::error::BootError;
use bitfield_struct::bitfield;
use kernel_memory_addresses::{PageSize, PhysicalAddress, Size2M, Size4K};

const TABLE_BYTES: usize = Size4K::SIZE as usize;
const ENTRIES_PER_TABLE: usize = TABLE_BYTES / size_of::<u64>();

/// Bytes needed for PML4, PDPT and PD.
pub const REGION_BYTES: usize = 3 * TABLE_BYTES;

/// A page-table entry at any level (the bits this loader uses).
#[bitfield(u64)]
#[derive(Eq, PartialEq)]
pub struct PageEntry {
    pub present: bool,
    pub writable: bool,
    pub user: bool,
    pub write_through: bool,
    pub cache_disabled: bool,
    pub accessed: bool,
    pub dirty: bool,
    /// PS: maps a 2 MiB page in a PD entry instead of pointing at a PT.
    pub large_page: bool,
    pub global: bool,
    #[bits(3)]
    pub os_available: u8,
    /// Physical frame number (bits 51:12).
    #[bits(40)]
    frame: u64,
    #[bits(11)]
    __reserved0: u16,
    pub no_execute: bool,
}

impl PageEntry {
    /// A present, writable entry pointing at the next-level table at `table`.
    #[must_use]
    pub const fn table(table: PhysicalAddress) -> Self {
        Self::new()
            .with_present(true)
            .with_writable(true)
            .with_frame(table.as_u64() >> Size4K::SHIFT)
    }

    /// A present, writable 2 MiB leaf mapping `page`.
    #[must_use]
    pub const fn large(page: PhysicalAddress) -> Self {
        Self::new()
            .with_present(true)
            .with_writable(true)
            .with_large_page(true)
            .with_frame(page.as_u64() >> Size4K::SHIFT)
    }

    #[must_use]
    pub const fn address(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.frame() << Size4K::SHIFT)
    }
}

/// Build the identity map into `region`, which lives at physical `base`.
/// Returns the PML4 address for CR3.
///
/// # Errors
/// [`BootError::PageTableRegion`] if `base` is not 4 KiB aligned or `region`
/// is too small; [`BootError::IdentityMapSize`] if `bytes` is zero, not a
/// multiple of 2 MiB, or more than one page directory can map.
pub fn build_identity_map(
    region: &mut [u8],
    base: PhysicalAddress,
    bytes: u64,
) -> Result<PhysicalAddress, BootError> {
    if !base.is_aligned::<Size4K>() || region.len() < REGION_BYTES {
        return Err(BootError::PageTableRegion(base.as_u64()));
    }
    let pages = bytes / Size2M::SIZE;
    if bytes == 0 || !bytes.is_multiple_of(Size2M::SIZE) || pages > ENTRIES_PER_TABLE as u64 {
        return Err(BootError::IdentityMapSize(bytes));
    }

    let region = &mut region[..REGION_BYTES];
    region.fill(0);
    let (pml4, rest) = region.split_at_mut(TABLE_BYTES);
    let (pdpt, pd) = rest.split_at_mut(TABLE_BYTES);

    let pdpt_base = base + Size4K::SIZE;
    let pd_base = pdpt_base + Size4K::SIZE;

    store(pml4, 0, PageEntry::table(pdpt_base));
    store(pdpt, 0, PageEntry::table(pd_base));
    for index in 0..pages {
        let page = PhysicalAddress::new(index * Size2M::SIZE);
        #[allow(clippy::cast_possible_truncation)]
        store(pd, index as usize, PageEntry::large(page));
    }

    Ok(base)
}

fn store(table: &mut [u8], index: usize, entry: PageEntry) {
    let at = index * size_of::<u64>();
    table[at..at + size_of::<u64>()].copy_from_slice(&entry.into_bits().to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(region: &[u8], table: usize, index: usize) -> PageEntry {
        let at = table * TABLE_BYTES + index * 8;
        PageEntry::from_bits(u64::from_le_bytes(region[at..at + 8].try_into().unwrap()))
    }

    #[test]
    fn eight_mib_identity_map() {
        let mut region = vec![0xAAu8; REGION_BYTES];
        let root = build_identity_map(&mut region, PhysicalAddress::new(0x1000), 8 << 20).unwrap();
        assert_eq!(root.as_u64(), 0x1000);

        assert_eq!(entry(&region, 0, 0).into_bits(), 0x2003);
        assert_eq!(entry(&region, 1, 0).into_bits(), 0x3003);
        for i in 0..4 {
            let pde = entry(&region, 2, i);
            assert!(pde.present() && pde.writable() && pde.large_page());
            assert_eq!(pde.address().as_u64(), (i as u64) << 21);
        }
        assert_eq!(entry(&region, 2, 3).into_bits(), 0x60_0083);
        assert_eq!(entry(&region, 2, 4).into_bits(), 0);
        assert_eq!(entry(&region, 0, 1).into_bits(), 0);
    }

    #[test]
    fn rejects_bad_geometry() {
        let mut region = vec![0u8; REGION_BYTES];
        assert!(matches!(
            build_identity_map(&mut region, PhysicalAddress::new(0x1800), 8 << 20),
            Err(BootError::PageTableRegion(0x1800))
        ));
        assert!(matches!(
            build_identity_map(&mut region, PhysicalAddress::new(0x1000), 3 << 20),
            Err(BootError::IdentityMapSize(_))
        ));
        let mut small = vec![0u8; TABLE_BYTES];
        assert!(build_identity_map(&mut small, PhysicalAddress::new(0x1000), 8 << 20).is_err());
    }
}

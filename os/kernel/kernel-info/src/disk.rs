//! # Disk Layout
//!
//! The boot disk is a raw image of 512-byte sectors:
//!
//! | LBA | Content |
//! |-----|---------|
//! | `0` | Stage-1 boot sector |
//! | `STAGE2_LBA ..` | Stage-2, `STAGE2_SECTORS` sectors |
//! | `KERNEL_LBA ..` | kernel image, `KERNEL_SECTORS` sectors |

/// Bytes per sector.
pub const SECTOR_SIZE: usize = 512;

/// The boot sector.
pub const STAGE1_LBA: u32 = 0;

/// First sector of Stage-2.
pub const STAGE2_LBA: u32 = 1;

/// Stage-2 size in sectors. Stage-1 loads it with a single firmware call.
pub const STAGE2_SECTORS: u16 = 64;

/// First sector of the kernel image.
pub const KERNEL_LBA: u32 = STAGE2_LBA + STAGE2_SECTORS as u32;

/// Kernel image size in sectors (256 KiB).
pub const KERNEL_SECTORS: u16 = 512;

/// Largest transfer handed to the firmware in one extended read.
///
/// 64 sectors are 32 KiB, which keeps every chunk inside one 64 KiB DMA
/// window when chunks start on a segment boundary.
pub const MAX_SECTORS_PER_READ: u16 = 64;

/// Boot-sector signature at byte offset 510.
pub const BOOT_SIGNATURE: [u8; 2] = [0x55, 0xAA];

const _: () = {
    assert!(STAGE2_SECTORS <= MAX_SECTORS_PER_READ);
    assert!(KERNEL_LBA > STAGE2_LBA);
    assert!(MAX_SECTORS_PER_READ as usize * SECTOR_SIZE <= 0x8000);
};

//! # Physical Memory Layout
//!
//! Everything below 1 MiB is placed by hand; see the crate documentation for
//! a map. Addresses are physical; after the mode switch they are also the
//! linear addresses, since the loader identity maps the low memory.

use crate::disk::{KERNEL_SECTORS, SECTOR_SIZE, STAGE2_SECTORS};

/// Where Stage-1 stores the BIOS boot drive number (`DL` at entry).
pub const BOOT_DRIVE_ADDR: u64 = 0x0500;

/// Base of the three 4 KiB page-table frames (PML4, PDPT, PD).
pub const PAGE_TABLES_ADDR: u64 = 0x1000;

/// Size of the page-table region.
pub const PAGE_TABLES_SIZE: usize = 3 * 4096;

/// Where Stage-2 builds the Handoff Descriptor Block.
pub const HANDOFF_ADDR: u64 = 0x4000;

/// Bytes reserved for the Handoff Descriptor Block.
pub const HANDOFF_CAPACITY: usize = 4096;

/// Where the BIOS loads the boot sector.
pub const STAGE1_LOAD_ADDR: u64 = 0x7C00;

/// Real-mode stack top shared by both loader stages (grows down).
pub const REAL_MODE_STACK_TOP: u64 = STAGE1_LOAD_ADDR;

/// Where Stage-1 loads Stage-2.
pub const STAGE2_LOAD_ADDR: u64 = 0x7E00;

/// Upper bound of the Stage-2 image in memory.
pub const STAGE2_END: u64 = STAGE2_LOAD_ADDR + STAGE2_SECTORS as u64 * SECTOR_SIZE as u64;

/// Real-mode segment the kernel image is read into.
pub const KERNEL_LOAD_SEGMENT: u16 = 0x1000;

/// Physical load address and entry point of the kernel.
pub const KERNEL_LOAD_ADDR: u64 = (KERNEL_LOAD_SEGMENT as u64) << 4;

/// Upper bound of the kernel image in memory.
pub const KERNEL_END: u64 = KERNEL_LOAD_ADDR + KERNEL_SECTORS as u64 * SECTOR_SIZE as u64;

/// Size of the kernel stack.
pub const KERNEL_STACK_SIZE: usize = 32 * 1024;

/// Initial kernel stack pointer, below the extended BIOS data area.
pub const KERNEL_STACK_TOP: u64 = 0x9_F000;

/// The VGA text-mode buffer.
pub const VGA_TEXT_BUFFER: u64 = 0xB_8000;

/// Text-mode geometry.
pub const TEXT_COLUMNS: u16 = 80;
pub const TEXT_ROWS: u16 = 25;

/// Bytes identity mapped with 2 MiB pages on the long-mode path.
pub const IDENTITY_MAP_BYTES: u64 = 8 * 1024 * 1024;

const _: () = {
    assert!(BOOT_DRIVE_ADDR < PAGE_TABLES_ADDR);
    assert!(PAGE_TABLES_ADDR.is_multiple_of(4096));
    assert!(PAGE_TABLES_ADDR + PAGE_TABLES_SIZE as u64 <= HANDOFF_ADDR);
    assert!(HANDOFF_ADDR + HANDOFF_CAPACITY as u64 <= STAGE1_LOAD_ADDR);
    assert!(STAGE2_END <= KERNEL_LOAD_ADDR);
    assert!(KERNEL_END <= KERNEL_STACK_TOP - KERNEL_STACK_SIZE as u64);
    assert!(KERNEL_STACK_TOP <= 0x9_FC00);
    assert!(KERNEL_STACK_SIZE.is_multiple_of(4096));
    assert!(IDENTITY_MAP_BYTES.is_multiple_of(2 * 1024 * 1024));
    // one page directory covers 1 GiB
    assert!(IDENTITY_MAP_BYTES <= 512 * 2 * 1024 * 1024);
    assert!(VGA_TEXT_BUFFER < IDENTITY_MAP_BYTES);
    // a real-mode segment holds all of Stage-2
    assert!(STAGE2_END - STAGE2_LOAD_ADDR <= 0x1_0000);
};

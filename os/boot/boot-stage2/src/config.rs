//! Compile-time configuration of the loader.

use kernel_info::disk::{KERNEL_LBA, KERNEL_SECTORS, MAX_SECTORS_PER_READ};
use kernel_info::handoff::ConsoleInfo;
use kernel_info::memory::{
    HANDOFF_ADDR, HANDOFF_CAPACITY, IDENTITY_MAP_BYTES, KERNEL_LOAD_SEGMENT, KERNEL_STACK_TOP,
    PAGE_TABLES_ADDR, TEXT_COLUMNS, TEXT_ROWS, VGA_TEXT_BUFFER,
};
use kernel_memory_addresses::{PhysicalAddress, SegmentedAddress};

/// CPU mode the kernel is entered in.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TargetMode {
    /// 32-bit protected mode, flat segments, paging off.
    Protected,
    /// 64-bit long mode over the boot identity map.
    Long,
}

impl TargetMode {
    #[must_use]
    pub const fn is_long(self) -> bool {
        matches!(self, Self::Long)
    }
}

/// Where the kernel comes from, where it goes, and how it is entered.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Stage2Config {
    pub target: TargetMode,
    /// First kernel sector on the boot drive.
    pub kernel_lba: u32,
    pub kernel_sectors: u16,
    /// Real-mode destination of the first kernel sector.
    pub kernel_load: SegmentedAddress,
    /// Largest single firmware read.
    pub max_sectors_per_read: u16,
    pub page_tables: PhysicalAddress,
    /// Bytes identity mapped with 2 MiB pages.
    pub identity_map_bytes: u64,
    pub handoff: PhysicalAddress,
    pub handoff_capacity: usize,
    pub kernel_stack_top: PhysicalAddress,
    pub console: ConsoleInfo,
}

impl Stage2Config {
    /// The layout from [`kernel_info`], targeting long mode when the
    /// `long-mode` feature is on.
    pub const DEFAULT: Self = Self {
        target: if cfg!(feature = "long-mode") {
            TargetMode::Long
        } else {
            TargetMode::Protected
        },
        kernel_lba: KERNEL_LBA,
        kernel_sectors: KERNEL_SECTORS,
        kernel_load: SegmentedAddress::new(KERNEL_LOAD_SEGMENT, 0),
        max_sectors_per_read: MAX_SECTORS_PER_READ,
        page_tables: PhysicalAddress::new(PAGE_TABLES_ADDR),
        identity_map_bytes: IDENTITY_MAP_BYTES,
        handoff: PhysicalAddress::new(HANDOFF_ADDR),
        handoff_capacity: HANDOFF_CAPACITY,
        kernel_stack_top: PhysicalAddress::new(KERNEL_STACK_TOP),
        console: ConsoleInfo {
            columns: TEXT_COLUMNS,
            rows: TEXT_ROWS,
            #[allow(clippy::cast_possible_truncation)]
            buffer: VGA_TEXT_BUFFER as u32,
        },
    };

    /// Same layout, different target mode.
    #[must_use]
    pub const fn with_target(mut self, target: TargetMode) -> Self {
        self.target = target;
        self
    }
}

impl Default for Stage2Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}

use kernel_info::handoff::HandoffError;

/// A failed `INT 13h` extended read.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum DiskError {
    /// Carry set; the firmware status from `AH`.
    #[error("firmware status {0:#04x}")]
    Firmware(u8),
    /// The destination segment would wrap past `0xFFFF` before the read
    /// completed.
    #[error("destination segment wraps before the read completes")]
    SegmentWrap,
}

/// Why Stage-2 stopped. Every variant is fatal.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum BootError {
    #[error("disk read of {sectors} sectors at LBA {lba} failed: {source}")]
    Disk {
        lba: u64,
        sectors: u16,
        #[source]
        source: DiskError,
    },
    #[error("kernel image of {sectors} sectors does not fit below 640 KiB at {load:#x}")]
    ImageTooLarge { load: u64, sectors: u16 },
    #[error("page tables need a 4 KiB aligned, 12 KiB region (got {0:#x})")]
    PageTableRegion(u64),
    #[error("long mode needs a page-table root")]
    MissingPageRoot,
    #[error("page-table root {0:#x} is not 4 KiB aligned")]
    PageRootMisaligned(u64),
    #[error("identity map of {0:#x} bytes is not a whole number of 2 MiB pages within 1 GiB")]
    IdentityMapSize(u64),
    #[error("handoff block: {0}")]
    Handoff(#[from] HandoffError),
    #[error("{stage} reached out of order")]
    OutOfOrder { stage: &'static str },
}

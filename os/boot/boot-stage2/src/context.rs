use crate::a20::A20Outcome;
use crate::disk::LoadedImage;
use kernel_hal::DescriptorTablePointer;
use kernel_memory_addresses::PhysicalAddress;

/// Everything Stage-2 learns on its way, filled in stage by stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BootContext {
    /// BIOS drive number Stage-1 received in `DL`.
    pub boot_drive: u8,
    pub a20: Option<A20Outcome>,
    pub kernel: Option<LoadedImage>,
    pub descriptor_table: Option<DescriptorTablePointer>,
    /// PML4 of the identity map (long mode only).
    pub page_root: Option<PhysicalAddress>,
    /// Sealed length of the handoff block.
    pub handoff_len: Option<usize>,
}

impl BootContext {
    #[must_use]
    pub const fn new(boot_drive: u8) -> Self {
        Self {
            boot_drive,
            a20: None,
            kernel: None,
            descriptor_table: None,
            page_root: None,
            handoff_len: None,
        }
    }
}

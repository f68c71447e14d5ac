//! Assembling the Handoff Descriptor Block from what the earlier stages
//! found out.

use crate::config::{Stage2Config, TargetMode};
use crate::context::BootContext;
use crate::firmware::{Firmware, collect_memory_map};
use kernel_info::handoff::{
    A20Method, ArchFlags, ArchitectureInfo, BootDeviceInfo, CpuMode, FirmwareInfo, FirmwareKind,
    HandoffError, HandoffWriter, MemoryClass, MemoryRegion,
};
use log::{debug, warn};

/// Regions kept from the E820 enumeration.
pub const MAX_MEMORY_REGIONS: usize = 32;

/// The Architecture entry for `target` given what the context recorded.
#[must_use]
pub fn architecture(target: TargetMode, context: &BootContext) -> ArchitectureInfo {
    let a20_verified = context.a20.is_some_and(|a20| a20.verified);
    match (target, context.page_root) {
        (TargetMode::Long, Some(root)) => ArchitectureInfo {
            mode: CpuMode::Long,
            flags: ArchFlags::new()
                .with_a20_verified(a20_verified)
                .with_pae(true)
                .with_paging(true),
            page_root: root.as_u64(),
        },
        _ => ArchitectureInfo {
            mode: CpuMode::Protected,
            flags: ArchFlags::new().with_a20_verified(a20_verified),
            page_root: 0,
        },
    }
}

/// Write all five entries into `buf` and seal the block; returns its length.
///
/// # Errors
/// [`HandoffError::Overflow`] when `buf` is too small for the block.
pub fn write_block(
    buf: &mut [u8],
    config: &Stage2Config,
    context: &BootContext,
    firmware: &mut impl Firmware,
) -> Result<usize, HandoffError> {
    let mut regions = [MemoryRegion {
        base: 0,
        length: 0,
        class: MemoryClass::RESERVED,
        attributes: 0,
    }; MAX_MEMORY_REGIONS];
    let count = collect_memory_map(firmware, &mut regions);
    if count == 0 {
        warn!("firmware returned no memory map");
    }
    for region in &regions[..count] {
        debug!(
            "E820 {:#012x}..{:#012x} {}",
            region.base,
            region.end(),
            region.class.name()
        );
    }

    let (lba, sectors) = context
        .kernel
        .map_or((config.kernel_lba, 0), |image| (image.lba, image.sectors));

    let mut writer = HandoffWriter::begin(buf)?;
    writer.append_entry(&architecture(config.target, context))?;
    writer.append_entry(&FirmwareInfo {
        kind: FirmwareKind::LegacyBios,
        a20: context.a20.map_or(A20Method::Unavailable, |a20| a20.method),
    })?;
    writer.append_memory_map(&regions[..count])?;
    writer.append_entry(&BootDeviceInfo {
        drive: context.boot_drive,
        start_sector: lba,
        sector_count: u32::from(sectors),
    })?;
    writer.append_entry(&config.console)?;
    Ok(writer.finalize())
}

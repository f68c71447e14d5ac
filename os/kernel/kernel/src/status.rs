//! Machine facts for the `status` command, read once from the HDB at entry.

use core::fmt;
use kernel_info::handoff::{
    ArchitectureInfo, BootDeviceInfo, ConsoleInfo, FirmwareInfo, HandoffBlock, HandoffError,
    MemoryClass,
};
use kernel_memory_addresses::PhysicalAddress;

/// What the loader told the kernel.
///
/// Entries the block does not carry stay `None` and print as `unknown`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct StatusReport {
    pub handoff: PhysicalAddress,
    pub handoff_len: usize,
    pub entries: u16,
    pub architecture: Option<ArchitectureInfo>,
    pub firmware: Option<FirmwareInfo>,
    pub boot_device: Option<BootDeviceInfo>,
    pub console: Option<ConsoleInfo>,
    pub memory_regions: usize,
    pub usable_bytes: u64,
}

impl StatusReport {
    /// Decode the entries the shell reports on.
    ///
    /// # Errors
    /// Any entry that is present but malformed.
    pub fn from_handoff(
        handoff: PhysicalAddress,
        block: &HandoffBlock<'_>,
    ) -> Result<Self, HandoffError> {
        let (mut memory_regions, mut usable_bytes) = (0, 0u64);
        if let Some(regions) = block.memory_map()? {
            for region in regions {
                memory_regions += 1;
                if region.class == MemoryClass::USABLE {
                    usable_bytes = usable_bytes.saturating_add(region.length);
                }
            }
        }

        Ok(Self {
            handoff,
            handoff_len: block.total_length(),
            entries: block.entry_count(),
            architecture: block.find::<ArchitectureInfo>().transpose()?,
            firmware: block.find::<FirmwareInfo>().transpose()?,
            boot_device: block.find::<BootDeviceInfo>().transpose()?,
            console: block.find::<ConsoleInfo>().transpose()?,
            memory_regions,
            usable_bytes,
        })
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Handoff block: {} ({} bytes, {} entries)",
            self.handoff, self.handoff_len, self.entries
        )?;

        match self.architecture {
            Some(arch) => writeln!(
                f,
                "CPU mode:      {}, paging {}",
                arch.mode,
                if arch.flags.paging() { "on" } else { "off" }
            )?,
            None => writeln!(f, "CPU mode:      unknown")?,
        }

        match (self.firmware, self.architecture) {
            (Some(firmware), Some(arch)) => writeln!(
                f,
                "A20 gate:      {} ({})",
                firmware.a20,
                if arch.flags.a20_verified() { "verified" } else { "not verified" }
            )?,
            (Some(firmware), None) => writeln!(f, "A20 gate:      {}", firmware.a20)?,
            (None, _) => writeln!(f, "A20 gate:      unknown")?,
        }

        match self.boot_device {
            Some(device) => writeln!(
                f,
                "Boot drive:    {:#04x}, kernel at LBA {} ({} sectors)",
                device.drive, device.start_sector, device.sector_count
            )?,
            None => writeln!(f, "Boot drive:    unknown")?,
        }

        writeln!(
            f,
            "Memory:        {} regions, {} KiB usable",
            self.memory_regions,
            self.usable_bytes / 1024
        )?;

        match self.console {
            Some(console) => writeln!(
                f,
                "Console:       {}x{} at {}",
                console.columns,
                console.rows,
                PhysicalAddress::new(u64::from(console.buffer))
            ),
            None => writeln!(f, "Console:       unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_info::handoff::{
        A20Method, ArchFlags, CpuMode, FirmwareKind, HandoffWriter, MemoryRegion,
    };

    fn block(buf: &mut [u8]) -> usize {
        let mut writer = HandoffWriter::begin(buf).unwrap();
        writer
            .append_entry(&ArchitectureInfo {
                mode: CpuMode::Long,
                flags: ArchFlags::new().with_pae(true).with_paging(true).with_a20_verified(true),
                page_root: 0x1000,
            })
            .unwrap();
        writer
            .append_entry(&FirmwareInfo {
                kind: FirmwareKind::LegacyBios,
                a20: A20Method::Firmware,
            })
            .unwrap();
        writer
            .append_memory_map(&[
                MemoryRegion {
                    base: 0,
                    length: 0x9_FC00,
                    class: MemoryClass::USABLE,
                    attributes: 1,
                },
                MemoryRegion {
                    base: 0xF_0000,
                    length: 0x1_0000,
                    class: MemoryClass::RESERVED,
                    attributes: 1,
                },
                MemoryRegion {
                    base: 0x10_0000,
                    length: 0x7F0_0000,
                    class: MemoryClass::USABLE,
                    attributes: 1,
                },
            ])
            .unwrap();
        writer
            .append_entry(&BootDeviceInfo {
                drive: 0x80,
                start_sector: 65,
                sector_count: 512,
            })
            .unwrap();
        writer
            .append_entry(&ConsoleInfo {
                columns: 80,
                rows: 25,
                buffer: 0xB_8000,
            })
            .unwrap();
        writer.finalize()
    }

    #[test]
    fn report_from_a_full_block() {
        let mut buf = [0u8; 512];
        let len = block(&mut buf);
        let parsed = HandoffBlock::parse(&buf[..len]).unwrap();

        let report = StatusReport::from_handoff(PhysicalAddress::new(0x4000), &parsed).unwrap();

        assert_eq!(report.entries, 5);
        assert_eq!(report.memory_regions, 3);
        assert_eq!(report.usable_bytes, 0x9_FC00 + 0x7F0_0000);
        assert_eq!(
            report.to_string(),
            "Handoff block: 0x00004000 (168 bytes, 5 entries)\n\
             CPU mode:      long (64-bit), paging on\n\
             A20 gate:      firmware (verified)\n\
             Boot drive:    0x80, kernel at LBA 65 (512 sectors)\n\
             Memory:        3 regions, 130687 KiB usable\n\
             Console:       80x25 at 0x000B8000\n"
        );
    }

    #[test]
    fn missing_entries_print_unknown() {
        let mut buf = [0u8; 64];
        let mut writer = HandoffWriter::begin(&mut buf).unwrap();
        let len = writer.finalize();
        let parsed = HandoffBlock::parse(&buf[..len]).unwrap();

        let report = StatusReport::from_handoff(PhysicalAddress::new(0x4000), &parsed).unwrap();

        let text = report.to_string();
        assert!(text.contains("CPU mode:      unknown"));
        assert!(text.contains("Memory:        0 regions, 0 KiB usable"));
        assert!(text.contains("Console:       unknown"));
    }
}

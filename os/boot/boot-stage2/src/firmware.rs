//! # BIOS Services
//!
//! The four firmware calls the loader relies on, as a trait:
//!
//! | Call                | Method                              |
//! |---------------------|-------------------------------------|
//! | `INT 13h, AH=42h`   | [`Firmware::read_sectors`]          |
//! | `INT 10h, AH=0Eh`   | [`Firmware::print_byte`]            |
//! | `INT 15h, EAX=E820h`| [`Firmware::memory_map_entry`]      |
//! | `INT 15h, AX=2401h` | [`Firmware::enable_a20`]            |

use crate::error::DiskError;
use core::fmt;
use kernel_info::handoff::MemoryRegion;
use kernel_memory_addresses::SegmentedAddress;

/// One extended read: the fields of a disk address packet plus the drive.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DiskRead {
    pub drive: u8,
    pub lba: u64,
    pub sectors: u16,
    pub buffer: SegmentedAddress,
}

/// A firmware service reported failure (carry set or `AH` nonzero).
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("firmware call failed with status {status:#04x}")]
pub struct FirmwareError {
    pub status: u8,
}

/// One step of the E820 enumeration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MemoryMapStep {
    pub region: MemoryRegion,
    /// Continuation value for the next call; `0` when this was the last one.
    pub continuation: u32,
}

pub trait Firmware {
    /// Read `request.sectors` sectors into `request.buffer`.
    ///
    /// # Errors
    /// The firmware status when the read fails.
    fn read_sectors(&mut self, request: &DiskRead) -> Result<(), DiskError>;

    /// Teletype output of one byte on the active page.
    fn print_byte(&mut self, byte: u8);

    /// Fetch the region for `continuation` (`0` starts the enumeration).
    /// `None` when the firmware has no map or rejects the call.
    fn memory_map_entry(&mut self, continuation: u32) -> Option<MemoryMapStep>;

    /// Ask the firmware to open the A20 gate.
    ///
    /// # Errors
    /// When the service is missing or refuses.
    fn enable_a20(&mut self) -> Result<(), FirmwareError>;
}

/// Fill `regions` from the E820 enumeration; returns how many were stored.
///
/// Stops early when `regions` is full. Zero-length regions are skipped.
pub fn collect_memory_map(firmware: &mut impl Firmware, regions: &mut [MemoryRegion]) -> usize {
    let mut count = 0;
    let mut continuation = 0;
    while count < regions.len() {
        let Some(step) = firmware.memory_map_entry(continuation) else {
            break;
        };
        if step.region.length != 0 {
            regions[count] = step.region;
            count += 1;
        }
        if step.continuation == 0 {
            break;
        }
        continuation = step.continuation;
    }
    count
}

/// [`fmt::Write`] over the firmware teletype, translating `\n` to `\r\n`.
pub struct Teletype<'a, F: Firmware>(pub &'a mut F);

impl<F: Firmware> fmt::Write for Teletype<'_, F> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.0.print_byte(b'\r');
            }
            self.0.print_byte(byte);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;
    use kernel_info::handoff::MemoryClass;

    #[derive(Default)]
    struct Screen {
        out: Vec<u8>,
        map: Vec<MemoryRegion>,
    }

    impl Firmware for Screen {
        fn read_sectors(&mut self, _: &DiskRead) -> Result<(), DiskError> {
            Ok(())
        }

        fn print_byte(&mut self, byte: u8) {
            self.out.push(byte);
        }

        fn memory_map_entry(&mut self, continuation: u32) -> Option<MemoryMapStep> {
            let index = continuation as usize;
            let region = *self.map.get(index)?;
            let next = if index + 1 == self.map.len() { 0 } else { continuation + 1 };
            Some(MemoryMapStep {
                region,
                continuation: next,
            })
        }

        fn enable_a20(&mut self) -> Result<(), FirmwareError> {
            Ok(())
        }
    }

    fn region(base: u64, length: u64) -> MemoryRegion {
        MemoryRegion {
            base,
            length,
            class: MemoryClass::USABLE,
            attributes: 1,
        }
    }

    #[test]
    fn teletype_expands_newlines() {
        let mut screen = Screen::default();
        write!(Teletype(&mut screen), "a\nb").unwrap();
        assert_eq!(screen.out, b"a\r\nb");
    }

    #[test]
    fn memory_map_skips_empty_regions() {
        let mut screen = Screen {
            map: vec![region(0, 0x9_FC00), region(0x9_FC00, 0), region(0x10_0000, 0x7F0_0000)],
            ..Screen::default()
        };
        let mut regions = [region(0, 0); 8];
        let n = collect_memory_map(&mut screen, &mut regions);
        assert_eq!(n, 2);
        assert_eq!(regions[1].base, 0x10_0000);
    }

    #[test]
    fn memory_map_stops_when_full() {
        let mut screen = Screen {
            map: (0..10).map(|i| region(i * 0x1000, 0x1000)).collect(),
            ..Screen::default()
        };
        let mut regions = [region(0, 0); 4];
        assert_eq!(collect_memory_map(&mut screen, &mut regions), 4);
        assert_eq!(regions[3].base, 0x3000);
    }
}

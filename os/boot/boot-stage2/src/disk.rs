//! Kernel image loading in firmware-sized chunks.
//!
//! Each chunk advances the LBA by its sector count and the destination
//! segment by `sectors * 512 / 16` paragraphs, leaving the offset alone, so
//! no single read crosses a 64 KiB segment boundary as long as the chunk
//! stays at or below 128 sectors.

use crate::error::{BootError, DiskError};
use crate::firmware::{DiskRead, Firmware};
use kernel_info::disk::SECTOR_SIZE;
use kernel_memory_addresses::SegmentedAddress;
use log::debug;

/// Real-mode memory ends where the extended BIOS data area starts.
const CONVENTIONAL_MEMORY_END: u64 = 0xA_0000;

/// Splits a contiguous read into requests of at most `max` sectors.
///
/// Yields a [`DiskError::SegmentWrap`] once, then stops, if the destination
/// runs out of segment space while sectors remain.
#[derive(Debug, Clone)]
pub struct Chunks {
    drive: u8,
    lba: u64,
    remaining: u32,
    max: u16,
    buffer: Option<SegmentedAddress>,
}

impl Chunks {
    #[must_use]
    pub fn new(drive: u8, lba: u64, sectors: u32, buffer: SegmentedAddress, max: u16) -> Self {
        Self {
            drive,
            lba,
            remaining: sectors,
            max: max.max(1),
            buffer: Some(buffer),
        }
    }
}

impl Iterator for Chunks {
    type Item = Result<DiskRead, BootError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let sectors = u16::try_from(self.remaining).map_or(self.max, |r| r.min(self.max));
        let Some(buffer) = self.buffer else {
            self.remaining = 0;
            return Some(Err(BootError::Disk {
                lba: self.lba,
                sectors,
                source: DiskError::SegmentWrap,
            }));
        };
        let request = DiskRead {
            drive: self.drive,
            lba: self.lba,
            sectors,
            buffer,
        };
        self.lba += u64::from(sectors);
        self.remaining -= u32::from(sectors);
        self.buffer = buffer.advance(u64::from(sectors) * SECTOR_SIZE as u64);
        Some(Ok(request))
    }
}

/// Facts about the loaded image, reported in the handoff block.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LoadedImage {
    pub lba: u32,
    pub sectors: u16,
    pub load: SegmentedAddress,
    /// Firmware calls issued.
    pub reads: u16,
}

/// Read `sectors` sectors starting at `lba` into `load`.
///
/// # Errors
/// [`BootError::ImageTooLarge`] if the image would run past conventional
/// memory, [`BootError::Disk`] for the first chunk that cannot be read.
pub fn load_image(
    firmware: &mut impl Firmware,
    drive: u8,
    lba: u32,
    sectors: u16,
    load: SegmentedAddress,
    max_per_read: u16,
) -> Result<LoadedImage, BootError> {
    let end = load.to_physical().as_u64() + u64::from(sectors) * SECTOR_SIZE as u64;
    if end > CONVENTIONAL_MEMORY_END {
        return Err(BootError::ImageTooLarge {
            load: load.to_physical().as_u64(),
            sectors,
        });
    }

    let mut reads = 0u16;
    for request in Chunks::new(drive, u64::from(lba), u32::from(sectors), load, max_per_read) {
        let request = request?;
        debug!(
            "read {} sectors at LBA {} into {}",
            request.sectors, request.lba, request.buffer
        );
        firmware
            .read_sectors(&request)
            .map_err(|source| BootError::Disk {
                lba: request.lba,
                sectors: request.sectors,
                source,
            })?;
        reads += 1;
    }

    Ok(LoadedImage {
        lba,
        sectors,
        load,
        reads,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_respect_limit_and_advance_segment() {
        let reads: Vec<_> = Chunks::new(0x80, 65, 150, SegmentedAddress::new(0x1000, 0), 64)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(reads.len(), 3);
        assert_eq!(
            reads.iter().map(|r| r.sectors).collect::<Vec<_>>(),
            [64, 64, 22]
        );
        assert_eq!(
            reads.iter().map(|r| r.lba).collect::<Vec<_>>(),
            [65, 129, 193]
        );
        assert_eq!(reads[1].buffer, SegmentedAddress::new(0x1800, 0));
        assert_eq!(reads[2].buffer, SegmentedAddress::new(0x2000, 0));
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let reads: Vec<_> = Chunks::new(0x80, 0, 128, SegmentedAddress::new(0x1000, 0), 64)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(reads.len(), 2);
        assert!(reads.iter().all(|r| r.sectors == 64));
    }

    #[test]
    fn zero_sectors_reads_nothing() {
        assert_eq!(
            Chunks::new(0x80, 65, 0, SegmentedAddress::new(0x1000, 0), 64).count(),
            0
        );
    }

    #[test]
    fn segment_wrap_is_reported_not_truncated() {
        let mut chunks = Chunks::new(0x80, 10, 100, SegmentedAddress::new(0xF800, 0), 64);

        let first = chunks.next().unwrap().unwrap();
        assert_eq!((first.lba, first.sectors), (10, 64));
        assert_eq!(
            chunks.next(),
            Some(Err(BootError::Disk {
                lba: 74,
                sectors: 36,
                source: DiskError::SegmentWrap,
            }))
        );
        assert_eq!(chunks.next(), None);
    }

    #[test]
    fn read_ending_at_the_last_segment_is_complete() {
        let reads: Vec<_> = Chunks::new(0x80, 0, 64, SegmentedAddress::new(0xF800, 0), 64)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(reads.len(), 1);
    }
}

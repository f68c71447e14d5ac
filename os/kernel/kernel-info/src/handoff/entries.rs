//! Typed entry payloads.

use super::HandoffError;
use super::bytes::{put, read_u16_le, read_u32_le, read_u64_le};
use bitfield_struct::bitfield;
use core::fmt;

/// Entry type tags.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u16)]
pub enum EntryType {
    Architecture = 1,
    Firmware = 2,
    MemoryMap = 3,
    BootDevice = 4,
    Console = 5,
}

impl EntryType {
    #[must_use]
    pub const fn from_u16(v: u16) -> Option<Self> {
        match v {
            1 => Some(Self::Architecture),
            2 => Some(Self::Firmware),
            3 => Some(Self::MemoryMap),
            4 => Some(Self::BootDevice),
            5 => Some(Self::Console),
            _ => None,
        }
    }
}

impl From<EntryType> for u16 {
    fn from(value: EntryType) -> Self {
        value as Self
    }
}

/// A fixed-size entry payload.
pub trait Entry: Sized {
    const TYPE: EntryType;
    const LEN: usize;

    /// Serialize into `out`, which is exactly [`LEN`](Self::LEN) bytes.
    fn encode(&self, out: &mut [u8]);

    /// Parse a payload.
    ///
    /// # Errors
    /// [`HandoffError::PayloadLength`] if `payload` is not [`LEN`](Self::LEN)
    /// bytes, [`HandoffError::InvalidValue`] for unknown enumerants.
    fn decode(payload: &[u8]) -> Result<Self, HandoffError>;
}

fn check_len<E: Entry>(payload: &[u8]) -> Result<(), HandoffError> {
    if payload.len() == E::LEN {
        Ok(())
    } else {
        Err(HandoffError::PayloadLength {
            kind: E::TYPE as u16,
            len: payload.len(),
            expected: E::LEN,
        })
    }
}

/// Execution mode the kernel is entered in.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u32)]
pub enum CpuMode {
    /// 32-bit protected mode, paging off.
    Protected = 1,
    /// 64-bit long mode with the boot identity map.
    Long = 2,
}

impl TryFrom<u32> for CpuMode {
    type Error = HandoffError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Protected),
            2 => Ok(Self::Long),
            _ => Err(HandoffError::InvalidValue {
                field: "cpu mode",
                value,
            }),
        }
    }
}

impl fmt::Display for CpuMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Protected => "protected (32-bit)",
            Self::Long => "long (64-bit)",
        })
    }
}

/// What the loader established before the jump.
#[bitfield(u32)]
#[derive(Eq, PartialEq)]
pub struct ArchFlags {
    /// The A20 wrap-around probe confirmed the gate is open.
    pub a20_verified: bool,
    /// CR4.PAE was set.
    pub pae: bool,
    /// CR0.PG was set.
    pub paging: bool,
    #[bits(29)]
    __reserved: u32,
}

/// Entry 1: execution environment.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ArchitectureInfo {
    pub mode: CpuMode,
    pub flags: ArchFlags,
    /// Physical address of the PML4, `0` without paging.
    pub page_root: u64,
}

impl Entry for ArchitectureInfo {
    const TYPE: EntryType = EntryType::Architecture;
    const LEN: usize = 16;

    fn encode(&self, out: &mut [u8]) {
        put(out, 0, &(self.mode as u32).to_le_bytes());
        put(out, 4, &self.flags.into_bits().to_le_bytes());
        put(out, 8, &self.page_root.to_le_bytes());
    }

    fn decode(payload: &[u8]) -> Result<Self, HandoffError> {
        check_len::<Self>(payload)?;
        Ok(Self {
            mode: CpuMode::try_from(read_u32_le(payload, 0)?)?,
            flags: ArchFlags::from_bits(read_u32_le(payload, 4)?),
            page_root: read_u64_le(payload, 8)?,
        })
    }
}

/// Firmware interface the machine booted through.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u32)]
pub enum FirmwareKind {
    LegacyBios = 1,
}

/// How the A20 gate was opened.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u32)]
pub enum A20Method {
    /// `INT 15h, AX=2401h` succeeded.
    Firmware = 1,
    /// Output-port write through the 8042 keyboard controller.
    KeyboardController = 2,
    /// Both methods were attempted; the gate state is unknown.
    Unavailable = 3,
}

impl TryFrom<u32> for A20Method {
    type Error = HandoffError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Firmware),
            2 => Ok(Self::KeyboardController),
            3 => Ok(Self::Unavailable),
            _ => Err(HandoffError::InvalidValue {
                field: "A20 method",
                value,
            }),
        }
    }
}

impl fmt::Display for A20Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Firmware => "firmware",
            Self::KeyboardController => "keyboard controller",
            Self::Unavailable => "unavailable",
        })
    }
}

/// Entry 2: firmware facts.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FirmwareInfo {
    pub kind: FirmwareKind,
    pub a20: A20Method,
}

impl Entry for FirmwareInfo {
    const TYPE: EntryType = EntryType::Firmware;
    const LEN: usize = 8;

    fn encode(&self, out: &mut [u8]) {
        put(out, 0, &(self.kind as u32).to_le_bytes());
        put(out, 4, &(self.a20 as u32).to_le_bytes());
    }

    fn decode(payload: &[u8]) -> Result<Self, HandoffError> {
        check_len::<Self>(payload)?;
        let kind = match read_u32_le(payload, 0)? {
            1 => FirmwareKind::LegacyBios,
            value => {
                return Err(HandoffError::InvalidValue {
                    field: "firmware kind",
                    value,
                });
            }
        };
        Ok(Self {
            kind,
            a20: A20Method::try_from(read_u32_le(payload, 4)?)?,
        })
    }
}

/// E820 address range type. Unknown values are carried through unchanged.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct MemoryClass(pub u32);

impl MemoryClass {
    pub const USABLE: Self = Self(1);
    pub const RESERVED: Self = Self(2);
    pub const ACPI_RECLAIMABLE: Self = Self(3);
    pub const ACPI_NVS: Self = Self(4);
    pub const BAD: Self = Self(5);

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self.0 {
            1 => "usable",
            2 => "reserved",
            3 => "ACPI reclaimable",
            4 => "ACPI NVS",
            5 => "bad",
            _ => "unknown",
        }
    }
}

impl fmt::Debug for MemoryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryClass({} {})", self.0, self.name())
    }
}

/// One record of the memory-map entry (entry 3 holds a sequence of these).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MemoryRegion {
    pub base: u64,
    pub length: u64,
    pub class: MemoryClass,
    /// ACPI 3.0 extended attributes; `1` (enabled) when the firmware gave none.
    pub attributes: u32,
}

impl MemoryRegion {
    pub const LEN: usize = 24;

    pub fn encode(&self, out: &mut [u8]) {
        put(out, 0, &self.base.to_le_bytes());
        put(out, 8, &self.length.to_le_bytes());
        put(out, 16, &self.class.0.to_le_bytes());
        put(out, 20, &self.attributes.to_le_bytes());
    }

    /// # Errors
    /// [`HandoffError::EntryOutOfBounds`] if `bytes` holds fewer than
    /// [`LEN`](Self::LEN) bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, HandoffError> {
        Ok(Self {
            base: read_u64_le(bytes, 0)?,
            length: read_u64_le(bytes, 8)?,
            class: MemoryClass(read_u32_le(bytes, 16)?),
            attributes: read_u32_le(bytes, 20)?,
        })
    }

    #[must_use]
    pub const fn end(&self) -> u64 {
        self.base.saturating_add(self.length)
    }
}

/// Entry 4: the device the system booted from.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BootDeviceInfo {
    /// BIOS drive number (`0x80` = first hard disk).
    pub drive: u8,
    /// First kernel sector.
    pub start_sector: u32,
    /// Kernel sectors loaded.
    pub sector_count: u32,
}

impl Entry for BootDeviceInfo {
    const TYPE: EntryType = EntryType::BootDevice;
    const LEN: usize = 12;

    fn encode(&self, out: &mut [u8]) {
        put(out, 0, &[self.drive, 0, 0, 0]);
        put(out, 4, &self.start_sector.to_le_bytes());
        put(out, 8, &self.sector_count.to_le_bytes());
    }

    fn decode(payload: &[u8]) -> Result<Self, HandoffError> {
        check_len::<Self>(payload)?;
        Ok(Self {
            drive: payload[0],
            start_sector: read_u32_le(payload, 4)?,
            sector_count: read_u32_le(payload, 8)?,
        })
    }
}

/// Entry 5: text console geometry.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ConsoleInfo {
    pub columns: u16,
    pub rows: u16,
    /// Physical address of the character cell buffer.
    pub buffer: u32,
}

impl Entry for ConsoleInfo {
    const TYPE: EntryType = EntryType::Console;
    const LEN: usize = 8;

    fn encode(&self, out: &mut [u8]) {
        put(out, 0, &self.columns.to_le_bytes());
        put(out, 2, &self.rows.to_le_bytes());
        put(out, 4, &self.buffer.to_le_bytes());
    }

    fn decode(payload: &[u8]) -> Result<Self, HandoffError> {
        check_len::<Self>(payload)?;
        Ok(Self {
            columns: read_u16_le(payload, 0)?,
            rows: read_u16_le(payload, 2)?,
            buffer: read_u32_le(payload, 4)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn architecture_layout() {
        let info = ArchitectureInfo {
            mode: CpuMode::Long,
            flags: ArchFlags::new().with_a20_verified(true).with_paging(true),
            page_root: 0x1000,
        };
        let mut out = [0u8; ArchitectureInfo::LEN];
        info.encode(&mut out);
        assert_eq!(out, [2, 0, 0, 0, 0b101, 0, 0, 0, 0, 0x10, 0, 0, 0, 0, 0, 0]);
        assert_eq!(ArchitectureInfo::decode(&out), Ok(info));
    }

    #[test]
    fn boot_device_pads_drive_byte() {
        let mut out = [0xEEu8; BootDeviceInfo::LEN];
        BootDeviceInfo {
            drive: 0x80,
            start_sector: 65,
            sector_count: 512,
        }
        .encode(&mut out);
        assert_eq!(&out[..4], &[0x80, 0, 0, 0]);
        assert_eq!(&out[4..8], &65u32.to_le_bytes());
    }

    #[test]
    fn wrong_payload_length_is_rejected() {
        assert_eq!(
            ConsoleInfo::decode(&[0; 7]),
            Err(HandoffError::PayloadLength {
                kind: 5,
                len: 7,
                expected: 8
            })
        );
    }

    #[test]
    fn unknown_enumerants_are_rejected() {
        let mut out = [0u8; FirmwareInfo::LEN];
        out[0] = 1;
        out[4] = 9;
        assert_eq!(
            FirmwareInfo::decode(&out),
            Err(HandoffError::InvalidValue {
                field: "A20 method",
                value: 9
            })
        );
    }

    #[test]
    fn unknown_memory_class_survives() {
        let region = MemoryRegion {
            base: 0x10_0000,
            length: 0x7F0_0000,
            class: MemoryClass(12),
            attributes: 1,
        };
        let mut out = [0u8; MemoryRegion::LEN];
        region.encode(&mut out);
        let back = MemoryRegion::decode(&out).unwrap();
        assert_eq!(back.class.name(), "unknown");
        assert_eq!(back.end(), 0x800_0000);
    }
}

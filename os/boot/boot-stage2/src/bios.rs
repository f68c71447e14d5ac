//! BIOS services over `int`, valid only while still in real mode with
//! `DS = ES = SS = 0`.

use boot_stage2::firmware::MemoryMapStep;
use boot_stage2::{DiskError, DiskRead, Firmware, FirmwareError};
use core::arch::asm;
use kernel_info::handoff::{MemoryClass, MemoryRegion};

/// `INT 13h, AH=42h` disk address packet.
#[repr(C, packed)]
struct DiskAddressPacket {
    size: u8,
    _zero: u8,
    sectors: u16,
    offset: u16,
    segment: u16,
    lba: u64,
}

impl DiskAddressPacket {
    #[allow(clippy::cast_possible_truncation)]
    const fn from_request(request: &DiskRead) -> Self {
        Self {
            size: size_of::<Self>() as u8,
            _zero: 0,
            sectors: request.sectors,
            offset: request.buffer.offset(),
            segment: request.buffer.segment(),
            lba: request.lba,
        }
    }
}

/// `INT 15h, EAX=E820h` output buffer (ACPI 3.0 layout).
#[repr(C)]
#[derive(Default)]
struct E820Entry {
    base: u64,
    length: u64,
    kind: u32,
    attributes: u32,
}

const SMAP: u32 = u32::from_be_bytes(*b"SMAP");

pub struct Bios {
    _private: (),
}

impl Bios {
    /// # Safety
    /// Only valid in real mode with BIOS interrupt vectors intact and all
    /// data segments at zero.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl Firmware for Bios {
    fn read_sectors(&mut self, request: &DiskRead) -> Result<(), DiskError> {
        let dap = DiskAddressPacket::from_request(request);
        let status: u16;
        let failed: u8;
        // SAFETY: the packet lives on the stack below 64 KiB, reachable as DS:SI.
        unsafe {
            asm!(
                "push si",
                "mov si, {dap:x}",
                "int 0x13",
                "setc {failed}",
                "pop si",
                dap = in(reg) core::ptr::from_ref(&dap),
                failed = out(reg_byte) failed,
                inout("ax") 0x4200u16 => status,
                in("dl") request.drive,
            );
        }
        if failed == 0 {
            Ok(())
        } else {
            Err(DiskError::Firmware(status.to_be_bytes()[0]))
        }
    }

    fn print_byte(&mut self, byte: u8) {
        // SAFETY: teletype output touches no memory we own.
        unsafe {
            asm!(
                "push bx",
                "xor bx, bx",
                "int 0x10",
                "pop bx",
                inout("ax") 0x0E00u16 | u16::from(byte) => _,
            );
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn memory_map_entry(&mut self, continuation: u32) -> Option<MemoryMapStep> {
        let mut entry = E820Entry {
            attributes: 1,
            ..E820Entry::default()
        };
        let signature: u32;
        let next: u32;
        let failed: u8;
        // SAFETY: `entry` lives on the stack, reachable as ES:DI.
        unsafe {
            asm!(
                "xchg {cont:e}, ebx",
                "int 0x15",
                "xchg {cont:e}, ebx",
                "setc {failed}",
                cont = inout(reg) continuation => next,
                failed = out(reg_byte) failed,
                inout("eax") 0xE820u32 => signature,
                inout("ecx") size_of::<E820Entry>() as u32 => _,
                in("edx") SMAP,
                in("edi") core::ptr::from_mut(&mut entry),
            );
        }
        if failed != 0 || signature != SMAP {
            return None;
        }
        Some(MemoryMapStep {
            region: MemoryRegion {
                base: entry.base,
                length: entry.length,
                class: MemoryClass(entry.kind),
                attributes: entry.attributes,
            },
            continuation: next,
        })
    }

    fn enable_a20(&mut self) -> Result<(), FirmwareError> {
        let status: u16;
        let failed: u8;
        // SAFETY: a pure firmware call.
        unsafe {
            asm!(
                "int 0x15",
                "setc {failed}",
                failed = out(reg_byte) failed,
                inout("ax") 0x2401u16 => status,
            );
        }
        if failed == 0 {
            Ok(())
        } else {
            Err(FirmwareError {
                status: status.to_be_bytes()[0],
            })
        }
    }
}

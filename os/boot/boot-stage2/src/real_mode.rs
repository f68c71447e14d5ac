//! The machine as Stage-2 sees it: real mode, `DS = ES = SS = 0`.

use crate::trampoline;
use boot_stage2::gdt::STORAGE_BYTES;
use boot_stage2::{CpuControl, ModeSwitch, PhysicalMemory};
use core::arch::asm;
use kernel_hal::DescriptorTablePointer;
use kernel_memory_addresses::PhysicalAddress;

/// Descriptor-table storage inside the Stage-2 image.
#[repr(C, align(8))]
struct TableStorage([u8; STORAGE_BYTES]);

#[unsafe(link_section = ".gdt")]
static mut DESCRIPTOR_TABLE: TableStorage = TableStorage([0; STORAGE_BYTES]);

pub struct RealMode {
    _private: (),
}

impl RealMode {
    /// # Safety
    /// Only valid in real mode with all data segments at zero. At most one
    /// instance may exist.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl CpuControl for RealMode {
    fn code_segment(&self) -> u16 {
        let cs: u16;
        // SAFETY: reads a segment register.
        unsafe {
            asm!("mov {0:x}, cs", out(reg) cs, options(nomem, nostack, preserves_flags));
        }
        cs
    }

    #[allow(clippy::cast_possible_truncation)]
    fn descriptor_table_offset(&self) -> u16 {
        // In real mode a near pointer is the offset within its segment.
        (&raw const DESCRIPTOR_TABLE).expose_provenance() as u16
    }

    fn address_wraps(&mut self) -> bool {
        let wraps: u8;
        // SAFETY: flips the boot signature word at 0x7DFE and restores it;
        // Stage-1 is done with it.
        unsafe {
            asm!(
                "push ds",
                "push es",
                "xor ax, ax",
                "mov ds, ax",
                "not ax",
                "mov es, ax",
                "mov dx, word ptr ds:[0x7DFE]",
                "not word ptr ds:[0x7DFE]",
                "mov ax, word ptr ds:[0x7DFE]",
                "cmp ax, word ptr es:[0x7E0E]",
                "sete {wraps}",
                "mov word ptr ds:[0x7DFE], dx",
                "pop es",
                "pop ds",
                wraps = out(reg_byte) wraps,
                out("ax") _,
                out("dx") _,
            );
        }
        wraps != 0
    }

    fn load_descriptor_table(&mut self, pointer: &DescriptorTablePointer) {
        // SAFETY: the table lives in the Stage-2 image, which the kernel never overwrites.
        unsafe { kernel_hal::load_descriptor_table(pointer) }
    }

    fn switch_and_enter(&mut self, plan: &ModeSwitch) -> ! {
        let Some(registers) = plan.registers() else {
            log::error!("mode switch plan does not fit 32-bit registers");
            self.halt()
        };
        // SAFETY: GDT, page tables, handoff block and kernel image are in
        // place; nothing after this point returns to real mode.
        unsafe { trampoline::enter(&registers) }
    }

    fn halt(&mut self) -> ! {
        loop {
            // SAFETY: stops the CPU with interrupts off.
            unsafe { asm!("cli", "hlt", options(nomem, nostack)) }
        }
    }
}

impl PhysicalMemory for RealMode {
    #[allow(clippy::cast_possible_truncation)]
    fn region(&mut self, base: PhysicalAddress, len: usize) -> &mut [u8] {
        // SAFETY: the engine only asks for loader-owned regions below 64 KiB,
        // reachable through DS = 0.
        unsafe {
            core::slice::from_raw_parts_mut(
                core::ptr::with_exposed_provenance_mut::<u8>(base.as_u64() as usize),
                len,
            )
        }
    }
}

//! Privileged CPU operations and raw memory, as seen from real mode.

use crate::switch::ModeSwitch;
use kernel_hal::DescriptorTablePointer;
use kernel_memory_addresses::PhysicalAddress;

pub trait CpuControl {
    /// Current value of `CS`.
    fn code_segment(&self) -> u16;

    /// Offset of the descriptor-table storage inside the Stage-2 image,
    /// relative to the base of `CS`.
    fn descriptor_table_offset(&self) -> u16;

    /// Whether the memory at `0xFFFF:0x7E0E` aliases `0x0000:0x7DFE`, i.e.
    /// whether address line 20 is still masked.
    fn address_wraps(&mut self) -> bool;

    fn load_descriptor_table(&mut self, pointer: &DescriptorTablePointer);

    /// Perform the mode switch described by `plan` and jump to the kernel.
    fn switch_and_enter(&mut self, plan: &ModeSwitch) -> !;

    /// Stop for good after a fatal error.
    fn halt(&mut self) -> !;
}

pub trait PhysicalMemory {
    /// The `len` bytes at `base`.
    ///
    /// Implementations may assume the engine only asks for regions it owns
    /// by the boot layout (page tables, handoff block, descriptor table).
    fn region(&mut self, base: PhysicalAddress, len: usize) -> &mut [u8];
}

//! # Mode-Switch Plan
//!
//! The register values for the jump out of real mode are computed up front
//! as typed values, then flattened into [`SwitchRegisters`] for the
//! trampoline. The trampoline performs, in this order:
//!
//! 1. `CR0 ← cr0` (PE), far jump to `code32`, reload data segments with `data32`.
//! 2. Long mode only: `CR4 ← cr4` (PAE), `CR3 ← cr3`, `EFER |= efer` (LME),
//!    `CR0 ← cr0` (PE | PG), far jump to `code64`, reload with `data64`.
//! 3. Stack at `stack_top`, handoff address as the first argument, jump to
//!    `entry`.

use crate::config::TargetMode;
use crate::error::BootError;
use kernel_hal::DescriptorTablePointer;
use kernel_info::selectors::{CODE32, CODE64, DATA32, DATA64};
use kernel_memory_addresses::PhysicalAddress;
use kernel_registers::{Cr0, Cr3, Cr4, Efer};

/// The second half of the switch, long-mode target only.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LongModeRegisters {
    pub cr4: Cr4,
    pub cr3: Cr3,
    /// Bits OR-ed into EFER.
    pub efer: Efer,
    /// Written after EFER; includes PE.
    pub cr0: Cr0,
    pub code_selector: u16,
    pub data_selector: u16,
}

/// Everything the trampoline needs to leave real mode and enter the kernel.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ModeSwitch {
    pub target: TargetMode,
    pub descriptor_table: DescriptorTablePointer,
    /// Written first; enables protection.
    pub cr0: Cr0,
    pub code_selector: u16,
    pub data_selector: u16,
    pub long_mode: Option<LongModeRegisters>,
    pub entry: PhysicalAddress,
    pub handoff: PhysicalAddress,
    pub stack_top: PhysicalAddress,
}

impl ModeSwitch {
    /// The plan for entering the kernel at `entry` in `target` mode.
    ///
    /// `page_root` is only consulted for the long-mode target.
    ///
    /// # Errors
    /// [`BootError::MissingPageRoot`] or [`BootError::PageRootMisaligned`] if
    /// the long-mode target has no 4 KiB aligned PML4 to load into CR3.
    pub fn new(
        target: TargetMode,
        descriptor_table: DescriptorTablePointer,
        page_root: Option<PhysicalAddress>,
        entry: PhysicalAddress,
        handoff: PhysicalAddress,
        stack_top: PhysicalAddress,
    ) -> Result<Self, BootError> {
        let cr0 = Cr0::RESET.with_pe(true);
        let long_mode = match target {
            TargetMode::Protected => None,
            TargetMode::Long => {
                let root = page_root.ok_or(BootError::MissingPageRoot)?;
                let cr3 = Cr3::for_pml4(root)
                    .ok_or(BootError::PageRootMisaligned(root.as_u64()))?;
                Some(LongModeRegisters {
                    cr4: Cr4::new().with_pae(true),
                    cr3,
                    efer: Efer::new().with_lme(true),
                    cr0: cr0.with_pg(true),
                    code_selector: CODE64,
                    data_selector: DATA64,
                })
            }
        };
        Ok(Self {
            target,
            descriptor_table,
            cr0,
            code_selector: CODE32,
            data_selector: DATA32,
            long_mode,
            entry,
            handoff,
            stack_top,
        })
    }

    /// Raw register image for the trampoline. `None` if an address does
    /// not fit in 32 bits.
    #[must_use]
    pub fn registers(&self) -> Option<SwitchRegisters> {
        let low = |bits: u64| u32::try_from(bits).ok();
        let (cr4, cr3, efer, cr0_paging) = match self.long_mode {
            Some(l) => (
                low(l.cr4.into_bits())?,
                low(l.cr3.into_bits())?,
                low(l.efer.into_bits())?,
                low(l.cr0.into_bits())?,
            ),
            None => (0, 0, 0, 0),
        };
        Some(SwitchRegisters {
            cr0_protected: low(self.cr0.into_bits())?,
            cr4,
            cr3,
            efer,
            cr0_paging,
            entry: self.entry.as_u32()?,
            handoff: self.handoff.as_u32()?,
            stack_top: self.stack_top.as_u32()?,
            long_mode: u32::from(self.long_mode.is_some()),
        })
    }
}

/// Flat, fixed-layout copy of a [`ModeSwitch`] read by the trampoline.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct SwitchRegisters {
    pub cr0_protected: u32,
    pub cr4: u32,
    pub cr3: u32,
    /// Low half of EFER; OR-ed into the MSR.
    pub efer: u32,
    pub cr0_paging: u32,
    pub entry: u32,
    pub handoff: u32,
    pub stack_top: u32,
    /// Nonzero to continue into long mode after protected mode.
    pub long_mode: u32,
}

use crate::a20;
use crate::config::Stage2Config;
use crate::context::BootContext;
use crate::disk;
use crate::error::BootError;
use crate::firmware::{Firmware, Teletype};
use crate::gdt::DescriptorTable;
use crate::handoff;
use crate::machine::{CpuControl, PhysicalMemory};
use crate::paging;
use crate::stage::Stage;
use crate::switch::ModeSwitch;
use core::fmt::Write;
use kernel_hal::PortIo;
use log::{error, info};

/// The Stage-2 state machine.
///
/// Owns the firmware, the keyboard-controller ports and the machine for the
/// whole boot, and records everything it learns in a [`BootContext`].
pub struct Engine<F, P, M> {
    config: Stage2Config,
    context: BootContext,
    stage: Stage,
    firmware: F,
    ports: P,
    machine: M,
}

impl<F, P, M> Engine<F, P, M>
where
    F: Firmware,
    P: PortIo,
    M: CpuControl + PhysicalMemory,
{
    pub const fn new(config: Stage2Config, boot_drive: u8, firmware: F, ports: P, machine: M) -> Self {
        Self {
            config,
            context: BootContext::new(boot_drive),
            stage: Stage::Entered,
            firmware,
            ports,
            machine,
        }
    }

    pub const fn stage(&self) -> Stage {
        self.stage
    }

    pub const fn context(&self) -> &BootContext {
        &self.context
    }

    pub const fn config(&self) -> &Stage2Config {
        &self.config
    }

    pub const fn firmware(&self) -> &F {
        &self.firmware
    }

    pub const fn ports(&self) -> &P {
        &self.ports
    }

    pub const fn machine(&self) -> &M {
        &self.machine
    }

    /// Perform the work of the next stage and move there.
    ///
    /// Once the handoff block is finalized there is nothing left to prepare;
    /// further calls return the current stage unchanged.
    ///
    /// # Errors
    /// Whatever the stage's work reports; the stage does not advance.
    pub fn step(&mut self) -> Result<Stage, BootError> {
        let Some(next) = self.stage.next(self.config.target) else {
            return Ok(self.stage);
        };

        match next {
            Stage::ExtendedAddressingEnabled => {
                let outcome = a20::enable(&mut self.firmware, &mut self.ports, &mut self.machine);
                self.context.a20 = Some(outcome);
            }
            Stage::KernelImageLoaded => {
                let image = disk::load_image(
                    &mut self.firmware,
                    self.context.boot_drive,
                    self.config.kernel_lba,
                    self.config.kernel_sectors,
                    self.config.kernel_load,
                    self.config.max_sectors_per_read,
                )?;
                info!(
                    "kernel: {} sectors from LBA {} at {} ({} reads)",
                    image.sectors, image.lba, image.load, image.reads
                );
                self.context.kernel = Some(image);
            }
            Stage::DescriptorTablesBuilt => {
                let table = DescriptorTable::for_target(self.config.target);
                let pointer = table.install(&mut self.machine);
                let base = pointer.base;
                info!("GDT: {} entries at {base:#x}", table.entries().len());
                self.context.descriptor_table = Some(pointer);
            }
            Stage::PageTablesBuilt => {
                let base = self.config.page_tables;
                let region = self.machine.region(base, paging::REGION_BYTES);
                let root = paging::build_identity_map(region, base, self.config.identity_map_bytes)?;
                info!(
                    "identity map: {:#x} bytes, PML4 at {root}",
                    self.config.identity_map_bytes
                );
                self.context.page_root = Some(root);
            }
            Stage::HandoffBlockFinalized => {
                let buf = self
                    .machine
                    .region(self.config.handoff, self.config.handoff_capacity);
                let len = handoff::write_block(buf, &self.config, &self.context, &mut self.firmware)?;
                info!("handoff block: {len} bytes at {}", self.config.handoff);
                self.context.handoff_len = Some(len);
            }
            Stage::Entered | Stage::ModeSwitched | Stage::KernelEntered => return Ok(self.stage),
        }

        self.stage = next;
        info!("stage: {next}");
        Ok(next)
    }

    /// Run every remaining preparation stage and return the switch plan.
    ///
    /// # Errors
    /// The first stage that fails.
    pub fn prepare(&mut self) -> Result<ModeSwitch, BootError> {
        while self.stage < Stage::HandoffBlockFinalized {
            self.step()?;
        }
        self.plan()
    }

    /// The switch plan for the current context.
    ///
    /// # Errors
    /// [`BootError::OutOfOrder`] before the handoff block is finalized, or the
    /// page-root error from [`ModeSwitch::new`].
    pub fn plan(&self) -> Result<ModeSwitch, BootError> {
        let descriptor_table = match self.context.descriptor_table {
            Some(table) if self.stage == Stage::HandoffBlockFinalized => table,
            _ => {
                return Err(BootError::OutOfOrder {
                    stage: Stage::ModeSwitched.name(),
                });
            }
        };
        ModeSwitch::new(
            self.config.target,
            descriptor_table,
            self.context.page_root,
            self.config.kernel_load.to_physical(),
            self.config.handoff,
            self.config.kernel_stack_top,
        )
    }

    /// Leave real mode and jump into the kernel.
    pub fn enter_kernel(mut self, plan: &ModeSwitch) -> ! {
        self.stage = Stage::ModeSwitched;
        info!(
            "stage: {}; entering kernel at {} in {:?} mode, handoff at {}",
            self.stage, plan.entry, plan.target, plan.handoff
        );
        self.machine.switch_and_enter(plan)
    }

    /// Report `err` on screen and stop.
    pub fn fail(mut self, err: &BootError) -> ! {
        error!("boot failed in stage {}: {err}", self.stage);
        if let Err(e) = writeln!(Teletype(&mut self.firmware), "Stage-2: {err}") {
            error!("boot failure not shown on screen: {e}");
        }
        self.machine.halt()
    }
}

use crate::pic::{LINES, Pic8259};
use kernel_hal::PortIo;

/// Device action run in interrupt context.
///
/// Handlers only talk to their device. The acknowledgement to the PIC is
/// sent by [`IrqTable::dispatch`] after the handler returns.
pub type IrqHandler = fn(&mut dyn PortIo);

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("device line {0} does not exist (the PIC pair has lines 0..=15)")]
pub struct LineOutOfRange(pub u8);

/// Device handlers for the 16 PIC lines.
///
/// Built during boot, then frozen in a `SyncOnceCell` before `sti`; the
/// service routines only read it.
pub struct IrqTable {
    handlers: [Option<IrqHandler>; LINES as usize],
}

impl Default for IrqTable {
    fn default() -> Self {
        Self::new()
    }
}

impl IrqTable {
    /// Every line routed to the acknowledge-only default.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            handlers: [None; LINES as usize],
        }
    }

    /// Route `line` to `handler`, replacing any earlier registration.
    ///
    /// # Errors
    /// [`LineOutOfRange`] for lines above 15.
    pub fn register(&mut self, line: u8, handler: IrqHandler) -> Result<(), LineOutOfRange> {
        let slot = self
            .handlers
            .get_mut(usize::from(line))
            .ok_or(LineOutOfRange(line))?;
        *slot = Some(handler);
        Ok(())
    }

    #[must_use]
    pub fn is_registered(&self, line: u8) -> bool {
        matches!(self.handlers.get(usize::from(line)), Some(Some(_)))
    }

    /// Run the device action for `line`, then acknowledge it.
    ///
    /// Lines without a registered handler are only acknowledged.
    pub fn dispatch(&self, line: u8, pic: Pic8259, ports: &mut dyn PortIo) {
        match self.handlers.get(usize::from(line)) {
            Some(Some(handler)) => handler(ports),
            Some(None) => log::trace!("IRQ {line} has no handler"),
            None => {
                log::warn!("spurious dispatch for line {line}");
                return;
            }
        }
        pic.end_of_interrupt(ports, line);
    }
}

//! # A20 Gate
//!
//! The firmware service is tried first. Only when it fails does the loader
//! drive the 8042 keyboard controller itself:
//!
//! ```text
//! 0x64 ← 0xAD   disable keyboard
//! 0x64 ← 0xD0   read output port
//! 0x60 → value
//! 0x64 ← 0xD1   write output port
//! 0x60 ← value | 0x02
//! 0x64 ← 0xAE   enable keyboard
//! ```
//!
//! Every command waits for the controller's input buffer to drain (status
//! bit 1 clear); the read waits for its output buffer to fill (bit 0 set).
//! Either way, the wrap-around probe afterwards decides whether the gate is
//! really open. A closed gate is recorded, not fatal.

use crate::firmware::Firmware;
use crate::machine::CpuControl;
use kernel_hal::PortIo;
use kernel_info::handoff::A20Method;
use log::{info, warn};

pub const KBC_DATA: u16 = 0x60;
pub const KBC_STATUS: u16 = 0x64;
pub const KBC_COMMAND: u16 = 0x64;

const STATUS_OUTPUT_FULL: u8 = 1 << 0;
const STATUS_INPUT_FULL: u8 = 1 << 1;

const CMD_DISABLE_KEYBOARD: u8 = 0xAD;
const CMD_READ_OUTPUT_PORT: u8 = 0xD0;
const CMD_WRITE_OUTPUT_PORT: u8 = 0xD1;
const CMD_ENABLE_KEYBOARD: u8 = 0xAE;

const OUTPUT_PORT_A20: u8 = 1 << 1;

/// Status polls before the controller is considered dead.
const POLL_LIMIT: u32 = 0x1_0000;

/// The controller stopped responding.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("keyboard controller timed out")]
pub struct ControllerTimeout;

/// What happened at the gate.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct A20Outcome {
    pub method: A20Method,
    /// The wrap-around probe saw distinct memory above 1 MiB.
    pub verified: bool,
}

/// Open the gate: firmware first, the keyboard controller on failure, then
/// verify.
pub fn enable(
    firmware: &mut impl Firmware,
    ports: &mut impl PortIo,
    cpu: &mut impl CpuControl,
) -> A20Outcome {
    let method = match firmware.enable_a20() {
        Ok(()) => A20Method::Firmware,
        Err(e) => {
            warn!("INT 15h A20 enable failed ({e}), trying the keyboard controller");
            match enable_via_controller(ports) {
                Ok(()) => A20Method::KeyboardController,
                Err(e) => {
                    warn!("{e}");
                    A20Method::Unavailable
                }
            }
        }
    };

    let verified = !cpu.address_wraps();
    if verified {
        info!("A20 open via {method}");
    } else {
        warn!("A20 probe still sees wrap-around after {method}; memory above 1 MiB is aliased");
    }
    A20Outcome { method, verified }
}

/// Set the A20 bit in the 8042 output port.
///
/// # Errors
/// [`ControllerTimeout`] if a status poll never settles.
pub fn enable_via_controller(ports: &mut impl PortIo) -> Result<(), ControllerTimeout> {
    command(ports, CMD_DISABLE_KEYBOARD)?;
    command(ports, CMD_READ_OUTPUT_PORT)?;
    let output_port = read_data(ports)?;
    command(ports, CMD_WRITE_OUTPUT_PORT)?;
    ports.write_u8(KBC_DATA, output_port | OUTPUT_PORT_A20);
    command(ports, CMD_ENABLE_KEYBOARD)?;
    wait_input_empty(ports)
}

fn command(ports: &mut impl PortIo, cmd: u8) -> Result<(), ControllerTimeout> {
    wait_input_empty(ports)?;
    ports.write_u8(KBC_COMMAND, cmd);
    wait_input_empty(ports)
}

fn read_data(ports: &mut impl PortIo) -> Result<u8, ControllerTimeout> {
    for _ in 0..POLL_LIMIT {
        if ports.read_u8(KBC_STATUS) & STATUS_OUTPUT_FULL != 0 {
            return Ok(ports.read_u8(KBC_DATA));
        }
        ports.io_wait();
    }
    Err(ControllerTimeout)
}

fn wait_input_empty(ports: &mut impl PortIo) -> Result<(), ControllerTimeout> {
    for _ in 0..POLL_LIMIT {
        if ports.read_u8(KBC_STATUS) & STATUS_INPUT_FULL == 0 {
            return Ok(());
        }
        ports.io_wait();
    }
    Err(ControllerTimeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_hal::testing::ScriptedPorts;

    #[test]
    fn controller_sequence() {
        let mut ports = ScriptedPorts::new();
        ports.fallback(KBC_STATUS, STATUS_OUTPUT_FULL);
        ports.script(KBC_DATA, [0xC1]);

        enable_via_controller(&mut ports).unwrap();

        assert_eq!(
            ports.writes(),
            vec![
                (KBC_COMMAND, CMD_DISABLE_KEYBOARD),
                (KBC_COMMAND, CMD_READ_OUTPUT_PORT),
                (KBC_COMMAND, CMD_WRITE_OUTPUT_PORT),
                (KBC_DATA, 0xC3),
                (KBC_COMMAND, CMD_ENABLE_KEYBOARD),
            ]
        );
    }

    #[test]
    fn busy_controller_times_out() {
        let mut ports = ScriptedPorts::new();
        ports.fallback(KBC_STATUS, STATUS_INPUT_FULL);
        assert_eq!(enable_via_controller(&mut ports), Err(ControllerTimeout));
        assert!(ports.writes().is_empty());
    }
}

//! # PS/2 keyboard driver
//!
//! One service routine on device line 1 and one non-blocking consumer.
//!
//! ```text
//! IRQ 1 ─▶ keyboard_interrupt ─▶ read 0x60 ─▶ translate (set 1) ─▶ LossySlot
//!                                                                    │
//! shell loop ◀──────────────────── poll() ◀──────────────────────────┘
//! ```
//!
//! The slot holds a single key. A key arriving before the shell took the
//! previous one replaces it; at human typing speed against a polling loop
//! that is not expected to happen, but nothing prevents it.

use core::sync::atomic::{AtomicBool, Ordering};
use kernel_hal::PortIo;
use kernel_sync::LossySlot;

/// Controller output buffer (scan codes).
pub const DATA_PORT: u16 = 0x60;
/// Controller status (read) and command (write) register.
pub const COMMAND_PORT: u16 = 0x64;

/// Device line the keyboard is wired to.
pub const KEYBOARD_LINE: u8 = 1;

/// Key code stored for the Enter key.
pub const ENTER: char = '\n';
/// Key code stored for the Backspace key.
pub const BACKSPACE: char = '\x08';

const LEFT_SHIFT: u8 = 0x2A;
const RIGHT_SHIFT: u8 = 0x36;
const RELEASE: u8 = 0x80;

/// Controller command that pulses the CPU reset line.
const PULSE_RESET: u8 = 0xFE;
/// Status bit 1: the controller has not consumed the last command yet.
const INPUT_FULL: u8 = 0x02;
const POLL_LIMIT: u32 = 0x1_0000;

/// The keyboard instance the service routine feeds.
pub static KEYBOARD: KeyboardDriver = KeyboardDriver::new();

/// Service routine body for [`KEYBOARD_LINE`].
pub fn keyboard_interrupt(ports: &mut dyn PortIo) {
    KEYBOARD.service(ports);
}

/// Take the pending key from [`KEYBOARD`], if any. Never blocks.
pub fn poll() -> Option<char> {
    KEYBOARD.poll()
}

/// Scan-code decoder and pending-key slot.
///
/// `service` runs in interrupt context, `poll` in the shell loop. The shift
/// state is only touched by `service`.
#[derive(Debug, Default)]
pub struct KeyboardDriver {
    slot: LossySlot,
    shift: AtomicBool,
}

impl KeyboardDriver {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: LossySlot::new(),
            shift: AtomicBool::new(false),
        }
    }

    /// Read one scan code from the controller and handle it.
    pub fn service<P: PortIo + ?Sized>(&self, ports: &mut P) {
        let code = ports.read_u8(DATA_PORT);
        self.handle_scancode(code);
    }

    /// Track shift, translate make codes and publish the result.
    ///
    /// Release codes and keys without a translation are dropped.
    pub fn handle_scancode(&self, code: u8) {
        match code {
            LEFT_SHIFT | RIGHT_SHIFT => self.shift.store(true, Ordering::Relaxed),
            c if c == LEFT_SHIFT | RELEASE || c == RIGHT_SHIFT | RELEASE => {
                self.shift.store(false, Ordering::Relaxed);
            }
            c if c & RELEASE != 0 => {}
            c => {
                let Some(key) = translate(c, self.shift.load(Ordering::Relaxed)) else {
                    log::trace!("scan code {c:#04x} has no key");
                    return;
                };
                if self.slot.publish(key) {
                    log::trace!("key {:?} replaced an unread key", char::from(key));
                }
            }
        }
    }

    /// Take the pending key, leaving the slot empty.
    pub fn poll(&self) -> Option<char> {
        self.slot.take().map(char::from)
    }
}

/// Set-1 make code to ASCII.
///
/// Letters, digits, space, Enter, Backspace and `- = / * + . ,`. With shift
/// held letters are upper case, `5` gives `%`, `8` gives `*` and `=` gives
/// `+`; other shifted keys have no translation.
#[must_use]
pub const fn translate(code: u8, shift: bool) -> Option<u8> {
    let base = match code {
        0x02..=0x0A => b'1' + (code - 0x02),
        0x0B => b'0',
        0x0C => b'-',
        0x0D => b'=',
        0x0E => 0x08,
        0x10 => b'q',
        0x11 => b'w',
        0x12 => b'e',
        0x13 => b'r',
        0x14 => b't',
        0x15 => b'y',
        0x16 => b'u',
        0x17 => b'i',
        0x18 => b'o',
        0x19 => b'p',
        0x1C => b'\n',
        0x1E => b'a',
        0x1F => b's',
        0x20 => b'd',
        0x21 => b'f',
        0x22 => b'g',
        0x23 => b'h',
        0x24 => b'j',
        0x25 => b'k',
        0x26 => b'l',
        0x2C => b'z',
        0x2D => b'x',
        0x2E => b'c',
        0x2F => b'v',
        0x30 => b'b',
        0x31 => b'n',
        0x32 => b'm',
        0x33 => b',',
        0x34 => b'.',
        0x35 => b'/',
        // keypad
        0x37 => b'*',
        0x39 => b' ',
        0x4A => b'-',
        0x4E => b'+',
        _ => return None,
    };

    if !shift {
        return Some(base);
    }
    match base {
        b'a'..=b'z' => Some(base.to_ascii_uppercase()),
        b'5' => Some(b'%'),
        b'8' => Some(b'*'),
        b'=' => Some(b'+'),
        _ if matches!(code, 0x0E | 0x1C | 0x37 | 0x39 | 0x4A | 0x4E) => Some(base),
        _ => None,
    }
}

/// Ask the keyboard controller to pulse the CPU reset line.
///
/// Returns if the machine is still running afterwards (the controller never
/// accepted the command, or the pulse had no effect).
pub fn pulse_reset_line<P: PortIo + ?Sized>(ports: &mut P) {
    for _ in 0..POLL_LIMIT {
        if ports.read_u8(COMMAND_PORT) & INPUT_FULL == 0 {
            break;
        }
    }
    ports.write_u8(COMMAND_PORT, PULSE_RESET);
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_hal::testing::ScriptedPorts;

    #[test]
    fn letters_digits_and_operators() {
        assert_eq!(translate(0x1E, false), Some(b'a'));
        assert_eq!(translate(0x1E, true), Some(b'A'));
        assert_eq!(translate(0x02, false), Some(b'1'));
        assert_eq!(translate(0x0A, false), Some(b'9'));
        assert_eq!(translate(0x0B, false), Some(b'0'));
        assert_eq!(translate(0x06, true), Some(b'%'));
        assert_eq!(translate(0x09, true), Some(b'*'));
        assert_eq!(translate(0x0D, true), Some(b'+'));
        assert_eq!(translate(0x35, false), Some(b'/'));
        assert_eq!(translate(0x4E, true), Some(b'+'));
        assert_eq!(translate(0x1C, false), Some(b'\n'));
        assert_eq!(translate(0x0E, false), Some(0x08));
    }

    #[test]
    fn unmapped_codes_are_dropped() {
        assert_eq!(translate(0x01, false), None);
        assert_eq!(translate(0x3B, false), None);
        assert_eq!(translate(0x02, true), None);
    }

    #[test]
    fn shift_is_tracked_across_scan_codes() {
        let keyboard = KeyboardDriver::new();
        keyboard.handle_scancode(LEFT_SHIFT);
        keyboard.handle_scancode(0x23);
        assert_eq!(keyboard.poll(), Some('H'));

        keyboard.handle_scancode(LEFT_SHIFT | RELEASE);
        keyboard.handle_scancode(0x23);
        assert_eq!(keyboard.poll(), Some('h'));
    }

    #[test]
    fn release_codes_publish_nothing() {
        let keyboard = KeyboardDriver::new();
        keyboard.handle_scancode(0x1E | RELEASE);
        assert_eq!(keyboard.poll(), None);
    }

    #[test]
    fn service_reads_the_data_port() {
        let keyboard = KeyboardDriver::new();
        let mut ports = ScriptedPorts::new();
        ports.script(DATA_PORT, [0x2E]);

        keyboard.service(&mut ports);

        assert_eq!(keyboard.poll(), Some('c'));
        assert!(ports.writes().is_empty());
    }

    #[test]
    fn reset_pulse_waits_for_the_controller() {
        let mut ports = ScriptedPorts::new();
        ports.script(COMMAND_PORT, [INPUT_FULL, INPUT_FULL, 0]);

        pulse_reset_line(&mut ports);

        assert_eq!(ports.writes(), vec![(COMMAND_PORT, 0xFE)]);
    }
}

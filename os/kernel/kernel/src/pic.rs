//! # 8259A Programmable Interrupt Controller pair
//!
//! After reset the master delivers its lines on vectors 8..=15, right on top
//! of the CPU exceptions. [`Pic8259::remap`] moves both controllers to a base
//! offset (32 in this kernel), so device line 1 (keyboard) arrives on vector
//! 33 and a double fault is never mistaken for a timer tick.
//!
//! ```text
//!  master 0x20/0x21   lines 0..=7   → base + 0..=7
//!  slave  0xA0/0xA1   lines 8..=15  → base + 8..=15 (cascaded on master line 2)
//! ```

use kernel_hal::PortIo;

pub const MASTER_COMMAND: u16 = 0x20;
pub const MASTER_DATA: u16 = 0x21;
pub const SLAVE_COMMAND: u16 = 0xA0;
pub const SLAVE_DATA: u16 = 0xA1;

/// Device lines across both controllers.
pub const LINES: u8 = 16;

/// Master line the slave is wired to.
pub const CASCADE_LINE: u8 = 2;

/// Vector of device line 0 in this kernel.
pub const IRQ_BASE: u8 = 32;

/// ICW1: initialisation, ICW4 follows, cascade mode, edge triggered.
const ICW1_INIT: u8 = 0x11;
/// ICW4: 8086/88 mode.
const ICW4_8086: u8 = 0x01;
/// OCW2: non-specific end of interrupt.
const EOI: u8 = 0x20;

/// The chained controller pair, described by the vector of line 0.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Pic8259 {
    base: u8,
}

impl Pic8259 {
    /// # Panics
    /// If `base` is not a multiple of 8, overlaps the exception range, or
    /// leaves no room for 16 vectors.
    #[must_use]
    pub const fn new(base: u8) -> Self {
        assert!(base.is_multiple_of(8) && base >= 32 && base <= 240);
        Self { base }
    }

    #[must_use]
    pub const fn base(self) -> u8 {
        self.base
    }

    /// Vector that `line` delivers on.
    #[must_use]
    pub const fn vector_for(self, line: u8) -> Option<u8> {
        if line < LINES {
            Some(self.base + line)
        } else {
            None
        }
    }

    /// Device line behind `vector`, if it belongs to this pair.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn line_for(self, vector: u64) -> Option<u8> {
        let base = self.base as u64;
        if vector >= base && vector < base + LINES as u64 {
            Some((vector - base) as u8)
        } else {
            None
        }
    }

    /// Run the ICW1..ICW4 sequence so lines land on `base..base+16`.
    ///
    /// The interrupt masks are read first and written back at the end, so
    /// lines the firmware left enabled stay enabled.
    pub fn remap<P: PortIo + ?Sized>(self, ports: &mut P) {
        let masks = self.masks(ports);

        ports.write_u8(MASTER_COMMAND, ICW1_INIT);
        ports.io_wait();
        ports.write_u8(SLAVE_COMMAND, ICW1_INIT);
        ports.io_wait();

        ports.write_u8(MASTER_DATA, self.base);
        ports.io_wait();
        ports.write_u8(SLAVE_DATA, self.base + 8);
        ports.io_wait();

        ports.write_u8(MASTER_DATA, 1 << CASCADE_LINE);
        ports.io_wait();
        ports.write_u8(SLAVE_DATA, CASCADE_LINE);
        ports.io_wait();

        ports.write_u8(MASTER_DATA, ICW4_8086);
        ports.io_wait();
        ports.write_u8(SLAVE_DATA, ICW4_8086);
        ports.io_wait();

        self.set_masks(ports, masks);
        log::info!(
            "PIC remapped to vectors {}..={}, masks {masks:#06x}",
            self.base,
            self.base + LINES - 1
        );
    }

    /// Acknowledge `line`: slave first for lines 8..=15, then master.
    pub fn end_of_interrupt<P: PortIo + ?Sized>(self, ports: &mut P, line: u8) {
        if line >= 8 {
            ports.write_u8(SLAVE_COMMAND, EOI);
        }
        ports.write_u8(MASTER_COMMAND, EOI);
    }

    /// Combined interrupt mask register, slave in the high byte.
    pub fn masks<P: PortIo + ?Sized>(self, ports: &mut P) -> u16 {
        let master = ports.read_u8(MASTER_DATA);
        let slave = ports.read_u8(SLAVE_DATA);
        u16::from_le_bytes([master, slave])
    }

    pub fn set_masks<P: PortIo + ?Sized>(self, ports: &mut P, masks: u16) {
        let [master, slave] = masks.to_le_bytes();
        ports.write_u8(MASTER_DATA, master);
        ports.write_u8(SLAVE_DATA, slave);
    }

    /// Enable delivery of `line`; slave lines also open the cascade line.
    pub fn unmask<P: PortIo + ?Sized>(self, ports: &mut P, line: u8) {
        if line >= LINES {
            return;
        }
        let mut masks = self.masks(ports) & !(1 << line);
        if line >= 8 {
            masks &= !(1 << CASCADE_LINE);
        }
        self.set_masks(ports, masks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_hal::testing::ScriptedPorts;

    #[test]
    fn remap_sends_the_init_words_and_restores_masks() {
        let mut ports = ScriptedPorts::new();
        ports.script(MASTER_DATA, [0xB8]).script(SLAVE_DATA, [0x8F]);

        Pic8259::new(32).remap(&mut ports);

        assert_eq!(
            ports.writes(),
            vec![
                (MASTER_COMMAND, 0x11),
                (SLAVE_COMMAND, 0x11),
                (MASTER_DATA, 32),
                (SLAVE_DATA, 40),
                (MASTER_DATA, 0x04),
                (SLAVE_DATA, 0x02),
                (MASTER_DATA, 0x01),
                (SLAVE_DATA, 0x01),
                (MASTER_DATA, 0xB8),
                (SLAVE_DATA, 0x8F),
            ]
        );
    }

    #[test]
    fn keyboard_line_delivers_on_vector_33() {
        let pic = Pic8259::new(32);
        assert_eq!(pic.vector_for(1), Some(33));
        assert_ne!(pic.vector_for(1), Some(1));
        assert_eq!(pic.line_for(33), Some(1));
        assert_eq!(pic.vector_for(16), None);
        assert_eq!(pic.line_for(31), None);
        assert_eq!(pic.line_for(48), None);
    }

    #[test]
    fn slave_lines_acknowledge_both_controllers() {
        let mut ports = ScriptedPorts::new();
        let pic = Pic8259::new(32);

        pic.end_of_interrupt(&mut ports, 1);
        assert_eq!(ports.writes(), vec![(MASTER_COMMAND, 0x20)]);

        ports.clear_writes();
        pic.end_of_interrupt(&mut ports, 12);
        assert_eq!(
            ports.writes(),
            vec![(SLAVE_COMMAND, 0x20), (MASTER_COMMAND, 0x20)]
        );
    }

    #[test]
    fn unmask_clears_one_bit() {
        let mut ports = ScriptedPorts::new();
        ports.script(MASTER_DATA, [0xFF]).script(SLAVE_DATA, [0xFF]);
        Pic8259::new(32).unmask(&mut ports, 1);
        assert_eq!(ports.writes(), vec![(MASTER_DATA, 0xFD), (SLAVE_DATA, 0xFF)]);

        ports.clear_writes();
        ports.script(MASTER_DATA, [0xFF]).script(SLAVE_DATA, [0xFF]);
        Pic8259::new(32).unmask(&mut ports, 12);
        assert_eq!(ports.writes(), vec![(MASTER_DATA, 0xFB), (SLAVE_DATA, 0xEF)]);
    }
}

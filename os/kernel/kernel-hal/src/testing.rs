//! Port doubles for host tests.

use crate::PortIo;
use std::collections::{HashMap, VecDeque};

/// A [`PortIo`] that records every write and serves reads from per-port
/// scripts.
///
/// Reads from a port without a script (or with an exhausted one) return the
/// port's fallback value, `0` unless set with [`ScriptedPorts::fallback`].
#[derive(Debug, Default)]
pub struct ScriptedPorts {
    writes: Vec<(u16, u8)>,
    reads: HashMap<u16, VecDeque<u8>>,
    fallback: HashMap<u16, u8>,
}

impl ScriptedPorts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `values` to be returned by successive reads of `port`.
    pub fn script(&mut self, port: u16, values: impl IntoIterator<Item = u8>) -> &mut Self {
        self.reads.entry(port).or_default().extend(values);
        self
    }

    /// Value returned by `port` once its script runs dry.
    pub fn fallback(&mut self, port: u16, value: u8) -> &mut Self {
        self.fallback.insert(port, value);
        self
    }

    /// All writes in order, excluding I/O delay writes.
    #[must_use]
    pub fn writes(&self) -> Vec<(u16, u8)> {
        self.writes
            .iter()
            .copied()
            .filter(|(port, _)| *port != crate::port::POST_PORT)
            .collect()
    }

    /// Writes to one port, in order.
    #[must_use]
    pub fn writes_to(&self, port: u16) -> Vec<u8> {
        self.writes
            .iter()
            .filter(|(p, _)| *p == port)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }
}

impl PortIo for ScriptedPorts {
    fn read_u8(&mut self, port: u16) -> u8 {
        self.reads
            .get_mut(&port)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| self.fallback.get(&port).copied().unwrap_or(0))
    }

    fn write_u8(&mut self, port: u16, value: u8) {
        self.writes.push((port, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_reads_then_fallback() {
        let mut ports = ScriptedPorts::new();
        ports.script(0x60, [0x1E, 0x9E]).fallback(0x60, 0xFF);
        assert_eq!(ports.read_u8(0x60), 0x1E);
        assert_eq!(ports.read_u8(0x60), 0x9E);
        assert_eq!(ports.read_u8(0x60), 0xFF);
        assert_eq!(ports.read_u8(0x64), 0);
    }

    #[test]
    fn io_wait_is_hidden_from_writes() {
        let mut ports = ScriptedPorts::new();
        ports.write_u8(0x20, 0x11);
        ports.io_wait();
        ports.write_u8(0x21, 0x20);
        assert_eq!(ports.writes(), vec![(0x20, 0x11), (0x21, 0x20)]);
    }
}

use bitfield_struct::bitfield;

/// CR0: system control flags.
///
/// Only the bits the boot path and the kernel care about are named; all
/// reserved ranges stay zero.
#[bitfield(u64)]
#[derive(Eq, PartialEq)]
pub struct Cr0 {
    /// Bit 0 (PE): protected mode. Set first on the way out of real mode.
    pub pe: bool,
    /// Bit 1 (MP): monitor coprocessor.
    pub mp: bool,
    /// Bit 2 (EM): x87 emulation (all x87 instructions fault when set).
    pub em: bool,
    /// Bit 3 (TS): task switched.
    pub ts: bool,
    /// Bit 4 (ET): extension type, hardwired to 1 on modern CPUs.
    pub et: bool,
    /// Bit 5 (NE): native x87 error reporting.
    pub ne: bool,

    #[bits(10)]
    __reserved1: u16,

    /// Bit 16 (WP): supervisor writes honour read-only pages.
    pub wp: bool,

    #[bits(1)]
    __reserved2: bool,

    /// Bit 18 (AM): alignment mask.
    pub am: bool,

    #[bits(10)]
    __reserved3: u16,

    /// Bit 29 (NW): not write-through.
    pub nw: bool,
    /// Bit 30 (CD): cache disable.
    pub cd: bool,
    /// Bit 31 (PG): paging. Requires PE; with EFER.LME it activates long mode.
    pub pg: bool,

    #[bits(32)]
    __reserved4: u32,
}

impl Cr0 {
    /// The value real-mode firmware leaves behind after reset (`ET` only).
    pub const RESET: Self = Self::new().with_et(true);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protection_and_paging_bits() {
        let cr0 = Cr0::RESET.with_pe(true);
        assert_eq!(cr0.into_bits(), 0x11);
        assert_eq!(cr0.with_pg(true).into_bits(), 0x8000_0011);
    }
}

use bitfield_struct::bitfield;

/// `IA32_EFER` (MSR `0xC000_0080`).
///
/// The boot path only sets [`lme`](Efer::lme); [`lma`](Efer::lma) is set by
/// the CPU once paging is enabled with LME on.
#[bitfield(u64, order = Lsb)]
#[derive(Eq, PartialEq)]
pub struct Efer {
    /// Bit 0 (SCE): `SYSCALL`/`SYSRET`.
    pub sce: bool,

    #[bits(7)]
    __reserved1: u8,

    /// Bit 8 (LME): long mode enable.
    pub lme: bool,

    #[bits(1)]
    __reserved2: bool,

    /// Bit 10 (LMA): long mode active (read-only).
    pub lma: bool,

    /// Bit 11 (NXE): no-execute page protection.
    pub nxe: bool,

    #[bits(52)]
    __reserved3: u64,
}

impl Efer {
    /// MSR index for `IA32_EFER`.
    pub const MSR_EFER: u32 = 0xC000_0080;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lme_is_bit_eight() {
        assert_eq!(Efer::new().with_lme(true).into_bits(), 0x100);
        assert!(Efer::from_bits(0x500).lma());
    }
}

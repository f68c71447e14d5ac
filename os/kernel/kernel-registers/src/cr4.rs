use bitfield_struct::bitfield;

/// CR4: architectural extensions.
///
/// Long mode needs [`pae`](Cr4::pae) before paging is switched on; the boot
/// path leaves the remaining named bits clear.
#[bitfield(u64, order = Lsb)]
#[derive(Eq, PartialEq)]
pub struct Cr4 {
    /// Bit 0 (VME): virtual-8086 mode extensions.
    pub vme: bool,
    /// Bit 1 (PVI): protected-mode virtual interrupts.
    pub pvi: bool,
    /// Bit 2 (TSD): `RDTSC` restricted to CPL 0.
    pub tsd: bool,
    /// Bit 3 (DE): debugging extensions.
    pub de: bool,
    /// Bit 4 (PSE): 4 MiB pages in 32-bit paging.
    pub pse: bool,
    /// Bit 5 (PAE): physical address extension; mandatory for long mode.
    pub pae: bool,
    /// Bit 6 (MCE): machine-check enable.
    pub mce: bool,
    /// Bit 7 (PGE): global pages.
    pub pge: bool,
    /// Bit 8 (PCE): `RDPMC` at any privilege level.
    pub pce: bool,
    /// Bit 9 (OSFXSR): `FXSAVE`/`FXRSTOR` supported by the OS.
    pub osfxsr: bool,
    /// Bit 10 (OSXMMEXCPT): unmasked SIMD floating-point exceptions.
    pub osxmmexcpt: bool,

    #[bits(53)]
    __reserved1: u64,
}

//! # Descriptor Table Layout
//!
//! | Index | Selector | Entry |
//! |-------|----------|-------|
//! | 0 | `0x00` | null |
//! | 1 | `0x08` | 32-bit code, flat 4 GiB, DPL 0 |
//! | 2 | `0x10` | 32-bit data, flat 4 GiB, DPL 0 |
//! | 3 | `0x18` | 64-bit code, DPL 0 (long-mode path) |
//! | 4 | `0x20` | 64-bit data, DPL 0 (long-mode path) |
//!
//! Selectors are `index << 3` with `TI = 0` (GDT) and `RPL = 0`.

pub const NULL: u16 = 0x00;
pub const CODE32: u16 = 0x08;
pub const DATA32: u16 = 0x10;
pub const CODE64: u16 = 0x18;
pub const DATA64: u16 = 0x20;

/// Entries in the protected-mode table.
pub const PROTECTED_ENTRIES: usize = 3;

/// Entries in the long-mode table.
pub const LONG_ENTRIES: usize = 5;

/// Selector for descriptor `index` at ring 0.
#[must_use]
pub const fn selector(index: u16) -> u16 {
    index << 3
}

const _: () = {
    assert!(NULL == selector(0));
    assert!(CODE32 == selector(1));
    assert!(DATA32 == selector(2));
    assert!(CODE64 == selector(3));
    assert!(DATA64 == selector(4));
    assert!(selector(LONG_ENTRIES as u16 - 1) == DATA64);
};

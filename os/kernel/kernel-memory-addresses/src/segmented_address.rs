use crate::PhysicalAddress;
use core::fmt;

/// Bytes per real-mode paragraph (one segment increment).
pub const PARAGRAPH: u64 = 16;

/// Highest physical address reachable as `0xFFFF:0xFFFF` with A20 enabled.
const REAL_MODE_LIMIT: u64 = 0x10_FFEF;

/// A real-mode `segment:offset` pair.
///
/// The physical address is `segment * 16 + offset`. Firmware disk reads and
/// the loaders' own segment registers speak in this form; everything after
/// the mode switch uses [`PhysicalAddress`].
#[repr(C)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct SegmentedAddress {
    offset: u16,
    segment: u16,
}

impl SegmentedAddress {
    #[inline]
    #[must_use]
    pub const fn new(segment: u16, offset: u16) -> Self {
        Self { offset, segment }
    }

    /// Physical base of a real-mode segment, i.e. `segment * 16`.
    #[inline]
    #[must_use]
    pub const fn segment_base(segment: u16) -> PhysicalAddress {
        PhysicalAddress::new((segment as u64) * PARAGRAPH)
    }

    /// Normalized form of `pa`: the offset is below 16 and the segment carries
    /// the rest. `None` if `pa` is not reachable from real mode.
    #[inline]
    #[must_use]
    pub const fn from_physical(pa: PhysicalAddress) -> Option<Self> {
        let v = pa.as_u64();
        if v > 0xF_FFFF {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        Some(Self::new((v / PARAGRAPH) as u16, (v % PARAGRAPH) as u16))
    }

    #[inline]
    #[must_use]
    pub const fn segment(self) -> u16 {
        self.segment
    }

    #[inline]
    #[must_use]
    pub const fn offset(self) -> u16 {
        self.offset
    }

    #[inline]
    #[must_use]
    pub const fn to_physical(self) -> PhysicalAddress {
        let v = (self.segment as u64) * PARAGRAPH + self.offset as u64;
        debug_assert!(v <= REAL_MODE_LIMIT);
        PhysicalAddress::new(v)
    }

    /// Advance by `bytes`, moving whole paragraphs into the segment and
    /// keeping the offset unchanged.
    ///
    /// Returns `None` if `bytes` is not a whole number of paragraphs or the
    /// segment would wrap past `0xFFFF`.
    #[inline]
    #[must_use]
    pub const fn advance(self, bytes: u64) -> Option<Self> {
        if bytes % PARAGRAPH != 0 {
            return None;
        }
        let paragraphs = bytes / PARAGRAPH;
        let segment = self.segment as u64 + paragraphs;
        if segment > u16::MAX as u64 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        Some(Self::new(segment as u16, self.offset))
    }
}

impl fmt::Debug for SegmentedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}:{:04X}", self.segment, self.offset)
    }
}

impl fmt::Display for SegmentedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

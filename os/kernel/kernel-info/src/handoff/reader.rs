use super::bytes::{read_u16_le, read_u32_le};
use super::entries::{Entry, EntryType, MemoryRegion};
use super::{ENTRY_HEADER_LEN, HEADER_LEN, HandoffError, SIGNATURE, VERSION};

/// A validated, read-only Handoff Descriptor Block.
///
/// [`parse`](Self::parse) checks the header and walks every entry once, so
/// iteration afterwards cannot fail.
#[derive(Debug, Copy, Clone)]
pub struct HandoffBlock<'a> {
    bytes: &'a [u8],
    entry_count: u16,
}

/// One entry as stored: its type tag and payload.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RawEntry<'a> {
    pub kind: u16,
    pub payload: &'a [u8],
}

impl RawEntry<'_> {
    /// The tag as a known [`EntryType`], if it is one.
    #[must_use]
    pub const fn entry_type(&self) -> Option<EntryType> {
        EntryType::from_u16(self.kind)
    }
}

impl<'a> HandoffBlock<'a> {
    /// Parse and validate a block starting at `bytes[0]`.
    ///
    /// `bytes` may extend past the block; only `total_length` bytes are used.
    ///
    /// # Errors
    /// Any [`HandoffError`] describing the first inconsistency found.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, HandoffError> {
        let total = Self::peek_length(bytes)?;
        if total > bytes.len() {
            return Err(HandoffError::Truncated {
                declared: total,
                available: bytes.len(),
            });
        }
        let version = read_u16_le(bytes, 8)?;
        if version != VERSION {
            return Err(HandoffError::UnsupportedVersion(version));
        }
        let declared = read_u16_le(bytes, 10)?;
        let bytes = &bytes[..total];

        let mut found: u16 = 0;
        let mut off = HEADER_LEN;
        while off < total {
            let (_, next) = entry_at(bytes, off)?;
            off = next;
            found = found
                .checked_add(1)
                .ok_or(HandoffError::CountMismatch { declared, found })?;
        }
        if found != declared {
            return Err(HandoffError::CountMismatch { declared, found });
        }

        Ok(Self {
            bytes,
            entry_count: declared,
        })
    }

    /// Validate the signature and return the declared `total_length`.
    ///
    /// Lets a caller that only holds a raw address learn how many bytes to
    /// map before calling [`parse`](Self::parse).
    ///
    /// # Errors
    /// [`HandoffError::TooShort`] or [`HandoffError::BadSignature`].
    pub fn peek_length(header: &[u8]) -> Result<usize, HandoffError> {
        if header.len() < HEADER_LEN {
            return Err(HandoffError::TooShort);
        }
        let signature = read_u32_le(header, 0)?;
        if signature != SIGNATURE {
            return Err(HandoffError::BadSignature(signature));
        }
        let total = read_u32_le(header, 4)? as usize;
        if total < HEADER_LEN {
            return Err(HandoffError::TooShort);
        }
        Ok(total)
    }

    /// `total_length` from the header.
    #[must_use]
    pub const fn total_length(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub const fn entry_count(&self) -> u16 {
        self.entry_count
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    #[must_use]
    pub const fn entries(&self) -> Entries<'a> {
        Entries {
            bytes: self.bytes,
            off: HEADER_LEN,
        }
    }

    /// Decode the first entry of type `E`, if present.
    #[must_use]
    pub fn find<E: Entry>(&self) -> Option<Result<E, HandoffError>> {
        let kind = u16::from(E::TYPE);
        self.entries()
            .find(|e| e.kind == kind)
            .map(|e| E::decode(e.payload))
    }

    /// The regions of the first memory-map entry, if present.
    ///
    /// # Errors
    /// [`HandoffError::PayloadLength`] if the payload is not a whole number
    /// of regions.
    pub fn memory_map(&self) -> Result<Option<MemoryRegions<'a>>, HandoffError> {
        let kind = u16::from(EntryType::MemoryMap);
        let Some(entry) = self.entries().find(|e| e.kind == kind) else {
            return Ok(None);
        };
        if !entry.payload.len().is_multiple_of(MemoryRegion::LEN) {
            return Err(HandoffError::PayloadLength {
                kind,
                len: entry.payload.len(),
                expected: entry.payload.len() / MemoryRegion::LEN * MemoryRegion::LEN,
            });
        }
        Ok(Some(MemoryRegions {
            chunks: entry.payload.chunks_exact(MemoryRegion::LEN),
        }))
    }
}

/// Decode the entry header at `off`; returns the entry and the next offset.
fn entry_at(bytes: &[u8], off: usize) -> Result<(RawEntry<'_>, usize), HandoffError> {
    let kind = read_u16_le(bytes, off)?;
    let len = read_u32_le(bytes, off + 4)? as usize;
    let start = off + ENTRY_HEADER_LEN;
    let end = start
        .checked_add(len)
        .filter(|end| *end <= bytes.len())
        .ok_or(HandoffError::EntryOutOfBounds { offset: off })?;
    Ok((
        RawEntry {
            kind,
            payload: &bytes[start..end],
        },
        end,
    ))
}

/// Iterator over the entries of a [`HandoffBlock`].
#[derive(Debug, Clone)]
pub struct Entries<'a> {
    bytes: &'a [u8],
    off: usize,
}

impl<'a> Iterator for Entries<'a> {
    type Item = RawEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.off >= self.bytes.len() {
            return None;
        }
        // The block was fully walked in `parse`.
        let (entry, next) = entry_at(self.bytes, self.off).ok()?;
        self.off = next;
        Some(entry)
    }
}

/// Iterator over the records of a memory-map entry.
#[derive(Debug, Clone)]
pub struct MemoryRegions<'a> {
    chunks: core::slice::ChunksExact<'a, u8>,
}

impl Iterator for MemoryRegions<'_> {
    type Item = MemoryRegion;

    fn next(&mut self) -> Option<Self::Item> {
        self.chunks.next().and_then(|c| MemoryRegion::decode(c).ok())
    }
}

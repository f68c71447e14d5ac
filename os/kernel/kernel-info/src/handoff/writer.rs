use super::bytes::put;
use super::entries::{Entry, EntryType, MemoryRegion};
use super::{ENTRY_HEADER_LEN, HEADER_LEN, HandoffError, SIGNATURE, VERSION};

/// Builds a Handoff Descriptor Block in a caller-provided buffer.
///
/// The buffer length is the block's capacity. [`begin`](Self::begin) resets
/// the header, each append writes one entry after the previous one, and
/// [`finalize`](Self::finalize) seals the header. Finalizing again (with or
/// without further appends) rewrites the header from the current state.
#[derive(Debug)]
pub struct HandoffWriter<'a> {
    buf: &'a mut [u8],
    cursor: usize,
    count: u16,
}

impl<'a> HandoffWriter<'a> {
    /// Start an empty block at the front of `buf`.
    ///
    /// # Errors
    /// [`HandoffError::Overflow`] if `buf` cannot hold the header.
    pub fn begin(buf: &'a mut [u8]) -> Result<Self, HandoffError> {
        if buf.len() < HEADER_LEN {
            return Err(HandoffError::Overflow {
                needed: HEADER_LEN,
                available: buf.len(),
            });
        }
        buf[..HEADER_LEN].fill(0);
        Ok(Self {
            buf,
            cursor: HEADER_LEN,
            count: 0,
        })
    }

    /// Append an entry of type `kind` whose payload is produced by `fill`
    /// writing into exactly `len` bytes.
    ///
    /// # Errors
    /// [`HandoffError::Overflow`] if the entry does not fit (nothing is
    /// written), [`HandoffError::TooManyEntries`] once `u16::MAX` entries exist.
    pub fn append_with(
        &mut self,
        kind: u16,
        len: usize,
        fill: impl FnOnce(&mut [u8]),
    ) -> Result<(), HandoffError> {
        let needed = ENTRY_HEADER_LEN + len;
        let available = self.remaining();
        if needed > available {
            return Err(HandoffError::Overflow { needed, available });
        }
        let count = self
            .count
            .checked_add(1)
            .ok_or(HandoffError::TooManyEntries)?;
        let len32 = u32::try_from(len).map_err(|_| HandoffError::Overflow { needed, available })?;

        let at = self.cursor;
        put(self.buf, at, &kind.to_le_bytes());
        put(self.buf, at + 2, &0u16.to_le_bytes());
        put(self.buf, at + 4, &len32.to_le_bytes());
        let payload = &mut self.buf[at + ENTRY_HEADER_LEN..at + needed];
        payload.fill(0);
        fill(payload);

        self.cursor += needed;
        self.count = count;
        Ok(())
    }

    /// Append an entry with a raw payload.
    ///
    /// # Errors
    /// See [`append_with`](Self::append_with).
    pub fn append(&mut self, kind: u16, payload: &[u8]) -> Result<(), HandoffError> {
        self.append_with(kind, payload.len(), |out| out.copy_from_slice(payload))
    }

    /// Append a typed entry.
    ///
    /// # Errors
    /// See [`append_with`](Self::append_with).
    pub fn append_entry<E: Entry>(&mut self, entry: &E) -> Result<(), HandoffError> {
        self.append_with(E::TYPE.into(), E::LEN, |out| entry.encode(out))
    }

    /// Append the memory map as one entry holding every region back to back.
    ///
    /// # Errors
    /// See [`append_with`](Self::append_with).
    pub fn append_memory_map(&mut self, regions: &[MemoryRegion]) -> Result<(), HandoffError> {
        self.append_with(
            EntryType::MemoryMap.into(),
            regions.len() * MemoryRegion::LEN,
            |out| {
                for (region, chunk) in regions.iter().zip(out.chunks_exact_mut(MemoryRegion::LEN)) {
                    region.encode(chunk);
                }
            },
        )
    }

    /// Write signature, total length, version and entry count; returns the
    /// total length.
    pub fn finalize(&mut self) -> usize {
        let total = u32::try_from(self.cursor).unwrap_or(u32::MAX);
        put(self.buf, 0, &SIGNATURE.to_le_bytes());
        put(self.buf, 4, &total.to_le_bytes());
        put(self.buf, 8, &VERSION.to_le_bytes());
        put(self.buf, 10, &self.count.to_le_bytes());
        self.cursor
    }

    /// Bytes used so far, header included.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.cursor
    }

    /// Whether no entries have been appended yet.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[must_use]
    pub const fn entry_count(&self) -> u16 {
        self.count
    }

    /// Bytes still free for entries.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buf.len() - self.cursor
    }

    /// The block as written so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.cursor]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_writes_nothing_but_a_zero_header() {
        let mut buf = [0xAAu8; 16];
        let w = HandoffWriter::begin(&mut buf).unwrap();
        assert_eq!(w.len(), HEADER_LEN);
        assert!(w.is_empty());
        assert_eq!(&buf[..HEADER_LEN], &[0; HEADER_LEN]);
        assert_eq!(&buf[HEADER_LEN..], &[0xAA; 4]);
    }

    #[test]
    fn begin_rejects_tiny_buffers() {
        let mut buf = [0u8; 11];
        assert_eq!(
            HandoffWriter::begin(&mut buf).unwrap_err(),
            HandoffError::Overflow {
                needed: 12,
                available: 11
            }
        );
    }

    #[test]
    fn entry_header_layout() {
        let mut buf = [0u8; 32];
        let mut w = HandoffWriter::begin(&mut buf).unwrap();
        w.append(0x0102, &[9, 8, 7]).unwrap();
        assert_eq!(w.finalize(), 12 + 8 + 3);
        assert_eq!(&buf[12..23], &[0x02, 0x01, 0, 0, 3, 0, 0, 0, 9, 8, 7]);
    }

    #[test]
    fn overflow_leaves_block_unchanged() {
        let mut buf = [0u8; 24];
        let mut w = HandoffWriter::begin(&mut buf).unwrap();
        w.append(1, &[1, 2, 3, 4]).unwrap();
        let before = w.len();
        assert_eq!(
            w.append(2, &[0; 1]),
            Err(HandoffError::Overflow {
                needed: 9,
                available: 0
            })
        );
        assert_eq!(w.len(), before);
        assert_eq!(w.entry_count(), 1);
    }

    #[test]
    fn finalize_is_idempotent() {
        let mut buf = [0u8; 64];
        let mut w = HandoffWriter::begin(&mut buf).unwrap();
        w.append(4, &[1; 12]).unwrap();
        let first = w.finalize();
        let snapshot = w.as_bytes().to_vec();
        assert_eq!(w.finalize(), first);
        assert_eq!(w.as_bytes(), snapshot.as_slice());
    }
}

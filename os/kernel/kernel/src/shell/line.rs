/// The line buffer has no room for another character.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("command line is full ({capacity} characters)")]
pub struct LineFull {
    pub capacity: usize,
}

/// A fixed-capacity ASCII line.
#[derive(Debug, Clone)]
pub struct LineBuffer<const N: usize> {
    bytes: [u8; N],
    len: usize,
}

impl<const N: usize> Default for LineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LineBuffer<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes: [0; N],
            len: 0,
        }
    }

    /// Append one ASCII byte.
    ///
    /// # Errors
    /// [`LineFull`] once `N` bytes are buffered; the byte is not stored.
    pub fn push(&mut self, byte: u8) -> Result<(), LineFull> {
        debug_assert!(byte.is_ascii());
        let slot = self
            .bytes
            .get_mut(self.len)
            .ok_or(LineFull { capacity: N })?;
        *slot = byte;
        self.len += 1;
        Ok(())
    }

    pub const fn pop(&mut self) -> Option<u8> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.bytes[self.len])
    }

    pub const fn clear(&mut self) {
        self.len = 0;
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.bytes[..self.len]).unwrap_or_default()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_is_typed_and_harmless() {
        let mut line = LineBuffer::<3>::new();
        for byte in *b"abc" {
            line.push(byte).unwrap();
        }
        assert_eq!(line.push(b'd'), Err(LineFull { capacity: 3 }));
        assert_eq!(line.as_str(), "abc");
    }

    #[test]
    fn pop_and_clear() {
        let mut line = LineBuffer::<8>::new();
        assert_eq!(line.pop(), None);
        line.push(b'h').unwrap();
        line.push(b'i').unwrap();
        assert_eq!(line.pop(), Some(b'i'));
        assert_eq!(line.as_str(), "h");
        line.clear();
        assert!(line.is_empty());
        assert_eq!(line.capacity(), 8);
    }
}

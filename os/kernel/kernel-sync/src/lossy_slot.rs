use core::sync::atomic::{AtomicU16, Ordering};

/// Ready flag above the 8-bit payload.
const READY: u16 = 1 << 8;

/// A one-byte mailbox with a ready flag.
///
/// Exactly one producer (an interrupt handler) calls [`publish`](Self::publish);
/// exactly one consumer (a polling loop) calls [`take`](Self::take).
///
/// The slot holds at most one value. Publishing while a value is pending
/// replaces it: the older value is lost. Payload and flag share one atomic
/// word so a consumer never sees a fresh flag with a stale payload.
///
/// ```rust
/// # use kernel_sync::LossySlot;
/// static KEY: LossySlot = LossySlot::new();
///
/// KEY.publish(b'a');
/// assert_eq!(KEY.take(), Some(b'a'));
/// assert_eq!(KEY.take(), None);
/// ```
#[derive(Debug)]
pub struct LossySlot {
    word: AtomicU16,
}

impl Default for LossySlot {
    fn default() -> Self {
        Self::new()
    }
}

impl LossySlot {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            word: AtomicU16::new(0),
        }
    }

    /// Store `value` and mark it ready, replacing any unconsumed value.
    ///
    /// Returns `true` if a pending value was overwritten.
    #[inline]
    pub fn publish(&self, value: u8) -> bool {
        let previous = self.word.swap(READY | u16::from(value), Ordering::AcqRel);
        previous & READY != 0
    }

    /// Take the pending value, leaving the slot empty. Never blocks.
    #[inline]
    pub fn take(&self) -> Option<u8> {
        let word = self.word.swap(0, Ordering::AcqRel);
        if word & READY == 0 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        Some(word as u8)
    }

    /// Whether a value is waiting, without consuming it.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.word.load(Ordering::Acquire) & READY != 0
    }
}

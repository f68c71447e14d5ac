//! Little-endian field access with bounds checks.

use super::HandoffError;

#[inline]
fn field<const N: usize>(buf: &[u8], off: usize) -> Result<[u8; N], HandoffError> {
    let end = off
        .checked_add(N)
        .ok_or(HandoffError::EntryOutOfBounds { offset: off })?;
    let s = buf
        .get(off..end)
        .ok_or(HandoffError::EntryOutOfBounds { offset: off })?;
    let mut out = [0u8; N];
    out.copy_from_slice(s);
    Ok(out)
}

#[inline]
pub fn read_u16_le(buf: &[u8], off: usize) -> Result<u16, HandoffError> {
    field(buf, off).map(u16::from_le_bytes)
}

#[inline]
pub fn read_u32_le(buf: &[u8], off: usize) -> Result<u32, HandoffError> {
    field(buf, off).map(u32::from_le_bytes)
}

#[inline]
pub fn read_u64_le(buf: &[u8], off: usize) -> Result<u64, HandoffError> {
    field(buf, off).map(u64::from_le_bytes)
}

/// Writes go to buffers the caller already sized; out-of-range writes are
/// programming errors in this crate and panic.
#[inline]
pub fn put(buf: &mut [u8], off: usize, bytes: &[u8]) {
    buf[off..off + bytes.len()].copy_from_slice(bytes);
}

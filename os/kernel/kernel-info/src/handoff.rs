//! # Handoff Descriptor Block (HDB)
//!
//! The loader's one-way message to the kernel. A fixed header followed by
//! type-length-value entries, all little-endian, no padding:
//!
//! ```text
//! offset  size  field
//! 0       4     signature      0x3142_4448 ("HDB1")
//! 4       4     total_length   12 + Σ (8 + length_i)
//! 8       2     version        1
//! 10      2     entry_count
//! 12      ...   entries
//!
//! entry:
//! 0       2     type
//! 2       2     reserved (0)
//! 4       4     length (payload bytes)
//! 8       ...   payload
//! ```
//!
//! The loader builds the block with a [`HandoffWriter`]:
//!
//! ```rust
//! # use kernel_info::handoff::*;
//! let mut buf = [0u8; 256];
//! let mut w = HandoffWriter::begin(&mut buf).unwrap();
//! w.append_entry(&ConsoleInfo { columns: 80, rows: 25, buffer: 0xB8000 }).unwrap();
//! let len = w.finalize();
//! assert_eq!(len, 12 + 8 + ConsoleInfo::LEN);
//!
//! let block = HandoffBlock::parse(&buf).unwrap();
//! let console: ConsoleInfo = block.find().unwrap().unwrap();
//! assert_eq!(console.rows, 25);
//! ```
//!
//! Appends are bounds checked against the buffer; an entry that does not fit
//! yields [`HandoffError::Overflow`] and leaves the block unchanged.

mod bytes;
mod entries;
mod error;
mod reader;
mod writer;

pub use entries::{
    A20Method, ArchFlags, ArchitectureInfo, BootDeviceInfo, ConsoleInfo, CpuMode, Entry,
    EntryType, FirmwareInfo, FirmwareKind, MemoryClass, MemoryRegion,
};
pub use error::HandoffError;
pub use reader::{Entries, HandoffBlock, MemoryRegions, RawEntry};
pub use writer::HandoffWriter;

/// `"HDB1"` read as a little-endian `u32`.
pub const SIGNATURE: u32 = u32::from_le_bytes(*b"HDB1");

/// Layout version written by this crate.
pub const VERSION: u16 = 1;

/// Bytes in the block header.
pub const HEADER_LEN: usize = 12;

/// Bytes in each entry header.
pub const ENTRY_HEADER_LEN: usize = 8;

const _: () = assert!(SIGNATURE == 0x3142_4448);

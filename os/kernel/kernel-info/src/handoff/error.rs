/// Failures while building or parsing a Handoff Descriptor Block.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum HandoffError {
    #[error("handoff block overflow: {needed} bytes needed, {available} available")]
    Overflow { needed: usize, available: usize },
    #[error("handoff block holds the maximum number of entries")]
    TooManyEntries,
    #[error("buffer is shorter than the handoff header")]
    TooShort,
    #[error("bad handoff signature {0:#010x}")]
    BadSignature(u32),
    #[error("unsupported handoff version {0}")]
    UnsupportedVersion(u16),
    #[error("handoff block declares {declared} bytes but only {available} are available")]
    Truncated { declared: usize, available: usize },
    #[error("entry at offset {offset} runs past the end of the block")]
    EntryOutOfBounds { offset: usize },
    #[error("header declares {declared} entries but {found} were found")]
    CountMismatch { declared: u16, found: u16 },
    #[error("entry type {kind} has a {len}-byte payload, expected {expected}")]
    PayloadLength { kind: u16, len: usize, expected: usize },
    #[error("invalid {field} value {value}")]
    InvalidValue { field: &'static str, value: u32 },
}

use thiserror::Error;

/// Why a wire buffer failed to parse or serialize
#[derive(Error, Debug, PartialEq, Eq)]
pub enum HeaderError {
    #[error("buffer too small: expected {expected} bytes, found {found}")]
    BufferTooSmall { expected: usize, found: usize },

    #[error("bad {0} checksum")]
    BadChecksum(&'static str),

    #[error("unsupported IP version: {0}")]
    UnsupportedVersion(u8),

    #[error("unsupported ARP hardware or protocol type")]
    UnsupportedArpType,

    #[error("length field inconsistent with buffer")]
    LengthMismatch,
}

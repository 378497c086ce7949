use std::path::PathBuf;

use thiserror::Error;

/// Single error currency for every fallible operation in this crate.
///
/// Every message is prefixed `hashindex:` so that the `Display` text
/// matches the side-channel diagnostics also emitted via [`log`].
#[derive(Error, Debug)]
pub enum HashIndexError {
    #[error("hashindex: allocation failed for {0} buckets")]
    Alloc(u32),

    #[error("hashindex: key size {0} out of range (1..=127)")]
    InvalidKeySize(u8),

    #[error("hashindex: value size {0} out of range (4..=127)")]
    InvalidValueSize(u8),

    #[error("hashindex: key length {actual} does not match configured key size {expected}")]
    KeyLengthMismatch { expected: u8, actual: usize },

    #[error("hashindex: value length {actual} does not match configured value size {expected}")]
    ValueLengthMismatch { expected: u8, actual: usize },

    #[error("hashindex: value's first 4 bytes collide with a reserved state sentinel")]
    ReservedSentinel,

    #[error("hashindex: I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("hashindex: bad magic in {path:?}")]
    BadMagic { path: PathBuf },

    #[error(
        "hashindex: corrupt file {path:?}: length {actual} does not match header-derived length {expected}"
    )]
    LengthMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },
}

pub type Result<T> = std::result::Result<T, HashIndexError>;

//! Archive error types.

use std::io;
use thiserror::Error;

/// Errors produced by the archive store.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The archive bytes do not form a valid sequence of blocks.
    #[error("corrupt archive: {0}")]
    Corrupt(String),

    /// A block index failed its checksum.
    #[error("index checksum mismatch at block offset {offset}: expected {expected:#010x}, got {actual:#010x}")]
    IndexChecksum { offset: u64, expected: u32, actual: u32 },

    /// An entry payload failed its checksum.
    #[error("payload checksum mismatch for {name}: expected {expected:#010x}, got {actual:#010x}")]
    PayloadChecksum {
        name: String,
        expected: u32,
        actual: u32,
    },

    /// Payload bytes were written with no header in progress.
    #[error("no entry in progress")]
    NoEntryInProgress,

    /// A glob pattern could not be compiled.
    #[error("bad pattern {pattern:?}: {reason}")]
    BadPattern { pattern: String, reason: String },

    /// Index record encoding failed.
    #[error("index encoding error: {0}")]
    Encoding(#[from] postcard::Error),

    /// I/O error from the underlying resource.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ArchiveError {
    /// Create a Corrupt error.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }

    /// Create a BadPattern error.
    pub fn bad_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BadPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }
}

/// Archive result type.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

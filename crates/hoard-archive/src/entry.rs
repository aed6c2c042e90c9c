//! Entry headers and index entries.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Per-entry flag bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags(u32);

impl Flags {
    /// No flags set.
    pub const NONE: Flags = Flags(0);
    /// Tombstone: the name is logically deleted from this point on.
    pub const DELETED: Flags = Flags(0x1);

    /// Raw bit value.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Build from raw bits. Unknown bits are preserved.
    pub fn from_bits(bits: u32) -> Self {
        Flags(bits)
    }

    /// Returns true if every bit of `other` is set.
    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

/// Metadata written ahead of an entry's payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Archive-relative key, slash-delimited, no leading slash.
    pub name: String,
    /// Permission bits, stored as given.
    pub mode: u32,
    /// Modification time recorded at creation.
    pub mod_time: SystemTime,
    pub flags: Flags,
}

impl Header {
    /// Header for a regular entry.
    pub fn new(name: impl Into<String>, mode: u32, mod_time: SystemTime) -> Self {
        Self {
            name: name.into(),
            mode,
            mod_time,
            flags: Flags::NONE,
        }
    }

    /// Tombstone header marking `name` as deleted.
    pub fn tombstone(name: impl Into<String>, mod_time: SystemTime) -> Self {
        Self {
            name: name.into(),
            mode: 0,
            mod_time,
            flags: Flags::DELETED,
        }
    }
}

/// One entry as known to the index.
///
/// `offset` is absolute within the archive resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub name: String,
    pub mode: u32,
    pub mod_time: SystemTime,
    pub flags: Flags,
    /// Absolute offset of the first payload byte.
    pub offset: u64,
    /// Payload length in bytes.
    pub size: u64,
    /// CRC-32 of the payload.
    pub crc32: u32,
}

impl IndexEntry {
    pub(crate) fn from_header(header: Header, offset: u64) -> Self {
        Self {
            name: header.name,
            mode: header.mode,
            mod_time: header.mod_time,
            flags: header.flags,
            offset,
            size: 0,
            crc32: 0,
        }
    }

    /// Returns true if this entry is a tombstone.
    pub fn is_deleted(&self) -> bool {
        self.flags.contains(Flags::DELETED)
    }
}

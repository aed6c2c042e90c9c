//! On-disk block codec.
//!
//! An archive is a sequence of blocks:
//!
//! ```text
//! ┌──────────────────────┬───────────────────────────┬──────────────┐
//! │ payloads             │ index                     │ footer (28B) │
//! │ entry 0 | entry 1 …  │ "HRDX" ver postcard(recs) │              │
//! └──────────────────────┴───────────────────────────┴──────────────┘
//! ```
//!
//! Footer fields are big-endian: entry count `u32`, index size `u64`,
//! block size `u64` (the whole block), index CRC-32 `u32`, magic `"HRDF"`.
//! Record offsets are relative to the block start so blocks can be read
//! back to front without knowing anything about earlier blocks.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::entry::{Flags, IndexEntry};
use crate::error::{ArchiveError, ArchiveResult};

pub(crate) const INDEX_MAGIC: &[u8; 4] = b"HRDX";
pub(crate) const FOOTER_MAGIC: &[u8; 4] = b"HRDF";
pub(crate) const FORMAT_VERSION: u8 = 1;
pub(crate) const FOOTER_SIZE: u64 = 28;

#[derive(Debug, Serialize, Deserialize)]
struct IndexRecord {
    name: String,
    mode: u32,
    mod_time: SystemTime,
    flags: Flags,
    offset: u64,
    size: u64,
    crc32: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Footer {
    pub entry_count: u32,
    pub index_size: u64,
    pub block_size: u64,
    pub index_crc32: u32,
}

impl Footer {
    pub fn encode(&self) -> [u8; FOOTER_SIZE as usize] {
        let mut buf = [0u8; FOOTER_SIZE as usize];
        buf[0..4].copy_from_slice(&self.entry_count.to_be_bytes());
        buf[4..12].copy_from_slice(&self.index_size.to_be_bytes());
        buf[12..20].copy_from_slice(&self.block_size.to_be_bytes());
        buf[20..24].copy_from_slice(&self.index_crc32.to_be_bytes());
        buf[24..28].copy_from_slice(FOOTER_MAGIC);
        buf
    }

    pub fn decode(buf: &[u8]) -> ArchiveResult<Self> {
        if buf.len() != FOOTER_SIZE as usize {
            return Err(ArchiveError::corrupt("short footer"));
        }
        if &buf[24..28] != FOOTER_MAGIC {
            return Err(ArchiveError::corrupt("bad footer magic"));
        }
        let u32_at = |at: usize| u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);
        let u64_at = |at: usize| {
            let mut b = [0u8; 8];
            b.copy_from_slice(&buf[at..at + 8]);
            u64::from_be_bytes(b)
        };
        Ok(Self {
            entry_count: u32_at(0),
            index_size: u64_at(4),
            block_size: u64_at(12),
            index_crc32: u32_at(20),
        })
    }
}

/// Encode the index for a block starting at `block_start`.
pub(crate) fn encode_index(entries: &[IndexEntry], block_start: u64) -> ArchiveResult<Vec<u8>> {
    let records: Vec<IndexRecord> = entries
        .iter()
        .map(|e| IndexRecord {
            name: e.name.clone(),
            mode: e.mode,
            mod_time: e.mod_time,
            flags: e.flags,
            offset: e.offset - block_start,
            size: e.size,
            crc32: e.crc32,
        })
        .collect();

    let mut buf = Vec::with_capacity(64 * records.len() + 5);
    buf.extend_from_slice(INDEX_MAGIC);
    buf.push(FORMAT_VERSION);
    buf.extend_from_slice(&postcard::to_stdvec(&records)?);
    Ok(buf)
}

/// Decode a block index, translating offsets to absolute positions.
pub(crate) fn decode_index(buf: &[u8], block_start: u64) -> ArchiveResult<Vec<IndexEntry>> {
    if buf.len() < 5 || &buf[0..4] != INDEX_MAGIC {
        return Err(ArchiveError::corrupt("bad index magic"));
    }
    if buf[4] != FORMAT_VERSION {
        return Err(ArchiveError::corrupt(format!(
            "unsupported index version {}",
            buf[4]
        )));
    }

    let records: Vec<IndexRecord> = postcard::from_bytes(&buf[5..])?;
    Ok(records
        .into_iter()
        .map(|r| IndexEntry {
            name: r.name,
            mode: r.mode,
            mod_time: r.mod_time,
            flags: r.flags,
            offset: block_start.saturating_add(r.offset),
            size: r.size,
            crc32: r.crc32,
        })
        .collect())
}

//! Combined archive reader and appender.

use std::io::{Read, Seek, SeekFrom, Write};

use crc32fast::Hasher;

use crate::block::{self, Footer, FOOTER_SIZE};
use crate::entry::{Header, IndexEntry};
use crate::error::{ArchiveError, ArchiveResult};
use crate::index::Index;

const VERIFY_CHUNK: usize = 64 * 1024;

/// Reads an existing archive and appends new entries to it.
///
/// Headers written with [`write_header`](Self::write_header) are visible in
/// [`index`](Self::index) immediately. Their payloads and index records only
/// become part of the durable archive once [`flush`](Self::flush) writes a
/// block footer; until then the resource ends in a partial block.
pub struct ArchiveReaderWriter<F> {
    file: F,
    committed: Vec<IndexEntry>,
    pending: Vec<IndexEntry>,
    block_start: u64,
    end: u64,
    /// Checksum state of the last pending entry, while it accepts payload.
    in_progress: Option<Hasher>,
}

impl<F> std::fmt::Debug for ArchiveReaderWriter<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveReaderWriter")
            .field("committed", &self.committed.len())
            .field("pending", &self.pending.len())
            .field("block_start", &self.block_start)
            .field("end", &self.end)
            .finish()
    }
}

impl<F: Read + Write + Seek> ArchiveReaderWriter<F> {
    /// Load the index of every block in `file` and prepare to append.
    ///
    /// An empty resource is an empty archive.
    pub fn new(mut file: F) -> ArchiveResult<Self> {
        let len = file.seek(SeekFrom::End(0))?;
        let committed = read_blocks(&mut file, len)?;
        tracing::debug!(entries = committed.len(), bytes = len, "archive loaded");

        Ok(Self {
            file,
            committed,
            pending: Vec::new(),
            block_start: len,
            end: len,
            in_progress: None,
        })
    }

    /// Every entry, committed then pending, in append order.
    pub fn index(&self) -> Index {
        Index::new(
            self.committed
                .iter()
                .chain(self.pending.iter())
                .cloned()
                .collect(),
        )
    }

    /// Start a new entry. Any entry in progress is finalized first.
    pub fn write_header(&mut self, header: Header) -> ArchiveResult<()> {
        self.finish_entry();
        tracing::trace!(name = %header.name, flags = header.flags.bits(), "write header");
        self.pending.push(IndexEntry::from_header(header, self.end));
        self.in_progress = Some(Hasher::new());
        Ok(())
    }

    /// Append payload bytes to the entry in progress.
    pub fn write(&mut self, buf: &[u8]) -> ArchiveResult<usize> {
        let hasher = self
            .in_progress
            .as_mut()
            .ok_or(ArchiveError::NoEntryInProgress)?;
        let entry = self
            .pending
            .last_mut()
            .ok_or(ArchiveError::NoEntryInProgress)?;

        self.file.seek(SeekFrom::Start(self.end))?;
        self.file.write_all(buf)?;
        hasher.update(buf);
        entry.size += buf.len() as u64;
        self.end += buf.len() as u64;
        Ok(buf.len())
    }

    /// Finalize the entry in progress and seal pending entries into a block.
    ///
    /// A flush with nothing pending only flushes the resource.
    pub fn flush(&mut self) -> ArchiveResult<()> {
        self.finish_entry();

        if !self.pending.is_empty() {
            let index = block::encode_index(&self.pending, self.block_start)?;
            let index_size = index.len() as u64;
            let block_size = self.end - self.block_start + index_size + FOOTER_SIZE;
            let footer = Footer {
                entry_count: self.pending.len() as u32,
                index_size,
                block_size,
                index_crc32: crc32fast::hash(&index),
            };

            self.file.seek(SeekFrom::Start(self.end))?;
            self.file.write_all(&index)?;
            self.file.write_all(&footer.encode())?;

            tracing::debug!(
                entries = self.pending.len(),
                block_start = self.block_start,
                block_size,
                "block sealed"
            );

            self.end += index_size + FOOTER_SIZE;
            self.block_start = self.end;
            self.committed.append(&mut self.pending);
        }

        self.file.flush()?;
        Ok(())
    }

    /// Flush and hand back the underlying resource.
    pub fn close(mut self) -> ArchiveResult<F> {
        self.flush()?;
        Ok(self.file)
    }

    /// Read payload bytes of `entry` starting at `pos` within the payload.
    ///
    /// Returns 0 at or past the end of the payload.
    pub fn read_at(&mut self, entry: &IndexEntry, pos: u64, buf: &mut [u8]) -> ArchiveResult<usize> {
        if pos >= entry.size || buf.is_empty() {
            return Ok(0);
        }
        let n = (buf.len() as u64).min(entry.size - pos) as usize;
        self.file.seek(SeekFrom::Start(entry.offset + pos))?;
        self.file.read_exact(&mut buf[..n])?;
        Ok(n)
    }

    /// Recompute the payload checksum of a sealed entry.
    pub fn verify(&mut self, entry: &IndexEntry) -> ArchiveResult<()> {
        let mut hasher = Hasher::new();
        let mut buf = vec![0u8; VERIFY_CHUNK];
        let mut pos = 0;
        loop {
            let n = self.read_at(entry, pos, &mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            pos += n as u64;
        }

        let actual = hasher.finalize();
        if actual != entry.crc32 {
            return Err(ArchiveError::PayloadChecksum {
                name: entry.name.clone(),
                expected: entry.crc32,
                actual,
            });
        }
        Ok(())
    }

    /// Number of entries written since the last flush.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Mutable access to the underlying resource.
    pub fn get_mut(&mut self) -> &mut F {
        &mut self.file
    }

    fn finish_entry(&mut self) {
        if let Some(hasher) = self.in_progress.take() {
            if let Some(entry) = self.pending.last_mut() {
                entry.crc32 = hasher.finalize();
            }
        }
    }
}

/// Walk blocks from the end of the resource back to offset 0.
#[tracing::instrument(level = "debug", skip(file), err)]
fn read_blocks<F: Read + Seek>(file: &mut F, len: u64) -> ArchiveResult<Vec<IndexEntry>> {
    let mut blocks = Vec::new();
    let mut pos = len;

    while pos > 0 {
        if pos < FOOTER_SIZE {
            return Err(ArchiveError::corrupt(format!("truncated block ending at {pos}")));
        }

        let mut buf = [0u8; FOOTER_SIZE as usize];
        file.seek(SeekFrom::Start(pos - FOOTER_SIZE))?;
        file.read_exact(&mut buf)?;
        let footer = Footer::decode(&buf)?;

        if footer.block_size > pos
            || footer.block_size < footer.index_size.saturating_add(FOOTER_SIZE)
        {
            return Err(ArchiveError::corrupt(format!(
                "block size {} out of range at {pos}",
                footer.block_size
            )));
        }
        let block_start = pos - footer.block_size;
        let index_start = pos - FOOTER_SIZE - footer.index_size;

        let mut index = vec![0u8; footer.index_size as usize];
        file.seek(SeekFrom::Start(index_start))?;
        file.read_exact(&mut index)?;

        let actual = crc32fast::hash(&index);
        if actual != footer.index_crc32 {
            return Err(ArchiveError::IndexChecksum {
                offset: block_start,
                expected: footer.index_crc32,
                actual,
            });
        }

        let entries = block::decode_index(&index, block_start)?;
        if entries.len() != footer.entry_count as usize {
            return Err(ArchiveError::corrupt(format!(
                "block at {block_start} declares {} entries, index has {}",
                footer.entry_count,
                entries.len()
            )));
        }
        if entries.iter().any(|e| e.offset.saturating_add(e.size) > index_start) {
            return Err(ArchiveError::corrupt(format!(
                "entry payload overlaps index in block at {block_start}"
            )));
        }

        blocks.push(entries);
        pos = block_start;
    }

    blocks.reverse();
    Ok(blocks.into_iter().flatten().collect())
}

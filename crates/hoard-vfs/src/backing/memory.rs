//! In-memory backing store.
//!
//! Used for testing and ephemeral archives. Buffers outlive the handles
//! opened on them, so an archive can be closed and reopened; all data is
//! lost when the store is dropped.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use super::{BackingFile, BackingStore};
use crate::error::{VfsError, VfsResult};
use crate::path;

type Buffer = Arc<Mutex<Vec<u8>>>;

/// In-memory backing store.
#[derive(Debug, Default)]
pub struct MemoryBacking {
    files: Mutex<HashMap<String, Buffer>>,
}

impl MemoryBacking {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a resource's bytes.
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        let files = self.files.lock();
        files.get(&path::normalize(path)).map(|b| b.lock().clone())
    }

    /// Replace a resource's bytes, creating it if needed.
    pub fn set_contents(&self, path: &str, data: Vec<u8>) {
        let mut files = self.files.lock();
        files.insert(path::normalize(path), Arc::new(Mutex::new(data)));
    }
}

impl BackingStore for MemoryBacking {
    fn open_file(&self, path: &str, create: bool, _mode: u32) -> VfsResult<Box<dyn BackingFile>> {
        let key = path::normalize(path);
        if key.is_empty() {
            return Err(VfsError::invalid_path(format!("{path} names the root")));
        }

        let mut files = self.files.lock();
        if !create && !files.contains_key(&key) {
            return Err(VfsError::not_found(key));
        }
        let data = files.entry(key).or_default().clone();
        Ok(Box::new(MemoryFile { data, pos: 0 }))
    }
}

/// Cursor over a shared in-memory buffer.
#[derive(Debug, Clone)]
pub struct MemoryFile {
    data: Buffer,
    pos: u64,
}

impl Read for MemoryFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = self.data.lock();
        let start = (self.pos as usize).min(data.len());
        let end = (start + buf.len()).min(data.len());
        buf[..end - start].copy_from_slice(&data[start..end]);
        self.pos = end as u64;
        Ok(end - start)
    }
}

impl Write for MemoryFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut data = self.data.lock();
        let offset = self.pos as usize;
        // Extend if necessary
        if offset + buf.len() > data.len() {
            data.resize(offset + buf.len(), 0);
        }
        data[offset..offset + buf.len()].copy_from_slice(buf);
        self.pos += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for MemoryFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.data.lock().len() as i64;
        let target = match pos {
            SeekFrom::Start(off) => off as i64,
            SeekFrom::End(off) => len + off,
            SeekFrom::Current(off) => self.pos as i64 + off,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of buffer",
            ));
        }
        self.pos = target as u64;
        Ok(self.pos)
    }
}

impl BackingFile for MemoryFile {
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

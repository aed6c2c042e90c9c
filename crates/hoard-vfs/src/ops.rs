//! Filesystem operations trait.
//!
//! The trait every filesystem view in this crate implements: the archive
//! itself and sub-directory views over it.

use crate::error::{VfsError, VfsResult};
use crate::handle::FileHandle;
use crate::path;
use crate::types::{FileInfo, OpenFlags};

/// POSIX-like filesystem operations.
///
/// Paths are slash-separated and normalized before use, so `/a/b`, `a/b`
/// and `a//./b` all name the same file.
pub trait Filesystem: Send + Sync {
    /// Open a file with explicit flags and creation mode.
    fn open_file(&self, path: &str, flags: OpenFlags, mode: u32) -> VfsResult<FileHandle>;

    /// Create (or replace) a file for writing.
    fn create(&self, path: &str) -> VfsResult<FileHandle>;

    /// Open a file for reading.
    fn open(&self, path: &str) -> VfsResult<FileHandle> {
        self.open_file(path, OpenFlags::read_only(), 0)
    }

    /// Get file or directory metadata.
    fn stat(&self, path: &str) -> VfsResult<FileInfo>;

    /// Same as `stat`; there are no symlinks.
    fn lstat(&self, path: &str) -> VfsResult<FileInfo> {
        self.stat(path)
    }

    /// List a directory: subdirectories first, then files, each sorted by path.
    fn read_dir(&self, path: &str) -> VfsResult<Vec<FileInfo>>;

    /// Delete a file.
    fn remove(&self, path: &str) -> VfsResult<()>;

    /// Rename a file.
    fn rename(&self, _from: &str, _to: &str) -> VfsResult<()> {
        Err(VfsError::unsupported("rename"))
    }

    /// Ensure a directory path is usable.
    fn mkdir_all(&self, path: &str, perm: u32) -> VfsResult<()>;

    /// Create a uniquely named temporary file.
    fn temp_file(&self, _dir: &str, _prefix: &str) -> VfsResult<FileHandle> {
        Err(VfsError::unsupported("temp files"))
    }

    /// Join path elements.
    fn join(&self, elems: &[&str]) -> String {
        path::join(elems)
    }

    /// Root of this filesystem as seen by callers.
    fn base(&self) -> &str {
        "/"
    }

    /// Write a whole file in one call.
    fn write_file(&self, path: &str, data: &[u8]) -> VfsResult<()> {
        let mut handle = self.create(path)?;
        let written = write_all(&mut handle, data);
        let closed = handle.close();
        written.and(closed)
    }

    /// Read a whole file in one call.
    fn read_file(&self, path: &str) -> VfsResult<Vec<u8>> {
        let mut handle = self.open(path)?;
        let mut out = Vec::with_capacity(handle.size() as usize);
        let mut buf = [0u8; 32 * 1024];
        loop {
            let n = handle.read(&mut buf)?;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        handle.close()?;
        Ok(out)
    }
}

fn write_all(handle: &mut FileHandle, mut data: &[u8]) -> VfsResult<()> {
    while !data.is_empty() {
        let n = handle.write(data)?;
        data = &data[n..];
    }
    Ok(())
}

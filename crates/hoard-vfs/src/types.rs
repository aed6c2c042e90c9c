//! Core VFS types.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use hoard_archive::IndexEntry;

/// File type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    /// Archive entry.
    File,
    /// Synthetic directory derived from entry names.
    Directory,
}

impl FileType {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }
}

/// Stat result for a file or synthetic directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Normalized archive path (no leading slash; empty for the root).
    pub path: String,
    /// File type.
    pub kind: FileType,
    /// Payload size in bytes. Zero for directories.
    pub size: u64,
    /// Permission bits as stored in the entry header.
    pub perm: u32,
    /// Last modification time.
    pub mtime: SystemTime,
}

impl FileInfo {
    /// Info for an archive entry.
    pub fn file(entry: &IndexEntry) -> Self {
        Self {
            path: entry.name.clone(),
            kind: FileType::File,
            size: entry.size,
            perm: entry.mode,
            mtime: entry.mod_time,
        }
    }

    /// Info for a synthetic directory.
    pub fn directory(path: impl Into<String>, perm: u32, mtime: SystemTime) -> Self {
        Self {
            path: path.into(),
            kind: FileType::Directory,
            size: 0,
            perm,
            mtime,
        }
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("")
    }

    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

/// Open file flags.
///
/// Only two shapes are accepted by the archive filesystem: read-only, and
/// create + truncate + write-only. Anything else is rejected at open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFlags {
    /// Read access requested.
    pub read: bool,
    /// Write access requested.
    pub write: bool,
    /// Append mode.
    pub append: bool,
    /// Create if not exists.
    pub create: bool,
    /// Truncate on open.
    pub truncate: bool,
    /// Exclusive create (fail if exists).
    pub exclusive: bool,
}

impl Default for OpenFlags {
    fn default() -> Self {
        Self::read_only()
    }
}

impl OpenFlags {
    /// Read-only access.
    pub fn read_only() -> Self {
        Self {
            read: true,
            write: false,
            append: false,
            create: false,
            truncate: false,
            exclusive: false,
        }
    }

    /// Create (or replace) with write-only access.
    pub fn create_truncate() -> Self {
        Self {
            read: false,
            write: true,
            create: true,
            truncate: true,
            ..Self::read_only()
        }
    }

    /// Create exclusively (fail if exists).
    pub fn create_exclusive() -> Self {
        Self {
            exclusive: true,
            ..Self::create_truncate()
        }
    }
}

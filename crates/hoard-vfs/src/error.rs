//! VFS error types.

use std::io;

use hoard_archive::ArchiveError;
use thiserror::Error;

/// VFS error type.
#[derive(Debug, Error)]
pub enum VfsError {
    /// No entry or directory at this path.
    #[error("not found: {0}")]
    NotFound(String),

    /// Exclusive create found the name present.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Expected a directory, found a file.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Expected a file, found a directory.
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// Directory not empty.
    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(String),

    /// The archive model cannot express this operation.
    #[error("operation not supported: {0}")]
    Unsupported(String),

    /// Another write handle holds the single writer slot.
    #[error("write already in progress: {0}")]
    WriterBusy(String),

    /// Write attempted on a read handle.
    #[error("file is read-only: {0}")]
    ReadOnlyFile(String),

    /// Read attempted on a write handle.
    #[error("file is write-only: {0}")]
    WriteOnlyFile(String),

    /// Seek attempted on a sequential write handle.
    #[error("file is not seekable: {0}")]
    NotSeekable(String),

    /// I/O attempted on a closed handle.
    #[error("file already closed: {0}")]
    AlreadyClosed(String),

    /// The archive session was closed under an open handle.
    #[error("archive session is closed")]
    SessionClosed,

    /// Seek before the start of the file.
    #[error("invalid offset: {0}")]
    InvalidOffset(i64),

    /// Invalid path.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The store could not produce its index.
    #[error("index unavailable: {0}")]
    IndexUnavailable(#[source] ArchiveError),

    /// Error from the archive store.
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl VfsError {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an AlreadyExists error.
    pub fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists(path.into())
    }

    /// Create a NotADirectory error.
    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    /// Create an IsADirectory error.
    pub fn is_a_directory(path: impl Into<String>) -> Self {
        Self::IsADirectory(path.into())
    }

    /// Create a DirectoryNotEmpty error.
    pub fn directory_not_empty(path: impl Into<String>) -> Self {
        Self::DirectoryNotEmpty(path.into())
    }

    /// Create an Unsupported error.
    pub fn unsupported(what: impl Into<String>) -> Self {
        Self::Unsupported(what.into())
    }

    /// Create a WriterBusy error.
    pub fn writer_busy(path: impl Into<String>) -> Self {
        Self::WriterBusy(path.into())
    }

    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Rewrite the path carried by path-bearing variants.
    pub(crate) fn map_path(self, f: impl FnOnce(String) -> String) -> Self {
        match self {
            Self::NotFound(p) => Self::NotFound(f(p)),
            Self::AlreadyExists(p) => Self::AlreadyExists(f(p)),
            Self::NotADirectory(p) => Self::NotADirectory(f(p)),
            Self::IsADirectory(p) => Self::IsADirectory(f(p)),
            Self::DirectoryNotEmpty(p) => Self::DirectoryNotEmpty(f(p)),
            Self::WriterBusy(p) => Self::WriterBusy(f(p)),
            other => other,
        }
    }
}

/// Convert VfsError to std::io::Error for compatibility.
impl From<VfsError> for io::Error {
    fn from(e: VfsError) -> Self {
        match e {
            VfsError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            VfsError::AlreadyExists(msg) => io::Error::new(io::ErrorKind::AlreadyExists, msg),
            VfsError::NotADirectory(msg) => io::Error::new(io::ErrorKind::NotADirectory, msg),
            VfsError::IsADirectory(msg) => io::Error::new(io::ErrorKind::IsADirectory, msg),
            VfsError::DirectoryNotEmpty(msg) => {
                io::Error::new(io::ErrorKind::DirectoryNotEmpty, msg)
            }
            VfsError::Unsupported(msg) => io::Error::new(io::ErrorKind::Unsupported, msg),
            VfsError::WriterBusy(msg) => io::Error::new(io::ErrorKind::ResourceBusy, msg),
            VfsError::ReadOnlyFile(msg) => io::Error::new(io::ErrorKind::PermissionDenied, msg),
            VfsError::WriteOnlyFile(msg) => io::Error::new(io::ErrorKind::PermissionDenied, msg),
            VfsError::NotSeekable(msg) => io::Error::new(io::ErrorKind::Unsupported, msg),
            VfsError::AlreadyClosed(msg) => io::Error::other(format!("file already closed: {msg}")),
            VfsError::SessionClosed => io::Error::other("archive session is closed"),
            VfsError::InvalidOffset(off) => {
                io::Error::new(io::ErrorKind::InvalidInput, format!("invalid offset: {off}"))
            }
            VfsError::InvalidPath(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            VfsError::Io(e) => e,
            VfsError::Archive(ArchiveError::Io(e)) => e,
            other => io::Error::other(other.to_string()),
        }
    }
}

/// VFS result type.
pub type VfsResult<T> = Result<T, VfsError>;

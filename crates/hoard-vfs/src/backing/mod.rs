//! Backing byte stores.
//!
//! The archive lives in a single resource provided by a [`BackingStore`]:
//! a real file under a root directory, or an in-memory buffer.

mod local;
mod memory;

use std::io::{self, Read, Seek, Write};

use crate::error::VfsResult;

pub use local::LocalBacking;
pub use memory::{MemoryBacking, MemoryFile};

/// An open archive resource.
pub trait BackingFile: Read + Write + Seek + Send {
    /// Push written bytes to durable storage.
    fn sync(&mut self) -> io::Result<()>;
}

/// Provider of archive resources.
pub trait BackingStore: Send + Sync + std::fmt::Debug {
    /// Open `path` for reading and writing.
    ///
    /// With `create`, a missing resource is created empty with permission
    /// bits `mode`; without it, a missing resource is
    /// [`VfsError::NotFound`](crate::VfsError::NotFound).
    fn open_file(&self, path: &str, create: bool, mode: u32) -> VfsResult<Box<dyn BackingFile>>;
}

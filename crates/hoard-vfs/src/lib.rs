//! Hierarchical filesystem over an append-only hoard archive.
//!
//! ```text
//! ArchiveFs / SubFs      POSIX-like operations, path normalization
//!        │
//! Synthesizer            directories derived from entry names
//! IndexView              tombstone-filtered, last-write-wins index
//!        │
//! Session                lazy open/close, single writer slot
//!        │
//! hoard_archive          append-only blocks in one BackingFile
//! ```
//!
//! Files are written once, sequentially, through a single write handle;
//! rewriting a path appends a newer entry and removing it appends a
//! tombstone. Nothing is durable until the filesystem is synced or closed.
//!
//! ```no_run
//! use std::sync::Arc;
//! use hoard_vfs::{ArchiveFs, Filesystem, LocalBacking};
//!
//! let fs = ArchiveFs::new(Arc::new(LocalBacking::new("/srv/archives")), "repo.hoard");
//! fs.write_file("objects/ab/cdef", b"blob")?;
//! for info in fs.read_dir("objects")? {
//!     println!("{} {}", info.path, info.size);
//! }
//! fs.close()?;
//! # Ok::<(), hoard_vfs::VfsError>(())
//! ```

pub mod backing;
mod config;
mod error;
mod fs;
mod handle;
pub mod index_view;
mod ops;
pub mod path;
mod session;
mod subdir;
pub mod synth;
mod types;

pub use backing::{BackingFile, BackingStore, LocalBacking, MemoryBacking};
pub use config::ArchiveFsConfig;
pub use error::{VfsError, VfsResult};
pub use fs::ArchiveFs;
pub use handle::FileHandle;
pub use index_view::IndexView;
pub use ops::Filesystem;
pub use subdir::SubFs;
pub use synth::Synthesizer;
pub use types::{FileInfo, FileType, OpenFlags};

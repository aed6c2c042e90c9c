//! Append-only keyed archive store.
//!
//! An archive is a single resource holding named, immutable entries. New
//! entries are appended; nothing is rewritten. Overwriting a name appends a
//! newer entry and removing a name appends a tombstone, so the live view of
//! the archive is derived by [`Index::filter`].
//!
//! - [`ArchiveReaderWriter`] - Loads the index, appends headers and payloads,
//!   seals blocks on flush
//! - [`Index`] - Raw or filtered entry list with exact and glob lookup
//! - [`glob`] - Shell-style patterns over slash-delimited names

mod block;
mod entry;
mod error;
pub mod glob;
mod index;
mod rw;

pub use entry::{Flags, Header, IndexEntry};
pub use error::{ArchiveError, ArchiveResult};
pub use index::Index;
pub use rw::ArchiveReaderWriter;

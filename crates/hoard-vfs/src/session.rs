//! Archive session: the lazily opened resource and its single writer slot.
//!
//! ```text
//! unopened ──ensure_open──▶ open ──ensure_closed──▶ unopened
//! ```
//!
//! Every filesystem operation and every handle I/O call goes through the
//! one [`Session`] lock, so the append log and its in-memory index are only
//! ever touched by one caller at a time.

use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

use hoard_archive::{ArchiveReaderWriter, Header};

use crate::backing::{BackingFile, BackingStore};
use crate::config::ArchiveFsConfig;
use crate::error::{VfsError, VfsResult};
use crate::index_view::IndexView;

pub(crate) type Archive = ArchiveReaderWriter<Box<dyn BackingFile>>;

/// Shared owner of the session state.
#[derive(Debug)]
pub(crate) struct Session {
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(backing: Arc<dyn BackingStore>, path: String, config: ArchiveFsConfig) -> Self {
        Self {
            state: Mutex::new(SessionState {
                backing,
                path,
                config,
                archive: None,
                writer_busy: false,
                generation: 0,
            }),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock()
    }
}

pub(crate) struct SessionState {
    backing: Arc<dyn BackingStore>,
    path: String,
    config: ArchiveFsConfig,
    archive: Option<Archive>,
    writer_busy: bool,
    /// Bumped on every open, so handles from an earlier session can tell.
    generation: u64,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("path", &self.path)
            .field("open", &self.archive.is_some())
            .field("writer_busy", &self.writer_busy)
            .field("generation", &self.generation)
            .finish()
    }
}

impl SessionState {
    pub fn is_open(&self) -> bool {
        self.archive.is_some()
    }

    pub fn writer_busy(&self) -> bool {
        self.writer_busy
    }

    /// Open the backing resource and load the archive, unless already open.
    pub fn ensure_open(&mut self) -> VfsResult<&mut Archive> {
        if self.archive.is_none() {
            let file = self.backing.open_file(
                &self.path,
                self.config.create_if_missing,
                self.config.archive_mode,
            )?;
            // The resource is dropped (closed) again if the archive fails to load.
            let archive = ArchiveReaderWriter::new(file).map_err(VfsError::IndexUnavailable)?;
            self.generation += 1;
            tracing::info!(
                path = %self.path,
                entries = archive.index().len(),
                generation = self.generation,
                "archive session opened"
            );
            self.archive = Some(archive);
        }
        self.archive_mut()
    }

    /// Flush and release the archive and its resource, if open.
    ///
    /// A failed flush leaves the session open so the caller can retry.
    pub fn ensure_closed(&mut self) -> VfsResult<()> {
        let Some(archive) = self.archive.as_mut() else {
            return Ok(());
        };
        archive.flush()?;

        if let Some(archive) = self.archive.take() {
            let mut file = archive.close()?;
            if self.config.sync_on_close {
                file.sync()?;
            }
        }
        if self.writer_busy {
            tracing::warn!(path = %self.path, "archive session closed with a write handle open");
        }
        self.writer_busy = false;
        tracing::info!(path = %self.path, "archive session closed");
        Ok(())
    }

    /// Flush pending entries and sync the resource without closing.
    ///
    /// Fails with `WriterBusy` while a write handle is open, since a flush
    /// would seal its entry early.
    pub fn sync(&mut self) -> VfsResult<()> {
        if self.writer_busy {
            return Err(VfsError::writer_busy(self.path.as_str()));
        }
        if let Some(archive) = self.archive.as_mut() {
            archive.flush()?;
            archive.get_mut().sync()?;
        }
        Ok(())
    }

    pub fn archive_mut(&mut self) -> VfsResult<&mut Archive> {
        self.archive.as_mut().ok_or(VfsError::SessionClosed)
    }

    /// Fresh tombstone-filtered view of the index.
    pub fn view(&self) -> VfsResult<IndexView> {
        let archive = self.archive.as_ref().ok_or(VfsError::SessionClosed)?;
        Ok(IndexView::new(&archive.index()))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Append an entry header and take the writer slot.
    ///
    /// Fails immediately with `WriterBusy` if the slot is taken. Returns
    /// the session generation the write handle is bound to.
    pub fn begin_write(&mut self, header: Header) -> VfsResult<u64> {
        if self.writer_busy {
            return Err(VfsError::writer_busy(header.name));
        }
        self.archive_mut()?.write_header(header)?;
        self.writer_busy = true;
        Ok(self.generation)
    }

    /// Flush and give back the writer slot taken in `generation`.
    ///
    /// A handle outliving its session has nothing left to release.
    pub fn end_write(&mut self, generation: u64) -> VfsResult<()> {
        if generation != self.generation || !self.writer_busy || self.archive.is_none() {
            return Ok(());
        }
        self.writer_busy = false;
        self.archive_mut()?.flush()?;
        Ok(())
    }
}

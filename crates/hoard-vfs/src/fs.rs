//! The archive filesystem.

use std::sync::Arc;
use std::time::SystemTime;

use hoard_archive::Header;

use crate::backing::BackingStore;
use crate::config::ArchiveFsConfig;
use crate::error::{VfsError, VfsResult};
use crate::handle::FileHandle;
use crate::ops::Filesystem;
use crate::path;
use crate::session::{Session, SessionState};
use crate::subdir::SubFs;
use crate::synth::Synthesizer;
use crate::types::{FileInfo, OpenFlags};

/// A hierarchical filesystem stored in one append-only archive.
///
/// The archive is opened on first use and stays open until [`close`]
/// (or [`sync`] to make writes durable without closing). Clones share the
/// same session.
///
/// Files are immutable once written: `create` appends a fresh entry that
/// supersedes any earlier one of the same name, and `remove` appends a
/// tombstone. Directories are never stored; they exist while some file
/// lives beneath them.
///
/// [`close`]: ArchiveFs::close
/// [`sync`]: ArchiveFs::sync
#[derive(Debug, Clone)]
pub struct ArchiveFs {
    session: Arc<Session>,
    config: ArchiveFsConfig,
}

impl ArchiveFs {
    /// Filesystem over the archive at `path` in `backing`, with default settings.
    pub fn new(backing: Arc<dyn BackingStore>, path: impl Into<String>) -> Self {
        Self::with_config(backing, path, ArchiveFsConfig::default())
    }

    pub fn with_config(
        backing: Arc<dyn BackingStore>,
        path: impl Into<String>,
        config: ArchiveFsConfig,
    ) -> Self {
        let session = Session::new(backing, path.into(), config.clone());
        Self {
            session: Arc::new(session),
            config,
        }
    }

    pub fn config(&self) -> &ArchiveFsConfig {
        &self.config
    }

    /// Whether the archive session is currently open.
    pub fn is_open(&self) -> bool {
        self.session.lock().is_open()
    }

    /// A view of this filesystem rooted at `dir`.
    pub fn dir(&self, dir: &str) -> SubFs<ArchiveFs> {
        SubFs::new(self.clone(), dir)
    }

    /// Flush pending entries and sync the archive to durable storage.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn sync(&self) -> VfsResult<()> {
        self.session.lock().sync()
    }

    /// Flush and close the archive session.
    ///
    /// Must be called before the process exits, or the entries written
    /// since the last flush are lost. Closing a closed filesystem is a
    /// no-op; the next operation reopens the archive.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn close(&self) -> VfsResult<()> {
        self.session.lock().ensure_closed()
    }

    fn create_entry(
        &self,
        state: &mut SessionState,
        key: String,
        flags: OpenFlags,
        mode: u32,
    ) -> VfsResult<FileHandle> {
        if key.is_empty() {
            return Err(VfsError::is_a_directory("/"));
        }
        if state.writer_busy() {
            return Err(VfsError::writer_busy(key));
        }

        let view = state.view()?;
        let synth = Synthesizer::new(&view, self.config.dir_mode);
        if synth.stat_dir(&key).is_some() {
            return Err(VfsError::is_a_directory(key));
        }
        if let Some(file) = view.file_ancestor(&key) {
            return Err(VfsError::not_a_directory(file));
        }
        if flags.exclusive && view.find(&key).is_some() {
            return Err(VfsError::already_exists(key));
        }

        let generation = state.begin_write(Header::new(key.as_str(), mode, SystemTime::now()))?;
        tracing::debug!(name = %key, mode, "write handle opened");
        Ok(FileHandle::writer(key, self.session.clone(), generation))
    }

    fn open_entry(&self, state: &mut SessionState, key: String) -> VfsResult<FileHandle> {
        let view = state.view()?;
        if let Some(entry) = view.find(&key) {
            return Ok(FileHandle::reader(key, self.session.clone(), entry.clone()));
        }
        let synth = Synthesizer::new(&view, self.config.dir_mode);
        if key.is_empty() || synth.stat_dir(&key).is_some() {
            return Err(VfsError::is_a_directory(display(&key)));
        }
        Err(VfsError::not_found(key))
    }
}

/// Reject flag combinations an append-only archive cannot honour.
fn check_flags(flags: &OpenFlags) -> VfsResult<()> {
    if flags.create && !flags.truncate {
        return Err(VfsError::unsupported("create without truncate"));
    }
    if flags.append {
        return Err(VfsError::unsupported("append"));
    }
    if flags.create && flags.read {
        return Err(VfsError::unsupported("read-write"));
    }
    if !flags.create && flags.write {
        return Err(VfsError::unsupported("write without create"));
    }
    Ok(())
}

fn display(key: &str) -> &str {
    if key.is_empty() { "/" } else { key }
}

impl Filesystem for ArchiveFs {
    #[tracing::instrument(level = "debug", skip(self, flags))]
    fn open_file(&self, path: &str, flags: OpenFlags, mode: u32) -> VfsResult<FileHandle> {
        check_flags(&flags)?;
        let key = path::normalize(path);

        let mut state = self.session.lock();
        state.ensure_open()?;
        if flags.create {
            self.create_entry(&mut state, key, flags, mode)
        } else {
            self.open_entry(&mut state, key)
        }
    }

    fn create(&self, path: &str) -> VfsResult<FileHandle> {
        self.open_file(path, OpenFlags::create_truncate(), self.config.file_mode)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    fn stat(&self, path: &str) -> VfsResult<FileInfo> {
        let key = path::normalize(path);
        let mut state = self.session.lock();
        state.ensure_open()?;

        let view = state.view()?;
        if let Some(entry) = view.find(&key) {
            return Ok(FileInfo::file(entry));
        }
        Synthesizer::new(&view, self.config.dir_mode)
            .stat_dir(&key)
            .ok_or_else(|| VfsError::not_found(display(&key)))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    fn read_dir(&self, path: &str) -> VfsResult<Vec<FileInfo>> {
        let key = path::normalize(path);
        let mut state = self.session.lock();
        state.ensure_open()?;

        let view = state.view()?;
        if view.find(&key).is_some() {
            return Err(VfsError::not_a_directory(key));
        }
        let synth = Synthesizer::new(&view, self.config.dir_mode);
        let mut entries = synth.list_child_dirs(&key);
        entries.extend(synth.list_files(&key)?);
        Ok(entries)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    fn remove(&self, path: &str) -> VfsResult<()> {
        let key = path::normalize(path);
        let mut state = self.session.lock();
        state.ensure_open()?;

        let view = state.view()?;
        if view.find(&key).is_none() {
            return match Synthesizer::new(&view, self.config.dir_mode).stat_dir(&key) {
                Some(_) => Err(VfsError::directory_not_empty(display(&key))),
                None => Err(VfsError::not_found(display(&key))),
            };
        }
        if state.writer_busy() {
            return Err(VfsError::writer_busy(key));
        }

        state
            .archive_mut()?
            .write_header(Header::tombstone(key.as_str(), SystemTime::now()))?;
        tracing::debug!(name = %key, "tombstone written");
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    fn mkdir_all(&self, path: &str, _perm: u32) -> VfsResult<()> {
        let key = path::normalize(path);
        let mut state = self.session.lock();
        state.ensure_open()?;

        let view = state.view()?;
        if view.find(&key).is_some() {
            return Err(VfsError::not_a_directory(key));
        }
        if let Some(file) = view.file_ancestor(&key) {
            return Err(VfsError::not_a_directory(file));
        }
        Ok(())
    }
}

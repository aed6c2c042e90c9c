//! Open file handles.
//!
//! A handle is either a reader over a snapshot of one entry or the single
//! sequential writer appending a new entry. Direction is fixed at open
//! time; the wrong direction fails with `WriteOnlyFile` / `ReadOnlyFile`.

use std::io::{self, SeekFrom};
use std::sync::Arc;

use hoard_archive::IndexEntry;

use crate::error::{VfsError, VfsResult};
use crate::session::Session;

enum HandleState {
    Read { entry: IndexEntry, pos: u64 },
    Write { generation: u64, written: u64 },
    Closed,
}

/// An open file in an [`ArchiveFs`](crate::ArchiveFs).
///
/// Write handles must be closed to release the writer slot. A write handle
/// dropped while still open is closed on drop, and any flush error is only
/// logged.
pub struct FileHandle {
    name: String,
    session: Arc<Session>,
    state: HandleState,
}

impl FileHandle {
    pub(crate) fn reader(name: String, session: Arc<Session>, entry: IndexEntry) -> Self {
        Self {
            name,
            session,
            state: HandleState::Read { entry, pos: 0 },
        }
    }

    pub(crate) fn writer(name: String, session: Arc<Session>, generation: u64) -> Self {
        Self {
            name,
            session,
            state: HandleState::Write {
                generation,
                written: 0,
            },
        }
    }

    /// Rename the handle as seen by the caller, e.g. relative to a sub-filesystem.
    pub(crate) fn with_name(mut self, name: String) -> Self {
        self.name = name;
        self
    }

    /// The path this handle was opened with.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, HandleState::Closed)
    }

    pub fn is_writer(&self) -> bool {
        matches!(self.state, HandleState::Write { .. })
    }

    /// Payload size: the entry size for readers, bytes written so far for writers.
    pub fn size(&self) -> u64 {
        match &self.state {
            HandleState::Read { entry, .. } => entry.size,
            HandleState::Write { written, .. } => *written,
            HandleState::Closed => 0,
        }
    }

    /// Read from the current position, advancing it.
    pub fn read(&mut self, buf: &mut [u8]) -> VfsResult<usize> {
        match &mut self.state {
            HandleState::Read { entry, pos } => {
                let n = self
                    .session
                    .lock()
                    .archive_mut()?
                    .read_at(entry, *pos, buf)?;
                *pos += n as u64;
                Ok(n)
            }
            HandleState::Write { .. } => Err(VfsError::WriteOnlyFile(self.name.clone())),
            HandleState::Closed => Err(VfsError::AlreadyClosed(self.name.clone())),
        }
    }

    /// Read at an absolute offset without moving the position.
    pub fn read_at(&mut self, buf: &mut [u8], offset: u64) -> VfsResult<usize> {
        match &self.state {
            HandleState::Read { entry, .. } => Ok(self
                .session
                .lock()
                .archive_mut()?
                .read_at(entry, offset, buf)?),
            HandleState::Write { .. } => Err(VfsError::WriteOnlyFile(self.name.clone())),
            HandleState::Closed => Err(VfsError::AlreadyClosed(self.name.clone())),
        }
    }

    /// Move the read position. Positions past the end are allowed and read
    /// nothing; positions before the start fail with `InvalidOffset`.
    pub fn seek(&mut self, target: SeekFrom) -> VfsResult<u64> {
        match &mut self.state {
            HandleState::Read { entry, pos } => {
                let new = match target {
                    SeekFrom::Start(off) => i128::from(off),
                    SeekFrom::Current(off) => i128::from(*pos) + i128::from(off),
                    SeekFrom::End(off) => i128::from(entry.size) + i128::from(off),
                };
                if new < 0 {
                    return Err(VfsError::InvalidOffset(
                        i64::try_from(new).unwrap_or(i64::MIN),
                    ));
                }
                *pos = u64::try_from(new).unwrap_or(u64::MAX);
                Ok(*pos)
            }
            HandleState::Write { .. } => Err(VfsError::NotSeekable(self.name.clone())),
            HandleState::Closed => Err(VfsError::AlreadyClosed(self.name.clone())),
        }
    }

    /// Append bytes to the entry being written.
    pub fn write(&mut self, buf: &[u8]) -> VfsResult<usize> {
        match &mut self.state {
            HandleState::Write {
                generation,
                written,
            } => {
                let mut state = self.session.lock();
                if state.generation() != *generation {
                    return Err(VfsError::SessionClosed);
                }
                let n = state.archive_mut()?.write(buf)?;
                *written += n as u64;
                Ok(n)
            }
            HandleState::Read { .. } => Err(VfsError::ReadOnlyFile(self.name.clone())),
            HandleState::Closed => Err(VfsError::AlreadyClosed(self.name.clone())),
        }
    }

    /// Close the handle.
    ///
    /// Closing a writer flushes the archive and frees the writer slot.
    /// A second close fails with `AlreadyClosed` and does nothing else.
    pub fn close(&mut self) -> VfsResult<()> {
        match std::mem::replace(&mut self.state, HandleState::Closed) {
            HandleState::Closed => Err(VfsError::AlreadyClosed(self.name.clone())),
            HandleState::Read { .. } => Ok(()),
            HandleState::Write {
                generation,
                written,
            } => {
                tracing::debug!(name = %self.name, bytes = written, "closing write handle");
                self.session.lock().end_write(generation)
            }
        }
    }
}

impl std::fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self.state {
            HandleState::Read { .. } => "read",
            HandleState::Write { .. } => "write",
            HandleState::Closed => "closed",
        };
        f.debug_struct("FileHandle")
            .field("name", &self.name)
            .field("mode", &mode)
            .field("size", &self.size())
            .finish()
    }
}

impl Drop for FileHandle {
    fn drop(&mut self) {
        if self.is_writer() {
            tracing::warn!(name = %self.name, "write handle dropped without close");
            if let Err(e) = self.close() {
                tracing::error!(name = %self.name, error = %e, "failed to close dropped write handle");
            }
        }
    }
}

impl io::Read for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(FileHandle::read(self, buf)?)
    }
}

impl io::Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(FileHandle::write(self, buf)?)
    }

    /// Entries are sealed on close; there is nothing to flush early.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Seek for FileHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(FileHandle::seek(self, pos)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backing::MemoryBacking;
    use crate::config::ArchiveFsConfig;
    use hoard_archive::Header;
    use std::time::SystemTime;

    fn open_session() -> Arc<Session> {
        let session = Arc::new(Session::new(
            Arc::new(MemoryBacking::new()),
            "h.hoard".into(),
            ArchiveFsConfig::default(),
        ));
        session.lock().ensure_open().unwrap();
        session
    }

    fn write_entry(session: &Arc<Session>, name: &str, data: &[u8]) -> IndexEntry {
        let generation = session
            .lock()
            .begin_write(Header::new(name, 0o644, SystemTime::now()))
            .unwrap();
        let mut w = FileHandle::writer(name.into(), session.clone(), generation);
        w.write(data).unwrap();
        w.close().unwrap();
        session.lock().view().unwrap().find(name).unwrap().clone()
    }

    #[test]
    fn test_read_and_seek() {
        let session = open_session();
        let entry = write_entry(&session, "f", b"0123456789");
        let mut r = FileHandle::reader("f".into(), session, entry);

        let mut buf = [0u8; 4];
        assert_eq!(r.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"0123");
        assert_eq!(r.seek(SeekFrom::Current(2)).unwrap(), 6);
        assert_eq!(r.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"6789");
        assert_eq!(r.read(&mut buf).unwrap(), 0);

        assert_eq!(r.seek(SeekFrom::End(-3)).unwrap(), 7);
        assert_eq!(r.read_at(&mut buf[..2], 1).unwrap(), 2);
        assert_eq!(&buf[..2], b"12");
        assert_eq!(r.seek(SeekFrom::Current(0)).unwrap(), 7);

        assert_eq!(r.seek(SeekFrom::Start(100)).unwrap(), 100);
        assert_eq!(r.read(&mut buf).unwrap(), 0);
        assert!(matches!(
            r.seek(SeekFrom::Current(-101)),
            Err(VfsError::InvalidOffset(-1))
        ));
    }

    #[test]
    fn test_wrong_direction() {
        let session = open_session();
        let entry = write_entry(&session, "f", b"abc");
        let mut r = FileHandle::reader("f".into(), session.clone(), entry);
        assert!(matches!(r.write(b"x"), Err(VfsError::ReadOnlyFile(_))));

        let generation = session
            .lock()
            .begin_write(Header::new("g", 0o644, SystemTime::now()))
            .unwrap();
        let mut w = FileHandle::writer("g".into(), session, generation);
        let mut buf = [0u8; 1];
        assert!(matches!(w.read(&mut buf), Err(VfsError::WriteOnlyFile(_))));
        assert!(matches!(w.read_at(&mut buf, 0), Err(VfsError::WriteOnlyFile(_))));
        assert!(matches!(w.seek(SeekFrom::Start(0)), Err(VfsError::NotSeekable(_))));
        w.close().unwrap();
    }

    #[test]
    fn test_double_close() {
        let session = open_session();
        let entry = write_entry(&session, "f", b"abc");
        let mut r = FileHandle::reader("f".into(), session.clone(), entry);
        r.close().unwrap();
        assert!(r.is_closed());
        assert!(matches!(r.close(), Err(VfsError::AlreadyClosed(_))));
        let mut buf = [0u8; 1];
        assert!(matches!(r.read(&mut buf), Err(VfsError::AlreadyClosed(_))));

        let generation = session
            .lock()
            .begin_write(Header::new("g", 0o644, SystemTime::now()))
            .unwrap();
        let mut w = FileHandle::writer("g".into(), session.clone(), generation);
        w.close().unwrap();
        assert!(matches!(w.close(), Err(VfsError::AlreadyClosed(_))));
        assert!(matches!(w.write(b"x"), Err(VfsError::AlreadyClosed(_))));
        assert!(!session.lock().writer_busy());
    }

    #[test]
    fn test_drop_releases_writer() {
        let session = open_session();
        let generation = session
            .lock()
            .begin_write(Header::new("g", 0o644, SystemTime::now()))
            .unwrap();
        let mut w = FileHandle::writer("g".into(), session.clone(), generation);
        w.write(b"partial").unwrap();
        drop(w);

        let mut state = session.lock();
        assert!(!state.writer_busy());
        assert_eq!(state.archive_mut().unwrap().pending(), 0);
        assert_eq!(state.view().unwrap().find("g").unwrap().size, 7);
    }

    #[test]
    fn test_write_after_session_close() {
        let session = open_session();
        let generation = session
            .lock()
            .begin_write(Header::new("g", 0o644, SystemTime::now()))
            .unwrap();
        let mut w = FileHandle::writer("g".into(), session.clone(), generation);
        session.lock().ensure_closed().unwrap();
        assert!(matches!(w.write(b"x"), Err(VfsError::SessionClosed)));
        w.close().unwrap();
    }

    #[test]
    fn test_std_io_traits() {
        use std::io::{Read, Write};

        let session = open_session();
        let generation = session
            .lock()
            .begin_write(Header::new("io", 0o644, SystemTime::now()))
            .unwrap();
        let mut w = FileHandle::writer("io".into(), session.clone(), generation);
        w.write_all(b"through std::io").unwrap();
        assert_eq!(w.size(), 15);
        w.close().unwrap();

        let entry = session.lock().view().unwrap().find("io").unwrap().clone();
        let mut r = FileHandle::reader("io".into(), session, entry);
        let mut out = String::new();
        r.read_to_string(&mut out).unwrap();
        assert_eq!(out, "through std::io");

        let err = Write::write(&mut r, b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }
}

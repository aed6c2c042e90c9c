//! Local filesystem backing store.
//!
//! Archive resources are real files under a root directory, with path
//! security to prevent escaping it.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};

use super::{BackingFile, BackingStore};
use crate::error::{VfsError, VfsResult};

/// Local filesystem backing store.
///
/// All resource paths are relative to `root`. For example, if `root` is
/// `/srv/archives`, then `open_file("repo.hoard", ..)` opens
/// `/srv/archives/repo.hoard`.
#[derive(Debug, Clone)]
pub struct LocalBacking {
    root: PathBuf,
}

impl LocalBacking {
    /// Create a backing store rooted at the given directory.
    ///
    /// The root is canonicalized at construction time to handle symlinks
    /// (e.g. macOS `/tmp` → `/private/tmp`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root: PathBuf = root.into();
        let root = root.canonicalize().unwrap_or(root);
        Self { root }
    }

    /// Get the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative resource path within the root.
    ///
    /// Returns an error if the path escapes the root via `..`.
    fn resolve(&self, path: &str) -> VfsResult<PathBuf> {
        let mut full = self.root.clone();
        let mut depth = 0usize;
        for component in Path::new(path).components() {
            match component {
                Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
                Component::ParentDir => {
                    if depth == 0 {
                        return Err(VfsError::invalid_path(format!(
                            "{path} escapes {}",
                            self.root.display()
                        )));
                    }
                    full.pop();
                    depth -= 1;
                }
                Component::Normal(s) => {
                    full.push(s);
                    depth += 1;
                }
            }
        }

        if depth == 0 {
            return Err(VfsError::invalid_path(format!("{path} names the root")));
        }
        Ok(full)
    }
}

impl BackingStore for LocalBacking {
    fn open_file(&self, path: &str, create: bool, mode: u32) -> VfsResult<Box<dyn BackingFile>> {
        let full = self.resolve(path)?;

        if create {
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut options = OpenOptions::new();
        options.read(true).write(true).create(create).truncate(false);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;

        let file = options.open(&full).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => VfsError::not_found(full.display().to_string()),
            _ => VfsError::from(e),
        })?;

        tracing::debug!(path = %full.display(), create, "opened local archive resource");
        Ok(Box::new(file))
    }
}

impl BackingFile for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

//! Sub-directory views.
//!
//! A [`SubFs`] re-roots another filesystem at one of its directories.
//! Paths going in are joined under the base; paths coming back out (in
//! metadata and handle names) are made relative to it again. `..` cannot
//! climb out of the base.

use crate::error::{VfsError, VfsResult};
use crate::handle::FileHandle;
use crate::ops::Filesystem;
use crate::path;
use crate::types::{FileInfo, OpenFlags};

/// A filesystem rooted at a directory of another filesystem.
#[derive(Debug, Clone)]
pub struct SubFs<F> {
    inner: F,
    base: String,
    root: String,
}

impl<F: Filesystem> SubFs<F> {
    pub fn new(inner: F, base: &str) -> Self {
        let base = path::normalize(base);
        let root = format!("/{base}");
        Self { inner, base, root }
    }

    /// A view rooted at `dir` below this one.
    pub fn dir(&self, dir: &str) -> SubFs<F>
    where
        F: Clone,
    {
        SubFs::new(self.inner.clone(), &self.full(dir))
    }

    fn full(&self, p: &str) -> String {
        path::join(&[self.base.as_str(), path::normalize(p).as_str()])
    }

    /// Report an inner error path relative to this view. Paths at or
    /// above the base show as the view root.
    fn relative_err(&self, e: VfsError) -> VfsError {
        e.map_path(|p| match path::strip_base(&p, &self.base) {
            Some("") | None => "/".to_string(),
            Some(rel) => rel.to_string(),
        })
    }

    fn relative(&self, mut info: FileInfo) -> FileInfo {
        if let Some(rel) = path::strip_base(&info.path, &self.base) {
            info.path = rel.to_string();
        }
        info
    }
}

impl<F: Filesystem> Filesystem for SubFs<F> {
    fn open_file(&self, p: &str, flags: OpenFlags, mode: u32) -> VfsResult<FileHandle> {
        let handle = self
            .inner
            .open_file(&self.full(p), flags, mode)
            .map_err(|e| self.relative_err(e))?;
        Ok(handle.with_name(path::normalize(p)))
    }

    fn create(&self, p: &str) -> VfsResult<FileHandle> {
        let handle = self
            .inner
            .create(&self.full(p))
            .map_err(|e| self.relative_err(e))?;
        Ok(handle.with_name(path::normalize(p)))
    }

    fn stat(&self, p: &str) -> VfsResult<FileInfo> {
        self.inner
            .stat(&self.full(p))
            .map(|info| self.relative(info))
            .map_err(|e| self.relative_err(e))
    }

    fn read_dir(&self, p: &str) -> VfsResult<Vec<FileInfo>> {
        let entries = self
            .inner
            .read_dir(&self.full(p))
            .map_err(|e| self.relative_err(e))?;
        Ok(entries.into_iter().map(|info| self.relative(info)).collect())
    }

    fn remove(&self, p: &str) -> VfsResult<()> {
        self.inner
            .remove(&self.full(p))
            .map_err(|e| self.relative_err(e))
    }

    fn rename(&self, from: &str, to: &str) -> VfsResult<()> {
        self.inner
            .rename(&self.full(from), &self.full(to))
            .map_err(|e| self.relative_err(e))
    }

    fn mkdir_all(&self, p: &str, perm: u32) -> VfsResult<()> {
        self.inner
            .mkdir_all(&self.full(p), perm)
            .map_err(|e| self.relative_err(e))
    }

    fn temp_file(&self, dir: &str, prefix: &str) -> VfsResult<FileHandle> {
        self.inner
            .temp_file(&self.full(dir), prefix)
            .map_err(|e| self.relative_err(e))
    }

    fn base(&self) -> &str {
        &self.root
    }
}

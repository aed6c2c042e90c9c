//! Synthetic directories derived from entry names.
//!
//! The archive stores no directory records. A directory exists exactly while
//! some live entry has it as a proper ancestor, and its modification time is
//! the newest modification time of anything beneath it. Nothing here is
//! cached: every answer is recomputed from the [`IndexView`] it is given.

use std::collections::BTreeMap;
use std::time::SystemTime;

use hoard_archive::glob;

use crate::error::VfsResult;
use crate::index_view::IndexView;
use crate::path;
use crate::types::FileInfo;

/// Directory queries over one index view.
pub struct Synthesizer<'a> {
    view: &'a IndexView,
    dir_perm: u32,
}

impl<'a> Synthesizer<'a> {
    pub fn new(view: &'a IndexView, dir_perm: u32) -> Self {
        Self { view, dir_perm }
    }

    /// Entries that are direct children of `dir`, sorted by path.
    pub fn list_files(&self, dir: &str) -> VfsResult<Vec<FileInfo>> {
        let pattern = format!("{}*", glob::escape(&path::child_prefix(dir)));
        let mut files: Vec<FileInfo> = self
            .view
            .search(&pattern)?
            .into_iter()
            .map(FileInfo::file)
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    /// Immediate child directories of `dir`, sorted by path.
    ///
    /// Each child's mtime is the newest mtime of any entry nested under it.
    pub fn list_child_dirs(&self, dir: &str) -> Vec<FileInfo> {
        let prefix = path::child_prefix(dir);
        let mut dirs: BTreeMap<&str, SystemTime> = BTreeMap::new();

        for entry in self.view.nested(dir) {
            let rest = &entry.name[prefix.len()..];
            let Some(cut) = rest.find('/') else {
                continue;
            };
            let child = &entry.name[..prefix.len() + cut];
            let newest = dirs.entry(child).or_insert(entry.mod_time);
            if *newest < entry.mod_time {
                *newest = entry.mod_time;
            }
        }

        dirs.into_iter()
            .map(|(child, mtime)| FileInfo::directory(child, self.dir_perm, mtime))
            .collect()
    }

    /// `dir` itself, if any live entry is nested beneath it.
    pub fn stat_dir(&self, dir: &str) -> Option<FileInfo> {
        self.view
            .nested(dir)
            .map(|e| e.mod_time)
            .max()
            .map(|mtime| FileInfo::directory(dir, self.dir_perm, mtime))
    }
}

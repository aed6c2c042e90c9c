//! Tombstone-filtered view over the archive index.

use hoard_archive::{Index, IndexEntry};

use crate::error::VfsResult;
use crate::path;

/// Live entries of the archive at one point in time.
///
/// Built from the raw index on every access so headers appended in the
/// current session, tombstones included, are always reflected. Each name
/// appears at most once, resolved to its most recent non-deleted entry.
#[derive(Debug, Clone)]
pub struct IndexView {
    live: Index,
}

impl IndexView {
    /// Filter a raw index down to live entries.
    pub fn new(raw: &Index) -> Self {
        Self { live: raw.filter() }
    }

    /// Live entry with exactly this name.
    pub fn find(&self, name: &str) -> Option<&IndexEntry> {
        self.live.find(name)
    }

    /// Live entries whose full name matches a glob pattern.
    pub fn search(&self, pattern: &str) -> VfsResult<Vec<&IndexEntry>> {
        Ok(self.live.glob(pattern)?)
    }

    /// Live entries strictly nested under `dir` at any depth.
    ///
    /// For the root this is every entry.
    pub fn nested<'a>(&'a self, dir: &str) -> impl Iterator<Item = &'a IndexEntry> + use<'a> {
        let prefix = path::child_prefix(dir);
        self.live
            .iter()
            .filter(move |e| e.name.len() > prefix.len() && e.name.starts_with(&prefix))
    }

    /// Nearest proper ancestor of `key` that is itself a live entry.
    pub fn file_ancestor<'k>(&self, key: &'k str) -> Option<&'k str> {
        path::ancestors(key).find(|a| self.find(a).is_some())
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoard_archive::{ArchiveReaderWriter, Header};
    use std::io::Cursor;
    use std::time::SystemTime;

    fn view(ops: &[(&str, bool)]) -> IndexView {
        let mut rw = ArchiveReaderWriter::new(Cursor::new(Vec::new())).unwrap();
        for (name, delete) in ops {
            let header = if *delete {
                Header::tombstone(*name, SystemTime::now())
            } else {
                Header::new(*name, 0o644, SystemTime::now())
            };
            rw.write_header(header).unwrap();
        }
        IndexView::new(&rw.index())
    }

    #[test]
    fn test_find_excludes_tombstones() {
        let v = view(&[("a", false), ("b", false), ("a", true)]);
        assert!(v.find("a").is_none());
        assert!(v.find("b").is_some());
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn test_search_excludes_tombstones() {
        let v = view(&[("d/x", false), ("d/y", false), ("d/x", true)]);
        let found = v.search("d/*").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "d/y");
    }

    #[test]
    fn test_search_bad_pattern() {
        let v = view(&[("a", false)]);
        assert!(v.search("[").is_err());
    }

    #[test]
    fn test_nested() {
        let v = view(&[("a", false), ("a/b", false), ("a/b/c", false), ("ab", false)]);
        let under_a: Vec<_> = v.nested("a").map(|e| e.name.as_str()).collect();
        assert_eq!(under_a, vec!["a/b", "a/b/c"]);
        assert_eq!(v.nested("").count(), 4);
    }

    #[test]
    fn test_file_ancestor() {
        let v = view(&[("a", false), ("x/y", false)]);
        assert_eq!(v.file_ancestor("a/b/c"), Some("a"));
        assert_eq!(v.file_ancestor("x/y/z"), Some("x/y"));
        assert_eq!(v.file_ancestor("x/z"), None);
    }
}

//! The archive index: every entry header in append order.

use std::collections::HashMap;

use crate::entry::IndexEntry;
use crate::error::ArchiveResult;
use crate::glob::Pattern;

/// A list of index entries in append order.
///
/// The raw index returned by the store contains every header ever written,
/// including tombstones and superseded versions. [`Index::filter`] reduces it
/// to the live view.
#[derive(Debug, Clone, Default)]
pub struct Index {
    entries: Vec<IndexEntry>,
}

impl Index {
    pub fn new(entries: Vec<IndexEntry>) -> Self {
        Self { entries }
    }

    /// Reduce to the live entries: one per name, the most recently appended,
    /// with names whose latest entry is a tombstone removed.
    ///
    /// Surviving entries keep their append order.
    pub fn filter(&self) -> Index {
        let mut latest: HashMap<&str, usize> = HashMap::new();
        for (pos, entry) in self.entries.iter().enumerate() {
            latest.insert(entry.name.as_str(), pos);
        }

        let entries = self
            .entries
            .iter()
            .enumerate()
            .filter(|(pos, entry)| latest.get(entry.name.as_str()) == Some(pos) && !entry.is_deleted())
            .map(|(_, entry)| entry.clone())
            .collect();

        Index { entries }
    }

    /// Most recently appended entry with exactly this name.
    pub fn find(&self, name: &str) -> Option<&IndexEntry> {
        self.entries.iter().rev().find(|e| e.name == name)
    }

    /// Entries whose full name matches the glob `pattern`.
    pub fn glob(&self, pattern: &str) -> ArchiveResult<Vec<&IndexEntry>> {
        let pattern = Pattern::new(pattern)?;
        Ok(self
            .entries
            .iter()
            .filter(|e| pattern.matches(&e.name))
            .collect())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IndexEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Index {
    type Item = &'a IndexEntry;
    type IntoIter = std::slice::Iter<'a, IndexEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

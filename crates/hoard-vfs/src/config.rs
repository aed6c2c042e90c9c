//! Archive filesystem configuration.
//!
//! Loaded from a RON file; every field is optional:
//!
//! ```ron
//! (
//!     file_mode: 0o644,
//!     dir_mode: 0o755,
//!     archive_mode: 0o644,
//!     create_if_missing: true,
//!     sync_on_close: false,
//! )
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{VfsError, VfsResult};

/// Settings for an [`ArchiveFs`](crate::ArchiveFs).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveFsConfig {
    /// Mode recorded for entries made with `create`.
    pub file_mode: u32,
    /// Mode reported for synthetic directories.
    pub dir_mode: u32,
    /// Mode used when the archive resource itself is created.
    pub archive_mode: u32,
    /// Create the archive resource on first use if it is missing.
    pub create_if_missing: bool,
    /// Sync the backing resource to durable storage when the session closes.
    pub sync_on_close: bool,
}

impl Default for ArchiveFsConfig {
    fn default() -> Self {
        Self {
            file_mode: 0o666,
            dir_mode: 0o755,
            archive_mode: 0o666,
            create_if_missing: true,
            sync_on_close: false,
        }
    }
}

impl ArchiveFsConfig {
    /// Parse a RON document.
    pub fn from_ron(text: &str) -> VfsResult<Self> {
        ron::from_str(text).map_err(|e| VfsError::config(format!("invalid config: {e}")))
    }

    /// Read and parse a RON file.
    pub fn load(path: impl AsRef<Path>) -> VfsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| VfsError::config(format!("{}: {e}", path.display())))?;
        Self::from_ron(&text)
    }

    /// Render as pretty RON.
    pub fn to_ron(&self) -> VfsResult<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| VfsError::config(e.to_string()))
    }
}

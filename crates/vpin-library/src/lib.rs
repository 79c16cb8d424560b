//! Table library for the VPin launcher
//!
//! Handles table discovery, file name normalization and snapshot lookup.

mod catalog;
mod names;
mod snapshots;

pub use catalog::TableCatalog;
pub use names::{TABLE_EXTENSION, display_title, normalize_key, table_stem};
pub use snapshots::{Snapshot, SnapshotLibrary};

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(PathBuf),

    #[error("Unreadable image {path}: {reason}")]
    Image { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A playable table discovered on disk
///
/// Title and key are always derived from the file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDescriptor {
    raw_file_name: String,
    display_title: String,
    normalized_key: String,
}

impl TableDescriptor {
    /// Build a descriptor from an on-disk table file name
    pub fn from_file_name(raw_file_name: impl Into<String>) -> Self {
        let raw_file_name = raw_file_name.into();
        Self {
            display_title: display_title(&raw_file_name),
            normalized_key: normalize_key(&raw_file_name),
            raw_file_name,
        }
    }

    /// File name as found in the tables directory
    pub fn raw_file_name(&self) -> &str {
        &self.raw_file_name
    }

    /// Title shown in the table list
    pub fn display_title(&self) -> &str {
        &self.display_title
    }

    /// Lookup key shared with snapshot assets
    pub fn normalized_key(&self) -> &str {
        &self.normalized_key
    }

    /// Full path of the table file inside `tables_dir`
    pub fn path_in(&self, tables_dir: &Path) -> PathBuf {
        tables_dir.join(&self.raw_file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_from_file_name() {
        let table = TableDescriptor::from_file_name("Fathom (Williams 1981).vpx");
        assert_eq!(table.raw_file_name(), "Fathom (Williams 1981).vpx");
        assert_eq!(table.display_title(), "Fathom (Williams 1981)");
        assert_eq!(table.normalized_key(), "fathom_williams_1981");
    }

    #[test]
    fn test_path_in() {
        let table = TableDescriptor::from_file_name("Viper.vpx");
        assert_eq!(
            table.path_in(Path::new("/tables")),
            PathBuf::from("/tables/Viper.vpx")
        );
    }
}

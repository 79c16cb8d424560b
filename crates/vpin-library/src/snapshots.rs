//! Table snapshot images
//!
//! Snapshots live in one directory and are named after the table's
//! normalized key, e.g. `table_snapshots/fathom_williams_1981.png`.

use crate::{LibraryError, TableDescriptor};
use std::path::{Path, PathBuf};
use vpin_config::LauncherConfig;

/// A snapshot found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Locates snapshot images for tables
#[derive(Debug, Clone)]
pub struct SnapshotLibrary {
    dir: PathBuf,
    extension: String,
}

impl SnapshotLibrary {
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn from_config(config: &LauncherConfig) -> Self {
        Self::new(&config.paths.snapshots_dir, &config.snapshots.extension)
    }

    /// Snapshot directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Expected snapshot path for a table, whether or not it exists
    pub fn path_for(&self, table: &TableDescriptor) -> PathBuf {
        self.dir
            .join(format!("{}.{}", table.normalized_key(), self.extension))
    }

    /// Find the snapshot for a table and read its dimensions
    pub fn load(&self, table: &TableDescriptor) -> Result<Snapshot, LibraryError> {
        let path = self.path_for(table);

        if !path.is_file() {
            return Err(LibraryError::SnapshotNotFound(path));
        }

        let (width, height) =
            image::image_dimensions(&path).map_err(|e| LibraryError::Image {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!("Snapshot {} is {}x{}", path.display(), width, height);

        Ok(Snapshot {
            path,
            width,
            height,
        })
    }
}

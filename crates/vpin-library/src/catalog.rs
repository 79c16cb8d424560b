//! Table directory scanning

use crate::{LibraryError, TABLE_EXTENSION, TableDescriptor};
use std::fs;
use std::io;
use std::path::Path;

/// Scans a flat tables directory for playable table files
#[derive(Debug, Clone)]
pub struct TableCatalog {
    /// Required file name suffix, matched case-sensitively
    extension: String,

    /// Skip hidden files
    skip_hidden: bool,
}

impl Default for TableCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl TableCatalog {
    /// Create a catalog matching `.vpx` files
    pub fn new() -> Self {
        Self {
            extension: TABLE_EXTENSION.to_string(),
            skip_hidden: true,
        }
    }

    /// Also list dot-files
    pub fn include_hidden(mut self) -> Self {
        self.skip_hidden = false;
        self
    }

    /// Scan a directory for tables.
    ///
    /// Results are sorted by file name since directory order differs
    /// between filesystems.
    pub fn scan(&self, path: &Path) -> Result<Vec<TableDescriptor>, LibraryError> {
        if path.as_os_str().is_empty() {
            return Err(LibraryError::Config("tables directory path is empty".into()));
        }

        let entries = fs::read_dir(path).map_err(|e| list_error(path, e))?;
        let mut names = Vec::new();

        for entry in entries {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                tracing::debug!("Skipping non UTF-8 entry {:?}", entry.file_name());
                continue;
            };

            if self.skip_hidden && name.starts_with('.') {
                continue;
            }

            if !name.ends_with(&self.extension) {
                continue;
            }

            if !entry.path().is_file() {
                continue;
            }

            names.push(name);
        }

        names.sort();
        tracing::info!("Found {} tables in {}", names.len(), path.display());

        Ok(names.into_iter().map(TableDescriptor::from_file_name).collect())
    }
}

fn list_error(path: &Path, err: io::Error) -> LibraryError {
    match err.kind() {
        io::ErrorKind::NotFound => LibraryError::PathNotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => LibraryError::PermissionDenied(path.to_path_buf()),
        _ => LibraryError::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_scan_empty_path() {
        let result = TableCatalog::new().scan(Path::new(""));
        assert!(matches!(result, Err(LibraryError::Config(_))));
    }

    #[test]
    fn test_scan_missing_directory() {
        let result = TableCatalog::new().scan(Path::new("/nonexistent/vpin/tables"));
        assert!(matches!(result, Err(LibraryError::PathNotFound(_))));
    }

    #[test]
    fn test_list_error_mapping() {
        let path = PathBuf::from("/tables");
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert!(matches!(
            list_error(&path, denied),
            LibraryError::PermissionDenied(p) if p == path
        ));

        let other = io::Error::other("boom");
        assert!(matches!(list_error(&path, other), LibraryError::Io(_)));
    }
}

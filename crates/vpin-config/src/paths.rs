//! Emulator and directory paths

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ConfigError;

/// Locations of the emulator and the directories the launcher reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Visual Pinball executable, either a path or a program name on `PATH`
    #[serde(default = "default_emulator")]
    pub emulator: PathBuf,

    /// Flat directory of `.vpx` table files
    #[serde(default = "default_tables_dir")]
    pub tables_dir: PathBuf,

    /// Directory of snapshot images keyed by normalized table name
    #[serde(default = "default_snapshots_dir")]
    pub snapshots_dir: PathBuf,

    /// PinMAME NVRAM directory holding persisted high scores
    #[serde(default = "default_nvram_dir")]
    pub nvram_dir: PathBuf,
}

fn home_dir() -> PathBuf {
    match directories::BaseDirs::new() {
        Some(dirs) => dirs.home_dir().to_path_buf(),
        None => {
            tracing::warn!("No home directory found, default paths are relative");
            PathBuf::new()
        }
    }
}

fn default_emulator() -> PathBuf {
    PathBuf::from("VPinballX_GL")
}

fn default_tables_dir() -> PathBuf {
    home_dir().join("VPinball").join("tables")
}

fn default_snapshots_dir() -> PathBuf {
    PathBuf::from("table_snapshots")
}

fn default_nvram_dir() -> PathBuf {
    home_dir().join(".pinmame").join("nvram")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            emulator: default_emulator(),
            tables_dir: default_tables_dir(),
            snapshots_dir: default_snapshots_dir(),
            nvram_dir: default_nvram_dir(),
        }
    }
}

impl PathsConfig {
    /// Reject empty required paths
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("paths.emulator", &self.emulator),
            ("paths.tables_dir", &self.tables_dir),
            ("paths.snapshots_dir", &self.snapshots_dir),
            ("paths.nvram_dir", &self.nvram_dir),
        ];

        for (key, path) in required {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!("{} is empty", key)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let paths = PathsConfig::default();
        assert_eq!(paths.emulator, PathBuf::from("VPinballX_GL"));
        assert!(paths.tables_dir.ends_with("VPinball/tables"));
        assert!(paths.nvram_dir.ends_with(".pinmame/nvram"));
        assert_eq!(paths.snapshots_dir, PathBuf::from("table_snapshots"));
    }

    #[test]
    fn test_default_paths_under_home() {
        let Some(dirs) = directories::BaseDirs::new() else {
            return;
        };
        let paths = PathsConfig::default();
        assert!(paths.tables_dir.starts_with(dirs.home_dir()));
        assert!(paths.nvram_dir.starts_with(dirs.home_dir()));
    }

    #[test]
    fn test_validate_empty_tables_dir() {
        let paths = PathsConfig {
            tables_dir: PathBuf::new(),
            ..Default::default()
        };
        let err = paths.validate().unwrap_err();
        assert!(err.to_string().contains("paths.tables_dir"));
    }
}

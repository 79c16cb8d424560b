//! Configuration management for the VPin launcher
//!
//! Handles emulator and directory paths, the table-to-NVRAM mapping, score
//! layouts and UI preferences. Settings live in a TOML file and can be
//! overridden per key from `VPIN_*` environment variables.

mod paths;
mod scores;

pub use paths::PathsConfig;
pub use scores::{ScoreEncoding, ScoreLayout, ScoresConfig, TableMapping, default_table_mappings};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration source error: {0}")]
    Source(#[from] config::ConfigError),
}

/// System-wide configuration directory
pub const CONFIG_DIR: &str = "/etc/vpin-launcher";

/// Configuration file name inside a configuration directory
pub const CONFIG_FILE: &str = "config.toml";

/// Prefix for environment overrides, e.g. `VPIN_PATHS__TABLES_DIR`
pub const ENV_PREFIX: &str = "VPIN";

/// Written at the top of saved configuration files
pub const CONFIG_HEADER: &str = "\
# VPin launcher configuration
#
# High scores are only shown for tables that have both a [[scores.tables]]
# mapping and a [[scores.layouts]] entry for the same NVRAM file. No layouts
# ship by default, so mapped tables show \"Hi Score: (unknown)\" until one is
# added, for example:
#
# [[scores.layouts]]
# store = \"fathom.nv\"
# offset = 0
# length = 4
# encoding = \"bcd\"   # or \"big_endian\"

";

/// Snapshot image settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Image file extension, without the dot
    #[serde(default = "default_snapshot_extension")]
    pub extension: String,
}

fn default_snapshot_extension() -> String {
    "png".to_string()
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            extension: default_snapshot_extension(),
        }
    }
}

/// Presentation preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Show snapshot errors to the player instead of only logging them
    #[serde(default)]
    pub popup_image_errors: bool,
}

/// Main launcher configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LauncherConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub snapshots: SnapshotConfig,

    #[serde(default)]
    pub ui: UiConfig,

    #[serde(default)]
    pub scores: ScoresConfig,
}

impl LauncherConfig {
    /// Load configuration from a file, applying environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        Self::load_layered(Some(path), None)
    }

    /// Load configuration from default locations
    pub fn load_default() -> Result<Self, ConfigError> {
        // Try user config first, then system config
        if let Some(user_config) = user_config_path().filter(|p| p.exists()) {
            return Self::load(&user_config);
        }

        let system_config = Path::new(CONFIG_DIR).join(CONFIG_FILE);
        if system_config.exists() {
            return Self::load(&system_config);
        }

        tracing::warn!("No configuration file found, using defaults");
        Self::load_layered(None, None)
    }

    /// Build the configuration from an optional file plus environment
    /// variables. `env` replaces the process environment when given.
    pub fn load_layered(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder
                .add_source(config::File::from(path).format(config::FileFormat::Toml));
        }

        let environment = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .source(env);

        let config: Self = builder.add_source(environment).build()?.try_deserialize()?;
        if let Some(path) = path {
            tracing::debug!("Loaded configuration from {}", path.display());
        }
        Ok(config)
    }

    /// Parse configuration from a TOML string, without environment overrides
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = format!("{}{}", CONFIG_HEADER, toml::to_string_pretty(self)?);

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check that every required setting is present
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.paths.validate()?;
        self.scores.validate()?;

        if self.snapshots.extension.trim().is_empty() {
            return Err(ConfigError::Invalid("snapshot extension is empty".into()));
        }
        Ok(())
    }
}

/// Per-user configuration file, e.g. `~/.config/vpin-launcher/config.toml`
/// on Linux
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "vpin-launcher")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env() -> Option<config::Map<String, String>> {
        Some(config::Map::new())
    }

    #[test]
    fn test_default_config() {
        let config = LauncherConfig::default();
        assert_eq!(config.snapshots.extension, "png");
        assert!(!config.ui.popup_image_errors);
        assert_eq!(config.scores.tables.len(), 9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serialize_deserialize() {
        let config = LauncherConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed = LauncherConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config.paths, parsed.paths);
        assert_eq!(config.scores.tables, parsed.scores.tables);
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::NotFound(PathBuf::from("/etc/vpin-launcher/config.toml"));
        assert!(format!("{}", err).contains("not found"));

        let err = ConfigError::Invalid("test error".to_string());
        assert!(format!("{}", err).contains("Invalid"));

        let err = ConfigError::ParseError("parse failed".to_string());
        assert!(format!("{}", err).contains("parse"));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let config_content = r#"
[paths]
emulator = "/opt/vpinball/VPinballX_GL"
tables_dir = "/srv/tables"

[ui]
popup_image_errors = true

[[scores.tables]]
prefix = "gorgar"
store = "gorgr_l2.nv"
"#;
        write!(temp_file, "{}", config_content).unwrap();

        let config = LauncherConfig::load_layered(Some(temp_file.path()), no_env()).unwrap();
        assert_eq!(config.paths.emulator, PathBuf::from("/opt/vpinball/VPinballX_GL"));
        assert_eq!(config.paths.tables_dir, PathBuf::from("/srv/tables"));
        assert!(config.ui.popup_image_errors);
        assert_eq!(config.scores.tables.len(), 1);
        assert_eq!(config.scores.tables[0].store, "gorgr_l2.nv");
        // Untouched sections keep their defaults
        assert_eq!(config.snapshots.extension, "png");
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "[paths]\ntables_dir = \"/srv/tables\"\n").unwrap();

        let mut env = config::Map::new();
        env.insert("VPIN_PATHS__TABLES_DIR".to_string(), "/mnt/usb/tables".to_string());
        env.insert("VPIN_UI__POPUP_IMAGE_ERRORS".to_string(), "true".to_string());

        let config = LauncherConfig::load_layered(Some(temp_file.path()), Some(env)).unwrap();
        assert_eq!(config.paths.tables_dir, PathBuf::from("/mnt/usb/tables"));
        assert!(config.ui.popup_image_errors);
    }

    #[test]
    fn test_load_missing_file() {
        let result = LauncherConfig::load(Path::new("/nonexistent/vpin/config.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_save_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");
        let mut config = LauncherConfig::default();
        config.ui.popup_image_errors = true;

        config.save(&path).unwrap();

        // Verify the file was written and can be read back
        let contents = std::fs::read_to_string(&path).unwrap();
        let loaded = LauncherConfig::from_toml(&contents).unwrap();
        assert!(loaded.ui.popup_image_errors);
        assert_eq!(loaded.paths, config.paths);
        assert!(contents.starts_with(CONFIG_HEADER));
        assert!(contents.contains("# [[scores.layouts]]"));
    }

    #[test]
    fn test_validate_rejects_empty_extension() {
        let mut config = LauncherConfig::default();
        config.snapshots.extension = " ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_config_pretty_print() {
        let config = LauncherConfig::default();
        let pretty = toml::to_string_pretty(&config).unwrap();

        assert!(pretty.contains("[paths]"));
        assert!(pretty.contains("[[scores.tables]]"));
    }

    #[test]
    fn test_user_config_path() {
        if let Some(path) = user_config_path() {
            assert!(path.ends_with("config.toml"));
            assert!(path.to_string_lossy().contains("vpin-launcher"));
        }
    }

    #[test]
    fn test_constants() {
        assert_eq!(CONFIG_DIR, "/etc/vpin-launcher");
        assert_eq!(ENV_PREFIX, "VPIN");
    }
}

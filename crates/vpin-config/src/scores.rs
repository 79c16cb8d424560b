//! High score configuration
//!
//! Maps table title prefixes to PinMAME NVRAM files and describes where the
//! top score sits inside each file.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One title prefix to NVRAM file pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMapping {
    /// Lowercase title prefix, e.g. "fathom"
    pub prefix: String,

    /// NVRAM file name, e.g. "fathom.nv"
    pub store: String,
}

impl TableMapping {
    pub fn new(prefix: impl Into<String>, store: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            store: store.into(),
        }
    }
}

/// How score digits are packed in the NVRAM bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreEncoding {
    /// Two decimal digits per byte, high nibble first
    #[default]
    Bcd,
    /// Unsigned big-endian integer
    BigEndian,
}

/// Location of the top score inside an NVRAM file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLayout {
    /// NVRAM file name this layout applies to
    pub store: String,

    /// Byte offset of the first score byte
    pub offset: usize,

    /// Number of bytes holding the score
    pub length: usize,

    #[serde(default)]
    pub encoding: ScoreEncoding,
}

/// High score settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoresConfig {
    /// Title prefix to NVRAM file mapping
    #[serde(default = "default_table_mappings")]
    pub tables: Vec<TableMapping>,

    /// Per-file score layouts
    #[serde(default)]
    pub layouts: Vec<ScoreLayout>,
}

impl Default for ScoresConfig {
    fn default() -> Self {
        Self {
            tables: default_table_mappings(),
            layouts: Vec::new(),
        }
    }
}

/// Tables whose NVRAM files are known to hold a readable high score
pub fn default_table_mappings() -> Vec<TableMapping> {
    vec![
        TableMapping::new("barracora", "barra_l1.nv"),
        TableMapping::new("elektra", "elektra.nv"),
        TableMapping::new("firepower", "frpwr_b7.nv"),
        TableMapping::new("seawitch", "seawitch.nv"),
        TableMapping::new("warlok", "wrlok_l3.nv"),
        TableMapping::new("black_knight", "bk_l4.nv"),
        TableMapping::new("fathom", "fathom.nv"),
        TableMapping::new("scorpion", "scrpn_l1.nv"),
        TableMapping::new("viper", "viper.nv"),
    ]
}

impl ScoresConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for mapping in &self.tables {
            if mapping.prefix.trim().is_empty() || mapping.store.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "score mapping '{}' -> '{}' has an empty side",
                    mapping.prefix, mapping.store
                )));
            }
        }

        for layout in &self.layouts {
            if layout.length == 0 {
                return Err(ConfigError::Invalid(format!(
                    "score layout for {} has zero length",
                    layout.store
                )));
            }
            if layout.encoding == ScoreEncoding::BigEndian && layout.length > 8 {
                return Err(ConfigError::Invalid(format!(
                    "score layout for {} is wider than 8 bytes",
                    layout.store
                )));
            }
        }
        Ok(())
    }

    /// Layout configured for an NVRAM file
    pub fn layout_for(&self, store: &str) -> Option<&ScoreLayout> {
        self.layouts.iter().find(|l| l.store == store)
    }

    /// Mapped NVRAM files that have no score layout and so never yield a score
    pub fn stores_without_layout(&self) -> Vec<&str> {
        self.tables
            .iter()
            .map(|m| m.store.as_str())
            .filter(|store| self.layout_for(store).is_none())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mappings() {
        let mappings = default_table_mappings();
        assert_eq!(mappings.len(), 9);
        assert!(mappings.contains(&TableMapping::new("black_knight", "bk_l4.nv")));
        assert!(mappings.iter().all(|m| m.prefix == m.prefix.to_lowercase()));
    }

    #[test]
    fn test_layout_parsing() {
        let config: ScoresConfig = toml::from_str(
            r#"
[[layouts]]
store = "fathom.nv"
offset = 16
length = 4

[[layouts]]
store = "viper.nv"
offset = 0
length = 2
encoding = "big_endian"
"#,
        )
        .unwrap();

        // Mappings fall back to the built-in table
        assert_eq!(config.tables.len(), 9);
        assert_eq!(config.layout_for("fathom.nv").unwrap().encoding, ScoreEncoding::Bcd);
        assert_eq!(
            config.layout_for("viper.nv").unwrap().encoding,
            ScoreEncoding::BigEndian
        );
        assert!(config.layout_for("bk_l4.nv").is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_stores_without_layout() {
        let config = ScoresConfig::default();
        assert_eq!(config.stores_without_layout().len(), 9);

        let config = ScoresConfig {
            tables: vec![
                TableMapping::new("fathom", "fathom.nv"),
                TableMapping::new("viper", "viper.nv"),
            ],
            layouts: vec![ScoreLayout {
                store: "fathom.nv".into(),
                offset: 0,
                length: 4,
                encoding: ScoreEncoding::Bcd,
            }],
        };
        assert_eq!(config.stores_without_layout(), vec!["viper.nv"]);
    }

    #[test]
    fn test_validate_rejects_zero_length_layout() {
        let config = ScoresConfig {
            tables: Vec::new(),
            layouts: vec![ScoreLayout {
                store: "viper.nv".into(),
                offset: 0,
                length: 0,
                encoding: ScoreEncoding::Bcd,
            }],
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_empty_prefix() {
        let config = ScoresConfig {
            tables: vec![TableMapping::new("", "viper.nv")],
            layouts: Vec::new(),
        };
        assert!(config.validate().is_err());
    }
}

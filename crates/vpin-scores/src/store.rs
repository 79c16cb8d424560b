//! Persisted score storage

use crate::ScoreError;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use vpin_config::{LauncherConfig, ScoreEncoding, ScoreLayout};

/// Reads and decodes persisted scores for a store id
pub trait ScoreStore: Send + Sync {
    /// Raw contents stored for `store_id`
    fn read(&self, store_id: &str) -> Result<Vec<u8>, ScoreError>;

    /// Decode the top score from the contents of `store_id`
    fn parse(&self, store_id: &str, contents: &[u8]) -> Result<i64, ScoreError>;
}

/// PinMAME NVRAM directory, one file per store id
#[derive(Debug, Clone)]
pub struct NvramStore {
    dir: PathBuf,
    layouts: HashMap<String, ScoreLayout>,
}

impl NvramStore {
    pub fn new(dir: impl Into<PathBuf>, layouts: impl IntoIterator<Item = ScoreLayout>) -> Self {
        Self {
            dir: dir.into(),
            layouts: layouts
                .into_iter()
                .map(|layout| (layout.store.clone(), layout))
                .collect(),
        }
    }

    pub fn from_config(config: &LauncherConfig) -> Self {
        Self::new(&config.paths.nvram_dir, config.scores.layouts.iter().cloned())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ScoreStore for NvramStore {
    fn read(&self, store_id: &str) -> Result<Vec<u8>, ScoreError> {
        let path = self.dir.join(store_id);

        match fs::read(&path) {
            Ok(contents) => {
                tracing::debug!("Read {} bytes from {}", contents.len(), path.display());
                Ok(contents)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ScoreError::NotFound(path)),
            Err(e) => Err(ScoreError::Io(e)),
        }
    }

    fn parse(&self, store_id: &str, contents: &[u8]) -> Result<i64, ScoreError> {
        let layout = self
            .layouts
            .get(store_id)
            .ok_or_else(|| ScoreError::Format(format!("no score layout for {}", store_id)))?;

        let end = layout
            .offset
            .checked_add(layout.length)
            .filter(|end| *end <= contents.len())
            .ok_or_else(|| {
                ScoreError::Format(format!(
                    "score range {}..{} is outside {} bytes",
                    layout.offset,
                    layout.offset.saturating_add(layout.length),
                    contents.len()
                ))
            })?;

        let bytes = &contents[layout.offset..end];
        match layout.encoding {
            ScoreEncoding::Bcd => decode_bcd(bytes),
            ScoreEncoding::BigEndian => decode_big_endian(bytes),
        }
    }
}

/// Packed BCD, two digits per byte, most significant first
fn decode_bcd(bytes: &[u8]) -> Result<i64, ScoreError> {
    let mut value: i64 = 0;

    for byte in bytes {
        for digit in [byte >> 4, byte & 0x0f] {
            if digit > 9 {
                return Err(ScoreError::Format(format!(
                    "invalid BCD byte 0x{:02x}",
                    byte
                )));
            }
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(i64::from(digit)))
                .ok_or_else(|| ScoreError::Format("BCD score overflows".into()))?;
        }
    }

    Ok(value)
}

fn decode_big_endian(bytes: &[u8]) -> Result<i64, ScoreError> {
    if bytes.len() > 8 {
        return Err(ScoreError::Format(format!(
            "{} bytes do not fit a 64-bit score",
            bytes.len()
        )));
    }

    let value = bytes
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));
    i64::try_from(value).map_err(|_| ScoreError::Format("score overflows".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(store: &str, offset: usize, length: usize, encoding: ScoreEncoding) -> ScoreLayout {
        ScoreLayout {
            store: store.to_string(),
            offset,
            length,
            encoding,
        }
    }

    #[test]
    fn test_decode_bcd() {
        assert_eq!(decode_bcd(&[0x01, 0x25, 0x00, 0x00]).unwrap(), 1_250_000);
        assert_eq!(decode_bcd(&[]).unwrap(), 0);
        assert!(matches!(decode_bcd(&[0x1a]), Err(ScoreError::Format(_))));
    }

    #[test]
    fn test_decode_bcd_overflow() {
        assert!(decode_bcd(&[0x99; 10]).is_err());
    }

    #[test]
    fn test_decode_big_endian() {
        assert_eq!(decode_big_endian(&[0x00, 0x01, 0x00]).unwrap(), 256);
        assert!(decode_big_endian(&[0xff; 8]).is_err());
        assert!(decode_big_endian(&[0x00; 9]).is_err());
    }

    #[test]
    fn test_parse_with_layout() {
        let store = NvramStore::new(
            "/nvram",
            [layout("fathom.nv", 2, 3, ScoreEncoding::Bcd)],
        );
        let contents = [0xff, 0xff, 0x00, 0x84, 0x20, 0xff];
        assert_eq!(store.parse("fathom.nv", &contents).unwrap(), 8420);
    }

    #[test]
    fn test_parse_without_layout() {
        let store = NvramStore::new("/nvram", Vec::<ScoreLayout>::new());
        let err = store.parse("viper.nv", &[0x00]).unwrap_err();
        assert!(err.to_string().contains("no score layout"));
    }

    #[test]
    fn test_parse_out_of_range() {
        let store = NvramStore::new("/nvram", [layout("viper.nv", 4, 4, ScoreEncoding::Bcd)]);
        assert!(matches!(
            store.parse("viper.nv", &[0x00; 6]),
            Err(ScoreError::Format(_))
        ));
    }

    #[test]
    fn test_read_missing_file() {
        let store = NvramStore::new("/nonexistent/nvram", Vec::<ScoreLayout>::new());
        assert!(matches!(store.read("viper.nv"), Err(ScoreError::NotFound(_))));
    }
}

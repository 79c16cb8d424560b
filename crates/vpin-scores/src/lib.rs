//! High score lookup for the VPin launcher
//!
//! Resolves a table title to the PinMAME NVRAM file that stores its scores,
//! then reads and decodes the top score from that file.

mod mapping;
mod retriever;
mod store;

pub use mapping::{Resolution, ScoreStoreMapping, TitleToStoreResolver};
pub use retriever::ScoreRetriever;
pub use store::{NvramStore, ScoreStore};

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("NVRAM file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid score data: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a high score lookup.
///
/// A table without a known NVRAM file is `Unsupported`, which is an
/// ordinary outcome rather than a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ScoreResult {
    Found(i64),
    Unsupported,
    Failed(String),
}

impl ScoreResult {
    /// The score, if one was read
    pub fn score(&self) -> Option<i64> {
        match self {
            ScoreResult::Found(score) => Some(*score),
            _ => None,
        }
    }
}

impl fmt::Display for ScoreResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreResult::Found(score) => write!(f, "Hi Score: {}", score),
            ScoreResult::Unsupported => write!(f, "Hi Score: (table unsupported)"),
            ScoreResult::Failed(_) => write!(f, "Hi Score: (unknown)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_result_display() {
        assert_eq!(ScoreResult::Found(1_250_000).to_string(), "Hi Score: 1250000");
        assert_eq!(
            ScoreResult::Unsupported.to_string(),
            "Hi Score: (table unsupported)"
        );
        assert_eq!(
            ScoreResult::Failed("read error: missing".into()).to_string(),
            "Hi Score: (unknown)"
        );
    }

    #[test]
    fn test_score_accessor() {
        assert_eq!(ScoreResult::Found(42).score(), Some(42));
        assert_eq!(ScoreResult::Unsupported.score(), None);
    }
}

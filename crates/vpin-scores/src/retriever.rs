//! High score retrieval

use crate::{Resolution, ScoreResult, ScoreStore, TitleToStoreResolver};
use std::sync::Arc;

/// Looks up the high score for a table title.
///
/// Every call reads storage again; nothing is cached.
#[derive(Clone)]
pub struct ScoreRetriever {
    resolver: TitleToStoreResolver,
    store: Arc<dyn ScoreStore>,
}

impl ScoreRetriever {
    pub fn new(resolver: TitleToStoreResolver, store: Arc<dyn ScoreStore>) -> Self {
        Self { resolver, store }
    }

    pub fn resolver(&self) -> &TitleToStoreResolver {
        &self.resolver
    }

    /// Fetch the high score for a display title
    pub fn fetch(&self, title: &str) -> ScoreResult {
        let store_id = match self.resolver.resolve(title) {
            Resolution::Store(store_id) => store_id,
            Resolution::Unsupported => {
                tracing::debug!("No score mapping for '{}'", title);
                return ScoreResult::Unsupported;
            }
        };

        let contents = match self.store.read(&store_id) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("Failed to read scores for '{}' from {}: {}", title, store_id, e);
                return ScoreResult::Failed(format!("read error: {}", e));
            }
        };

        match self.store.parse(&store_id, &contents) {
            Ok(score) => ScoreResult::Found(score),
            Err(e) => {
                tracing::warn!("Failed to parse scores for '{}' from {}: {}", title, store_id, e);
                ScoreResult::Failed(format!("parse error: {}", e))
            }
        }
    }
}

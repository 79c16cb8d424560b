//! Title to NVRAM file resolution

use std::sync::Arc;
use vpin_config::ScoresConfig;

/// Fixed set of title prefix to store id pairs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreStoreMapping {
    /// Sorted by prefix, one entry per prefix
    entries: Vec<(String, String)>,
}

impl Default for ScoreStoreMapping {
    fn default() -> Self {
        Self::from_config(&ScoresConfig::default())
    }
}

impl ScoreStoreMapping {
    /// Build a mapping from prefix/store pairs. Prefixes are lowercased;
    /// when a prefix repeats, the first pair wins.
    pub fn from_pairs<I, P, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, S)>,
        P: Into<String>,
        S: Into<String>,
    {
        let mut entries: Vec<(String, String)> = Vec::new();

        for (prefix, store) in pairs {
            let prefix = prefix.into().to_lowercase();
            let store = store.into();

            if entries.iter().any(|(p, _)| *p == prefix) {
                tracing::warn!("Ignoring duplicate score mapping for '{}'", prefix);
                continue;
            }
            entries.push((prefix, store));
        }

        entries.sort();
        Self { entries }
    }

    pub fn from_config(config: &ScoresConfig) -> Self {
        Self::from_pairs(
            config
                .tables
                .iter()
                .map(|m| (m.prefix.as_str(), m.store.as_str())),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(prefix, store_id)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, s)| (p.as_str(), s.as_str()))
    }
}

/// Outcome of resolving a title
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Store(String),
    Unsupported,
}

/// Heuristic title to store id resolver
#[derive(Debug, Clone)]
pub struct TitleToStoreResolver {
    mapping: Arc<ScoreStoreMapping>,
}

impl Default for TitleToStoreResolver {
    fn default() -> Self {
        Self::new(ScoreStoreMapping::default())
    }
}

impl TitleToStoreResolver {
    pub fn new(mapping: ScoreStoreMapping) -> Self {
        Self {
            mapping: Arc::new(mapping),
        }
    }

    pub fn mapping(&self) -> &ScoreStoreMapping {
        &self.mapping
    }

    /// Resolve a display title to a store id.
    ///
    /// Single-word prefixes are matched against the first word of the title
    /// (cut at the first `_`), prefixes containing `_` against the whole
    /// title joined with underscores. The longest matching prefix wins.
    pub fn resolve(&self, title: &str) -> Resolution {
        let token = scan_token(title);
        let compound = compound_token(title);

        let best = self
            .mapping
            .iter()
            .filter(|(prefix, _)| {
                if prefix.contains('_') {
                    compound.starts_with(*prefix)
                } else {
                    token.starts_with(*prefix)
                }
            })
            .max_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| b.0.cmp(a.0)));

        match best {
            Some((prefix, store)) => {
                tracing::debug!("Resolved '{}' to {} via '{}'", title, store, prefix);
                Resolution::Store(store.to_string())
            }
            None => Resolution::Unsupported,
        }
    }
}

/// First whitespace token, cut at the first underscore, lowercased
fn scan_token(title: &str) -> String {
    let first = title.split_whitespace().next().unwrap_or("");
    first.split('_').next().unwrap_or("").to_lowercase()
}

/// Whole title without parentheses, words joined by underscores, lowercased
fn compound_token(title: &str) -> String {
    let stripped: String = title.chars().filter(|c| *c != '(' && *c != ')').collect();
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

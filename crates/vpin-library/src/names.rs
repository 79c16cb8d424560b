//! Table file name normalization
//!
//! A table file name yields two derived strings: the display title shown in
//! the list, and the normalized key used to name snapshot images.

/// Extension of Visual Pinball table files
pub const TABLE_EXTENSION: &str = ".vpx";

const RECOGNIZED_EXTENSIONS: &[&str] = &[TABLE_EXTENSION];

/// File name without its table extension.
///
/// Only recognized extensions are stripped, the longest one first.
pub fn table_stem(file_name: &str) -> &str {
    RECOGNIZED_EXTENSIONS
        .iter()
        .filter(|ext| file_name.ends_with(**ext))
        .max_by_key(|ext| ext.len())
        .map(|ext| &file_name[..file_name.len() - ext.len()])
        .unwrap_or(file_name)
}

/// Snapshot lookup key: parentheses removed, spaces to underscores, lowercase.
///
/// `"Fathom (Williams 1981).vpx"` becomes `"fathom_williams_1981"`.
pub fn normalize_key(file_name: &str) -> String {
    let stem = table_stem(file_name);

    let stripped: String = if stem.contains('(') {
        stem.chars().filter(|c| *c != '(' && *c != ')').collect()
    } else {
        stem.to_string()
    };

    stripped.replace(' ', "_").to_lowercase()
}

/// Title for the table list, cut after the first closing parenthesis.
///
/// A stem with `(` but no `)` keeps its full text and gains a trailing `)`.
pub fn display_title(file_name: &str) -> String {
    let stem = table_stem(file_name);

    if !stem.contains('(') {
        return stem.to_string();
    }

    match stem.find(')') {
        Some(end) => stem[..=end].to_string(),
        None => format!("{})", stem),
    }
}

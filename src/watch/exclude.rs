// src/watch/exclude.rs

use std::path::Path;

use crate::watch::path_utils::normalize;

/// Directories pruned from every traversal.
///
/// Entries are compared for exact equality after normalisation, so
/// `vendor` excludes `vendor/` but neither `vendor2` nor `lib/vendor`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludeSet {
    entries: Vec<String>,
}

impl ExcludeSet {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|e| normalize(Path::new(e.as_ref().trim())))
            .filter(|e| !e.is_empty())
            .collect();
        Self { entries }
    }

    pub fn matches(&self, path: &Path) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        let candidate = normalize(path);
        self.entries.iter().any(|e| *e == candidate)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::Path;

/// Normalise a path for comparison: forward slashes, no leading `./`,
/// no trailing `/`.
pub fn normalize(path: &Path) -> String {
    let s = path.to_string_lossy().replace('\\', "/");
    let mut s = s.as_str();
    while let Some(rest) = s.strip_prefix("./") {
        s = rest;
    }
    s.trim_end_matches('/').to_string()
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
///
/// Returns `None` if the path cannot be reasonably related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(normalize(rel));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(normalize(rel));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn normalize_strips_dot_prefix_and_trailing_slash() {
        assert_eq!(normalize(Path::new("./vendor/")), "vendor");
        assert_eq!(normalize(Path::new("././web/dist")), "web/dist");
        assert_eq!(normalize(Path::new("app/vendor")), "app/vendor");
    }

    #[test]
    fn relative_str_strips_root() {
        let root = PathBuf::from("/proj");
        assert_eq!(
            relative_str(&root, Path::new("/proj/src/main.rs")).as_deref(),
            Some("src/main.rs")
        );
        assert_eq!(relative_str(&root, Path::new("/elsewhere/x.rs")), None);
    }
}

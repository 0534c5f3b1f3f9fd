//! Exclusion filter
//!
//! Decides whether a path below the source root is copied. A path is
//! excluded when any one of its segments is exactly one of the configured
//! names; substrings never match. The walker consults this before
//! descending, so an excluded directory removes its whole subtree.

use std::collections::BTreeSet;
use std::path::{Component, Path};

/// Returns `true` if `relative` (a path relative to the source root) should be copied
///
/// The empty path is the source root itself and is always included.
pub fn should_include(relative: &Path, excludes: &BTreeSet<String>) -> bool {
    if excludes.is_empty() {
        return true;
    }

    relative.components().all(|component| match component {
        Component::Normal(segment) => segment
            .to_str()
            .map_or(true, |name| !excludes.contains(name)),
        _ => true,
    })
}

/// Parse a comma-separated exclusion list (`"node_modules, .git, temp"`)
pub fn parse_excludes(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn excludes(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_root_always_included() {
        assert!(should_include(Path::new(""), &excludes(&["temp"])));
    }

    #[test]
    fn test_exact_segment_excluded() {
        let set = excludes(&["temp"]);
        assert!(!should_include(Path::new("temp"), &set));
        assert!(!should_include(Path::new("temp/x"), &set));
    }

    #[test]
    fn test_substring_never_matches() {
        let set = excludes(&["temp"]);
        assert!(should_include(Path::new("templates/x"), &set));
        assert!(should_include(Path::new("my_temp"), &set));
        assert!(should_include(Path::new("src/temp.rs"), &set));
    }

    #[test]
    fn test_excluded_at_any_depth() {
        let set = excludes(&["node_modules"]);
        let deep: PathBuf = ["packages", "web", "node_modules", "react", "index.js"]
            .iter()
            .collect();
        assert!(!should_include(&deep, &set));
        assert!(should_include(Path::new("packages/web/src/index.js"), &set));
    }

    #[test]
    fn test_case_sensitive() {
        let set = excludes(&[".git"]);
        assert!(should_include(Path::new(".GIT/config"), &set));
        assert!(!should_include(Path::new(".git/config"), &set));
    }

    #[test]
    fn test_empty_exclude_set_includes_everything() {
        assert!(should_include(Path::new("node_modules/x"), &BTreeSet::new()));
    }

    #[test]
    fn test_parse_excludes() {
        let set = parse_excludes("node_modules, .git, temp");
        assert_eq!(set, excludes(&["node_modules", ".git", "temp"]));
        assert!(parse_excludes("").is_empty());
        assert!(parse_excludes(" , ,").is_empty());
    }
}

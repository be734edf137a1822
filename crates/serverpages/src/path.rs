// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Url and resource path helpers.
//!
//! All functions are pure string transformations. Empty inputs are valid and
//! have defined results (see [`end_slash`] and [`normalize_relative_path`]).

use lazy_static::lazy_static;
use regex::Regex;

/// Path separator.
pub const SLASH: &str = "/";

lazy_static! {
    // any run of slashes, optionally surrounded by whitespace
    static ref DIRTY_SLASHES: Regex = Regex::new(r"\s*/[\s/]*").unwrap();
}

/// Combines `path` with `base`.
///
/// When `path` is empty only `base` is normalized. An empty `base` never
/// introduces a leading slash.
pub fn normalize_path(base: &str, path: &str) -> String {
    if path.is_empty() {
        clean_up_path(base)
    } else if base.is_empty() {
        clean_up_path(path)
    } else {
        join(&[base, path])
    }
}

/// Joins parts with `/` and collapses duplicate separators.
pub fn join(parts: &[&str]) -> String {
    clean_up_path(&parts.join(SLASH))
}

/// Replaces backslashes and collapses repeated slashes, trimming whitespace.
pub fn clean_up_path(path: &str) -> String {
    let fixed = path.replace('\\', SLASH);
    DIRTY_SLASHES.replace_all(&fixed, SLASH).trim().to_string()
}

/// Returns the path with a leading slash.
pub fn prefix_slash(path: &str) -> String {
    if path.starts_with(SLASH) {
        path.to_string()
    } else {
        format!("{}{}", SLASH, path)
    }
}

/// Returns the path with a trailing slash.
///
/// The empty string stays empty, otherwise it would turn into a leading slash.
pub fn end_slash(path: &str) -> String {
    if path.is_empty() || path.ends_with(SLASH) {
        path.to_string()
    } else {
        format!("{}{}", path, SLASH)
    }
}

/// Removes leading and trailing `*` (wildcard mappings like `/*`).
pub fn trim_stars(path: &str) -> &str {
    path.trim_matches('*')
}

/// Removes leading and trailing slashes.
pub fn trim_slashes(path: &str) -> &str {
    path.trim_matches('/')
}

/// Cleans the path and removes the leading slash.
pub fn to_relative_path(path: &str) -> String {
    clean_up_path(path).trim_start_matches('/').to_string()
}

/// Normalizes a sub url used for prefix matching.
///
/// The result never starts with a slash and always ends with one (unless
/// empty), so `foo/` can't match `foobar`. Note that `/` becomes `""`.
pub fn normalize_relative_path(path: &str) -> String {
    let clean = clean_up_path(path);
    if clean.is_empty() {
        clean
    } else {
        end_slash(trim_slashes(&clean))
    }
}

/// Normalizes a resource root given either as `com.app.ui` or `/com/app/ui`.
pub fn normalize_classpath_path(path: &str) -> String {
    normalize_relative_path(&path.replace('.', SLASH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/ui/", "/404.html"), "/ui/404.html");
        assert_eq!(normalize_path("ui", "page"), "ui/page");
        assert_eq!(normalize_path("", "/page"), "/page");
        assert_eq!(normalize_path("/ui//", ""), "/ui/");
        assert_eq!(normalize_path(" /a\\\\b/ ", ""), "/a/b/");
    }

    #[test]
    fn test_normalize_path_idempotent() {
        for (base, rel) in [("/a//b", "c///d"), ("x\\y", ""), ("", "//z/"), ("/ui/ / /", "x")] {
            let once = normalize_path(base, rel);
            assert_eq!(normalize_path(&once, ""), once, "{} + {}", base, rel);
        }
    }

    #[test]
    fn test_slashes() {
        assert_eq!(prefix_slash("a"), "/a");
        assert_eq!(prefix_slash("/a"), "/a");
        assert_eq!(end_slash("a"), "a/");
        assert_eq!(end_slash("a/"), "a/");
        assert_eq!(end_slash(""), "");
        assert_eq!(trim_slashes("//a/b//"), "a/b");
        assert_eq!(trim_stars("/*"), "/");
        assert_eq!(to_relative_path("//a//b"), "a/b");
    }

    #[test]
    fn test_normalize_relative_path() {
        assert_eq!(normalize_relative_path("/"), "");
        assert_eq!(normalize_relative_path(""), "");
        assert_eq!(normalize_relative_path("/foo"), "foo/");
        assert_eq!(normalize_relative_path("foo\\bar//"), "foo/bar/");
        assert!(!"foobar/x".starts_with(&normalize_relative_path("/foo")));
    }

    #[test]
    fn test_normalize_classpath_path() {
        assert_eq!(normalize_classpath_path("com.app.ui"), "com/app/ui/");
        assert_eq!(normalize_classpath_path("/com/app/ui"), "com/app/ui/");
        assert_eq!(normalize_classpath_path("/"), "");
    }
}

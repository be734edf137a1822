// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Resource access and multi-location lookup.
//!
//! Resources are addressed by classpath-style paths: forward slashes, no
//! leading slash (`com/app/ui/style.css`). A [`ResourceProvider`] answers
//! whether such a path exists and loads its bytes.
//!
//! # Provider Implementations
//!
//! - [`FileSystemProvider`]: resources below a root directory
//! - [`MemoryProvider`]: resources held in memory (testing, embedding)

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{PagesError, Result};

/// Source of resources (assets and templates).
pub trait ResourceProvider: Send + Sync + 'static {
    /// Returns true when a resource exists at the path.
    fn exists(&self, path: &str) -> bool;

    /// Loads the resource content.
    fn read(&self, path: &str) -> Result<Vec<u8>>;
}

/// Filesystem-backed provider.
///
/// The root directory plays the role of the classpath root. Paths escaping
/// the root (`..`) never resolve.
#[derive(Debug, Clone)]
pub struct FileSystemProvider {
    root: PathBuf,
}

impl FileSystemProvider {
    /// Creates a provider serving files below `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe {
            tracing::debug!("Rejected resource path escaping root: {}", path);
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl ResourceProvider for FileSystemProvider {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.is_file()).unwrap_or(false)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        match self.resolve(path) {
            Some(full) if full.is_file() => Ok(fs::read(full)?),
            _ => Err(PagesError::ResourceNotFound {
                path: path.to_string(),
                locations: vec![self.root.display().to_string()],
            }),
        }
    }
}

/// In-memory provider.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    resources: HashMap<String, Vec<u8>>,
}

impl MemoryProvider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource.
    pub fn add(&mut self, path: &str, content: impl Into<Vec<u8>>) {
        self.resources
            .insert(path.trim_start_matches('/').to_string(), content.into());
    }

    /// Builder-style variant of [`MemoryProvider::add`].
    pub fn with(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.add(path, content);
        self
    }
}

impl ResourceProvider for MemoryProvider {
    fn exists(&self, path: &str) -> bool {
        self.resources.contains_key(path.trim_start_matches('/'))
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.resources
            .get(path.trim_start_matches('/'))
            .cloned()
            .ok_or_else(|| PagesError::ResourceNotFound {
                path: path.to_string(),
                locations: Vec::new(),
            })
    }
}

/// Lookup of one resource in several root locations.
pub struct ResourceLookup;

impl ResourceLookup {
    /// Searches `path` in `roots`, in the given order.
    ///
    /// Roots are expected to end with a slash. Returns the first
    /// `root + path` that exists, or `None`.
    pub fn lookup(provider: &dyn ResourceProvider, path: &str, roots: &[String]) -> Option<String> {
        let relative = path.trim_start_matches('/');
        roots
            .iter()
            .map(|root| format!("{}{}", root, relative))
            .find(|candidate| provider.exists(candidate))
    }

    /// Same as [`ResourceLookup::lookup`] but fails with the searched locations.
    pub fn lookup_or_fail(provider: &dyn ResourceProvider, path: &str, roots: &[String]) -> Result<String> {
        Self::lookup(provider, path, roots).ok_or_else(|| PagesError::ResourceNotFound {
            path: path.to_string(),
            locations: roots.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn roots(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_root_wins() {
        let provider = MemoryProvider::new()
            .with("pkgA/x.js", "a")
            .with("pkgB/x.js", "b");
        let found = ResourceLookup::lookup(&provider, "/x.js", &roots(&["pkgB/", "pkgA/"]));
        assert_eq!(found.as_deref(), Some("pkgB/x.js"));
    }

    #[test]
    fn test_not_found_lists_locations() {
        let provider = MemoryProvider::new();
        let err = ResourceLookup::lookup_or_fail(&provider, "x.js", &roots(&["a/", "b/"])).unwrap_err();
        match err {
            PagesError::ResourceNotFound { locations, .. } => assert_eq!(locations, vec!["a/", "b/"]),
            other => panic!("Expected ResourceNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_filesystem_provider() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("com/app")).unwrap();
        fs::write(dir.path().join("com/app/style.css"), "body{}").unwrap();

        let provider = FileSystemProvider::new(dir.path());
        assert!(provider.exists("com/app/style.css"));
        assert!(provider.exists("/com/app/style.css"));
        assert!(!provider.exists("com/app"));
        assert!(!provider.exists("com/app/../app/style.css"));
        assert_eq!(provider.read("com/app/style.css").unwrap(), b"body{}");
        assert!(provider.read("missing.css").is_err());
    }
}

// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Application asset locations.
//!
//! An application serves static files from several resource roots. Roots can
//! be attached to the application root url or to a sub url (`/foo/` mapped to
//! `com/ext/foo/`). Sub url mappings shadow the root mapping, and for a single
//! url the root attached last is searched first, so extensions can override
//! files of the application.

use crate::path::{normalize_classpath_path, normalize_relative_path, trim_slashes, SLASH};
use crate::prefix::{PrefixMultimap, PrefixRouter};
use crate::resource::{ResourceLookup, ResourceProvider};

/// Asset locations registered for an application, in registration order.
#[derive(Debug, Clone, Default)]
pub struct AssetSources {
    locations: PrefixMultimap,
}

impl AssetSources {
    /// Creates empty sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a root location (`com.app.ui` or `/com/app/ui`).
    pub fn attach(&mut self, location: &str) {
        self.attach_to(SLASH, location);
    }

    /// Attaches a location to a sub url.
    pub fn attach_to(&mut self, url: &str, location: &str) {
        self.locations
            .put(normalize_relative_path(url), normalize_classpath_path(location));
    }

    /// Appends all locations of another configuration.
    pub fn merge(&mut self, other: &AssetSources) {
        self.locations.put_all(&other.locations);
    }

    /// Locations registered for the exact normalized url.
    pub fn get(&self, url: &str) -> &[String] {
        self.locations.get(url)
    }

    /// True when nothing is attached.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

/// Resolved asset locations of a started application.
#[derive(Debug, Clone)]
pub struct AssetLookup {
    primary_location: String,
    locations: PrefixRouter<Vec<String>>,
}

impl AssetLookup {
    /// Builds the lookup from collected sources.
    ///
    /// `primary_location` is the application's own root (`com/app/ui/`).
    pub fn new(primary_location: &str, sources: &AssetSources) -> Self {
        Self {
            primary_location: normalize_classpath_path(primary_location),
            locations: sources.locations.to_override_router(),
        }
    }

    /// The application's own resource root.
    pub fn primary_location(&self) -> &str {
        &self.primary_location
    }

    /// Path relative to the application root.
    ///
    /// Template paths may already be prefixed with the primary location; that
    /// prefix is removed.
    pub fn relative_path(&self, path: &str) -> String {
        let relative = path.trim_start_matches('/');
        relative
            .strip_prefix(self.primary_location.as_str())
            .unwrap_or(relative)
            .to_string()
    }

    /// Resolves a request path into a resource path.
    ///
    /// Only the most specific matching url is searched: when its locations
    /// don't contain the file, less specific urls are not tried.
    pub fn lookup(&self, provider: &dyn ResourceProvider, path: &str) -> Option<String> {
        let relative = self.relative_path(path);
        let found = self.locations.find(&relative)?;
        let resolved = ResourceLookup::lookup(provider, found.remainder, found.value);
        tracing::debug!(
            "Asset {} (url '{}') resolved to {:?}",
            path,
            found.prefix,
            resolved
        );
        resolved
    }

    /// Locations eligible for the path, formatted for error messages.
    pub fn matching_locations(&self, path: &str) -> Vec<String> {
        let relative = self.relative_path(path);
        self.locations
            .matching(&relative)
            .flat_map(|(url, roots)| {
                roots
                    .iter()
                    .map(move |root| trim_slashes(&format!("{}{}", url, root)).replace('/', "."))
            })
            .collect()
    }

    /// Locations searched for the path, in search order.
    pub fn locations_for(&self, path: &str) -> Vec<String> {
        let relative = self.relative_path(path);
        self.locations
            .find(&relative)
            .map(|m| m.value.clone())
            .unwrap_or_default()
    }

    /// Root url locations, in search order.
    pub fn root_locations(&self) -> &[String] {
        self.locations.get("").map(Vec::as_slice).unwrap_or(&[])
    }

    /// All configured urls with their locations, most specific first.
    pub fn locations(&self) -> impl Iterator<Item = (&str, &Vec<String>)> {
        self.locations.entries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MemoryProvider;

    fn lookup(configure: impl FnOnce(&mut AssetSources)) -> AssetLookup {
        let mut sources = AssetSources::new();
        sources.attach("com.app.ui");
        configure(&mut sources);
        AssetLookup::new("com.app.ui", &sources)
    }

    #[test]
    fn test_primary_location_lookup() {
        let provider = MemoryProvider::new().with("com/app/ui/style.css", "body{}");
        let assets = lookup(|_| {});
        assert_eq!(assets.lookup(&provider, "/style.css").as_deref(), Some("com/app/ui/style.css"));
        assert_eq!(
            assets.lookup(&provider, "com/app/ui/style.css").as_deref(),
            Some("com/app/ui/style.css")
        );
        assert_eq!(assets.lookup(&provider, "missing.css"), None);
    }

    #[test]
    fn test_later_location_overrides() {
        let provider = MemoryProvider::new()
            .with("pkgA/x.js", "a")
            .with("pkgB/x.js", "b");
        let mut sources = AssetSources::new();
        sources.attach("pkgA");
        sources.attach("pkgB");
        let assets = AssetLookup::new("pkgA", &sources);
        assert_eq!(assets.lookup(&provider, "x.js").as_deref(), Some("pkgB/x.js"));
        assert_eq!(assets.root_locations(), ["pkgB/", "pkgA/"]);
    }

    #[test]
    fn test_sub_url_shadows_root() {
        let provider = MemoryProvider::new()
            .with("com/app/ui/foo/a.js", "root")
            .with("com/ext/a.js", "ext");
        let assets = lookup(|s| s.attach_to("/foo", "com.ext"));
        assert_eq!(assets.lookup(&provider, "foo/a.js").as_deref(), Some("com/ext/a.js"));
        // no fall through to the root mapping
        assert_eq!(assets.lookup(&provider, "foo/b.js"), None);
        assert_eq!(assets.locations_for("foo/b.js"), ["com/ext/"]);
        // partial segment never matches
        assert_eq!(assets.locations_for("foobar/a.js"), ["com/app/ui/"]);
    }

    #[test]
    fn test_matching_locations() {
        let assets = lookup(|s| s.attach_to("/foo", "com.ext"));
        assert_eq!(assets.matching_locations("foo/a.js"), ["foo.com.ext", "com.app.ui"]);
    }

    #[test]
    fn test_merge_keeps_order() {
        let mut app = AssetSources::new();
        app.attach("a");
        let mut ext = AssetSources::new();
        ext.attach("b");
        ext.attach("a");
        app.merge(&ext);
        assert_eq!(app.get(""), ["a/", "b/"]);
    }
}

// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! View rest prefixes.
//!
//! A page request `/app/something` is rendered by the view layer under
//! `{rest}/{prefix}/something`. Sub urls can be mapped to their own prefix:
//! with `/sub/` mapped to `other`, `/app/sub/page` goes to `{rest}/other/page`.

use std::collections::BTreeMap;

use crate::error::{PagesError, Result};
use crate::path::{join, normalize_relative_path, trim_slashes, SLASH};
use crate::prefix::PrefixRouter;

/// View prefixes registered for an application.
#[derive(Debug, Clone, Default)]
pub struct ViewRestSources {
    prefixes: BTreeMap<String, String>,
}

impl ViewRestSources {
    /// Creates empty sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps the application root to a rest prefix.
    pub fn map(&mut self, prefix: &str) -> Result<()> {
        self.map_to(SLASH, prefix)
    }

    /// Maps a sub url to a rest prefix.
    ///
    /// Each url accepts exactly one prefix.
    pub fn map_to(&mut self, url: &str, prefix: &str) -> Result<()> {
        let url = normalize_relative_path(url);
        if let Some(existing) = self.prefixes.get(&url) {
            return Err(PagesError::DuplicateViewMapping {
                url,
                existing: existing.clone(),
            });
        }
        self.prefixes.insert(url, trim_slashes(prefix).to_string());
        Ok(())
    }

    /// Adds mappings of another configuration, rejecting duplicate urls.
    pub fn merge(&mut self, other: &ViewRestSources) -> Result<()> {
        for (url, prefix) in &other.prefixes {
            self.map_to(url, prefix)?;
        }
        Ok(())
    }

    /// True when the url (normalized) is mapped.
    pub fn contains(&self, url: &str) -> bool {
        self.prefixes.contains_key(&normalize_relative_path(url))
    }

    /// Registered mappings.
    pub fn prefixes(&self) -> &BTreeMap<String, String> {
        &self.prefixes
    }
}

/// Resolved view prefixes of a started application.
#[derive(Debug, Clone)]
pub struct ViewRestLookup {
    prefixes: PrefixRouter<String>,
}

impl ViewRestLookup {
    /// Builds the lookup. The root url falls back to the application name
    /// when nothing was mapped for it.
    pub fn new(app_name: &str, sources: &ViewRestSources) -> Self {
        let mut prefixes = sources.prefixes.clone();
        prefixes
            .entry(String::new())
            .or_insert_with(|| trim_slashes(app_name).to_string());
        Self {
            prefixes: PrefixRouter::new(prefixes),
        }
    }

    /// Prefix of the application root.
    pub fn primary_mapping(&self) -> &str {
        self.prefixes.get("").map(String::as_str).unwrap_or_default()
    }

    /// Target path, relative to the rest root, for an application page.
    pub fn lookup(&self, path: &str) -> Option<String> {
        let relative = path.trim_start_matches('/');
        self.prefixes
            .find(relative)
            .map(|m| join(&[m.value.as_str(), m.remainder]))
    }

    /// All mappings, most specific first.
    pub fn prefixes(&self) -> impl Iterator<Item = (&str, &String)> {
        self.prefixes.entries()
    }

    /// Distinct rest prefixes in use.
    pub fn rest_prefixes(&self) -> Vec<&str> {
        let mut all: Vec<&str> = self.prefixes.entries().map(|(_, p)| p.as_str()).collect();
        all.sort_unstable();
        all.dedup();
        all
    }
}

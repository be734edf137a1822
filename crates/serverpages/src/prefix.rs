// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Longest-prefix-first routing tables.
//!
//! Both asset locations and view mappings are keyed by normalized sub urls
//! (`""`, `foo/`, `foo/bar/`). A [`PrefixRouter`] keeps keys ordered from the
//! longest to the shortest so that more specific mappings shadow the root
//! mapping, which is always checked last.
//!
//! [`PrefixMultimap`] collects registrations (several values per key, in
//! registration order) and turns them into a router with override lists:
//! values registered later come first.

/// A matched router entry.
#[derive(Debug)]
pub struct PrefixMatch<'r, 'p, V> {
    /// The matched prefix.
    pub prefix: &'r str,
    /// Value mapped to the prefix.
    pub value: &'r V,
    /// Path remainder after the prefix.
    pub remainder: &'p str,
}

/// Immutable table of prefixes, longest first.
#[derive(Debug, Clone)]
pub struct PrefixRouter<V> {
    entries: Vec<(String, V)>,
}

impl<V> PrefixRouter<V> {
    /// Builds the router, ordering keys by length (longest first).
    ///
    /// Keys of equal length keep their given order.
    pub fn new(entries: impl IntoIterator<Item = (String, V)>) -> Self {
        let mut entries: Vec<(String, V)> = entries.into_iter().collect();
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { entries }
    }

    /// Finds the longest prefix of `path`.
    pub fn find<'r, 'p>(&'r self, path: &'p str) -> Option<PrefixMatch<'r, 'p, V>> {
        self.entries
            .iter()
            .find(|(prefix, _)| path.starts_with(prefix.as_str()))
            .map(|(prefix, value)| PrefixMatch {
                prefix: prefix.as_str(),
                value,
                remainder: &path[prefix.len()..],
            })
    }

    /// All entries whose prefix matches `path`, longest first.
    pub fn matching<'r>(&'r self, path: &'r str) -> impl Iterator<Item = (&'r str, &'r V)> + 'r {
        self.entries
            .iter()
            .filter(move |(prefix, _)| path.starts_with(prefix.as_str()))
            .map(|(prefix, value)| (prefix.as_str(), value))
    }

    /// Value registered for the exact prefix.
    pub fn get(&self, prefix: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(key, _)| key == prefix)
            .map(|(_, value)| value)
    }

    /// All entries in lookup order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of prefixes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no prefix is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Insertion-ordered multimap of registrations.
///
/// A value registered twice under one key is kept once, at its first
/// position.
#[derive(Debug, Clone, Default)]
pub struct PrefixMultimap {
    entries: Vec<(String, Vec<String>)>,
}

impl PrefixMultimap {
    /// Creates an empty multimap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a value under a key.
    pub fn put(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => {
                if !values.contains(&value) {
                    values.push(value);
                }
            }
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Appends all registrations of another multimap.
    pub fn put_all(&mut self, other: &PrefixMultimap) {
        for (key, values) in &other.entries {
            for value in values {
                self.put(key.clone(), value.clone());
            }
        }
    }

    /// Values registered for a key, in registration order.
    pub fn get(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    /// Registered keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds a router where the last registered value of each key comes first.
    pub fn to_override_router(&self) -> PrefixRouter<Vec<String>> {
        PrefixRouter::new(self.entries.iter().map(|(key, values)| {
            let mut reversed = values.clone();
            reversed.reverse();
            (key.clone(), reversed)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_prefix_first() {
        let router = PrefixRouter::new(vec![
            (String::new(), "root"),
            ("foo/".to_string(), "foo"),
            ("foo/bar/".to_string(), "bar"),
        ]);
        let m = router.find("foo/bar/x.js").unwrap();
        assert_eq!(*m.value, "bar");
        assert_eq!(m.remainder, "x.js");
        assert_eq!(*router.find("foo/x.js").unwrap().value, "foo");
        assert_eq!(*router.find("foobar/x.js").unwrap().value, "root");
        assert_eq!(router.matching("foo/bar/x").count(), 3);
    }

    #[test]
    fn test_registration_order_does_not_matter() {
        let router = PrefixRouter::new(vec![
            ("a/".to_string(), 1),
            ("a/b/".to_string(), 2),
        ]);
        assert_eq!(*router.find("a/b/c").unwrap().value, 2);
    }

    #[test]
    fn test_multimap_override_order() {
        let mut map = PrefixMultimap::new();
        map.put(String::new(), "pkgA/".into());
        map.put(String::new(), "pkgB/".into());
        map.put(String::new(), "pkgA/".into());
        assert_eq!(map.get(""), ["pkgA/", "pkgB/"]);

        let router = map.to_override_router();
        assert_eq!(router.get("").unwrap(), &vec!["pkgB/".to_string(), "pkgA/".to_string()]);
    }
}

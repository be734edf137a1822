// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! HTTP request abstraction for server pages.
//!
//! This module provides a platform-agnostic request type. HTTP adapters build
//! one per incoming request; internal forwards (error pages, SPA routing,
//! template dispatch) derive new ones with [`PageRequest::forwarded_to`].

use std::collections::HashMap;

/// Conditional headers dropped on forward: the target is a different resource.
const CONDITIONAL_HEADERS: [&str; 2] = ["if-none-match", "if-modified-since"];

/// A platform-agnostic HTTP request.
///
/// # Example
///
/// ```rust
/// use serverpages::PageRequest;
///
/// let request = PageRequest::new("/ui/dashboard", "GET")
///     .with_header("Accept", "text/html");
/// assert!(request.accepts_html());
/// ```
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// The request path, including context and mount prefix (e.g., "/ui/dashboard")
    pub path: String,

    /// The HTTP method (e.g., "GET")
    pub method: String,

    /// HTTP headers, keyed by lowercase name
    pub headers: HashMap<String, String>,

    /// Query parameters
    pub query: HashMap<String, String>,

    /// Path of the original request when this one is an internal forward
    pub forwarded_from: Option<String>,
}

impl PageRequest {
    /// Creates a new request with the given path and method.
    pub fn new(path: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            headers: HashMap::new(),
            query: HashMap::new(),
            forwarded_from: None,
        }
    }

    /// Replaces request headers.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        self
    }

    /// Adds one header.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Adds query parameters to the request.
    pub fn with_query(mut self, query: HashMap<String, String>) -> Self {
        self.query = query;
        self
    }

    /// Header value (case-insensitive name).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    /// True unless the client explicitly refuses html.
    ///
    /// A request without `Accept` header is considered to accept anything.
    pub fn accepts_html(&self) -> bool {
        self.header("accept").map(is_html_compatible).unwrap_or(true)
    }

    /// True only when the client explicitly asks for html (or any text).
    pub fn explicitly_accepts_html(&self) -> bool {
        self.header("accept").map(is_html_compatible).unwrap_or(false)
    }

    /// True for internal forwards.
    pub fn is_forwarded(&self) -> bool {
        self.forwarded_from.is_some()
    }

    /// Path the client actually called.
    pub fn original_path(&self) -> &str {
        self.forwarded_from.as_deref().unwrap_or(&self.path)
    }

    /// Derives an internal forward of this request to another path.
    pub fn forwarded_to(&self, path: impl Into<String>) -> Self {
        let mut forward = self.clone();
        forward.forwarded_from = Some(self.original_path().to_string());
        forward.path = path.into();
        for header in CONDITIONAL_HEADERS {
            forward.headers.remove(header);
        }
        forward
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new("/", "GET")
    }
}

/// Checks an `Accept` header value for a media range covering `text/html`.
fn is_html_compatible(accept: &str) -> bool {
    accept
        .split(',')
        .map(|range| range.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
        .any(|range| range == "text/html" || range == "text/*" || range == "*/*")
}

// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Request entry point of an application.
//!
//! Each request below the application mapping is classified:
//!
//! - the application root uses the index file as candidate file name
//! - other requests are checked with the file request matcher
//!   (`/ui/css/style.css?v=1` gives `style.css`)
//! - a candidate file that no renderer recognizes as a template is an asset
//! - everything else (routes, template files) is rendered by the view layer
//!
//! Both branches run with `send_error` intercepted. An intercepted error (or
//! a returned failure) is then offered to the error pages; when no page
//! handles it the raw status is sent.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::asset_handler::AssetHandler;
use crate::error::{HttpError, PagesError, Result};
use crate::path::end_slash;
use crate::redirect::{Forward, TemplateRedirect, MIN_ERROR_STATUS};
use crate::render::RendererRegistry;
use crate::request::PageRequest;
use crate::response::{ErrorCapture, ResponseSink};

/// Default file request detection: a last path segment with an extension,
/// optionally followed by a query.
pub const FILE_REQUEST_PATTERN: &str = r"(?:^|/)([^/]+\.(?:[a-zA-Z\d]+))(?:\?.+)?$";

lazy_static! {
    static ref DEFAULT_FILE_PATTERN: Regex = Regex::new(FILE_REQUEST_PATTERN).unwrap();
}

/// Detects requests addressing a file.
pub trait FileRequestMatcher: Send + Sync {
    /// File name addressed by the uri, if any.
    fn find_file(&self, uri: &str) -> Option<String>;
}

/// Regex based matcher: the first capture group is the file name.
#[derive(Debug, Clone)]
pub struct RegexFileMatcher {
    pattern: Regex,
}

impl RegexFileMatcher {
    /// Compiles the pattern.
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| PagesError::invalid_pattern(pattern, e))?;
        Ok(Self { pattern })
    }

    /// The pattern source.
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

impl Default for RegexFileMatcher {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_FILE_PATTERN.clone(),
        }
    }
}

impl FileRequestMatcher for RegexFileMatcher {
    fn find_file(&self, uri: &str) -> Option<String> {
        self.pattern.captures(uri).map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(0))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        })
    }
}

/// How a request is served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// Static file (the detected file name).
    Asset(String),
    /// Template rendering of the page (path relative to the mapping).
    Template(String),
}

/// Per application request handling.
pub struct ServerPagesFilter {
    uri_path: String,
    index: String,
    files: Box<dyn FileRequestMatcher>,
    renderers: RendererRegistry,
    assets: AssetHandler,
    redirect: Arc<TemplateRedirect>,
}

impl ServerPagesFilter {
    /// Creates the filter for an application mounted at `uri_path`.
    pub fn new(
        uri_path: &str,
        index: &str,
        files: Box<dyn FileRequestMatcher>,
        renderers: RendererRegistry,
        assets: AssetHandler,
        redirect: Arc<TemplateRedirect>,
    ) -> Self {
        Self {
            uri_path: end_slash(uri_path),
            index: index.to_string(),
            files,
            renderers,
            assets,
            redirect,
        }
    }

    /// Application mapping.
    pub fn uri_path(&self) -> &str {
        &self.uri_path
    }

    /// Template redirection of the application.
    pub fn template_redirect(&self) -> &TemplateRedirect {
        &self.redirect
    }

    fn is_root(&self, request: &PageRequest) -> bool {
        end_slash(&request.path) == self.uri_path
    }

    /// Classifies the request.
    pub fn classify(&self, request: &PageRequest) -> RequestKind {
        let file = if self.is_root(request) {
            // index may be a route instead of a file
            self.files.find_file(&self.index).map(|_| self.index.clone())
        } else {
            self.files.find_file(&request.path)
        };
        match file {
            Some(file) if !self.renderers.is_template(&file) => RequestKind::Asset(file),
            _ => {
                let page = request
                    .path
                    .strip_prefix(self.uri_path.as_str())
                    .unwrap_or_default();
                let page = if page.is_empty() { self.index.as_str() } else { page };
                RequestKind::Template(page.to_string())
            }
        }
    }

    /// Serves the request, applying error pages.
    pub fn handle(&self, request: &PageRequest, response: &mut dyn ResponseSink) {
        if self.is_root(request) {
            self.redirect.error_redirect().spa().mark_root(response);
        }
        let kind = self.classify(request);
        tracing::debug!("{} {} served as {:?}", request.method, request.path, kind);

        let (result, captured) = {
            let mut capture = ErrorCapture::new(response);
            let result = match &kind {
                RequestKind::Asset(_) => self.assets.serve(request, &mut capture),
                RequestKind::Template(page) => self.redirect.redirect(request, &mut capture, page),
            };
            (result, capture.error())
        };

        let error = match result {
            Err(e) => {
                tracing::debug!("Failed to serve {}: {}", request.path, e);
                Some(e.to_http())
            }
            Ok(()) => captured.map(HttpError::status),
        };
        if let Some(error) = error {
            self.handle_error(request, response, &error);
        }
    }

    fn handle_error(&self, request: &PageRequest, response: &mut dyn ResponseSink, error: &HttpError) {
        // 3xx pass through
        if error.status < MIN_ERROR_STATUS {
            return;
        }
        if self
            .redirect
            .error_redirect()
            .redirect(request, response, error, self)
        {
            return;
        }
        if response.is_committed() {
            tracing::warn!(
                "Can't send error {} for {}: response already committed",
                error.status,
                request.path
            );
        } else {
            response.send_error(error.status);
        }
    }
}

impl Forward for ServerPagesFilter {
    fn forward(&self, request: &PageRequest, response: &mut dyn ResponseSink) -> Result<()> {
        self.handle(request, response);
        Ok(())
    }
}

impl std::fmt::Debug for ServerPagesFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerPagesFilter")
            .field("uri_path", &self.uri_path)
            .field("index", &self.index)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_file_pattern() {
        let matcher = RegexFileMatcher::default();
        assert_eq!(matcher.find_file("/ui/style.css").as_deref(), Some("style.css"));
        assert_eq!(matcher.find_file("/ui/css/style.min.css?v=2").as_deref(), Some("style.min.css"));
        assert_eq!(matcher.find_file("index.html").as_deref(), Some("index.html"));
        assert_eq!(matcher.find_file("/ui/dashboard"), None);
        assert_eq!(matcher.find_file("/ui/v1.2/"), None);
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(RegexFileMatcher::new("([a-z]").is_err());
        assert_eq!(RegexFileMatcher::new(r"\.(\w+)$").unwrap().as_str(), r"\.(\w+)$");
    }
}

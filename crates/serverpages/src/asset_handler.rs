// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Static assets of an application, served from all its locations.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::assets::AssetLookup;
use crate::error::{Result, NOT_FOUND};
use crate::path::end_slash;
use crate::request::PageRequest;
use crate::resource::ResourceProvider;
use crate::response::ResponseSink;

/// Serves files resolved through the application [`AssetLookup`].
///
/// Missing files are reported with `send_error(404)` so error pages apply.
pub struct AssetHandler {
    uri_path: String,
    index: String,
    assets: Arc<AssetLookup>,
    provider: Arc<dyn ResourceProvider>,
}

impl AssetHandler {
    /// Creates a handler for an application mounted at `uri_path`.
    pub fn new(
        uri_path: &str,
        index: &str,
        assets: Arc<AssetLookup>,
        provider: Arc<dyn ResourceProvider>,
    ) -> Self {
        Self {
            uri_path: end_slash(uri_path),
            index: index.to_string(),
            assets,
            provider,
        }
    }

    /// Serves the requested file.
    pub fn serve(&self, request: &PageRequest, response: &mut dyn ResponseSink) -> Result<()> {
        if !matches!(request.method.as_str(), "GET" | "HEAD") {
            response.send_error(405);
            return Ok(());
        }

        let mut path = if end_slash(&request.path) == self.uri_path {
            ""
        } else {
            request
                .path
                .strip_prefix(self.uri_path.as_str())
                .unwrap_or(&request.path)
                .trim_start_matches('/')
        };
        if path.is_empty() {
            path = &self.index;
        }

        let Some(resource) = self.assets.lookup(self.provider.as_ref(), path) else {
            tracing::info!(
                "Asset '{}' not found in locations: {:?}",
                path,
                self.assets.matching_locations(path)
            );
            response.send_error(NOT_FOUND);
            return Ok(());
        };

        let content = self.provider.read(&resource)?;
        let etag = format!("\"{:x}\"", Sha256::digest(&content));
        response.set_header("ETag", &etag);
        if request.header("if-none-match") == Some(etag.as_str()) {
            response.set_status(304);
            return Ok(());
        }

        let mime = mime_guess::from_path(&resource).first_or_octet_stream();
        response.set_status(200);
        response.set_header("Content-Type", mime.essence_str());
        response.write(&content);
        Ok(())
    }
}

impl std::fmt::Debug for AssetHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetHandler")
            .field("uri_path", &self.uri_path)
            .field("index", &self.index)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetSources;
    use crate::resource::MemoryProvider;
    use crate::response::{ErrorCapture, PageResponse};

    fn handler() -> AssetHandler {
        let mut sources = AssetSources::new();
        sources.attach("com.app.ui");
        let provider = MemoryProvider::new()
            .with("com/app/ui/style.css", "body{}")
            .with("com/app/ui/index.html", "<html></html>");
        AssetHandler::new(
            "/ui/",
            "index.html",
            Arc::new(AssetLookup::new("com.app.ui", &sources)),
            Arc::new(provider),
        )
    }

    #[test]
    fn test_serves_asset() {
        let mut response = PageResponse::new();
        handler()
            .serve(&PageRequest::new("/ui/style.css", "GET"), &mut response)
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.header("content-type"), Some("text/css"));
        assert_eq!(response.body(), b"body{}");
    }

    #[test]
    fn test_root_serves_index() {
        let mut response = PageResponse::new();
        handler()
            .serve(&PageRequest::new("/ui/", "GET"), &mut response)
            .unwrap();
        assert_eq!(response.body_str(), Some("<html></html>"));
    }

    #[test]
    fn test_etag_not_modified() {
        let handler = handler();
        let mut first = PageResponse::new();
        handler
            .serve(&PageRequest::new("/ui/style.css", "GET"), &mut first)
            .unwrap();
        let etag = first.header("etag").unwrap().to_string();

        let mut second = PageResponse::new();
        handler
            .serve(
                &PageRequest::new("/ui/style.css", "GET").with_header("If-None-Match", etag),
                &mut second,
            )
            .unwrap();
        assert_eq!(second.status(), 304);
        assert!(second.body().is_empty());
    }

    #[test]
    fn test_missing_asset_sends_404() {
        let mut response = PageResponse::new();
        let error = {
            let mut capture = ErrorCapture::new(&mut response);
            handler()
                .serve(&PageRequest::new("/ui/missing.js", "GET"), &mut capture)
                .unwrap();
            capture.error()
        };
        assert_eq!(error, Some(404));
        assert!(!response.is_committed());
    }
}

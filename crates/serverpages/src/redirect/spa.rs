// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Single page application routing.
//!
//! Client-side routes (`/app/users/12`) don't exist on the server. With SPA
//! support enabled, a 404 for a browser page request is answered with the
//! application index instead. Requests that look like static files keep
//! their 404.

use regex::Regex;

use crate::error::{PagesError, Result, NOT_FOUND};
use crate::path::end_slash;
use crate::redirect::Forward;
use crate::request::PageRequest;
use crate::response::ResponseSink;

/// Requests matching this are never routed to the index.
pub const DEFAULT_NO_REDIRECT_REGEX: &str =
    r"\.(html|css|js|png|jpg|jpeg|gif|ico|xml|rss|txt|eot|svg|ttf|woff|woff2|cur)(\?((r|v|rel|rev)=[\-\.\w]*)?)?$";

const NO_CACHE: &str = "must-revalidate,no-cache,no-store";

/// SPA routing of one application.
#[derive(Debug, Clone)]
pub struct SpaSupport {
    enabled: bool,
    target: String,
    no_redirect: Option<Regex>,
}

impl SpaSupport {
    /// Enables routing to `target` (the application mapping).
    pub fn new(target: &str, no_redirect_regex: &str) -> Result<Self> {
        let no_redirect = Regex::new(no_redirect_regex)
            .map_err(|e| PagesError::invalid_pattern(no_redirect_regex, e))?;
        Ok(Self {
            enabled: true,
            target: end_slash(target),
            no_redirect: Some(no_redirect),
        })
    }

    /// Routing switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            target: String::new(),
            no_redirect: None,
        }
    }

    /// True when routing is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disables caching of the index page when it is called directly.
    pub fn mark_root(&self, response: &mut dyn ResponseSink) {
        if self.enabled {
            response.set_header("Cache-Control", NO_CACHE);
        }
    }

    /// True when the request is a browser page request that may be routed.
    pub fn is_redirect_allowed(&self, request: &PageRequest) -> bool {
        let Some(no_redirect) = &self.no_redirect else {
            return false;
        };
        self.enabled
            && !request.is_forwarded()
            && end_slash(&request.path) != self.target
            && request.explicitly_accepts_html()
            && !no_redirect.is_match(&request.path)
    }

    /// Forwards a 404 to the application index.
    ///
    /// Returns true when the index was served instead of the error.
    pub fn redirect_404(
        &self,
        request: &PageRequest,
        response: &mut dyn ResponseSink,
        status: u16,
        forward: &dyn Forward,
    ) -> bool {
        if status != NOT_FOUND || !self.is_redirect_allowed(request) || response.is_committed() {
            return false;
        }
        tracing::debug!("SPA route {} served with {}", request.path, self.target);
        response.set_header("Cache-Control", NO_CACHE);
        match forward.forward(&request.forwarded_to(self.target.as_str()), response) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to route {} to {}: {}", request.path, self.target, e);
                false
            }
        }
    }
}

// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Error pages.
//!
//! Errors raised while serving assets or rendering templates are replaced by
//! the application's error page for the status (or its default error page).
//! While an error page renders, the triggering error is bound to the current
//! thread: views can show it, and a failure of the error page itself is
//! detected instead of recursing into error handling again. In that case the
//! client gets the original status without a body.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::error::{HttpError, PagesError, Result, INTERNAL_SERVER_ERROR};
use crate::path::normalize_path;
use crate::redirect::spa::SpaSupport;
use crate::redirect::Forward;
use crate::request::PageRequest;
use crate::response::{ErrorCapture, ResponseSink};

/// Key of the page used for statuses without a dedicated page.
pub const DEFAULT_ERROR_PAGE: i32 = -1;

/// Lowest status handled by error pages.
pub const MIN_ERROR_STATUS: u16 = 400;

thread_local! {
    static ERROR_CONTEXT: RefCell<Option<ActiveError>> = const { RefCell::new(None) };
}

/// Error pages by status code.
#[derive(Debug, Clone, Default)]
pub struct ErrorPages {
    pages: BTreeMap<i32, String>,
}

impl ErrorPages {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a page for a status code (400 and above) or for
    /// [`DEFAULT_ERROR_PAGE`].
    pub fn register(&mut self, code: i32, page: &str) -> Result<()> {
        if code != DEFAULT_ERROR_PAGE && code < i32::from(MIN_ERROR_STATUS) {
            return Err(PagesError::InvalidErrorCode(code));
        }
        self.pages.insert(code, page.to_string());
        Ok(())
    }

    /// Registers the default page.
    pub fn set_default(&mut self, page: &str) {
        self.pages.insert(DEFAULT_ERROR_PAGE, page.to_string());
    }

    /// Page for the status: exact match first, then the default page.
    ///
    /// Statuses below 400 never select a page.
    pub fn select(&self, status: u16) -> Option<&str> {
        if status < MIN_ERROR_STATUS {
            return None;
        }
        self.pages
            .get(&i32::from(status))
            .or_else(|| self.pages.get(&DEFAULT_ERROR_PAGE))
            .map(String::as_str)
    }

    /// Copy with all pages made absolute against the application mapping.
    pub fn resolved(&self, app_mapping: &str) -> Self {
        Self {
            pages: self
                .pages
                .iter()
                .map(|(code, page)| (*code, normalize_path(app_mapping, page)))
                .collect(),
        }
    }

    /// Registered pages by code; the default page comes first.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &str)> {
        self.pages.iter().map(|(code, page)| (*code, page.as_str()))
    }

    /// True when no page is registered.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Error being rendered by an error page.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Triggering error.
    pub error: HttpError,
    /// Url the client called.
    pub url: String,
    /// Error page path.
    pub page: String,
}

#[derive(Debug)]
struct ActiveError {
    context: ErrorContext,
    failed: bool,
}

/// Clears the thread error context when dropped.
struct ErrorContextGuard;

impl ErrorContextGuard {
    fn enter(context: ErrorContext) -> Self {
        ERROR_CONTEXT.with(|current| {
            current.replace(Some(ActiveError {
                context,
                failed: false,
            }));
        });
        ErrorContextGuard
    }

    fn failed(&self) -> bool {
        ERROR_CONTEXT.with(|current| current.borrow().as_ref().map(|a| a.failed).unwrap_or(false))
    }
}

impl Drop for ErrorContextGuard {
    fn drop(&mut self) {
        ERROR_CONTEXT.with(|current| {
            current.replace(None);
        });
    }
}

/// Error page redirection of one application.
#[derive(Debug)]
pub struct ErrorRedirect {
    pages: ErrorPages,
    spa: SpaSupport,
    log_errors: bool,
}

impl ErrorRedirect {
    /// Creates error redirection with pages relative to `app_mapping`.
    pub fn new(app_mapping: &str, pages: ErrorPages, spa: SpaSupport, log_errors: bool) -> Self {
        Self {
            pages: pages.resolved(app_mapping),
            spa,
            log_errors,
        }
    }

    /// Error being rendered on the current thread, if any.
    pub fn context_error() -> Option<HttpError> {
        Self::error_context().map(|c| c.error)
    }

    /// Full error context of the current thread, if any.
    pub fn error_context() -> Option<ErrorContext> {
        ERROR_CONTEXT.with(|current| current.borrow().as_ref().map(|a| a.context.clone()))
    }

    /// Error page for the status.
    pub fn select_error_page(&self, status: u16) -> Option<&str> {
        self.pages.select(status)
    }

    /// True when the error would be handled by an error page.
    pub fn is_redirectable(&self, error: &HttpError) -> bool {
        self.pages.select(error.status).is_some()
    }

    /// SPA routing support of the application.
    pub fn spa(&self) -> &SpaSupport {
        &self.spa
    }

    /// Resolved error pages.
    pub fn pages(&self) -> &ErrorPages {
        &self.pages
    }

    /// Handles an error: SPA route, error page or nothing.
    ///
    /// Returns `false` when nothing was written and the caller should send
    /// the raw status. Returns `true` when the response was produced here,
    /// including the fallback to the raw status after an error page failure.
    pub fn redirect(
        &self,
        request: &PageRequest,
        response: &mut dyn ResponseSink,
        error: &HttpError,
        forward: &dyn Forward,
    ) -> bool {
        if self.spa.redirect_404(request, response, error.status, forward) {
            return true;
        }
        if !request.accepts_html() {
            tracing::debug!("Error page not used for {}: html not accepted", request.path);
            return false;
        }
        let Some(page) = self.pages.select(error.status) else {
            return false;
        };

        let nested = ERROR_CONTEXT.with(|current| {
            current.borrow_mut().as_mut().map(|active| {
                active.failed = true;
                active.context.page.clone()
            })
        });
        if let Some(rendering) = nested {
            tracing::warn!(
                "Error {} while rendering error page '{}', error page not applied again",
                error.status,
                rendering
            );
            return false;
        }
        if response.is_committed() {
            tracing::warn!(
                "Can't render error page '{}' for {}: response already committed",
                page,
                request.original_path()
            );
            return false;
        }

        let guard = ErrorContextGuard::enter(ErrorContext {
            error: error.clone(),
            url: request.original_path().to_string(),
            page: page.to_string(),
        });
        let (result, captured) = {
            let mut capture = ErrorCapture::with_status(response, error.status);
            let result = forward.forward(&request.forwarded_to(page), &mut capture);
            (result, capture.error())
        };
        let failed = guard.failed();
        drop(guard);

        match (result, captured) {
            (Ok(()), None) if !failed => {
                if self.log_errors || error.status == INTERNAL_SERVER_ERROR {
                    tracing::error!(
                        "Error serving response for '{}' (handled as '{}'): {}. Custom error page '{}' rendered",
                        request.original_path(),
                        request.path,
                        error,
                        page
                    );
                } else {
                    tracing::debug!("Error page '{}' rendered for {}", page, error);
                }
            }
            (result, captured) => {
                // the original error is logged, not the error page failure
                tracing::error!(
                    "Failed to render error page '{}' instead of {} for '{}' (page failure: {})",
                    page,
                    error,
                    request.original_path(),
                    match result {
                        Err(e) => e.to_string(),
                        Ok(()) => format!("status {}", captured.unwrap_or(error.status)),
                    }
                );
                if response.is_committed() {
                    tracing::warn!("Response already committed, original status {} not sent", error.status);
                } else {
                    response.reset();
                    response.send_error(error.status);
                }
            }
        }
        true
    }
}

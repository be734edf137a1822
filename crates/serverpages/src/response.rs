// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! HTTP response abstraction for server pages.
//!
//! Request handling writes into a [`ResponseSink`]. Asset serving and
//! template rendering report failures with [`ResponseSink::send_error`];
//! [`ErrorCapture`] intercepts those calls so error pages can be rendered
//! instead of the raw status.

use std::collections::HashMap;

/// Writable response, servlet style.
///
/// Writing the body commits the response: status and headers can't change
/// afterwards and nothing can be rendered in place of it.
pub trait ResponseSink {
    /// Current status code.
    fn status(&self) -> u16;

    /// Sets the status code. Ignored once committed.
    fn set_status(&mut self, status: u16);

    /// Sets a header. Ignored once committed.
    fn set_header(&mut self, name: &str, value: &str);

    /// Appends to the body and commits the response.
    fn write(&mut self, body: &[u8]);

    /// Finishes the response with an error status.
    fn send_error(&mut self, status: u16);

    /// True when the response can no longer be changed.
    fn is_committed(&self) -> bool;

    /// Clears status, headers and body. No effect once committed.
    fn reset(&mut self);
}

/// Buffered response produced by request handling.
///
/// # Example
///
/// ```rust
/// use serverpages::{PageResponse, ResponseSink};
///
/// let mut response = PageResponse::new();
/// response.set_header("Content-Type", "text/plain");
/// response.write(b"hello");
/// assert!(response.is_committed());
/// assert_eq!(response.body(), b"hello");
/// ```
#[derive(Debug, Clone)]
pub struct PageResponse {
    status: u16,
    headers: HashMap<String, String>,
    body: Vec<u8>,
    error: Option<u16>,
    committed: bool,
}

impl PageResponse {
    /// Creates an empty 200 response.
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: HashMap::new(),
            body: Vec::new(),
            error: None,
            committed: false,
        }
    }

    /// Creates a committed error response.
    pub fn error(status: u16) -> Self {
        let mut response = Self::new();
        response.send_error(status);
        response
    }

    /// Response headers, keyed by lowercase name.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Header value (case-insensitive name).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    /// Response body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as a string, if valid UTF-8.
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Status sent with `send_error`, when the response ended that way.
    ///
    /// Adapters render their default error body for such responses.
    pub fn sent_error(&self) -> Option<u16> {
        self.error
    }

    /// Splits into status, headers and body.
    pub fn into_parts(self) -> (u16, HashMap<String, String>, Vec<u8>) {
        (self.status, self.headers, self.body)
    }
}

impl Default for PageResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSink for PageResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn set_status(&mut self, status: u16) {
        if !self.committed {
            self.status = status;
        }
    }

    fn set_header(&mut self, name: &str, value: &str) {
        if !self.committed {
            self.headers
                .insert(name.to_ascii_lowercase(), value.to_string());
        }
    }

    fn write(&mut self, body: &[u8]) {
        self.body.extend_from_slice(body);
        self.committed = true;
    }

    fn send_error(&mut self, status: u16) {
        if self.committed {
            tracing::warn!("Can't send error {}: response already committed", status);
            return;
        }
        self.status = status;
        self.body.clear();
        self.error = Some(status);
        self.committed = true;
    }

    fn is_committed(&self) -> bool {
        self.committed
    }

    fn reset(&mut self) {
        if !self.committed {
            *self = Self::new();
        }
    }
}

/// Response wrapper intercepting `send_error`.
///
/// Error statuses (400 and above) are recorded instead of being sent, so the
/// caller can decide whether an error page replaces them. Other calls pass
/// through to the wrapped response.
///
/// While an error page renders the wrapper can also pin the response status:
/// success statuses set by the page are ignored so the client still gets the
/// original error code.
pub struct ErrorCapture<'a> {
    inner: &'a mut dyn ResponseSink,
    error: Option<u16>,
    forced_status: Option<u16>,
}

impl<'a> ErrorCapture<'a> {
    /// Wraps a response.
    pub fn new(inner: &'a mut dyn ResponseSink) -> Self {
        Self {
            inner,
            error: None,
            forced_status: None,
        }
    }

    /// Wraps a response keeping the given status unless an error status
    /// replaces it.
    pub fn with_status(inner: &'a mut dyn ResponseSink, status: u16) -> Self {
        inner.set_status(status);
        Self {
            inner,
            error: None,
            forced_status: Some(status),
        }
    }

    /// Last intercepted error status.
    pub fn error(&self) -> Option<u16> {
        self.error
    }
}

impl ResponseSink for ErrorCapture<'_> {
    fn status(&self) -> u16 {
        self.inner.status()
    }

    fn set_status(&mut self, status: u16) {
        match self.forced_status {
            Some(_) if status < 300 => {}
            _ => self.inner.set_status(status),
        }
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.inner.set_header(name, value);
    }

    fn write(&mut self, body: &[u8]) {
        self.inner.write(body);
    }

    fn send_error(&mut self, status: u16) {
        if status >= 400 {
            tracing::debug!("Intercepted error status {}", status);
            self.error = Some(status);
        } else {
            self.inner.send_error(status);
        }
    }

    fn is_committed(&self) -> bool {
        self.inner.is_committed()
    }

    fn reset(&mut self) {
        self.inner.reset();
        if let Some(status) = self.forced_status {
            self.inner.set_status(status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_error_commits() {
        let mut response = PageResponse::new();
        response.set_header("X-Test", "1");
        response.send_error(404);
        assert!(response.is_committed());
        assert_eq!(response.sent_error(), Some(404));
        assert_eq!(response.status(), 404);

        // committed responses ignore further changes
        response.set_status(200);
        response.send_error(500);
        assert_eq!(response.status(), 404);
    }

    #[test]
    fn test_capture_intercepts_errors() {
        let mut response = PageResponse::new();
        let error = {
            let mut capture = ErrorCapture::new(&mut response);
            capture.send_error(404);
            capture.send_error(500);
            assert!(!capture.is_committed());
            capture.error()
        };
        assert_eq!(error, Some(500));
        assert!(!response.is_committed());
        assert_eq!(response.status(), 200);
    }

    #[test]
    fn test_forced_status() {
        let mut response = PageResponse::new();
        {
            let mut capture = ErrorCapture::with_status(&mut response, 404);
            capture.set_status(200);
            capture.set_header("Content-Type", "text/html");
            capture.write(b"<h1>Not here</h1>");
        }
        assert_eq!(response.status(), 404);
        assert_eq!(response.header("content-type"), Some("text/html"));
        assert_eq!(response.sent_error(), None);
    }
}

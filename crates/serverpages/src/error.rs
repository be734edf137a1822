// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Error types for server pages.
//!
//! This module defines [`PagesError`], the main error enum, and [`HttpError`],
//! the status-carrying error object that flows through error page handling.
//!
//! # Error Categories
//!
//! - **Configuration errors**: raised at registration or startup, never at request time
//! - **Resolution errors**: asset or template not found in any configured location
//! - **Render errors**: failures while producing a template
//! - **HTTP errors**: explicit status codes raised by view handlers

use std::fmt;
use thiserror::Error;

/// Status code used for errors that carry no explicit status.
pub const INTERNAL_SERVER_ERROR: u16 = 500;

/// Status code used for missing assets and templates.
pub const NOT_FOUND: u16 = 404;

/// An error with an HTTP status attached.
///
/// This is what error pages see: either a plain status (e.g. an asset handler
/// answered 404) or a converted failure with its message preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    /// HTTP status code.
    pub status: u16,
    /// Human readable description.
    pub message: String,
}

impl HttpError {
    /// Creates an error carrying only a status code.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            message: default_reason(status).to_string(),
        }
    }

    /// Creates an error with a status and message.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}: {}", self.status, self.message)
    }
}

impl std::error::Error for HttpError {}

/// The main error type for server pages operations.
#[derive(Error, Debug)]
pub enum PagesError {
    /// Two applications registered under one name.
    #[error("Server pages application with name '{0}' is already registered")]
    DuplicateApplication(String),

    /// A view sub url was mapped twice.
    #[error("View mapping for url '{url}' already registered to prefix '{existing}'")]
    DuplicateViewMapping {
        /// Normalized sub url.
        url: String,
        /// Prefix already mapped for the url.
        existing: String,
    },

    /// Error page registered for a non-error status.
    #[error("Only error codes (4xx, 5xx) allowed for mapping, got {0}")]
    InvalidErrorCode(i32),

    /// Registration attempted after startup.
    #[error("Server pages application '{0}' is already started")]
    AlreadyStarted(String),

    /// Assets path resolves to the resources root.
    #[error("'{0}' is the classpath root")]
    ClasspathRoot(String),

    /// Configured regular expression does not compile.
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The rejected expression.
        pattern: String,
        /// Compilation failure.
        #[source]
        source: regex::Error,
    },

    /// A required template renderer is not registered.
    #[error("Required template renderers not available for application '{app}': {missing:?}")]
    MissingRenderer {
        /// Application name.
        app: String,
        /// Missing renderer names.
        missing: Vec<String>,
    },

    /// Two applications mounted on the same uri in one context.
    #[error("Server pages application '{app}' registration clash with '{other}' on path {uri}")]
    MountClash {
        /// Application being installed.
        app: String,
        /// Application already mounted.
        other: String,
        /// Shared mount path.
        uri: String,
    },

    /// Start attempted after a failed installation.
    #[error("Server pages startup already failed: {0}")]
    StartupFailed(String),

    /// Extension or lookup for an application that was never registered.
    #[error("Unknown server pages application '{0}'")]
    UnknownApplication(String),

    /// Invalid view handler route.
    #[error("Invalid view route '{route}': {message}")]
    InvalidRoute {
        /// Route pattern.
        route: String,
        /// Router message.
        message: String,
    },

    /// Resource missing in every searched location.
    #[error("Resource '{path}' not found in locations: {locations:?}")]
    ResourceNotFound {
        /// Requested path.
        path: String,
        /// Searched roots.
        locations: Vec<String>,
    },

    /// Template could not be located.
    #[error("Template {0} not found")]
    TemplateNotFound(String),

    /// No registered renderer accepts the template.
    #[error("No renderer found for template {0}")]
    NoRenderer(String),

    /// Template rendering failed.
    #[error("Failed to render template {template}: {message}")]
    RenderError {
        /// Template path.
        template: String,
        /// Failure description.
        message: String,
    },

    /// Template context accessed outside of template processing.
    #[error("No template context found for current thread")]
    NoTemplateContext,

    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Explicit HTTP status error.
    #[error(transparent)]
    Http(#[from] HttpError),
}

impl PagesError {
    /// Returns the HTTP status this error should produce.
    pub fn status(&self) -> u16 {
        match self {
            PagesError::ResourceNotFound { .. } | PagesError::TemplateNotFound(_) => NOT_FOUND,
            PagesError::Http(err) => err.status,
            _ => INTERNAL_SERVER_ERROR,
        }
    }

    /// Converts into the status-carrying form used for error pages.
    pub fn to_http(&self) -> HttpError {
        match self {
            PagesError::Http(err) => err.clone(),
            other => HttpError::new(other.status(), other.to_string()),
        }
    }

    pub(crate) fn invalid_pattern(pattern: &str, source: regex::Error) -> Self {
        PagesError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        }
    }
}

/// Convenience type alias for Results with [`PagesError`].
pub type Result<T> = std::result::Result<T, PagesError>;

/// Canonical reason phrase for common statuses.
pub fn default_reason(status: u16) -> &'static str {
    match status {
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        503 => "Service Unavailable",
        s if s >= 500 => "Server Error",
        s if s >= 400 => "Client Error",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(PagesError::TemplateNotFound("a.tpl".into()).status(), 404);
        assert_eq!(HttpError::status(403).status, 403);
        assert_eq!(PagesError::Http(HttpError::status(418)).status(), 418);
        assert_eq!(PagesError::NoRenderer("x".into()).status(), 500);
    }

    #[test]
    fn test_to_http_keeps_message() {
        let err = PagesError::RenderError {
            template: "/page.tpl".into(),
            message: "boom".into(),
        };
        let http = err.to_http();
        assert_eq!(http.status, 500);
        assert!(http.message.contains("boom"));
    }
}

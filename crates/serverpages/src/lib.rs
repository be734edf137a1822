// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

// Warn on missing documentation for public items
#![warn(missing_docs)]

//! # Server pages
//!
//! Templated views and static assets served under one URL space.
//!
//! A server pages application is mounted on a uri (`/ui/`) and backed by one
//! or more resource locations (`com/app/ui/`). Requests for plain files are
//! served from these locations, everything else is rendered by a template
//! engine through an internal view layer. Errors of both branches are
//! replaced by the application's error pages.
//!
//! ## Features
//!
//! - Multi-location asset lookup with override and per-url locations
//! - Direct template rendering and view handlers with `{param}` routes
//! - Error pages per status code with loop protection
//! - SPA routing (404 becomes the application index)
//! - Extension of applications by other modules before startup
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use serverpages::{Context, Environment, FileSystemProvider, PageRequest, PlaceholderRenderer, ServerPages, ServerPagesApp};
//!
//! let mut pages = ServerPages::new();
//! pages.register_renderer(PlaceholderRenderer)?;
//! pages.register(
//!     ServerPagesApp::builder("app", "com.app.ui", "/ui")
//!         .index_page("index.html")
//!         .error_page("/error.tpl")
//!         .build()?,
//! )?;
//!
//! let runtime = pages.start(&Environment::new(Arc::new(FileSystemProvider::new("./resources"))))?;
//! let response = runtime.handle(Context::Main, PageRequest::new("/ui/dashboard", "GET"));
//! ```

/// Error types.
pub mod error;
/// Path manipulation helpers.
pub mod path;
/// Resource providers and multi-location lookup.
pub mod resource;
/// Longest-prefix routing tables.
pub mod prefix;
/// Application asset locations.
pub mod assets;
/// Application view prefixes.
pub mod views;
/// Request abstraction.
pub mod request;
/// Response abstraction and error interception.
pub mod response;
/// Template engines.
pub mod render;
/// Services available to view handlers.
pub mod services;
/// The internal view layer.
pub mod dispatch;
/// Per request template context.
pub mod context;
/// Template, error page and SPA redirection.
pub mod redirect;
/// Request classification.
pub mod filter;
/// Static asset serving.
pub mod asset_handler;
/// Application declaration and startup.
pub mod app;
/// Application registry and runtime.
pub mod registry;
/// Startup reports.
pub mod report;

pub use app::{AppBuilder, ServerPagesApp};
pub use asset_handler::AssetHandler;
pub use assets::{AssetLookup, AssetSources};
pub use context::TemplateContext;
pub use dispatch::{View, ViewHandler, ViewRegistry, ViewRequest};
pub use error::{HttpError, PagesError, Result};
pub use filter::{FileRequestMatcher, RegexFileMatcher, RequestKind, ServerPagesFilter};
pub use redirect::{ErrorContext, ErrorPages, ErrorRedirect, Forward, SpaSupport, TemplateRedirect};
pub use render::{PlaceholderRenderer, RendererRegistry, ViewRenderer};
pub use registry::{Context, Environment, GlobalConfig, ServerPages, ServerPagesRuntime, SharedServices};
pub use request::PageRequest;
pub use resource::{FileSystemProvider, MemoryProvider, ResourceLookup, ResourceProvider};
pub use response::{ErrorCapture, PageResponse, ResponseSink};
pub use services::Services;
pub use views::{ViewRestLookup, ViewRestSources};

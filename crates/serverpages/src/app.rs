// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Server pages applications.
//!
//! An application is a set of static assets and templates mounted on a uri
//! of the main or admin context. It is declared with an [`AppBuilder`],
//! registered in [`ServerPages`](crate::ServerPages) and started in two
//! steps:
//!
//! 1. [`ServerPagesApp::install`] merges extensions into the final asset
//!    and view mappings and registers the view prefixes
//! 2. [`ServerPagesApp::finalize_startup`] binds the view layer root path and
//!    builds the request filter
//!
//! After startup the application is immutable.

use std::sync::Arc;

use crate::asset_handler::AssetHandler;
use crate::assets::{AssetLookup, AssetSources};
use crate::error::{PagesError, Result};
use crate::filter::{FileRequestMatcher, RegexFileMatcher, ServerPagesFilter, FILE_REQUEST_PATTERN};
use crate::path::{end_slash, join, normalize_classpath_path, prefix_slash};
use crate::redirect::{ErrorPages, ErrorRedirect, SpaSupport, TemplateRedirect, DEFAULT_ERROR_PAGE, DEFAULT_NO_REDIRECT_REGEX};
use crate::registry::{Environment, GlobalConfig, SharedServices};
use crate::report;
use crate::views::{ViewRestLookup, ViewRestSources};

/// State computed on install.
#[derive(Debug)]
struct Installed {
    assets: Arc<AssetLookup>,
    views: Arc<ViewRestLookup>,
    error_redirect: Arc<ErrorRedirect>,
}

/// A server pages application.
pub struct ServerPagesApp {
    name: String,
    main_context: bool,
    uri_path: String,
    full_uri_path: String,
    main_assets_path: String,
    index_file: String,
    file_pattern: String,
    file_matcher: Option<Box<dyn FileRequestMatcher>>,
    required_renderers: Vec<String>,
    spa: bool,
    spa_no_redirect: String,
    error_pages: ErrorPages,
    log_errors: bool,
    assets: AssetSources,
    views: ViewRestSources,
    installed: Option<Installed>,
    filter: Option<Arc<ServerPagesFilter>>,
    started: bool,
}

impl ServerPagesApp {
    /// Starts declaring an application.
    ///
    /// `assets_path` is the resources root of the application (`com.app.ui`
    /// or `/com/app/ui/`), `uri` its mount path.
    pub fn builder(name: &str, assets_path: &str, uri: &str) -> AppBuilder {
        AppBuilder::new(name, assets_path, uri)
    }

    /// Application name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True for the main context, false for the admin context.
    pub fn is_main_context(&self) -> bool {
        self.main_context
    }

    /// Mount path within the context.
    pub fn uri_path(&self) -> &str {
        &self.uri_path
    }

    /// Mount path including the context path (known after install).
    pub fn full_uri_path(&self) -> &str {
        &self.full_uri_path
    }

    /// Resources root of the application.
    pub fn main_assets_path(&self) -> &str {
        &self.main_assets_path
    }

    /// Index file.
    pub fn index_file(&self) -> &str {
        &self.index_file
    }

    /// File request detection pattern.
    pub fn file_pattern(&self) -> &str {
        &self.file_pattern
    }

    /// Renderers the application needs.
    pub fn required_renderers(&self) -> &[String] {
        &self.required_renderers
    }

    /// True when SPA routing is enabled.
    pub fn is_spa(&self) -> bool {
        self.spa
    }

    /// SPA no-redirect regex.
    pub fn spa_no_redirect(&self) -> &str {
        &self.spa_no_redirect
    }

    /// Configured error pages (relative to the application).
    pub fn error_pages(&self) -> &ErrorPages {
        &self.error_pages
    }

    /// True once startup finished.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Final asset mappings (after install).
    pub fn assets(&self) -> Option<&AssetLookup> {
        self.installed.as_ref().map(|i| i.assets.as_ref())
    }

    /// Final view mappings (after install).
    pub fn views(&self) -> Option<&ViewRestLookup> {
        self.installed.as_ref().map(|i| i.views.as_ref())
    }

    /// Request filter (after startup).
    pub fn filter(&self) -> Option<&Arc<ServerPagesFilter>> {
        self.filter.as_ref()
    }

    /// Computes the final mappings of the application.
    ///
    /// Asset and view extensions registered for the application are merged
    /// here; registering them later fails.
    pub fn install(&mut self, environment: &Environment, config: &mut GlobalConfig) -> Result<()> {
        if self.started || self.installed.is_some() {
            return Err(PagesError::AlreadyStarted(self.name.clone()));
        }

        let missing: Vec<String> = self
            .required_renderers
            .iter()
            .filter(|name| !config.renderers().contains(name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(PagesError::MissingRenderer {
                app: self.name.clone(),
                missing,
            });
        }

        let context_path = environment.context_path(self.main_context);
        self.full_uri_path = end_slash(&prefix_slash(&join(&[context_path, self.uri_path.as_str()])));

        if let Some(ext) = config.asset_extensions(&self.name) {
            self.assets.merge(ext);
        }
        let assets = AssetLookup::new(&self.main_assets_path, &self.assets);

        if let Some(ext) = config.view_extensions(&self.name) {
            self.views.merge(ext)?;
        }
        let views = ViewRestLookup::new(&self.name, &self.views);
        for prefix in views.rest_prefixes() {
            config.views_mut().add_template_prefix(prefix);
        }

        let spa = if self.spa {
            SpaSupport::new(&self.uri_path, &self.spa_no_redirect)?
        } else {
            SpaSupport::disabled()
        };
        let error_redirect = ErrorRedirect::new(&self.uri_path, self.error_pages.clone(), spa, self.log_errors);

        tracing::debug!("Server pages app '{}' installed on {}", self.name, self.full_uri_path);
        self.installed = Some(Installed {
            assets: Arc::new(assets),
            views: Arc::new(views),
            error_redirect: Arc::new(error_redirect),
        });
        Ok(())
    }

    /// Completes startup once the view layer is ready.
    ///
    /// `rest_context` and `rest_mapping` locate the view layer (e.g. `/` and
    /// `/rest/*`).
    pub fn finalize_startup(&mut self, rest_context: &str, rest_mapping: &str, shared: &SharedServices) -> Result<()> {
        if self.started {
            return Err(PagesError::AlreadyStarted(self.name.clone()));
        }
        let installed = self
            .installed
            .as_ref()
            .ok_or_else(|| PagesError::UnknownApplication(self.name.clone()))?;

        let redirect = TemplateRedirect::new(
            &self.name,
            &self.full_uri_path,
            Arc::clone(&installed.assets),
            Arc::clone(&installed.views),
            Arc::clone(&shared.provider),
            Arc::clone(&shared.services),
            Arc::clone(&installed.error_redirect),
            Arc::clone(&shared.rest),
        );
        redirect.set_root_path(rest_context, rest_mapping);

        let assets = AssetHandler::new(
            &self.uri_path,
            &self.index_file,
            Arc::clone(&installed.assets),
            Arc::clone(&shared.provider),
        );
        let files = self
            .file_matcher
            .take()
            .unwrap_or_else(|| Box::new(RegexFileMatcher::default()));
        self.filter = Some(Arc::new(ServerPagesFilter::new(
            &self.uri_path,
            &self.index_file,
            files,
            shared.rest.renderers().clone(),
            assets,
            Arc::new(redirect),
        )));
        self.started = true;

        tracing::info!("{}", report::build(self, &shared.rest));
        Ok(())
    }
}

impl std::fmt::Debug for ServerPagesApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerPagesApp")
            .field("name", &self.name)
            .field("main_context", &self.main_context)
            .field("uri_path", &self.uri_path)
            .field("main_assets_path", &self.main_assets_path)
            .field("started", &self.started)
            .finish()
    }
}

/// Declares a [`ServerPagesApp`].
///
/// Invalid settings are reported by [`AppBuilder::build`] (the first one
/// encountered).
///
/// # Example
///
/// ```rust
/// use serverpages::ServerPagesApp;
///
/// let app = ServerPagesApp::builder("app", "com.app.ui", "/ui")
///     .index_page("index.html")
///     .error_page_for(404, "/404.html")
///     .error_page("/error.html")
///     .spa_routing()
///     .build()
///     .unwrap();
/// assert_eq!(app.uri_path(), "/ui/");
/// ```
pub struct AppBuilder {
    app: ServerPagesApp,
    error: Option<PagesError>,
}

impl AppBuilder {
    fn new(name: &str, assets_path: &str, uri: &str) -> Self {
        let main_assets_path = normalize_classpath_path(assets_path);
        let mut assets = AssetSources::new();
        assets.attach(&main_assets_path);
        let mut builder = Self {
            app: ServerPagesApp {
                name: name.to_string(),
                main_context: true,
                uri_path: end_slash(&prefix_slash(uri)),
                full_uri_path: String::new(),
                main_assets_path: main_assets_path.clone(),
                index_file: String::new(),
                file_pattern: FILE_REQUEST_PATTERN.to_string(),
                file_matcher: None,
                required_renderers: Vec::new(),
                spa: false,
                spa_no_redirect: DEFAULT_NO_REDIRECT_REGEX.to_string(),
                error_pages: ErrorPages::new(),
                log_errors: false,
                assets,
                views: ViewRestSources::new(),
                installed: None,
                filter: None,
                started: false,
            },
            error: None,
        };
        if main_assets_path.is_empty() {
            builder.fail(PagesError::ClasspathRoot(assets_path.to_string()));
        }
        builder
    }

    fn fail(&mut self, error: PagesError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn check(mut self, result: Result<()>) -> Self {
        if let Err(e) = result {
            self.fail(e);
        }
        self
    }

    /// Index file served for the application root (file or template).
    pub fn index_page(mut self, index: &str) -> Self {
        self.app.index_file = index.to_string();
        self
    }

    /// Default error page, used for statuses without a dedicated page.
    pub fn error_page(self, page: &str) -> Self {
        self.error_page_for(DEFAULT_ERROR_PAGE, page)
    }

    /// Error page for a status code (400 and above).
    pub fn error_page_for(mut self, code: i32, page: &str) -> Self {
        let result = self.app.error_pages.register(code, page);
        self.check(result)
    }

    /// Custom file request detection regex (first group is the file name).
    pub fn file_pattern(mut self, pattern: &str) -> Self {
        match RegexFileMatcher::new(pattern) {
            Ok(matcher) => {
                self.app.file_pattern = pattern.to_string();
                self.app.file_matcher = Some(Box::new(matcher));
            }
            Err(e) => self.fail(e),
        }
        self
    }

    /// Custom file request detection.
    pub fn file_matcher<M: FileRequestMatcher + 'static>(mut self, matcher: M) -> Self {
        self.app.file_pattern = String::from("<custom>");
        self.app.file_matcher = Some(Box::new(matcher));
        self
    }

    /// Enables SPA routing with the default no-redirect regex.
    pub fn spa_routing(mut self) -> Self {
        self.app.spa = true;
        self
    }

    /// Enables SPA routing with a custom no-redirect regex.
    pub fn spa_no_redirect_regex(mut self, regex: &str) -> Self {
        if let Err(e) = regex::Regex::new(regex) {
            self.fail(PagesError::invalid_pattern(regex, e));
            return self;
        }
        self.app.spa = true;
        self.app.spa_no_redirect = regex.to_string();
        self
    }

    /// Template renderers which must be available on startup.
    pub fn require_renderers(mut self, names: &[&str]) -> Self {
        for name in names {
            if !self.app.required_renderers.iter().any(|r| r == name) {
                self.app.required_renderers.push(name.to_string());
            }
        }
        self
    }

    /// Adds a resources root; later roots override earlier ones.
    pub fn attach_assets(mut self, location: &str) -> Self {
        self.app.assets.attach(location);
        self
    }

    /// Adds a resources root for a sub url.
    pub fn attach_assets_for_url(mut self, url: &str, location: &str) -> Self {
        self.app.assets.attach_to(url, location);
        self
    }

    /// View prefix of the application root (defaults to the application name).
    pub fn map_views(mut self, prefix: &str) -> Self {
        let result = self.app.views.map(prefix);
        self.check(result)
    }

    /// View prefix for a sub url.
    pub fn map_views_for_url(mut self, url: &str, prefix: &str) -> Self {
        let result = self.app.views.map_to(url, prefix);
        self.check(result)
    }

    /// Logs all errors rendered with error pages (5xx are always logged).
    pub fn log_errors(mut self, enabled: bool) -> Self {
        self.app.log_errors = enabled;
        self
    }

    /// Mounts the application in the admin context.
    pub fn admin(mut self, admin: bool) -> Self {
        self.app.main_context = !admin;
        self
    }

    /// Validates and returns the application.
    pub fn build(self) -> Result<ServerPagesApp> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.app),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let app = ServerPagesApp::builder("app", "/com/app/ui/", "ui").build().unwrap();
        assert_eq!(app.uri_path(), "/ui/");
        assert_eq!(app.main_assets_path(), "com/app/ui/");
        assert!(app.is_main_context());
        assert!(!app.is_spa());
        assert_eq!(app.file_pattern(), FILE_REQUEST_PATTERN);
    }

    #[test]
    fn test_classpath_root_rejected() {
        for root in ["/", "", "."] {
            let err = ServerPagesApp::builder("app", root, "/").build().unwrap_err();
            assert!(matches!(err, PagesError::ClasspathRoot(_)), "{}", root);
        }
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert!(matches!(
            ServerPagesApp::builder("app", "com.app", "/").error_page_for(200, "/ok.html").build(),
            Err(PagesError::InvalidErrorCode(200))
        ));
        assert!(matches!(
            ServerPagesApp::builder("app", "com.app", "/").file_pattern("(").build(),
            Err(PagesError::InvalidPattern { .. })
        ));
        assert!(matches!(
            ServerPagesApp::builder("app", "com.app", "/").spa_no_redirect_regex("[").build(),
            Err(PagesError::InvalidPattern { .. })
        ));
        assert!(matches!(
            ServerPagesApp::builder("app", "com.app", "/")
                .map_views_for_url("/a", "x")
                .map_views_for_url("/a/", "y")
                .build(),
            Err(PagesError::DuplicateViewMapping { .. })
        ));
    }

    #[test]
    fn test_admin_and_renderers() {
        let app = ServerPagesApp::builder("adm", "com.adm", "/")
            .admin(true)
            .require_renderers(&["placeholder", "placeholder"])
            .build()
            .unwrap();
        assert!(!app.is_main_context());
        assert_eq!(app.required_renderers(), ["placeholder"]);
    }
}

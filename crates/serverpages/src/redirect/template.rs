// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use std::sync::{Arc, OnceLock};

use crate::assets::AssetLookup;
use crate::context::TemplateContext;
use crate::dispatch::ViewRegistry;
use crate::error::Result;
use crate::path::{join, prefix_slash, trim_stars, SLASH};
use crate::redirect::ErrorRedirect;
use crate::request::PageRequest;
use crate::resource::ResourceProvider;
use crate::response::ResponseSink;
use crate::services::Services;
use crate::views::ViewRestLookup;

/// Hands template requests of one application to the view layer.
///
/// A page `dashboard` of application `app` is dispatched to
/// `{rest root}/{view prefix}/dashboard` under a fresh [`TemplateContext`].
pub struct TemplateRedirect {
    app: String,
    mapping: String,
    assets: Arc<AssetLookup>,
    views: Arc<ViewRestLookup>,
    provider: Arc<dyn ResourceProvider>,
    services: Arc<Services>,
    error_redirect: Arc<ErrorRedirect>,
    rest: Arc<ViewRegistry>,
    root_path: OnceLock<String>,
}

impl TemplateRedirect {
    /// Creates the redirect. `mapping` is the application root url.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        app: &str,
        mapping: &str,
        assets: Arc<AssetLookup>,
        views: Arc<ViewRestLookup>,
        provider: Arc<dyn ResourceProvider>,
        services: Arc<Services>,
        error_redirect: Arc<ErrorRedirect>,
        rest: Arc<ViewRegistry>,
    ) -> Self {
        Self {
            app: app.to_string(),
            mapping: mapping.to_string(),
            assets,
            views,
            provider,
            services,
            error_redirect,
            rest,
            root_path: OnceLock::new(),
        }
    }

    /// Sets the view layer root: rest context path plus rest servlet mapping.
    ///
    /// Only the first call has effect.
    pub fn set_root_path(&self, rest_context: &str, rest_mapping: &str) {
        let root = prefix_slash(&join(&[rest_context, trim_stars(rest_mapping)]));
        if self.root_path.set(root).is_err() {
            tracing::warn!("View root path of '{}' is already set", self.app);
        }
    }

    /// View layer root path.
    pub fn root_path(&self) -> &str {
        self.root_path.get().map(String::as_str).unwrap_or(SLASH)
    }

    /// Error pages support of the application.
    pub fn error_redirect(&self) -> &ErrorRedirect {
        &self.error_redirect
    }

    /// Resolved view prefixes.
    pub fn views(&self) -> &ViewRestLookup {
        &self.views
    }

    /// Context bound to the current thread (only during template dispatch).
    pub fn template_context() -> Option<Arc<TemplateContext>> {
        TemplateContext::try_current()
    }

    /// Internal path rendering the page.
    pub fn target_path(&self, page: &str) -> String {
        let target = self
            .views
            .lookup(page)
            .unwrap_or_else(|| join(&[self.views.primary_mapping(), page]));
        prefix_slash(&join(&[self.root_path(), target.as_str()]))
    }

    /// Renders the page through the view layer.
    ///
    /// The template context is bound for the duration of the call and always
    /// released, whatever the outcome.
    pub fn redirect(&self, request: &PageRequest, response: &mut dyn ResponseSink, page: &str) -> Result<()> {
        let context = Arc::new(TemplateContext::new(
            &self.app,
            &self.mapping,
            request.original_path(),
            Arc::clone(&self.assets),
            Arc::clone(&self.provider),
            Arc::clone(&self.services),
            Arc::clone(&self.error_redirect),
        ));
        let _guard = TemplateContext::bind(Arc::clone(&context));

        let path = self.target_path(page);
        tracing::debug!("Rendering template path: {}", path);
        self.rest.dispatch(&request.forwarded_to(path), response, &context)
    }
}

impl std::fmt::Debug for TemplateRedirect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRedirect")
            .field("app", &self.app)
            .field("mapping", &self.mapping)
            .field("root_path", &self.root_path.get())
            .finish()
    }
}

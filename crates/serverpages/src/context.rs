// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Template rendering context.
//!
//! A [`TemplateContext`] is created for every request entering template
//! rendering. It is passed explicitly to view handlers and is also bound to
//! the current thread while the request is dispatched, so code that only
//! gets the request (template helpers, renderers) can reach it through
//! [`TemplateContext::current`]. The binding is released by a guard on every
//! exit path.

use std::cell::RefCell;
use std::sync::Arc;

use crate::assets::AssetLookup;
use crate::error::{PagesError, Result};
use crate::redirect::ErrorRedirect;
use crate::resource::ResourceProvider;
use crate::services::Services;

thread_local! {
    static CURRENT: RefCell<Option<Arc<TemplateContext>>> = const { RefCell::new(None) };
}

/// Request-scoped state of template rendering.
pub struct TemplateContext {
    app_name: String,
    root_url: String,
    url: String,
    assets: Arc<AssetLookup>,
    provider: Arc<dyn ResourceProvider>,
    services: Arc<Services>,
    error_redirect: Arc<ErrorRedirect>,
}

impl TemplateContext {
    pub(crate) fn new(
        app_name: &str,
        root_url: &str,
        url: &str,
        assets: Arc<AssetLookup>,
        provider: Arc<dyn ResourceProvider>,
        services: Arc<Services>,
        error_redirect: Arc<ErrorRedirect>,
    ) -> Self {
        Self {
            app_name: app_name.to_string(),
            root_url: root_url.to_string(),
            url: url.to_string(),
            assets,
            provider,
            services,
            error_redirect,
        }
    }

    /// Context bound to the current thread.
    pub fn current() -> Result<Arc<TemplateContext>> {
        Self::try_current().ok_or(PagesError::NoTemplateContext)
    }

    /// Context bound to the current thread, if any.
    pub fn try_current() -> Option<Arc<TemplateContext>> {
        CURRENT.with(|current| current.borrow().clone())
    }

    /// Binds the context to the current thread until the guard is dropped.
    pub(crate) fn bind(context: Arc<TemplateContext>) -> ContextGuard {
        CURRENT.with(|current| {
            if current.replace(Some(context)).is_some() {
                tracing::warn!("Replacing template context still bound to the thread");
            }
        });
        ContextGuard
    }

    /// Application name.
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Application root url, including the context path.
    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    /// Url the client called.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Resource roots of the application, in search order.
    pub fn resource_roots(&self) -> &[String] {
        self.assets.root_locations()
    }

    /// Resolved application assets.
    pub fn assets(&self) -> &AssetLookup {
        &self.assets
    }

    /// Error pages support of the application.
    pub fn error_redirect(&self) -> &ErrorRedirect {
        &self.error_redirect
    }

    /// Looks up a service by type.
    pub fn service<T: std::any::Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.services.get::<T>()
    }

    /// Resolves a template to a resource path.
    ///
    /// Absolute templates (`/com/app/page.tpl`) are used as is. Relative ones
    /// are searched in the application locations, so extensions can
    /// override them.
    pub fn lookup_template_path(&self, template: &str) -> Result<String> {
        let resolved = if template.starts_with('/') {
            let absolute = template.trim_start_matches('/');
            self.provider.exists(absolute).then(|| absolute.to_string())
        } else {
            self.assets.lookup(self.provider.as_ref(), template)
        };
        resolved.ok_or_else(|| {
            tracing::info!(
                "Template {} not found in locations: {:?}",
                template,
                self.assets.matching_locations(template)
            );
            PagesError::TemplateNotFound(template.to_string())
        })
    }

    /// Loads template source.
    pub fn read_template(&self, path: &str) -> Result<Vec<u8>> {
        self.provider.read(path)
    }
}

impl std::fmt::Debug for TemplateContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateContext")
            .field("app_name", &self.app_name)
            .field("root_url", &self.root_url)
            .field("url", &self.url)
            .finish()
    }
}

/// Clears the thread binding when dropped.
pub(crate) struct ContextGuard;

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT.with(|current| {
            current.replace(None);
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::assets::AssetSources;
    use crate::redirect::{ErrorPages, SpaSupport};
    use crate::resource::MemoryProvider;

    pub(crate) fn context(provider: MemoryProvider) -> TemplateContext {
        let mut sources = AssetSources::new();
        sources.attach("com.app");
        let error_redirect = ErrorRedirect::new(
            "app",
            ErrorPages::new(),
            SpaSupport::disabled(),
            false,
        );
        TemplateContext::new(
            "app",
            "/ui/",
            "/ui/page",
            Arc::new(AssetLookup::new("com.app", &sources)),
            Arc::new(provider),
            Arc::new(Services::new()),
            Arc::new(error_redirect),
        )
    }

    #[test]
    fn test_binding_is_scoped() {
        assert!(TemplateContext::current().is_err());
        {
            let _guard = TemplateContext::bind(Arc::new(context(MemoryProvider::new())));
            assert_eq!(TemplateContext::current().unwrap().app_name(), "app");
        }
        assert!(TemplateContext::try_current().is_none());
    }

    #[test]
    fn test_rebinding_clears_on_drop() {
        let _outer = TemplateContext::bind(Arc::new(context(MemoryProvider::new())));
        {
            let _inner = TemplateContext::bind(Arc::new(context(MemoryProvider::new())));
        }
        assert!(TemplateContext::try_current().is_none());
    }

    #[test]
    fn test_resource_roots() {
        let context = context(MemoryProvider::new());
        assert_eq!(context.resource_roots(), ["com/app/"]);
    }

    #[test]
    fn test_lookup_template_path() {
        let provider = MemoryProvider::new()
            .with("com/app/page.tpl", "x")
            .with("other/abs.tpl", "y");
        let ctx = context(provider);
        assert_eq!(ctx.lookup_template_path("page.tpl").unwrap(), "com/app/page.tpl");
        assert_eq!(ctx.lookup_template_path("/other/abs.tpl").unwrap(), "other/abs.tpl");
        let err = ctx.lookup_template_path("missing.tpl").unwrap_err();
        assert_eq!(err.status(), 404);
    }
}

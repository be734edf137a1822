// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The view layer.
//!
//! Template requests are dispatched to internal paths below a root path
//! (`/rest/app/dashboard`). The [`ViewRegistry`] maps such paths to view
//! handlers, which pick a template and build its model. Paths without an
//! explicit handler fall back to direct template rendering: the rest of
//! the path after the view prefix names the template file.
//!
//! Handler routes use `{param}` segments:
//!
//! ```text
//! app/dashboard      -> /rest/app/dashboard
//! app/users/{id}     -> /rest/app/users/42 (id = "42")
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde_json::{json, Map, Value as JsonValue};

use crate::context::TemplateContext;
use crate::error::{HttpError, PagesError, Result, NOT_FOUND};
use crate::path::{clean_up_path, prefix_slash, SLASH};
use crate::redirect::ErrorRedirect;
use crate::render::RendererRegistry;
use crate::request::PageRequest;
use crate::response::ResponseSink;

/// Template and model selected by a view handler.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    /// Template name, relative to the application locations or absolute.
    pub template: String,
    /// Template model.
    pub model: JsonValue,
    /// Response status. Error statuses are handled by error pages.
    pub status: Option<u16>,
}

impl View {
    /// Creates a view with an empty model.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            model: JsonValue::Null,
            status: None,
        }
    }

    /// Sets the model.
    pub fn with_model(mut self, model: JsonValue) -> Self {
        self.model = model;
        self
    }

    /// Sets the response status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Request as seen by a view handler.
#[derive(Debug)]
pub struct ViewRequest<'a> {
    /// Forwarded request.
    pub request: &'a PageRequest,
    /// Path relative to the view root (`/app/users/42`).
    pub path: &'a str,
    params: HashMap<String, String>,
}

impl ViewRequest<'_> {
    /// Route parameter value.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }

    /// Query parameter value.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.request.query.get(name).map(|s| s.as_str())
    }
}

/// Builds a view for a request.
pub trait ViewHandler: Send + Sync + 'static {
    /// Selects the template and builds its model.
    fn handle(&self, request: &ViewRequest<'_>, context: &TemplateContext) -> Result<View>;
}

impl<F> ViewHandler for F
where
    F: Fn(&ViewRequest<'_>, &TemplateContext) -> Result<View> + Send + Sync + 'static,
{
    fn handle(&self, request: &ViewRequest<'_>, context: &TemplateContext) -> Result<View> {
        self(request, context)
    }
}

/// View handlers and template prefixes below the view root.
pub struct ViewRegistry {
    root_path: String,
    router: matchit::Router<usize>,
    handlers: Vec<(String, Arc<dyn ViewHandler>)>,
    template_prefixes: BTreeSet<String>,
    renderers: RendererRegistry,
}

impl ViewRegistry {
    /// Creates an empty registry rendering with the given engines.
    pub fn new(renderers: RendererRegistry) -> Self {
        Self {
            root_path: SLASH.to_string(),
            router: matchit::Router::new(),
            handlers: Vec::new(),
            template_prefixes: BTreeSet::new(),
            renderers,
        }
    }

    /// Mounts a handler on a route relative to the view root.
    pub fn route<H: ViewHandler>(&mut self, route: &str, handler: H) -> Result<()> {
        let pattern = route_path(route);
        self.router
            .insert(pattern.clone(), self.handlers.len())
            .map_err(|e| PagesError::InvalidRoute {
                route: route.to_string(),
                message: e.to_string(),
            })?;
        tracing::debug!("View handler mounted on {}", pattern);
        self.handlers.push((pattern, Arc::new(handler)));
        Ok(())
    }

    /// Enables direct template rendering below a view prefix.
    ///
    /// Returns false when the prefix was already enabled (shared by apps).
    pub fn add_template_prefix(&mut self, prefix: &str) -> bool {
        let prefix = prefix.trim_matches('/').to_string();
        let added = self.template_prefixes.insert(prefix.clone());
        if added {
            tracing::debug!("Direct templates handler registered for /{}/", prefix);
        }
        added
    }

    /// Sets the absolute root path of the view layer.
    pub fn set_root_path(&mut self, root_path: &str) {
        self.root_path = prefix_slash(root_path);
    }

    /// Absolute root path of the view layer.
    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    /// Template engines.
    pub fn renderers(&self) -> &RendererRegistry {
        &self.renderers
    }

    pub(crate) fn renderers_mut(&mut self) -> &mut RendererRegistry {
        &mut self.renderers
    }

    /// Mounted handler routes.
    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.handlers.iter().map(|(route, _)| route.as_str())
    }

    /// Handler routes below a view prefix.
    pub fn routes_for(&self, prefix: &str) -> Vec<&str> {
        let start = format!("/{}/", prefix.trim_matches('/'));
        self.routes().filter(|r| r.starts_with(&start)).collect()
    }

    /// True when direct templates are rendered below the prefix.
    pub fn has_template_prefix(&self, prefix: &str) -> bool {
        self.template_prefixes.contains(prefix.trim_matches('/'))
    }

    /// Handles a forwarded template request.
    ///
    /// Errors are returned to the caller; view statuses of 400 and above are
    /// reported with `send_error`.
    pub fn dispatch(
        &self,
        request: &PageRequest,
        response: &mut dyn ResponseSink,
        context: &TemplateContext,
    ) -> Result<()> {
        let relative = request
            .path
            .strip_prefix(self.root_path.as_str())
            .ok_or_else(|| not_found(&request.path))?;
        let path = route_path(relative);

        let view = match self.router.at(&path) {
            Ok(matched) => {
                let (route, handler) = &self.handlers[*matched.value];
                tracing::debug!("View {} handled by route {}", path, route);
                let params = matched
                    .params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                handler.handle(
                    &ViewRequest {
                        request,
                        path: &path,
                        params,
                    },
                    context,
                )?
            }
            Err(_) => self.direct_template(&path)?,
        };
        self.render(view, response, context)
    }

    fn direct_template(&self, path: &str) -> Result<View> {
        let relative = path.trim_start_matches('/');
        let template = self
            .template_prefixes
            .iter()
            .rev()
            .find_map(|prefix| relative.strip_prefix(prefix.as_str())?.strip_prefix('/'))
            .filter(|template| self.renderers.is_template(template))
            .ok_or_else(|| not_found(path))?;
        tracing::debug!("Direct template {} for {}", template, path);
        Ok(View::new(template))
    }

    fn render(&self, view: View, response: &mut dyn ResponseSink, context: &TemplateContext) -> Result<()> {
        let status = view.status.unwrap_or(200);
        if status >= 400 {
            tracing::debug!("View {} answered with status {}", view.template, status);
            response.send_error(status);
            return Ok(());
        }

        let path = context.lookup_template_path(&view.template)?;
        let source = context.read_template(&path)?;
        let model = template_model(view.model, context);
        let html = self.renderers.render(&path, &source, &model)?;

        response.set_status(status);
        response.set_header("Content-Type", "text/html; charset=utf-8");
        response.write(html.as_bytes());
        Ok(())
    }
}

impl std::fmt::Debug for ViewRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewRegistry")
            .field("root_path", &self.root_path)
            .field("routes", &self.routes().collect::<Vec<_>>())
            .field("template_prefixes", &self.template_prefixes)
            .finish()
    }
}

fn route_path(path: &str) -> String {
    let path = prefix_slash(&clean_up_path(path));
    if path.len() > 1 {
        path.trim_end_matches('/').to_string()
    } else {
        path
    }
}

fn not_found(path: &str) -> PagesError {
    PagesError::Http(HttpError::new(NOT_FOUND, format!("No view found for {}", path)))
}

/// Adds `context` (and `error` while an error page renders) to the model.
fn template_model(model: JsonValue, context: &TemplateContext) -> JsonValue {
    let mut map = match model {
        JsonValue::Object(map) => map,
        JsonValue::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("model".to_string(), other);
            map
        }
    };
    map.insert(
        "context".to_string(),
        json!({
            "app": context.app_name(),
            "rootUrl": context.root_url(),
            "url": context.url(),
        }),
    );
    if let Some(error) = ErrorRedirect::context_error() {
        map.insert(
            "error".to_string(),
            json!({"status": error.status, "message": error.message}),
        );
    }
    JsonValue::Object(map)
}

// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Registration and startup of server pages applications.
//!
//! [`ServerPages`] collects applications, renderers, view handlers, services
//! and extensions while the host configures itself. [`ServerPages::start`]
//! installs everything and freezes the configuration into a
//! [`ServerPagesRuntime`], which serves requests and is shared between
//! request threads without locking.

use std::collections::HashMap;
use std::sync::Arc;

use crate::app::ServerPagesApp;
use crate::assets::AssetSources;
use crate::dispatch::{ViewHandler, ViewRegistry};
use crate::error::{PagesError, Result, NOT_FOUND};
use crate::filter::ServerPagesFilter;
use crate::path::{end_slash, join, prefix_slash, trim_stars};
use crate::prefix::PrefixRouter;
use crate::render::{RendererRegistry, ViewRenderer};
use crate::report;
use crate::request::PageRequest;
use crate::resource::ResourceProvider;
use crate::response::PageResponse;
use crate::services::Services;
use crate::views::ViewRestSources;

/// Server context an application is mounted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    /// Main (application) context.
    Main,
    /// Admin context.
    Admin,
}

/// Host environment of the applications.
#[derive(Clone)]
pub struct Environment {
    /// Main context path.
    pub main_context_path: String,
    /// Admin context path.
    pub admin_context_path: String,
    /// Context path of the view layer (the main context path).
    pub rest_context_path: String,
    /// View layer mapping within its context (e.g. `/rest/*`).
    pub rest_mapping: String,
    /// Resources of all applications.
    pub provider: Arc<dyn ResourceProvider>,
}

impl Environment {
    /// Environment with root context paths and the view layer on `/rest/*`.
    pub fn new(provider: Arc<dyn ResourceProvider>) -> Self {
        Self {
            main_context_path: "/".to_string(),
            admin_context_path: "/".to_string(),
            rest_context_path: "/".to_string(),
            rest_mapping: "/rest/*".to_string(),
            provider,
        }
    }

    /// Context path of the main or admin context.
    pub fn context_path(&self, main: bool) -> &str {
        if main {
            &self.main_context_path
        } else {
            &self.admin_context_path
        }
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("main_context_path", &self.main_context_path)
            .field("admin_context_path", &self.admin_context_path)
            .field("rest_context_path", &self.rest_context_path)
            .field("rest_mapping", &self.rest_mapping)
            .finish()
    }
}

/// Configuration shared by all applications during startup.
#[derive(Debug)]
pub struct GlobalConfig {
    views: ViewRegistry,
    services: Services,
    asset_extensions: HashMap<String, AssetSources>,
    view_extensions: HashMap<String, ViewRestSources>,
}

impl GlobalConfig {
    fn new() -> Self {
        Self {
            views: ViewRegistry::new(RendererRegistry::new()),
            services: Services::new(),
            asset_extensions: HashMap::new(),
            view_extensions: HashMap::new(),
        }
    }

    /// Registered renderers.
    pub fn renderers(&self) -> &RendererRegistry {
        self.views.renderers()
    }

    /// View layer under construction.
    pub fn views_mut(&mut self) -> &mut ViewRegistry {
        &mut self.views
    }

    /// Asset extensions registered for an application.
    pub fn asset_extensions(&self, app: &str) -> Option<&AssetSources> {
        self.asset_extensions.get(app)
    }

    /// View extensions registered for an application.
    pub fn view_extensions(&self, app: &str) -> Option<&ViewRestSources> {
        self.view_extensions.get(app)
    }
}

/// Components shared by started applications.
#[derive(Clone)]
pub struct SharedServices {
    /// Resources of all applications.
    pub provider: Arc<dyn ResourceProvider>,
    /// Services available to view handlers.
    pub services: Arc<Services>,
    /// The view layer.
    pub rest: Arc<ViewRegistry>,
}

/// Registry of server pages applications.
#[derive(Debug)]
pub struct ServerPages {
    apps: Vec<ServerPagesApp>,
    config: GlobalConfig,
    started: bool,
    failed: Option<String>,
}

impl Default for ServerPages {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerPages {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            apps: Vec::new(),
            config: GlobalConfig::new(),
            started: false,
            failed: None,
        }
    }

    fn check_not_started(&self, what: &str) -> Result<()> {
        if self.started {
            return Err(PagesError::AlreadyStarted(what.to_string()));
        }
        Ok(())
    }

    /// Registers an application. Names must be unique.
    pub fn register(&mut self, app: ServerPagesApp) -> Result<()> {
        self.check_not_started(app.name())?;
        if self.apps.iter().any(|a| a.name() == app.name()) {
            return Err(PagesError::DuplicateApplication(app.name().to_string()));
        }
        tracing::debug!("Server pages app '{}' registered", app.name());
        self.apps.push(app);
        Ok(())
    }

    /// Registers a template engine.
    pub fn register_renderer<R: ViewRenderer>(&mut self, renderer: R) -> Result<()> {
        self.check_not_started(renderer.name())?;
        self.config.views.renderers_mut().register(renderer);
        Ok(())
    }

    /// Mounts a view handler relative to the view layer root
    /// (`app/users/{id}`).
    pub fn route<H: ViewHandler>(&mut self, route: &str, handler: H) -> Result<()> {
        self.check_not_started(route)?;
        self.config.views.route(route, handler)
    }

    /// Registers a service for view handlers.
    pub fn add_service<T: std::any::Any + Send + Sync>(&mut self, service: T) -> Result<()> {
        self.check_not_started(std::any::type_name::<T>())?;
        self.config.services.insert(service);
        Ok(())
    }

    /// Adds asset locations to an application (possibly registered later).
    pub fn extend_assets(&mut self, app: &str, sources: &AssetSources) -> Result<()> {
        self.check_not_started(app)?;
        self.config
            .asset_extensions
            .entry(app.to_string())
            .or_default()
            .merge(sources);
        Ok(())
    }

    /// Adds view mappings to an application (possibly registered later).
    pub fn extend_views(&mut self, app: &str, sources: &ViewRestSources) -> Result<()> {
        self.check_not_started(app)?;
        self.config
            .view_extensions
            .entry(app.to_string())
            .or_default()
            .merge(sources)
    }

    /// True after [`ServerPages::start`].
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Registered applications.
    pub fn apps(&self) -> &[ServerPagesApp] {
        &self.apps
    }

    /// Registered application by name.
    pub fn app(&self, name: &str) -> Result<&ServerPagesApp> {
        self.apps
            .iter()
            .find(|a| a.name() == name)
            .ok_or_else(|| PagesError::UnknownApplication(name.to_string()))
    }

    /// Checks mounts and renderers of all applications before any is installed.
    fn validate(&self) -> Result<()> {
        let mut mounts: HashMap<(Context, &str), &str> = HashMap::new();
        for app in &self.apps {
            let context = if app.is_main_context() { Context::Main } else { Context::Admin };
            if let Some(other) = mounts.insert((context, app.uri_path()), app.name()) {
                return Err(PagesError::MountClash {
                    app: app.name().to_string(),
                    other: other.to_string(),
                    uri: app.uri_path().to_string(),
                });
            }

            let renderers = self.config.renderers();
            let missing: Vec<String> = app
                .required_renderers()
                .iter()
                .filter(|name| !renderers.contains(name))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(PagesError::MissingRenderer {
                    app: app.name().to_string(),
                    missing,
                });
            }
        }
        Ok(())
    }

    /// Installs and starts all applications.
    ///
    /// Any further registration fails afterwards. Nothing is installed when
    /// validation fails, so the registry can be fixed and started again. A
    /// failure during installation leaves the registry unusable.
    pub fn start(&mut self, environment: &Environment) -> Result<ServerPagesRuntime> {
        if let Some(reason) = &self.failed {
            return Err(PagesError::StartupFailed(reason.clone()));
        }
        self.check_not_started("server pages")?;

        for name in self.config.asset_extensions.keys().chain(self.config.view_extensions.keys()) {
            if !self.apps.iter().any(|a| a.name() == name) {
                tracing::warn!("Extensions registered for unknown server pages app '{}'", name);
            }
        }

        self.validate()?;
        for app in &mut self.apps {
            if let Err(e) = app.install(environment, &mut self.config) {
                self.failed = Some(e.to_string());
                return Err(e);
            }
        }

        let config = std::mem::replace(&mut self.config, GlobalConfig::new());
        let mut views = config.views;
        views.set_root_path(&prefix_slash(&end_slash(&join(&[
            environment.rest_context_path.as_str(),
            trim_stars(&environment.rest_mapping),
        ]))));
        let shared = SharedServices {
            provider: Arc::clone(&environment.provider),
            services: Arc::new(config.services),
            rest: Arc::new(views),
        };

        let mut main = Vec::new();
        let mut admin = Vec::new();
        for app in &mut self.apps {
            if let Err(e) = app.finalize_startup(&environment.rest_context_path, &environment.rest_mapping, &shared) {
                self.failed = Some(e.to_string());
                return Err(e);
            }
            if let Some(filter) = app.filter() {
                let key = app.uri_path().trim_start_matches('/').to_string();
                if app.is_main_context() {
                    main.push((key, Arc::clone(filter)));
                } else {
                    admin.push((key, Arc::clone(filter)));
                }
            }
        }
        self.started = true;

        Ok(ServerPagesRuntime {
            main_context_path: end_slash(&prefix_slash(&environment.main_context_path)),
            admin_context_path: end_slash(&prefix_slash(&environment.admin_context_path)),
            main: PrefixRouter::new(main),
            admin: PrefixRouter::new(admin),
            reports: self.apps.iter().map(|app| report::build(app, &shared.rest)).collect(),
            shared,
        })
    }
}

/// Started applications, ready to serve requests.
pub struct ServerPagesRuntime {
    main_context_path: String,
    admin_context_path: String,
    main: PrefixRouter<Arc<ServerPagesFilter>>,
    admin: PrefixRouter<Arc<ServerPagesFilter>>,
    reports: Vec<String>,
    shared: SharedServices,
}

impl ServerPagesRuntime {
    /// Serves a request of the given context.
    ///
    /// The application with the longest matching mount path handles the
    /// request; without one the response is a 404.
    pub fn handle(&self, context: Context, request: PageRequest) -> PageResponse {
        let (context_path, apps) = match context {
            Context::Main => (&self.main_context_path, &self.main),
            Context::Admin => (&self.admin_context_path, &self.admin),
        };

        let Some(relative) = strip_context(context_path, &request.path) else {
            tracing::debug!("{} is outside of context {}", request.path, context_path);
            return PageResponse::error(NOT_FOUND);
        };
        let lookup = end_slash(relative.trim_start_matches('/'));
        let Some(found) = apps.find(&lookup) else {
            tracing::debug!("No server pages app for {}", request.path);
            return PageResponse::error(NOT_FOUND);
        };

        let mut request = request;
        request.path = relative;
        let mut response = PageResponse::new();
        found.value.handle(&request, &mut response);
        response
    }

    /// Startup reports of all applications.
    pub fn reports(&self) -> &[String] {
        &self.reports
    }

    /// The view layer.
    pub fn views(&self) -> &ViewRegistry {
        &self.shared.rest
    }

    /// Mount paths of a context, most specific first.
    pub fn mounts(&self, context: Context) -> Vec<String> {
        let apps = match context {
            Context::Main => &self.main,
            Context::Admin => &self.admin,
        };
        apps.entries().map(|(uri, _)| prefix_slash(uri)).collect()
    }
}

impl std::fmt::Debug for ServerPagesRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerPagesRuntime")
            .field("main", &self.mounts(Context::Main))
            .field("admin", &self.mounts(Context::Admin))
            .finish()
    }
}

/// Path within the context (with leading slash), or `None` outside of it.
fn strip_context(context_path: &str, path: &str) -> Option<String> {
    if context_path == "/" {
        return Some(prefix_slash(path));
    }
    if end_slash(path) == context_path {
        return Some("/".to_string());
    }
    path.strip_prefix(context_path.trim_end_matches('/'))
        .filter(|rest| rest.starts_with('/'))
        .map(str::to_string)
}

// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Integration tests for the full request pipeline.
//!
//! Applications are registered and started like a host would do it, and
//! requests go through the runtime with an in-memory resource provider.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value as JsonValue};

use serverpages::{
    AssetSources, Context, Environment, ErrorRedirect, MemoryProvider, PageRequest, PagesError,
    PlaceholderRenderer, ResponseSink, Result, ServerPages, ServerPagesApp, ServerPagesRuntime,
    TemplateContext, View, ViewRenderer, ViewRequest, ViewRestSources,
};

/// Renderer that always fails, counting its invocations.
struct BrokenRenderer {
    calls: Arc<AtomicUsize>,
}

impl ViewRenderer for BrokenRenderer {
    fn name(&self) -> &str {
        "broken"
    }

    fn is_renderable(&self, template: &str) -> bool {
        template.ends_with(".broken")
    }

    fn render(&self, template: &str, _source: &[u8], _model: &JsonValue) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(PagesError::RenderError {
            template: template.to_string(),
            message: "syntax error".to_string(),
        })
    }
}

struct Greeting(&'static str);

fn provider() -> MemoryProvider {
    MemoryProvider::new()
        .with("com/app/ui/index.html", "<h1>home</h1>")
        .with("com/app/ui/style.css", "body{}")
        .with("com/app/ui/dashboard.tpl", "Dashboard of {{ context.app }} for {{ user }}")
        .with("com/app/ui/hello.tpl", "{{ greeting }} {{ name }}")
        .with("com/app/ui/404.tpl", "Not found {{ error.status }}: {{ context.url }}")
        .with("com/app/ui/error.tpl", "Error {{ error.status }}")
        .with("com/app/ui/error.broken", "irrelevant")
        .with("com/ext/ui/style.css", "body{color:red}")
        .with("com/ext/ui/extra.js", "ext()")
        .with("com/admin/ui/index.html", "<h1>admin</h1>")
}

fn browser(path: &str) -> PageRequest {
    PageRequest::new(path, "GET").with_header("Accept", "text/html,application/xhtml+xml;q=0.9")
}

fn start(pages: &mut ServerPages) -> ServerPagesRuntime {
    pages.start(&Environment::new(Arc::new(provider()))).unwrap()
}

fn registry(app: ServerPagesApp) -> ServerPages {
    let mut pages = ServerPages::new();
    pages.register_renderer(PlaceholderRenderer).unwrap();
    pages
        .route("app/dashboard", |_: &ViewRequest<'_>, _: &TemplateContext| -> Result<View> {
            Ok(View::new("dashboard.tpl").with_model(json!({"user": "<bob>"})))
        })
        .unwrap();
    pages
        .route("app/hello/{name}", |req: &ViewRequest<'_>, ctx: &TemplateContext| -> Result<View> {
            let greeting = ctx.service::<Greeting>().map(|g| g.0).unwrap_or("hi");
            Ok(View::new("hello.tpl").with_model(json!({"greeting": greeting, "name": req.param("name")})))
        })
        .unwrap();
    pages
        .route("app/boom", |_: &ViewRequest<'_>, _: &TemplateContext| -> Result<View> {
            Err(PagesError::RenderError {
                template: "boom".to_string(),
                message: "exploded".to_string(),
            })
        })
        .unwrap();
    pages.add_service(Greeting("Hello")).unwrap();
    pages.register(app).unwrap();
    pages
}

fn ui_app() -> serverpages::AppBuilder {
    ServerPagesApp::builder("app", "com.app.ui", "/ui").index_page("index.html")
}

#[test]
fn test_asset_served() {
    let runtime = start(&mut registry(ui_app().build().unwrap()));
    let response = runtime.handle(Context::Main, browser("/ui/style.css"));
    assert_eq!(response.status(), 200);
    assert_eq!(response.body_str(), Some("body{}"));
    assert_eq!(response.header("content-type"), Some("text/css"));

    let index = runtime.handle(Context::Main, browser("/ui/"));
    assert_eq!(index.body_str(), Some("<h1>home</h1>"));
    let index = runtime.handle(Context::Main, browser("/ui"));
    assert_eq!(index.body_str(), Some("<h1>home</h1>"));
}

#[test]
fn test_template_route_rendered() {
    let runtime = start(&mut registry(ui_app().build().unwrap()));
    let response = runtime.handle(Context::Main, browser("/ui/dashboard"));
    assert_eq!(response.status(), 200);
    assert_eq!(response.body_str(), Some("Dashboard of app for &lt;bob&gt;"));
    assert_eq!(response.header("content-type"), Some("text/html; charset=utf-8"));

    let response = runtime.handle(Context::Main, browser("/ui/hello/world"));
    assert_eq!(response.body_str(), Some("Hello world"));
}

#[test]
fn test_direct_template_rendered() {
    let runtime = start(&mut registry(ui_app().build().unwrap()));
    let response = runtime.handle(Context::Main, browser("/ui/error.tpl"));
    assert_eq!(response.status(), 200);
    assert_eq!(response.body_str(), Some("Error "));
}

#[test]
fn test_extension_overrides_assets() {
    let mut pages = registry(ui_app().build().unwrap());
    let mut ext = AssetSources::new();
    ext.attach("com.ext.ui");
    pages.extend_assets("app", &ext).unwrap();
    let runtime = start(&mut pages);

    let response = runtime.handle(Context::Main, browser("/ui/style.css"));
    assert_eq!(response.body_str(), Some("body{color:red}"));
    let response = runtime.handle(Context::Main, browser("/ui/extra.js"));
    assert_eq!(response.body_str(), Some("ext()"));
    // not overridden
    let response = runtime.handle(Context::Main, browser("/ui/"));
    assert_eq!(response.body_str(), Some("<h1>home</h1>"));
}

#[test]
fn test_view_extension_maps_sub_url() {
    let mut pages = registry(ui_app().build().unwrap());
    let mut views = ViewRestSources::new();
    views.map_to("/greet", "app/hello").unwrap();
    pages.extend_views("app", &views).unwrap();
    let runtime = start(&mut pages);

    let response = runtime.handle(Context::Main, browser("/ui/greet/you"));
    assert_eq!(response.body_str(), Some("Hello you"));

    let filter = pages.app("app").unwrap().filter().unwrap();
    let redirect = filter.template_redirect();
    assert_eq!(redirect.root_path(), "/rest/");
    assert_eq!(redirect.target_path("greet/you"), "/rest/app/hello/you");
    assert_eq!(redirect.target_path("dashboard"), "/rest/app/dashboard");
}

#[test]
fn test_error_page_keeps_status() {
    let app = ui_app()
        .error_page_for(404, "/404.tpl")
        .error_page("/error.tpl")
        .build()
        .unwrap();
    let runtime = start(&mut registry(app));

    let response = runtime.handle(Context::Main, browser("/ui/missing.css"));
    assert_eq!(response.status(), 404);
    assert_eq!(response.body_str(), Some("Not found 404: /ui/missing.css"));

    let response = runtime.handle(Context::Main, browser("/ui/boom"));
    assert_eq!(response.status(), 500);
    assert_eq!(response.body_str(), Some("Error 500"));

    assert!(ErrorRedirect::context_error().is_none());
    assert!(TemplateContext::try_current().is_none());
}

#[test]
fn test_error_page_requires_html() {
    let app = ui_app().error_page("/error.tpl").build().unwrap();
    let runtime = start(&mut registry(app));

    let json = PageRequest::new("/ui/missing.css", "GET").with_header("Accept", "application/json");
    let response = runtime.handle(Context::Main, json);
    assert_eq!(response.sent_error(), Some(404));
    assert!(response.body().is_empty());

    // no accept header at all still gets the page
    let response = runtime.handle(Context::Main, PageRequest::new("/ui/missing.css", "GET"));
    assert_eq!(response.body_str(), Some("Error 404"));
}

#[test]
fn test_failing_error_page_sends_original_status() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = ui_app().error_page("/error.broken").build().unwrap();
    let mut pages = registry(app);
    pages
        .register_renderer(BrokenRenderer {
            calls: Arc::clone(&calls),
        })
        .unwrap();
    let runtime = start(&mut pages);

    let response = runtime.handle(Context::Main, browser("/ui/missing.css"));
    assert_eq!(response.sent_error(), Some(404));
    assert!(response.body().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(ErrorRedirect::context_error().is_none());
    assert!(TemplateContext::try_current().is_none());

    // the next request is not affected by the failure
    let response = runtime.handle(Context::Main, browser("/ui/style.css"));
    assert_eq!(response.status(), 200);
}

#[test]
fn test_spa_routing() {
    let app = ui_app().spa_routing().build().unwrap();
    let runtime = start(&mut registry(app));

    let response = runtime.handle(Context::Main, browser("/ui/users/12"));
    assert_eq!(response.status(), 200);
    assert_eq!(response.body_str(), Some("<h1>home</h1>"));
    assert_eq!(response.header("cache-control"), Some("must-revalidate,no-cache,no-store"));

    // files keep their 404
    let response = runtime.handle(Context::Main, browser("/ui/app.js"));
    assert_eq!(response.sent_error(), Some(404));

    // non-browser requests too
    let response = runtime.handle(Context::Main, PageRequest::new("/ui/users/12", "GET"));
    assert_eq!(response.sent_error(), Some(404));
}

#[test]
fn test_apps_selected_by_longest_mount() {
    let mut pages = registry(ui_app().build().unwrap());
    pages
        .register(
            ServerPagesApp::builder("admin", "com.admin.ui", "/")
                .index_page("index.html")
                .admin(true)
                .build()
                .unwrap(),
        )
        .unwrap();
    pages
        .register(
            ServerPagesApp::builder("ext", "com.ext.ui", "/ui/ext")
                .build()
                .unwrap(),
        )
        .unwrap();
    let mut environment = Environment::new(Arc::new(provider()));
    environment.admin_context_path = "/admin".to_string();
    let runtime = pages.start(&environment).unwrap();

    let response = runtime.handle(Context::Main, browser("/ui/ext/extra.js"));
    assert_eq!(response.body_str(), Some("ext()"));
    let response = runtime.handle(Context::Main, browser("/ui/style.css"));
    assert_eq!(response.body_str(), Some("body{}"));

    let response = runtime.handle(Context::Admin, browser("/admin/"));
    assert_eq!(response.body_str(), Some("<h1>admin</h1>"));
    let response = runtime.handle(Context::Admin, browser("/ui/style.css"));
    assert_eq!(response.sent_error(), Some(404));
    let response = runtime.handle(Context::Main, browser("/other"));
    assert_eq!(response.sent_error(), Some(404));

    assert_eq!(runtime.reports().len(), 3);
    assert!(runtime.reports()[1].contains("in admin context"));
}

#[test]
fn test_startup_failures() {
    let mut pages = registry(ui_app().build().unwrap());
    assert!(matches!(
        pages.register(ui_app().build().unwrap()),
        Err(PagesError::DuplicateApplication(_))
    ));

    pages
        .register(ServerPagesApp::builder("clash", "com.other", "/ui/").build().unwrap())
        .unwrap();
    assert!(matches!(
        pages.start(&Environment::new(Arc::new(provider()))),
        Err(PagesError::MountClash { .. })
    ));

    let mut pages = registry(ui_app().require_renderers(&["freemarker"]).build().unwrap());
    assert!(matches!(
        pages.start(&Environment::new(Arc::new(provider()))),
        Err(PagesError::MissingRenderer { .. })
    ));
}

#[test]
fn test_runtime_is_shared_between_threads() {
    let app = ui_app().error_page_for(404, "/404.tpl").build().unwrap();
    let runtime = Arc::new(start(&mut registry(app)));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let runtime = Arc::clone(&runtime);
            std::thread::spawn(move || {
                let path = format!("/ui/missing-{}.css", i);
                let response = runtime.handle(Context::Main, browser(&path));
                assert_eq!(response.status(), 404);
                response.body_str().map(str::to_string)
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let body = handle.join().unwrap();
        assert_eq!(body, Some(format!("Not found 404: /ui/missing-{}.css", i)));
    }
}

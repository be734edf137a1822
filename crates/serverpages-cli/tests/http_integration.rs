// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Integration tests for the HTTP adapter.
//!
//! A project is written to a temp directory and served through the real
//! axum router.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use tempfile::tempdir;

use serverpages::Context;
use serverpages_cli::config::{Config, CONFIG_FILE};
use serverpages_cli::project;
use serverpages_cli::server::http;

const CONFIG: &str = r#"
[server]
resources_dir = "resources"

[[app]]
name = "app"
uri = "/ui"
assets = "com.app.ui"
spa = true

[app.error_pages]
404 = "/404.tpl"

[[app]]
name = "admin"
assets = "com.admin"
admin = true

[[extension]]
app = "app"
assets = ["com.ext.ui"]
"#;

/// Create a test project structure in a temp directory
fn setup_test_project(dir: &Path) {
    let resources = dir.join("resources");
    fs::create_dir_all(resources.join("com/app/ui")).unwrap();
    fs::create_dir_all(resources.join("com/ext/ui")).unwrap();
    fs::create_dir_all(resources.join("com/admin")).unwrap();

    fs::write(resources.join("com/app/ui/index.html"), "<h1>home</h1>").unwrap();
    fs::write(resources.join("com/app/ui/style.css"), "body{}").unwrap();
    fs::write(resources.join("com/app/ui/page.tpl"), "Page of {{ context.app }}").unwrap();
    fs::write(resources.join("com/app/ui/404.tpl"), "Missing {{ context.url }}").unwrap();
    fs::write(resources.join("com/ext/ui/style.css"), "body{color:red}").unwrap();
    fs::write(resources.join("com/admin/index.html"), "<h1>admin</h1>").unwrap();

    fs::write(dir.join(CONFIG_FILE), CONFIG).unwrap();
}

fn server(dir: &Path, context: Context) -> TestServer {
    let config = Config::load(&dir.join(CONFIG_FILE)).unwrap();
    let runtime = Arc::new(project::start(&config).unwrap());
    TestServer::new(http::router(runtime, context)).unwrap()
}

fn accept_html() -> (HeaderName, HeaderValue) {
    (HeaderName::from_static("accept"), HeaderValue::from_static("text/html"))
}

#[tokio::test]
async fn test_serves_assets_and_templates() {
    let dir = tempdir().unwrap();
    setup_test_project(dir.path());
    let server = server(dir.path(), Context::Main);

    let response = server.get("/ui/style.css").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "body{color:red}");
    assert_eq!(response.header("content-type"), "text/css");
    assert!(response.headers().contains_key("etag"));

    let response = server.get("/ui/").await;
    assert_eq!(response.text(), "<h1>home</h1>");

    let response = server.get("/ui/page.tpl").await;
    assert_eq!(response.text(), "Page of app");
}

#[tokio::test]
async fn test_error_page_and_spa() {
    let dir = tempdir().unwrap();
    setup_test_project(dir.path());
    let server = server(dir.path(), Context::Main);
    let (name, value) = accept_html();

    // file requests get the error page
    let response = server.get("/ui/missing.css").add_header(name.clone(), value.clone()).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.text(), "Missing /ui/missing.css");

    // client routes get the index
    let response = server.get("/ui/users/12").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "<h1>home</h1>");
    assert_eq!(response.header("cache-control"), "must-revalidate,no-cache,no-store");
}

#[tokio::test]
async fn test_unmapped_path_gets_default_error() {
    let dir = tempdir().unwrap();
    setup_test_project(dir.path());
    let server = server(dir.path(), Context::Main);

    let response = server.get("/elsewhere").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(response.text().contains("404 Not Found"));
}

#[tokio::test]
async fn test_admin_context() {
    let dir = tempdir().unwrap();
    setup_test_project(dir.path());
    let server = server(dir.path(), Context::Admin);

    let response = server.get("/").await;
    assert_eq!(response.text(), "<h1>admin</h1>");
    let response = server.get("/ui/style.css").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[test]
fn test_invalid_listen_address() {
    let dir = tempdir().unwrap();
    setup_test_project(dir.path());
    let config = Config::load(&dir.path().join(CONFIG_FILE)).unwrap();
    let runtime = Arc::new(project::start(&config).unwrap());
    let result = tokio_test::block_on(http::serve(runtime, "not an address", None));
    assert!(result.is_err());
}

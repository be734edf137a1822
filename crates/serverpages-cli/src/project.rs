// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Builds and starts the applications of a project configuration.

use std::sync::Arc;

use anyhow::{anyhow, Context as _};
use serverpages::redirect::DEFAULT_ERROR_PAGE;
use serverpages::{
    AppBuilder, AssetSources, Environment, FileSystemProvider, PlaceholderRenderer, ServerPages,
    ServerPagesApp, ServerPagesRuntime, ViewRestSources,
};

use crate::config::{AppConfig, Config, ExtensionConfig};

/// Registers all configured applications and extensions.
pub fn build_registry(config: &Config) -> anyhow::Result<ServerPages> {
    let mut pages = ServerPages::new();
    pages.register_renderer(PlaceholderRenderer)?;

    for app in &config.apps {
        let built = app_builder(app, config.server.log_errors)?
            .build()
            .with_context(|| format!("Invalid server pages app '{}'", app.name))?;
        pages.register(built)?;
    }
    for extension in &config.extensions {
        apply_extension(&mut pages, extension)
            .with_context(|| format!("Invalid extension of app '{}'", extension.app))?;
    }
    Ok(pages)
}

/// Host environment of the configuration.
pub fn environment(config: &Config) -> Environment {
    let provider = FileSystemProvider::new(config.resources_dir());
    let mut environment = Environment::new(Arc::new(provider));
    environment.main_context_path = config.server.context_path.clone();
    environment.admin_context_path = config.server.admin_context_path.clone();
    environment.rest_context_path = config.server.context_path.clone();
    environment.rest_mapping = config.server.rest_mapping.clone();
    environment
}

/// Registers and starts everything.
pub fn start(config: &Config) -> anyhow::Result<ServerPagesRuntime> {
    let mut pages = build_registry(config)?;
    let runtime = pages.start(&environment(config))?;
    Ok(runtime)
}

fn app_builder(app: &AppConfig, log_errors: bool) -> anyhow::Result<AppBuilder> {
    let mut builder = ServerPagesApp::builder(&app.name, &app.assets, &app.uri)
        .index_page(&app.index)
        .admin(app.admin)
        .log_errors(app.log_errors.unwrap_or(log_errors));

    if let Some(pattern) = &app.file_pattern {
        builder = builder.file_pattern(pattern);
    }
    if let Some(regex) = &app.spa_no_redirect {
        builder = builder.spa_no_redirect_regex(regex);
    } else if app.spa {
        builder = builder.spa_routing();
    }
    let renderers: Vec<&str> = app.required_renderers.iter().map(String::as_str).collect();
    builder = builder.require_renderers(&renderers);

    for (code, page) in &app.error_pages {
        builder = builder.error_page_for(error_code(code)?, page);
    }
    for (url, locations) in &app.assets_for {
        for location in locations {
            builder = builder.attach_assets_for_url(url, location);
        }
    }
    for (url, prefix) in &app.views {
        builder = builder.map_views_for_url(url, prefix);
    }
    Ok(builder)
}

fn apply_extension(pages: &mut ServerPages, extension: &ExtensionConfig) -> anyhow::Result<()> {
    let mut assets = AssetSources::new();
    for location in &extension.assets {
        assets.attach(location);
    }
    for (url, locations) in &extension.assets_for {
        for location in locations {
            assets.attach_to(url, location);
        }
    }
    if !assets.is_empty() {
        pages.extend_assets(&extension.app, &assets)?;
    }

    let mut views = ViewRestSources::new();
    for (url, prefix) in &extension.views {
        views.map_to(url, prefix)?;
    }
    pages.extend_views(&extension.app, &views)?;
    Ok(())
}

fn error_code(key: &str) -> anyhow::Result<i32> {
    if key.eq_ignore_ascii_case("default") {
        return Ok(DEFAULT_ERROR_PAGE);
    }
    key.parse::<i32>()
        .map_err(|_| anyhow!("Invalid error page code '{}'", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(error_code("default").unwrap(), DEFAULT_ERROR_PAGE);
        assert_eq!(error_code("404").unwrap(), 404);
        assert!(error_code("oops").is_err());
    }

    #[test]
    fn test_registry_from_config() {
        let config = Config::parse(
            r#"
[[app]]
name = "app"
uri = "/ui"
assets = "com.app.ui"

[app.error_pages]
200 = "/ok.html"
"#,
        )
        .unwrap();
        let err = build_registry(&config).unwrap_err();
        assert!(err.to_string().contains("Invalid server pages app 'app'"));

        let config = Config::parse(
            r#"
[[app]]
name = "app"
assets = "com.app"

[[extension]]
app = "app"
assets = ["com.ext"]
"#,
        )
        .unwrap();
        let pages = build_registry(&config).unwrap();
        assert_eq!(pages.apps().len(), 1);
    }
}

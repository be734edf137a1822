// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Server pages project configuration.
//!
//! Configuration is loaded from `serverpages.toml` at the project root.
//!
//! # Example Configuration
//!
//! ```toml
//! [server]
//! port = 8080
//! admin_port = 8081
//! resources_dir = "resources"
//!
//! [[app]]
//! name = "app"
//! uri = "/ui"
//! assets = "com.app.ui"
//! spa = true
//!
//! [app.error_pages]
//! 404 = "/404.tpl"
//! default = "/error.tpl"
//!
//! [app.views]
//! "/" = "app"
//!
//! [[extension]]
//! app = "app"
//! assets = ["com.ext.ui"]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "serverpages.toml";

/// Main configuration structure loaded from `serverpages.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Applications.
    #[serde(default, rename = "app")]
    pub apps: Vec<AppConfig>,
    /// Extensions of registered applications.
    #[serde(default, rename = "extension")]
    pub extensions: Vec<ExtensionConfig>,
    /// Directory of the configuration file (relative paths are resolved against it).
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// HTTP server configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host (default: "127.0.0.1").
    #[serde(default = "default_host")]
    pub host: String,
    /// Main context port (default: 8080).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Admin context port. Admin applications are not served without it.
    #[serde(default)]
    pub admin_port: Option<u16>,
    /// Main context path (default: "/").
    #[serde(default = "default_context_path")]
    pub context_path: String,
    /// Admin context path (default: "/").
    #[serde(default = "default_context_path")]
    pub admin_context_path: String,
    /// View layer mapping in the main context (default: "/rest/*").
    #[serde(default = "default_rest_mapping")]
    pub rest_mapping: String,
    /// Resources root directory (default: "resources").
    #[serde(default = "default_resources_dir")]
    pub resources_dir: String,
    /// Log errors rendered with error pages for all applications.
    #[serde(default)]
    pub log_errors: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_context_path() -> String {
    "/".to_string()
}

fn default_rest_mapping() -> String {
    "/rest/*".to_string()
}

fn default_resources_dir() -> String {
    "resources".to_string()
}

fn default_uri() -> String {
    "/".to_string()
}

fn default_index() -> String {
    "index.html".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            admin_port: None,
            context_path: default_context_path(),
            admin_context_path: default_context_path(),
            rest_mapping: default_rest_mapping(),
            resources_dir: default_resources_dir(),
            log_errors: false,
        }
    }
}

/// One application.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Unique application name.
    pub name: String,
    /// Mount path (default: "/").
    #[serde(default = "default_uri")]
    pub uri: String,
    /// Resources root (`com.app.ui` or `/com/app/ui`).
    pub assets: String,
    /// Index file (default: "index.html").
    #[serde(default = "default_index")]
    pub index: String,
    /// Custom file request regex.
    #[serde(default)]
    pub file_pattern: Option<String>,
    /// Mount in the admin context.
    #[serde(default)]
    pub admin: bool,
    /// SPA routing.
    #[serde(default)]
    pub spa: bool,
    /// Custom SPA no-redirect regex (enables SPA routing).
    #[serde(default)]
    pub spa_no_redirect: Option<String>,
    /// Renderers which must be available.
    #[serde(default)]
    pub required_renderers: Vec<String>,
    /// Error pages by status code or `default`.
    #[serde(default)]
    pub error_pages: BTreeMap<String, String>,
    /// Additional resources roots by sub url.
    #[serde(default)]
    pub assets_for: BTreeMap<String, Vec<String>>,
    /// View prefixes by sub url.
    #[serde(default)]
    pub views: BTreeMap<String, String>,
    /// Overrides `server.log_errors`.
    #[serde(default)]
    pub log_errors: Option<bool>,
}

/// Extension of an application registered elsewhere.
#[derive(Debug, Deserialize, Clone)]
pub struct ExtensionConfig {
    /// Extended application.
    pub app: String,
    /// Resources roots added to the application root.
    #[serde(default)]
    pub assets: Vec<String>,
    /// Resources roots by sub url.
    #[serde(default)]
    pub assets_for: BTreeMap<String, Vec<String>>,
    /// View prefixes by sub url.
    #[serde(default)]
    pub views: BTreeMap<String, String>,
}

impl Config {
    /// Loads the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or cannot be parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("Invalid configuration {}", path.display()))?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    /// Parses configuration content.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Resources root directory.
    pub fn resources_dir(&self) -> PathBuf {
        self.base_dir.join(&self.server.resources_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse("[[app]]\nname = \"app\"\nassets = \"com.app\"\n").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.rest_mapping, "/rest/*");
        assert_eq!(config.server.admin_port, None);
        assert_eq!(config.apps[0].uri, "/");
        assert_eq!(config.apps[0].index, "index.html");
        assert!(config.extensions.is_empty());
    }

    #[test]
    fn test_full_app() {
        let config = Config::parse(
            r#"
[server]
port = 9000
admin_port = 9001

[[app]]
name = "app"
uri = "/ui"
assets = "com.app.ui"
spa = true
required_renderers = ["placeholder"]

[app.error_pages]
404 = "/404.tpl"
default = "/error.tpl"

[app.assets_for]
"/docs" = ["com.docs"]

[app.views]
"/" = "main"

[[extension]]
app = "app"
assets = ["com.ext.ui"]
"#,
        )
        .unwrap();
        let app = &config.apps[0];
        assert_eq!(config.server.admin_port, Some(9001));
        assert_eq!(app.error_pages.get("404").map(String::as_str), Some("/404.tpl"));
        assert_eq!(app.assets_for["/docs"], ["com.docs"]);
        assert_eq!(app.views["/"], "main");
        assert_eq!(config.extensions[0].assets, ["com.ext.ui"]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(&dir.path().join(CONFIG_FILE)).is_err());
    }
}

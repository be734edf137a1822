// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! HTTP server command.

use std::path::Path;
use std::sync::Arc;

use console::style;
use serverpages::Context;

use crate::config::Config;
use crate::project;
use crate::server::http;

/// Listener overrides from the command line.
#[derive(Debug, Default, Clone)]
pub struct ServeOptions {
    /// Host override.
    pub host: Option<String>,
    /// Main port override.
    pub port: Option<u16>,
    /// Admin port override.
    pub admin_port: Option<u16>,
}

/// Runs the serve command.
pub async fn run(config_path: &Path, options: ServeOptions) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;
    let runtime = Arc::new(project::start(&config)?);

    let host = options.host.unwrap_or_else(|| config.server.host.clone());
    let port = options.port.unwrap_or(config.server.port);
    let main_addr = format!("{}:{}", host, port);
    let admin_addr = options
        .admin_port
        .or(config.server.admin_port)
        .map(|port| format!("{}:{}", host, port));

    if admin_addr.is_none() && !runtime.mounts(Context::Admin).is_empty() {
        tracing::warn!("Admin applications are not served: no admin port configured");
    }

    println!("{}", style("Starting server pages...").cyan().bold());
    println!("  {} http://{}", style("Main:").dim(), main_addr);
    if let Some(admin_addr) = &admin_addr {
        println!("  {} http://{}", style("Admin:").dim(), admin_addr);
    }

    http::serve(runtime, &main_addr, admin_addr.as_deref()).await
}

// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serverpages_cli::commands;
use serverpages_cli::commands::serve::ServeOptions;
use serverpages_cli::config::CONFIG_FILE;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "serverpages")]
#[command(author = "Maravilla Labs")]
#[command(version)]
#[command(about = "Serve templated views and static assets under one URL space", long_about = None)]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the configured applications
    Serve {
        /// Port of the main context
        #[arg(short, long)]
        port: Option<u16>,
        /// Port of the admin context
        #[arg(long)]
        admin_port: Option<u16>,
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },
    /// Validate the configuration and print startup reports
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with the specified log level
    let filter = EnvFilter::try_new(&cli.log_level)
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    match cli.command {
        Commands::Serve { port, admin_port, host } => {
            commands::serve::run(&cli.config, ServeOptions { host, port, admin_port }).await
        }
        Commands::Check => commands::check::run(&cli.config),
    }
}

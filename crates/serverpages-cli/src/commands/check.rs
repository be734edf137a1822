// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Configuration check command.
//!
//! Starts all applications without binding any port and prints what would
//! be served.

use std::path::Path;

use console::style;
use serverpages::Context;

use crate::config::Config;
use crate::project;

/// Runs the check command.
pub fn run(config_path: &Path) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;
    let runtime = project::start(&config)?;

    println!(
        "{} {}",
        style("Configuration").green().bold(),
        style(config_path.display()).dim()
    );
    for report in runtime.reports() {
        println!();
        print!("{}", report);
    }
    println!();
    for (name, context) in [("main", Context::Main), ("admin", Context::Admin)] {
        let mounts = runtime.mounts(context);
        if !mounts.is_empty() {
            println!("{} {}", style(format!("{} context:", name)).cyan(), mounts.join(", "));
        }
    }
    Ok(())
}

// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

// Warn on missing documentation for public items
#![warn(missing_docs)]

//! Server pages CLI library.
//!
//! Hosts server pages applications described in a project file and serves
//! them over HTTP.
//!
//! # Usage
//!
//! This crate is primarily used through the `serverpages` binary:
//!
//! ```bash
//! serverpages check    # Validate configuration, print startup reports
//! serverpages serve    # Serve main and admin contexts
//! ```
//!
//! # Configuration
//!
//! Projects are configured via `serverpages.toml` at the project root.

/// CLI commands (check, serve).
pub mod commands;
/// Project configuration from `serverpages.toml`.
pub mod config;
/// Registry construction from the configuration.
pub mod project;
/// HTTP server.
pub mod server;

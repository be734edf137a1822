// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! CLI command implementations.
//!
//! - `check`: Validate the configuration and print the startup reports
//! - `serve`: Serve the configured applications over HTTP

/// Configuration check command.
pub mod check;
/// HTTP server command.
pub mod serve;

// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Startup report of an application.

use std::fmt::Write;

use crate::app::ServerPagesApp;
use crate::dispatch::ViewRegistry;
use crate::path::{trim_slashes, SLASH};
use crate::redirect::DEFAULT_ERROR_PAGE;

const TAB: &str = "    ";

/// Builds the human readable report of a started (or installed) application.
pub fn build(app: &ServerPagesApp, views: &ViewRegistry) -> String {
    let mut out = String::new();
    let context = if app.is_main_context() { "main" } else { "admin" };
    let uri = if app.full_uri_path().is_empty() {
        app.uri_path()
    } else {
        app.full_uri_path()
    };
    let _ = writeln!(
        out,
        "Server pages app '{}' registered on uri '{}*' in {} context",
        app.name(),
        uri,
        context
    );

    if let Some(assets) = app.assets() {
        let _ = writeln!(out, "\n{}Static resources locations:", TAB);
        for (url, locations) in assets.locations() {
            let _ = writeln!(out, "{}{}{}", TAB, TAB, if url.is_empty() { SLASH } else { url });
            for location in locations {
                let _ = writeln!(out, "{}{}{}{}", TAB, TAB, TAB, trim_slashes(location).replace('/', "."));
            }
        }
    }

    if let Some(mappings) = app.views() {
        let _ = writeln!(out, "\n{}View rest mappings:", TAB);
        for (url, prefix) in mappings.prefixes() {
            let url = if url.is_empty() { SLASH.to_string() } else { format!("/{}", url) };
            let _ = writeln!(out, "{}{}{:<20} -> {}{}", TAB, TAB, url, views.root_path(), prefix);
            for route in views.routes_for(prefix) {
                let _ = writeln!(out, "{}{}{}{}", TAB, TAB, TAB, route);
            }
        }
    }

    if !app.error_pages().is_empty() {
        let _ = writeln!(out, "\n{}Error pages:", TAB);
        for (code, page) in app.error_pages().iter() {
            let code = if code == DEFAULT_ERROR_PAGE {
                "*".to_string()
            } else {
                code.to_string()
            };
            let _ = writeln!(out, "{}{}{:<5} -> {}", TAB, TAB, code, page);
        }
    }

    if app.is_spa() {
        let custom = if app.spa_no_redirect() == crate::redirect::DEFAULT_NO_REDIRECT_REGEX {
            ""
        } else {
            " (with custom pattern)"
        };
        let _ = writeln!(out, "\n{}SPA routing enabled{}", TAB, custom);
    }
    out
}

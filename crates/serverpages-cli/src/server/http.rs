// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! HTTP server for server pages applications.
//!
//! This is a thin adapter that converts HTTP requests to `PageRequest`,
//! calls `runtime.handle()`, and converts `PageResponse` back to HTTP.
//! Requests are handled on the blocking pool: resources are read from disk
//! and the template context is bound to the handling thread.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{Method, StatusCode},
    response::{Html, IntoResponse, Response},
    Router,
};
use serverpages::error::default_reason;
use serverpages::{Context, PageRequest, PageResponse, ServerPagesRuntime};
use tower_http::trace::TraceLayer;

/// Shared state of one context listener.
pub struct AppState {
    /// Started applications.
    pub runtime: Arc<ServerPagesRuntime>,
    /// Context served by the listener.
    pub context: Context,
}

/// Builds the router serving one context.
pub fn router(runtime: Arc<ServerPagesRuntime>, context: Context) -> Router {
    let state = Arc::new(AppState { runtime, context });
    Router::new()
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the main context (and the admin context when a port is given).
pub async fn serve(
    runtime: Arc<ServerPagesRuntime>,
    main_addr: &str,
    admin_addr: Option<&str>,
) -> anyhow::Result<()> {
    let main_listener = tokio::net::TcpListener::bind(main_addr).await?;
    let main_app = router(Arc::clone(&runtime), Context::Main);
    let main = async move { axum::serve(main_listener, main_app).await };

    match admin_addr {
        Some(admin_addr) => {
            let admin_listener = tokio::net::TcpListener::bind(admin_addr).await?;
            let admin_app = router(runtime, Context::Admin);
            let admin = async move { axum::serve(admin_listener, admin_app).await };
            tokio::try_join!(main, admin)?;
        }
        None => main.await?,
    }
    Ok(())
}

/// Routes every request through the server pages runtime.
async fn fallback_handler(State(state): State<Arc<AppState>>, request: Request<Body>) -> Response {
    let page_request = to_page_request(&request);
    let head = request.method() == Method::HEAD;

    let runtime = Arc::clone(&state.runtime);
    let context = state.context;
    let handled = tokio::task::spawn_blocking(move || runtime.handle(context, page_request)).await;

    match handled {
        Ok(response) => to_axum_response(response, head),
        Err(e) => {
            tracing::error!("Request handling failed: {}", e);
            error_page(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Convert axum Request to PageRequest
fn to_page_request(request: &Request<Body>) -> PageRequest {
    let uri = request.uri();
    let query: HashMap<String, String> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?.to_string();
            let value = parts.next().unwrap_or("").to_string();
            if key.is_empty() {
                None
            } else {
                Some((key, value))
            }
        })
        .collect();

    let headers: HashMap<String, String> = request
        .headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
        .collect();

    PageRequest::new(uri.path(), request.method().as_str())
        .with_query(query)
        .with_headers(headers)
}

/// Convert PageResponse to axum Response
fn to_axum_response(response: PageResponse, head: bool) -> Response {
    let sent_error = response.sent_error();
    let (status, headers, body) = response.into_parts();
    let status_code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if sent_error.is_some() && body.is_empty() {
        return error_page(status_code);
    }

    let mut builder = Response::builder().status(status_code);
    for (key, value) in headers {
        builder = builder.header(key, value);
    }
    let body = if head { Body::empty() } else { Body::from(body) };
    builder.body(body).unwrap_or_else(|_| {
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to build response").into_response()
    })
}

/// Plain error page for statuses no application page handled.
fn error_page(status: StatusCode) -> Response {
    let reason = default_reason(status.as_u16());
    (
        status,
        Html(format!(
            "<!DOCTYPE html>\n<html>\n<head><title>{} {}</title></head>\n<body><h1>{} {}</h1></body>\n</html>\n",
            status.as_u16(),
            reason,
            status.as_u16(),
            reason
        )),
    )
        .into_response()
}

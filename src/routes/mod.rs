// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP surface: RPC procedures, sign-in routes, scheduled functions.

pub mod auth;
pub mod functions;
pub mod rpc;

use crate::error::AppError;
use crate::middleware::{require_auth, security::add_security_headers};
use crate::AppState;
use axum::http::{header, request::Parts, HeaderValue, Method, Uri};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id: option_env!("BUILD_ID").unwrap_or("unknown").to_string(),
    })
}

async fn unknown_route(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

/// Browsers may call from the site itself or from a local dev server.
fn is_allowed_origin(site_url: &str, origin: &str) -> bool {
    origin == site_url.trim_end_matches('/')
        || origin.starts_with("http://localhost")
        || origin.starts_with("http://127.0.0.1")
}

fn cors_layer(site_url: &str) -> CorsLayer {
    let site_url = site_url.to_string();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _: &Parts| {
                origin
                    .to_str()
                    .is_ok_and(|origin| is_allowed_origin(&site_url, origin))
            },
        ))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Build the complete router.
///
/// Only `/rpc/*` sits behind the ID-token check; `/functions/*` carries its
/// own scheduler check.
pub fn create_router(state: Arc<AppState>) -> Router {
    let rpc = rpc::routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_auth,
    ));

    Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes())
        .merge(functions::routes(state.clone()))
        .merge(rpc)
        .fallback(unknown_route)
        .layer(middleware::from_fn(add_security_headers))
        .layer(cors_layer(&state.config.site_url))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_origins() {
        let site = "https://studio.example.com/";
        assert!(is_allowed_origin(site, "https://studio.example.com"));
        assert!(is_allowed_origin(site, "http://localhost:5173"));
        assert!(is_allowed_origin(site, "http://127.0.0.1:3000"));
        assert!(!is_allowed_origin(site, "https://studio.example.com.evil.io"));
        assert!(!is_allowed_origin(site, "https://localhost.evil.io"));
    }
}

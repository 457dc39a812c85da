// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scheduled background functions, invoked by Cloud Scheduler.

use crate::error::Result;
use crate::middleware::require_scheduler_auth;
use crate::AppState;
use axum::{extract::State, middleware, routing::post, Json, Router};
use serde::Serialize;
use std::sync::Arc;

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/functions/purge-expired-invitations",
            post(purge_expired_invitations),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            require_scheduler_auth,
        ))
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub deleted: usize,
}

async fn purge_expired_invitations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PurgeResponse>> {
    let deleted = state
        .services
        .invitations
        .purge_expired(chrono::Utc::now())
        .await?;
    Ok(Json(PurgeResponse { deleted }))
}

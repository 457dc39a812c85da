// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cloud Scheduler authentication middleware.

use crate::services::id_token::{bearer_token, TokenError};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Require a Cloud Scheduler OIDC token for `/functions/*` routes.
pub async fn require_scheduler_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = bearer_token(auth_header) else {
        tracing::warn!(path = %request.uri().path(), "Blocked function call without bearer token");
        return Err(StatusCode::FORBIDDEN);
    };

    let principal = state
        .scheduler_tokens
        .verify(token)
        .await
        .map_err(|err| match err {
            TokenError::Rejected(reason) => {
                tracing::warn!(reason = %reason, "Blocked function call: invalid OIDC token");
                StatusCode::FORBIDDEN
            }
            TokenError::Transient(reason) => {
                tracing::error!(reason = %reason, "Scheduler OIDC verification transient failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        })?;

    tracing::debug!(
        email = principal.email.as_deref().unwrap_or_default(),
        subject = %principal.subject,
        "Scheduler OIDC verification succeeded"
    );

    Ok(next.run(request).await)
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase ID token authentication middleware.

use crate::error::AppError;
use crate::services::id_token::{bearer_token, TokenError};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Cookie holding the caller's Firebase ID token.
pub const SESSION_COOKIE: &str = "studio_session";

/// Authenticated caller extracted from a verified ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    /// Verified email, if the provider has one
    pub email: Option<String>,
}

/// Session token from the cookie, falling back to a Bearer header.
pub fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    bearer_token(auth_header).map(str::to_string)
}

/// Middleware that requires a valid Firebase ID token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(&jar, request.headers()).ok_or(AppError::Unauthenticated)?;

    let verified = state
        .id_tokens
        .verify(&token)
        .await
        .map_err(|err| match err {
            TokenError::Rejected(reason) => {
                tracing::debug!(reason = %reason, "Rejected ID token");
                AppError::Unauthenticated
            }
            TokenError::Transient(reason) => {
                tracing::error!(reason = %reason, "ID token verification unavailable");
                AppError::Internal(anyhow::anyhow!("ID token verification unavailable"))
            }
        })?;

    request.extensions_mut().insert(AuthUser {
        uid: verified.subject,
        email: verified.email,
    });

    Ok(next.run(request).await)
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase sign-in completion and session cookie routes.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::Redirect,
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{session_token, SESSION_COOKIE};
use crate::AppState;

/// Firebase ID tokens are valid for one hour.
const SESSION_MAX_AGE: time::Duration = time::Duration::hours(1);

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/callback", get(auth_callback))
        .route("/auth/dev-login", post(dev_login))
        .route("/auth/logout", post(logout))
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let local = state.config.site_url.starts_with("http://localhost")
        || state.config.site_url.starts_with("http://127.0.0.1");

    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(!local)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(SESSION_MAX_AGE)
        .build()
}

fn home(state: &AppState) -> Redirect {
    Redirect::to(&format!("{}/", state.config.site_url))
}

fn login(state: &AppState) -> Redirect {
    Redirect::to(&format!("{}/login", state.config.site_url))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackParams {
    #[serde(default)]
    id_token: Option<String>,
}

/// Complete a redirect sign-in: establish the session and go home, or send
/// the user back to the login page.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
    jar: CookieJar,
    headers: HeaderMap,
) -> (CookieJar, Redirect) {
    let Some(token) = params
        .id_token
        .filter(|t| !t.is_empty())
        .or_else(|| session_token(&jar, &headers))
    else {
        tracing::debug!("Sign-in callback without a token");
        return (jar, login(&state));
    };

    match state.id_tokens.verify(&token).await {
        Ok(verified) => {
            tracing::info!(uid = %verified.subject, "Sign-in completed");
            let jar = jar.add(session_cookie(&state, token));
            (jar, home(&state))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Sign-in callback rejected");
            (jar.remove(Cookie::build(SESSION_COOKIE).path("/")), login(&state))
        }
    }
}

/// Sign the seed user in with a password. Development only.
async fn dev_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    if state.config.app_env != crate::config::AppEnv::Development {
        return Err(AppError::NotFound("/auth/dev-login".to_string()));
    }

    let token = state
        .identity
        .sign_in_with_password(
            &state.config.seed_user_email,
            &state.config.seed_user_password,
        )
        .await?;

    tracing::info!(email = %state.config.seed_user_email, "Development sign-in");
    Ok((jar.add(session_cookie(&state, token)), home(&state)))
}

async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        StatusCode::NO_CONTENT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_params_accept_camel_case() {
        let params: CallbackParams =
            serde_json::from_value(serde_json::json!({"idToken": "abc"})).unwrap();
        assert_eq!(params.id_token.as_deref(), Some("abc"));
    }
}

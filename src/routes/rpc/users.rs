// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use super::RpcInput;
use crate::context::AuthContext;
use crate::error::Result;
use crate::models::{User, UserSettings};
use crate::services::users::{CreatedUser, NewUser, SettingsKey, SettingsUpsert, UserKey};
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rpc/user.getById", get(get_by_id))
        .route("/rpc/user.create", post(create))
        .route("/rpc/user.settings.get", get(get_settings))
        .route("/rpc/user.settings.upsert", post(upsert_settings))
}

async fn get_by_id(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    RpcInput(input): RpcInput<UserKey>,
) -> Result<Json<Option<User>>> {
    Ok(Json(state.services.users.get_by_id(&ctx, &input.id).await?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    RpcInput(input): RpcInput<NewUser>,
) -> Result<Json<CreatedUser>> {
    Ok(Json(state.services.users.create(&ctx, input).await?))
}

async fn get_settings(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    RpcInput(input): RpcInput<SettingsKey>,
) -> Result<Json<UserSettings>> {
    Ok(Json(
        state
            .services
            .users
            .get_settings(&ctx, &input.user_id)
            .await?,
    ))
}

async fn upsert_settings(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    RpcInput(input): RpcInput<SettingsUpsert>,
) -> Result<Json<UserSettings>> {
    Ok(Json(
        state.services.users.upsert_settings(&ctx, input).await?,
    ))
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! `canvas.*` and `userCanvas.*` procedures.

use super::RpcInput;
use crate::context::AuthContext;
use crate::error::{Result, UpdateOutcome};
use crate::models::{Canvas, UserCanvas};
use crate::services::canvas::{CanvasUpdate, ProjectKey};
use crate::services::user_canvas::{UserCanvasKey, UserCanvasUpdate};
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rpc/canvas.get", get(get_canvas))
        .route("/rpc/canvas.getOrCreate", post(get_or_create_canvas))
        .route("/rpc/canvas.update", post(update_canvas))
        .route("/rpc/userCanvas.get", get(get_user_canvas))
        .route("/rpc/userCanvas.getOrCreate", post(get_or_create_user_canvas))
        .route("/rpc/userCanvas.update", post(update_user_canvas))
}

async fn get_canvas(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    RpcInput(input): RpcInput<ProjectKey>,
) -> Result<Json<Option<Canvas>>> {
    Ok(Json(
        state.services.canvas.get(&ctx, &input.project_id).await?,
    ))
}

async fn get_or_create_canvas(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    RpcInput(input): RpcInput<ProjectKey>,
) -> Result<Json<Canvas>> {
    Ok(Json(
        state
            .services
            .canvas
            .get_or_create(&ctx, &input.project_id)
            .await?,
    ))
}

async fn update_canvas(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    RpcInput(input): RpcInput<CanvasUpdate>,
) -> Result<Json<UpdateOutcome>> {
    Ok(Json(state.services.canvas.update(&ctx, input).await?))
}

async fn get_user_canvas(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    RpcInput(input): RpcInput<UserCanvasKey>,
) -> Result<Json<UserCanvas>> {
    Ok(Json(state.services.user_canvas.get(&ctx, input).await?))
}

async fn get_or_create_user_canvas(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    RpcInput(input): RpcInput<UserCanvasKey>,
) -> Result<Json<UserCanvas>> {
    Ok(Json(
        state.services.user_canvas.get_or_create(&ctx, input).await?,
    ))
}

async fn update_user_canvas(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    RpcInput(input): RpcInput<UserCanvasUpdate>,
) -> Result<Json<UpdateOutcome>> {
    Ok(Json(state.services.user_canvas.update(&ctx, input).await?))
}

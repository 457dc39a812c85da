// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use super::RpcInput;
use crate::context::AuthContext;
use crate::error::Result;
use crate::models::Member;
use crate::services::canvas::ProjectKey;
use crate::services::members::RemoveMember;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct Removed {
    success: bool,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rpc/member.list", get(list))
        .route("/rpc/member.remove", post(remove))
}

async fn list(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    RpcInput(input): RpcInput<ProjectKey>,
) -> Result<Json<Vec<Member>>> {
    Ok(Json(
        state.services.members.list(&ctx, &input.project_id).await?,
    ))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    RpcInput(input): RpcInput<RemoveMember>,
) -> Result<Json<Removed>> {
    state.services.members.remove(&ctx, input).await?;
    Ok(Json(Removed { success: true }))
}

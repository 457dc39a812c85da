// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use super::RpcInput;
use crate::context::AuthContext;
use crate::error::Result;
use crate::models::{Invitation, InvitationWithInviter, UserProject};
use crate::services::canvas::ProjectKey;
use crate::services::invitations::{AcceptInvitation, InvitationKey, NewInvitation};
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct Deleted {
    success: bool,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rpc/invitation.get", get(get_invitation))
        .route("/rpc/invitation.list", get(list))
        .route("/rpc/invitation.create", post(create))
        .route("/rpc/invitation.delete", post(delete))
        .route("/rpc/invitation.accept", post(accept))
}

async fn get_invitation(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    RpcInput(input): RpcInput<InvitationKey>,
) -> Result<Json<InvitationWithInviter>> {
    Ok(Json(state.services.invitations.get(&ctx, input).await?))
}

async fn list(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    RpcInput(input): RpcInput<ProjectKey>,
) -> Result<Json<Vec<Invitation>>> {
    Ok(Json(
        state
            .services
            .invitations
            .list(&ctx, &input.project_id)
            .await?,
    ))
}

async fn create(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    RpcInput(input): RpcInput<NewInvitation>,
) -> Result<Json<Invitation>> {
    Ok(Json(state.services.invitations.create(&ctx, input).await?))
}

async fn delete(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    RpcInput(input): RpcInput<InvitationKey>,
) -> Result<Json<Deleted>> {
    state.services.invitations.delete(&ctx, input).await?;
    Ok(Json(Deleted { success: true }))
}

async fn accept(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    RpcInput(input): RpcInput<AcceptInvitation>,
) -> Result<Json<UserProject>> {
    Ok(Json(state.services.invitations.accept(&ctx, input).await?))
}

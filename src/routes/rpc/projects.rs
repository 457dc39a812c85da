// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use super::RpcInput;
use crate::context::AuthContext;
use crate::error::Result;
use crate::models::{FullProject, Project};
use crate::services::canvas::ProjectKey;
use crate::services::projects::{
    CreateProject, DeleteProjectResponse, ProjectId, ProjectUpdate, UserId,
};
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rpc/project.getFullProject", get(get_full_project))
        .route("/rpc/project.create", post(create))
        .route("/rpc/project.delete", post(delete))
        .route("/rpc/project.getPreviewProjects", get(get_preview_projects))
        .route("/rpc/project.update", post(update))
}

async fn get_full_project(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    RpcInput(input): RpcInput<ProjectKey>,
) -> Result<Json<Option<FullProject>>> {
    let project = state
        .services
        .projects
        .get_full_project(&ctx, &input.project_id)
        .await?;
    Ok(Json(project))
}

async fn create(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    RpcInput(input): RpcInput<CreateProject>,
) -> Result<Json<Project>> {
    Ok(Json(state.services.projects.create(&ctx, input).await?))
}

async fn delete(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    RpcInput(input): RpcInput<ProjectId>,
) -> Result<Json<DeleteProjectResponse>> {
    let deleted = state.services.projects.delete(&ctx, &input.id).await?;
    Ok(Json(DeleteProjectResponse { deleted }))
}

async fn get_preview_projects(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    RpcInput(input): RpcInput<UserId>,
) -> Result<Json<Vec<Project>>> {
    let projects = state
        .services
        .projects
        .get_preview_projects(&ctx, &input.user_id)
        .await?;
    Ok(Json(projects))
}

async fn update(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    RpcInput(input): RpcInput<ProjectUpdate>,
) -> Result<Json<Project>> {
    Ok(Json(state.services.projects.update(&ctx, input).await?))
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed RPC procedures under `/rpc/{router}.{procedure}`.
//!
//! Queries are `GET` with a URL-encoded JSON `input` parameter; mutations
//! are `POST` with a JSON body. Input is validated before any handler runs.

mod canvas;
mod invitations;
mod members;
mod projects;
mod users;

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{FromRequest, Query, Request},
    http::Method,
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize};
use std::sync::Arc;
use validator::Validate;

/// Deserialized and validated procedure input.
#[derive(Debug)]
pub struct RpcInput<T>(pub T);

#[derive(Deserialize)]
struct QueryInput {
    input: Option<String>,
}

impl<S, T> FromRequest<S> for RpcInput<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let value: T = if req.method() == Method::GET {
            let Query(query) = Query::<QueryInput>::try_from_uri(req.uri())
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            let raw = query
                .input
                .ok_or_else(|| AppError::BadRequest("Missing input parameter".to_string()))?;
            serde_json::from_str(&raw)
                .map_err(|e| AppError::BadRequest(format!("Invalid input: {}", e)))?
        } else {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            value
        };

        value
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        Ok(RpcInput(value))
    }
}

/// All procedures. The auth middleware is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(projects::routes())
        .merge(canvas::routes())
        .merge(members::routes())
        .merge(invitations::routes())
        .merge(users::routes())
}

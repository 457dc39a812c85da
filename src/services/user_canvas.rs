// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user canvas view state (zoom and pan).

use crate::context::{Access, AuthContext};
use crate::db::{get_model, merge_value, paths, to_document, DocumentStore, WriteMode};
use crate::error::{AppError, Result, UpdateOutcome};
use crate::models::{defaults, validate_doc_id, Fields, UserCanvas};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserCanvasKey {
    #[validate(custom(function = "validate_doc_id"))]
    pub project_id: String,
    #[validate(custom(function = "validate_doc_id"))]
    pub canvas_id: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserCanvasUpdate {
    #[validate(custom(function = "validate_doc_id"))]
    pub project_id: String,
    #[serde(default)]
    #[validate(custom(function = "validate_doc_id"))]
    pub canvas_id: Option<String>,
    #[serde(flatten)]
    pub fields: Fields,
}

#[derive(Clone)]
pub struct UserCanvasService {
    store: Arc<dyn DocumentStore>,
}

impl UserCanvasService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, ctx: &AuthContext, key: UserCanvasKey) -> Result<UserCanvas> {
        ctx.authorize(Access::Member(&key.project_id)).await?;

        get_model(
            self.store.as_ref(),
            &paths::user_canvas(&key.project_id, &key.canvas_id, ctx.uid()),
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User canvas for canvas {}", key.canvas_id)))
    }

    pub async fn get_or_create(&self, ctx: &AuthContext, key: UserCanvasKey) -> Result<UserCanvas> {
        ctx.authorize(Access::Member(&key.project_id)).await?;
        self.ensure(&key.project_id, &key.canvas_id, ctx.uid())
            .await
    }

    /// Merge view state for the caller. Failures are reported in the outcome.
    pub async fn update(
        &self,
        ctx: &AuthContext,
        input: UserCanvasUpdate,
    ) -> Result<UpdateOutcome> {
        ctx.authorize(Access::Member(&input.project_id)).await?;

        let outcome: UpdateOutcome = self.apply_update(ctx.uid(), input).await.into();
        if let Some(cause) = &outcome.error {
            tracing::warn!(code = %cause.code, message = %cause.message, "User canvas update failed");
        }
        Ok(outcome)
    }

    async fn apply_update(&self, user_id: &str, input: UserCanvasUpdate) -> Result<()> {
        let canvas_id = input
            .canvas_id
            .ok_or_else(|| AppError::BadRequest("canvasId is required".to_string()))?;

        // The stored ids always mirror the document path.
        let mut fields = input.fields;
        fields.insert("userId".to_string(), Value::String(user_id.to_string()));
        fields.insert("canvasId".to_string(), Value::String(canvas_id.clone()));
        let patch = Value::Object(fields);

        let path = paths::user_canvas(&input.project_id, &canvas_id, user_id);
        let existing = self.store.get(&path).await?;
        let mut merged = match &existing {
            Some(doc) => doc.data.clone(),
            None => to_document(&defaults::create_default_user_canvas(user_id, &canvas_id))?,
        };
        merge_value(&mut merged, patch.clone());

        // Zoom and pan must stay numeric for later reads to succeed.
        if let Err(e) = serde_json::from_value::<UserCanvas>(merged.clone()) {
            return Err(AppError::BadRequest(format!("Invalid user canvas fields: {}", e)));
        }

        // A first write lays the patch over the defaults.
        let write = if existing.is_some() { patch } else { merged };
        self.store.set(&path, write, WriteMode::Merge).await
    }

    pub(crate) async fn ensure(
        &self,
        project_id: &str,
        canvas_id: &str,
        user_id: &str,
    ) -> Result<UserCanvas> {
        let path = paths::user_canvas(project_id, canvas_id, user_id);
        if let Some(existing) = get_model(self.store.as_ref(), &path).await? {
            return Ok(existing);
        }

        let user_canvas = defaults::create_default_user_canvas(user_id, canvas_id);
        self.store
            .set(&path, to_document(&user_canvas)?, WriteMode::Replace)
            .await?;

        tracing::debug!(project_id, canvas_id, user_id, "Created default user canvas");
        Ok(user_canvas)
    }
}

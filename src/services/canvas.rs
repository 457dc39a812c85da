// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Canvas operations. A project has at most one canvas.

use crate::context::{Access, AuthContext};
use crate::db::{paths, to_document, DocumentStore, Query, WriteMode};
use crate::error::{AppError, Result, UpdateOutcome};
use crate::models::{defaults, validate_doc_id, Canvas, Fields};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectKey {
    #[validate(custom(function = "validate_doc_id"))]
    pub project_id: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CanvasUpdate {
    #[validate(custom(function = "validate_doc_id"))]
    pub id: String,
    #[validate(custom(function = "validate_doc_id"))]
    pub project_id: String,
    #[serde(flatten)]
    pub fields: Fields,
}

#[derive(Clone)]
pub struct CanvasService {
    store: Arc<dyn DocumentStore>,
}

impl CanvasService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// The project's canvas, if one exists.
    pub async fn get(&self, ctx: &AuthContext, project_id: &str) -> Result<Option<Canvas>> {
        ctx.authorize(Access::Member(project_id)).await?;
        self.find_first(project_id).await
    }

    /// The project's canvas, persisting a default one when none exists.
    pub async fn get_or_create(&self, ctx: &AuthContext, project_id: &str) -> Result<Canvas> {
        ctx.authorize(Access::Member(project_id)).await?;
        self.ensure(project_id).await
    }

    /// Merge `fields` into the canvas. Store failures are reported in the outcome.
    pub async fn update(&self, ctx: &AuthContext, input: CanvasUpdate) -> Result<UpdateOutcome> {
        ctx.authorize(Access::Member(&input.project_id)).await?;

        let outcome: UpdateOutcome = self.apply_update(input).await.into();
        if let Some(cause) = &outcome.error {
            tracing::warn!(code = %cause.code, message = %cause.message, "Canvas update failed");
        }
        Ok(outcome)
    }

    async fn apply_update(&self, input: CanvasUpdate) -> Result<()> {
        let path = paths::canvas(&input.project_id, &input.id);
        if self.store.get(&path).await?.is_none() {
            return Err(AppError::NotFound(format!("Canvas {}", input.id)));
        }

        let mut fields = input.fields;
        fields.remove("id");
        fields.remove("projectId");
        if fields.is_empty() {
            return Ok(());
        }

        self.store
            .set(&path, Value::Object(fields), WriteMode::Merge)
            .await
    }

    pub(crate) async fn find_first(&self, project_id: &str) -> Result<Option<Canvas>> {
        self.store
            .list(&paths::canvases(project_id), Query::all().limit(1))
            .await?
            .into_iter()
            .next()
            .map(|doc| doc.into_model())
            .transpose()
    }

    pub(crate) async fn ensure(&self, project_id: &str) -> Result<Canvas> {
        if let Some(canvas) = self.find_first(project_id).await? {
            return Ok(canvas);
        }

        let canvas = defaults::create_default_canvas(project_id);
        self.store
            .set(
                &paths::canvas(project_id, &canvas.id),
                to_document(&canvas)?,
                WriteMode::Replace,
            )
            .await?;

        tracing::info!(project_id, canvas_id = %canvas.id, "Created default canvas");
        Ok(canvas)
    }
}

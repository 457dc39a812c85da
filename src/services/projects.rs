// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Project lifecycle: creation with its default workspace, cascading
//! deletion, previews and updates.

use super::canvas::CanvasService;
use super::members::membership_records;
use super::user_canvas::UserCanvasService;
use crate::context::{Access, AuthContext};
use crate::db::{
    batch_delete, get_model, merge_value, paths, DocPath, Document, DocumentStore, Filter, Query,
    WriteBatch, WriteMode,
};
use crate::error::{AppError, Result};
use crate::models::project::RESERVED_PROJECT_FIELDS;
use crate::models::{
    defaults, validate_doc_id, Fields, Frame, FullProject, NewProject, Project, ProjectRole,
    UserProject,
};
use crate::time_utils::now_rfc3339;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

/// Firestore caps `in` filters at 30 values.
pub const IN_QUERY_LIMIT: usize = 30;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProject {
    #[validate(nested)]
    pub project: NewProject,
    #[validate(custom(function = "validate_doc_id"))]
    pub user_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProjectId {
    #[validate(custom(function = "validate_doc_id"))]
    pub id: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserId {
    #[validate(custom(function = "validate_doc_id"))]
    pub user_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProjectUpdate {
    #[serde(default)]
    #[validate(custom(function = "validate_doc_id"))]
    pub id: Option<String>,
    #[serde(flatten)]
    pub fields: Fields,
}

#[derive(Debug, Serialize)]
pub struct DeleteProjectResponse {
    pub deleted: usize,
}

#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn DocumentStore>,
    canvas: CanvasService,
    user_canvas: UserCanvasService,
}

impl ProjectService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            canvas: CanvasService::new(store.clone()),
            user_canvas: UserCanvasService::new(store.clone()),
            store,
        }
    }

    /// Everything the editor needs, or `None` when the project is gone.
    ///
    /// A deleted project takes its memberships with it, so absence is
    /// reported before the membership check.
    pub async fn get_full_project(
        &self,
        ctx: &AuthContext,
        project_id: &str,
    ) -> Result<Option<FullProject>> {
        let Some(project) =
            get_model::<Project>(self.store.as_ref(), &paths::project(project_id)).await?
        else {
            return Ok(None);
        };
        ctx.authorize(Access::Member(project_id)).await?;

        let canvas = self.canvas.ensure(project_id).await?;
        let user_canvas = self
            .user_canvas
            .ensure(project_id, &canvas.id, ctx.uid())
            .await?;

        let frames = self
            .store
            .list(&paths::frames(project_id, &canvas.id), Query::all())
            .await?
            .into_iter()
            .map(Document::into_model::<Frame>)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(FullProject {
            project,
            canvas,
            user_canvas,
            frames,
        }))
    }

    /// Create a project with its owner membership and default workspace.
    ///
    /// All five documents land in one atomic batch.
    pub async fn create(&self, ctx: &AuthContext, input: CreateProject) -> Result<Project> {
        ctx.authorize(Access::SelfOnly(&input.user_id)).await?;

        let project = input
            .project
            .into_project(defaults::new_id(), &now_rfc3339());
        let canvas = defaults::create_default_canvas(&project.id);
        let user_canvas = defaults::create_default_user_canvas(&input.user_id, &canvas.id);
        let frame = defaults::create_default_frame(&canvas.id, &project.sandbox_url);
        let membership = UserProject::new(&input.user_id, &project.id, ProjectRole::Owner);

        let mut batch = WriteBatch::new();
        batch.set_model(paths::project(&project.id), &project)?;
        batch.set_model(paths::user_project(&input.user_id, &project.id), &membership)?;
        batch.set_model(paths::canvas(&project.id, &canvas.id), &canvas)?;
        batch.set_model(
            paths::user_canvas(&project.id, &canvas.id, &input.user_id),
            &user_canvas,
        )?;
        batch.set_model(paths::frame(&project.id, &canvas.id, &frame.id), &frame)?;
        self.store.commit(batch).await?;

        tracing::info!(project_id = %project.id, user_id = %input.user_id, "Project created");
        Ok(project)
    }

    /// Delete a project and everything under it. Returns the number of
    /// documents removed.
    ///
    /// The project document and the caller's own membership go in the final
    /// batch, so a partial failure leaves a project the owner can delete again.
    pub async fn delete(&self, ctx: &AuthContext, project_id: &str) -> Result<usize> {
        ctx.authorize(Access::Owner(project_id)).await?;

        let owner_membership = paths::user_project(ctx.uid(), project_id);
        let mut children = self.child_paths(project_id).await?;
        children.retain(|path| path != &owner_membership);

        let mut deleted = batch_delete(self.store.as_ref(), children).await?;

        let mut last = WriteBatch::new();
        last.delete(owner_membership)
            .delete(paths::project(project_id));
        deleted += last.len();
        self.store.commit(last).await?;

        tracing::info!(project_id, deleted, "Project deleted");
        Ok(deleted)
    }

    async fn child_paths(&self, project_id: &str) -> Result<Vec<DocPath>> {
        let mut doomed = Vec::new();

        for canvas in self
            .store
            .list(&paths::canvases(project_id), Query::all())
            .await?
        {
            let canvas_id = canvas.id().to_string();
            for collection in [
                paths::frames(project_id, &canvas_id),
                paths::user_canvases(project_id, &canvas_id),
            ] {
                doomed.extend(
                    self.store
                        .list(&collection, Query::all())
                        .await?
                        .into_iter()
                        .map(|doc| doc.path),
                );
            }
            doomed.push(canvas.path);
        }

        doomed.extend(
            self.store
                .list(&paths::invitations(project_id), Query::all())
                .await?
                .into_iter()
                .map(|doc| doc.path),
        );

        doomed.extend(
            membership_records(self.store.as_ref(), project_id)
                .await?
                .into_iter()
                .map(|doc| doc.path),
        );

        Ok(doomed)
    }

    /// Projects the user belongs to.
    pub async fn get_preview_projects(
        &self,
        ctx: &AuthContext,
        user_id: &str,
    ) -> Result<Vec<Project>> {
        ctx.authorize(Access::SelfOnly(user_id)).await?;

        let project_ids: Vec<String> = self
            .store
            .list(&paths::user_projects(user_id), Query::all())
            .await?
            .iter()
            .map(|doc| doc.id().to_string())
            .collect();

        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut projects = Vec::with_capacity(project_ids.len());
        for chunk in project_ids.chunks(IN_QUERY_LIMIT) {
            let query = Query::all().filter(Filter::In {
                field: "id",
                values: chunk.to_vec(),
            });
            for doc in self.store.list(&paths::projects(), query).await? {
                projects.push(doc.into_model::<Project>()?);
            }
        }

        Ok(projects)
    }

    /// Merge client fields into a project. Server-owned fields are not
    /// overwritten. `updatedAt` moves only when the merge changes something,
    /// so repeating an update leaves the document as it was.
    pub async fn update(&self, ctx: &AuthContext, input: ProjectUpdate) -> Result<Project> {
        let project_id = input
            .id
            .ok_or_else(|| AppError::BadRequest("Project id is required".to_string()))?;
        ctx.authorize(Access::Member(&project_id)).await?;

        let path = paths::project(&project_id);
        let current = self
            .store
            .get(&path)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {}", project_id)))?;

        let mut fields = input.fields;
        for field in RESERVED_PROJECT_FIELDS {
            fields.remove(field);
        }

        let mut merged = current.data.clone();
        merge_value(&mut merged, Value::Object(fields.clone()));
        if merged == current.data {
            return current.into_model();
        }

        let mut project: Project = serde_json::from_value(merged)
            .map_err(|e| AppError::BadRequest(format!("Invalid project fields: {}", e)))?;
        let now = now_rfc3339();
        fields.insert("updatedAt".to_string(), Value::String(now.clone()));

        self.store
            .set(&path, Value::Object(fields), WriteMode::Merge)
            .await?;

        project.updated_at = now;
        Ok(project)
    }
}

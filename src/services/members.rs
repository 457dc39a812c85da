// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Project membership.

use crate::context::{Access, AuthContext};
use crate::db::{collections, get_model, paths, Document, DocumentStore, Filter, Query};
use crate::error::{AppError, Result};
use crate::models::{validate_doc_id, Member, ProjectRole, User, UserProject};
use futures_util::{stream, StreamExt, TryStreamExt};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Concurrent user lookups when joining members.
const USER_FETCH_CONCURRENCY: usize = 8;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RemoveMember {
    #[validate(custom(function = "validate_doc_id"))]
    pub user_id: String,
    #[validate(custom(function = "validate_doc_id"))]
    pub project_id: String,
}

/// Every `users/*/projects/{project_id}` join record.
pub(crate) async fn membership_records(
    store: &dyn DocumentStore,
    project_id: &str,
) -> Result<Vec<Document>> {
    let query = Query::all().filter(Filter::Eq {
        field: "projectId",
        value: project_id.to_string(),
    });

    Ok(store
        .collection_group(collections::USER_PROJECTS, query)
        .await?
        .into_iter()
        .filter(|doc| paths::is_user_project(&doc.path))
        .collect())
}

#[derive(Clone)]
pub struct MemberService {
    store: Arc<dyn DocumentStore>,
}

impl MemberService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Members of a project, each joined with their user record.
    pub async fn list(&self, ctx: &AuthContext, project_id: &str) -> Result<Vec<Member>> {
        ctx.authorize(Access::Member(project_id)).await?;

        let memberships = membership_records(self.store.as_ref(), project_id)
            .await?
            .into_iter()
            .map(Document::into_model::<UserProject>)
            .collect::<Result<Vec<_>>>()?;

        stream::iter(memberships)
            .map(|membership| async move {
                let user = get_model::<User>(
                    self.store.as_ref(),
                    &paths::user(&membership.user_id),
                )
                .await?;
                Ok::<_, AppError>(Member { membership, user })
            })
            .buffered(USER_FETCH_CONCURRENCY)
            .try_collect()
            .await
    }

    /// Remove a member. Managers may remove others; anyone may leave.
    ///
    /// Owners cannot be removed.
    pub async fn remove(&self, ctx: &AuthContext, input: RemoveMember) -> Result<()> {
        if input.user_id == ctx.uid() {
            ctx.authorize(Access::Member(&input.project_id)).await?;
        } else {
            ctx.authorize(Access::Manager(&input.project_id)).await?;
        }

        let path = paths::user_project(&input.user_id, &input.project_id);
        let membership = get_model::<UserProject>(self.store.as_ref(), &path)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "User {} is not a member of project {}",
                    input.user_id, input.project_id
                ))
            })?;

        if membership.role == ProjectRole::Owner {
            return Err(AppError::BadRequest(
                "The project owner cannot be removed".to_string(),
            ));
        }

        self.store.delete(&path).await?;

        tracing::info!(
            project_id = %input.project_id,
            user_id = %input.user_id,
            removed_by = %ctx.uid(),
            "Member removed"
        );
        Ok(())
    }
}

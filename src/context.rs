// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-request authorization context.

use crate::db::{get_model, paths, DocumentStore};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{ProjectRole, UserProject};
use crate::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::sync::Arc;

/// Role requirement an operation declares before touching a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access<'a> {
    /// Any verified caller
    Authenticated,
    /// The caller is this user
    SelfOnly(&'a str),
    /// Any role on the project
    Member(&'a str),
    /// Owner or admin of the project
    Manager(&'a str),
    Owner(&'a str),
}

/// Verified caller plus the store handle used to check their memberships.
#[derive(Clone)]
pub struct AuthContext {
    pub user: AuthUser,
    pub store: Arc<dyn DocumentStore>,
}

impl AuthContext {
    pub fn new(user: AuthUser, store: Arc<dyn DocumentStore>) -> Self {
        Self { user, store }
    }

    pub fn uid(&self) -> &str {
        &self.user.uid
    }

    pub fn email(&self) -> Option<&str> {
        self.user.email.as_deref()
    }

    /// The caller's membership record for a project, if any.
    pub async fn membership(&self, project_id: &str) -> Result<Option<UserProject>> {
        get_model(
            self.store.as_ref(),
            &paths::user_project(self.uid(), project_id),
        )
        .await
    }

    /// Check `access` against the caller, failing with `Forbidden`.
    pub async fn authorize(&self, access: Access<'_>) -> Result<()> {
        let (project_id, required) = match access {
            Access::Authenticated => return Ok(()),
            Access::SelfOnly(user_id) => {
                return if user_id == self.uid() {
                    Ok(())
                } else {
                    tracing::warn!(uid = %self.uid(), target = user_id, "Cross-user access denied");
                    Err(AppError::Forbidden(
                        "Cannot act on behalf of another user".to_string(),
                    ))
                };
            }
            Access::Member(project_id) => (project_id, ProjectRole::Member),
            Access::Manager(project_id) => (project_id, ProjectRole::Admin),
            Access::Owner(project_id) => (project_id, ProjectRole::Owner),
        };

        match self.membership(project_id).await? {
            Some(membership) if membership.role.at_least(required) => Ok(()),
            Some(membership) => {
                tracing::warn!(
                    uid = %self.uid(),
                    project_id,
                    role = ?membership.role,
                    required = ?required,
                    "Insufficient project role"
                );
                Err(AppError::Forbidden(format!(
                    "Requires {:?} role on project {}",
                    required, project_id
                )))
            }
            None => {
                tracing::warn!(uid = %self.uid(), project_id, "Caller is not a project member");
                Err(AppError::Forbidden(format!(
                    "Not a member of project {}",
                    project_id
                )))
            }
        }
    }
}

impl FromRequestParts<Arc<AppState>> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthenticated)?;

        Ok(AuthContext::new(user, state.store.clone()))
    }
}

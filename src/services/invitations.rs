// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Project invitations: create and email, inspect, accept, revoke, purge.

use super::canvas::CanvasService;
use super::mailer::{InvitationEmail, Notifier};
use crate::context::{Access, AuthContext};
use crate::db::{
    batch_delete, collections, get_model, paths, Document, DocumentStore, Filter, Query,
    WriteBatch,
};
use crate::error::{AppError, Result};
use crate::models::invitation::INVITATION_TTL_DAYS;
use crate::models::{
    defaults, validate_doc_id, Invitation, InvitationWithInviter, Project, ProjectRole, User,
    UserProject,
};
use crate::time_utils::{days_after, format_utc_rfc3339};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InvitationKey {
    #[validate(custom(function = "validate_doc_id"))]
    pub id: String,
    #[validate(custom(function = "validate_doc_id"))]
    pub project_id: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewInvitation {
    #[validate(custom(function = "validate_doc_id"))]
    pub project_id: String,
    #[validate(email)]
    pub invitee_email: String,
    pub role: ProjectRole,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AcceptInvitation {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(custom(function = "validate_doc_id"))]
    pub id: String,
    #[validate(custom(function = "validate_doc_id"))]
    pub project_id: String,
}

#[derive(Clone)]
pub struct InvitationService {
    store: Arc<dyn DocumentStore>,
    notifier: Arc<dyn Notifier>,
    canvas: CanvasService,
    site_url: String,
}

impl InvitationService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
        site_url: impl Into<String>,
    ) -> Self {
        Self {
            canvas: CanvasService::new(store.clone()),
            store,
            notifier,
            site_url: site_url.into(),
        }
    }

    /// Link the invitee follows to accept.
    pub fn invitation_link(&self, invitation: &Invitation) -> String {
        format!(
            "{}/invitation/{}?token={}",
            self.site_url,
            urlencoding::encode(&invitation.id),
            urlencoding::encode(&invitation.token)
        )
    }

    /// An invitation with its inviter inlined.
    ///
    /// Visible to project members and to the invitee.
    pub async fn get(
        &self,
        ctx: &AuthContext,
        key: InvitationKey,
    ) -> Result<InvitationWithInviter> {
        let invitation = self.find(&key.project_id, &key.id).await?;

        if !is_invitee(ctx, &invitation) {
            ctx.authorize(Access::Member(&key.project_id)).await?;
        }

        let inviter =
            get_model::<User>(self.store.as_ref(), &paths::user(&invitation.inviter_id)).await?;

        Ok(InvitationWithInviter {
            invitation,
            inviter,
        })
    }

    /// All invitations of a project, expired ones included.
    pub async fn list(&self, ctx: &AuthContext, project_id: &str) -> Result<Vec<Invitation>> {
        ctx.authorize(Access::Member(project_id)).await?;

        self.store
            .list(&paths::invitations(project_id), Query::all())
            .await?
            .into_iter()
            .map(Document::into_model)
            .collect()
    }

    /// Store an invitation and email it. If the email cannot be sent the
    /// invitation is removed again.
    pub async fn create(&self, ctx: &AuthContext, input: NewInvitation) -> Result<Invitation> {
        ctx.authorize(Access::Manager(&input.project_id)).await?;

        if input.role == ProjectRole::Owner {
            return Err(AppError::BadRequest(
                "Invitations cannot grant the owner role".to_string(),
            ));
        }
        self.notifier.ensure_configured()?;

        let project = get_model::<Project>(self.store.as_ref(), &paths::project(&input.project_id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {}", input.project_id)))?;

        let invitation = Invitation {
            id: defaults::new_id(),
            project_id: input.project_id,
            invitee_email: input.invitee_email.trim().to_string(),
            role: input.role,
            token: defaults::new_id(),
            inviter_id: ctx.uid().to_string(),
            expires_at: days_after(Utc::now(), INVITATION_TTL_DAYS),
        };

        let path = paths::invitation(&invitation.project_id, &invitation.id);
        let mut batch = WriteBatch::new();
        batch.set_model(path.clone(), &invitation)?;
        self.store.commit(batch).await?;

        let email = InvitationEmail {
            to: invitation.invitee_email.clone(),
            inviter: ctx.email().unwrap_or("A teammate").to_string(),
            project_name: project.name,
            role: invitation.role,
            link: self.invitation_link(&invitation),
        };

        if let Err(err) = self.notifier.send_invitation(&email).await {
            tracing::error!(
                invitation_id = %invitation.id,
                error = %err,
                "Invitation email failed, removing invitation"
            );
            if let Err(cleanup) = self.store.delete(&path).await {
                tracing::error!(
                    invitation_id = %invitation.id,
                    error = %cleanup,
                    "Failed to remove undeliverable invitation"
                );
            }
            return Err(err);
        }

        tracing::info!(
            invitation_id = %invitation.id,
            project_id = %invitation.project_id,
            role = ?invitation.role,
            "Invitation created"
        );
        Ok(invitation)
    }

    pub async fn delete(&self, ctx: &AuthContext, key: InvitationKey) -> Result<()> {
        ctx.authorize(Access::Manager(&key.project_id)).await?;
        self.store
            .delete(&paths::invitation(&key.project_id, &key.id))
            .await
    }

    /// Redeem an invitation for the caller.
    pub async fn accept(&self, ctx: &AuthContext, input: AcceptInvitation) -> Result<UserProject> {
        ctx.authorize(Access::Authenticated).await?;

        let invitation = self.find(&input.project_id, &input.id).await?;
        let path = paths::invitation(&input.project_id, &input.id);

        let token_matches: bool = invitation
            .token
            .as_bytes()
            .ct_eq(input.token.as_bytes())
            .into();
        if !token_matches {
            tracing::warn!(invitation_id = %input.id, uid = %ctx.uid(), "Invitation token mismatch");
            return Err(AppError::BadRequest("Invalid invitation token".to_string()));
        }

        if !is_invitee(ctx, &invitation) {
            tracing::warn!(invitation_id = %input.id, uid = %ctx.uid(), "Invitation email mismatch");
            return Err(AppError::BadRequest(
                "Invitation was sent to a different email address".to_string(),
            ));
        }

        if invitation.is_expired(Utc::now()) {
            self.store.delete(&path).await?;
            return Err(AppError::BadRequest("Invitation has expired".to_string()));
        }

        let membership_path = paths::user_project(ctx.uid(), &invitation.project_id);
        let mut batch = WriteBatch::new();
        batch.delete(path);

        // Existing members keep their role.
        let membership = match get_model::<UserProject>(self.store.as_ref(), &membership_path)
            .await?
        {
            Some(existing) => existing,
            None => {
                let membership =
                    UserProject::new(ctx.uid(), &invitation.project_id, invitation.role);
                batch.set_model(membership_path, &membership)?;
                membership
            }
        };

        if let Some(canvas) = self.canvas.find_first(&invitation.project_id).await? {
            let view_path = paths::user_canvas(&invitation.project_id, &canvas.id, ctx.uid());
            if self.store.get(&view_path).await?.is_none() {
                let view = defaults::create_default_user_canvas(ctx.uid(), &canvas.id);
                batch.set_model(view_path, &view)?;
            }
        }

        self.store.commit(batch).await?;

        tracing::info!(
            invitation_id = %invitation.id,
            project_id = %invitation.project_id,
            uid = %ctx.uid(),
            role = ?membership.role,
            "Invitation accepted"
        );
        Ok(membership)
    }

    /// Delete every invitation that expired before `now`, across projects.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let query = Query::all().filter(Filter::Lt {
            field: "expiresAt",
            value: format_utc_rfc3339(now),
        });

        let expired: Vec<_> = self
            .store
            .collection_group(collections::INVITATIONS, query)
            .await?
            .into_iter()
            .map(|doc| doc.path)
            .collect();

        let deleted = batch_delete(self.store.as_ref(), expired).await?;
        tracing::info!(deleted, "Purged expired invitations");
        Ok(deleted)
    }

    async fn find(&self, project_id: &str, id: &str) -> Result<Invitation> {
        get_model(self.store.as_ref(), &paths::invitation(project_id, id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Invitation {}", id)))
    }
}

fn is_invitee(ctx: &AuthContext, invitation: &Invitation) -> bool {
    ctx.email()
        .is_some_and(|email| email.eq_ignore_ascii_case(invitation.invitee_email.trim()))
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod canvas;
pub mod id_token;
pub mod identity;
pub mod invitations;
pub mod mailer;
pub mod members;
pub mod projects;
pub mod user_canvas;
pub mod users;

pub use canvas::CanvasService;
pub use id_token::{TokenError, TokenVerifier, VerifiedToken};
pub use identity::IdentityClient;
pub use invitations::InvitationService;
pub use mailer::{InvitationEmail, Notifier, ResendMailer};
pub use members::MemberService;
pub use projects::ProjectService;
pub use user_canvas::UserCanvasService;
pub use users::UserService;

use crate::db::DocumentStore;
use std::sync::Arc;

/// Resource services, all sharing one store.
#[derive(Clone)]
pub struct Services {
    pub projects: ProjectService,
    pub canvas: CanvasService,
    pub user_canvas: UserCanvasService,
    pub members: MemberService,
    pub invitations: InvitationService,
    pub users: UserService,
}

impl Services {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
        site_url: &str,
    ) -> Self {
        Self {
            projects: ProjectService::new(store.clone()),
            canvas: CanvasService::new(store.clone()),
            user_canvas: UserCanvasService::new(store.clone()),
            members: MemberService::new(store.clone()),
            invitations: InvitationService::new(store.clone(), notifier, site_url),
            users: UserService::new(store),
        }
    }
}

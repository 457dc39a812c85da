// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Studio API: data access and authentication for a collaborative
//! web design tool.
//!
//! Projects, canvases, frames, memberships, invitations and user settings
//! live in Firestore; callers authenticate with Firebase ID tokens and reach
//! every resource through typed RPC procedures.

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::DocumentStore;
use services::{IdentityClient, Notifier, Services, TokenVerifier};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    /// Firebase ID tokens (browser sessions)
    pub id_tokens: TokenVerifier,
    /// Cloud Scheduler OIDC tokens (`/functions/*`)
    pub scheduler_tokens: TokenVerifier,
    pub identity: IdentityClient,
    pub services: Services,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        notifier: Arc<dyn Notifier>,
        id_tokens: TokenVerifier,
        scheduler_tokens: TokenVerifier,
        identity: IdentityClient,
    ) -> Self {
        let services = Services::new(store.clone(), notifier, &config.site_url);
        Self {
            config,
            store,
            id_tokens,
            scheduler_tokens,
            identity,
            services,
        }
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Studio API Server
//!
//! Serves the data-access RPC procedures, the Firebase sign-in callback and
//! the scheduled functions of the collaborative design studio.

use std::sync::Arc;
use studio_api::{
    config::Config,
    db::FirestoreStore,
    services::{IdentityClient, ResendMailer, TokenVerifier},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(port = config.port, env = ?config.app_env, "Starting Studio API");

    let store = FirestoreStore::new(&config.gcp_project_id).await?;

    let notifier = ResendMailer::new(&config)?;
    if config.resend_api_key.is_none() {
        tracing::warn!("RESEND_API_KEY not set, invitations will be refused");
    }

    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::new(store),
        Arc::new(notifier),
        TokenVerifier::firebase(&config)?,
        TokenVerifier::scheduler(&config)?,
        IdentityClient::new(&config)?,
    ));

    let app = studio_api::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive("studio_api=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();

    Ok(())
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity Toolkit REST client for the development password sign-in.

use crate::config::Config;
use crate::error::{AppError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
}

pub struct IdentityClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl IdentityClient {
    /// Honors `FIREBASE_AUTH_EMULATOR_HOST` like the Firebase SDKs do.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed building Identity Toolkit HTTP client")?;

        let base_url = match std::env::var("FIREBASE_AUTH_EMULATOR_HOST") {
            Ok(host) => format!("http://{host}/identitytoolkit.googleapis.com/v1"),
            Err(_) => IDENTITY_TOOLKIT_URL.to_string(),
        };

        Ok(Self {
            http_client,
            api_key: config.firebase_api_key.clone(),
            base_url,
        })
    }

    /// Exchange email and password for a Firebase ID token.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AppError::MissingConfig("FIREBASE_API_KEY"))?;

        let url = format!(
            "{}/accounts:signInWithPassword?key={}",
            self.base_url,
            urlencoding::encode(api_key)
        );

        let response = self
            .http_client
            .post(&url)
            .json(&SignInRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .with_context(|| "Identity Toolkit request failed")?;

        let status = response.status();
        if status.is_client_error() {
            tracing::warn!(status = %status, email, "Password sign-in rejected");
            return Err(AppError::Unauthenticated);
        }
        if !status.is_success() {
            return Err(AppError::Internal(anyhow::anyhow!(
                "Identity Toolkit returned status {status}"
            )));
        }

        let body: SignInResponse = response
            .json()
            .await
            .context("invalid Identity Toolkit response")?;

        Ok(body.id_token)
    }
}
